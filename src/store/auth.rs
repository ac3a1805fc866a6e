//! Authentication slice: bearer token plus the logged-in user's role and menus.
//!
//! This is the only slice mirrored to durable storage.

use serde::{Deserialize, Serialize};

use super::Action;
use crate::api::error::{ApiError, FailureKind};
use crate::api::routes;
use crate::api::types::{AuthRequest, AuthResponse, MenuItem};
use crate::state::AppState;

/// Session lifecycle: `Anonymous -> Authenticated -> Anonymous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
}

/// Profile returned at login, minus the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub token_type: String,
    pub expires_in: u64,
    pub role: String,
    pub menus: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthState {
    pub is_loading: bool,
    pub is_error: bool,
    pub token: Option<String>,
    pub user: Option<UserData>,
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    LoginPending,
    LoginFulfilled(AuthResponse),
    LoginRejected,
    Logout,
    ClearError,
}

impl AuthState {
    pub fn status(&self) -> SessionStatus {
        match self.token {
            Some(_) => SessionStatus::Authenticated,
            None => SessionStatus::Anonymous,
        }
    }

    pub fn role(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.role.as_str())
    }

    /// State as merged at startup: an in-flight login never survives a restart.
    pub(crate) fn rehydrated(mut self) -> Self {
        self.is_loading = false;
        self
    }

    pub(crate) fn reduce(&mut self, action: AuthAction) {
        match action {
            AuthAction::LoginPending => {
                self.is_loading = true;
                self.is_error = false;
            }
            AuthAction::LoginFulfilled(resp) => {
                self.is_loading = false;
                self.is_error = false;
                self.token = resp.access_token;
                self.user = Some(UserData {
                    token_type: resp.token_type,
                    expires_in: resp.expires_in,
                    role: resp.role,
                    menus: resp.menus,
                });
            }
            AuthAction::LoginRejected => {
                self.is_loading = false;
                self.is_error = true;
                self.token = None;
                self.user = None;
            }
            AuthAction::Logout => {
                self.is_loading = false;
                self.token = None;
                self.user = None;
            }
            AuthAction::ClearError => self.is_error = false,
        }
    }
}

/// Log in with username and password.
///
/// Succeeds only on a `meta.code == 200` envelope that carries an access
/// token; the request client has already stored that token by the time
/// this returns.
pub async fn login(app: &AppState, request: &AuthRequest) -> Result<AuthResponse, ApiError> {
    log::info!("Logging in as {}", request.username);
    app.store.dispatch(Action::Auth(AuthAction::LoginPending));

    let result = app.api.post::<AuthResponse, _>(routes::LOGIN, request).await;
    let outcome = match result {
        Ok(env) if env.meta.code == 200 => match env.data {
            Some(data) if data.access_token.is_some() => Ok(data),
            _ => Err(ApiError::new(
                FailureKind::Decode,
                env.meta.code,
                "Login response carried no access token",
            )),
        },
        Ok(env) => {
            let message = if env.meta.message.is_empty() {
                "Login failed".to_string()
            } else {
                env.meta.message
            };
            Err(ApiError::new(FailureKind::Rejected, env.meta.code, message))
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(data) => {
            app.store
                .dispatch(Action::Auth(AuthAction::LoginFulfilled(data.clone())));
            log::info!("Login complete (role: {})", data.role);
            Ok(data)
        }
        Err(e) => {
            log::warn!("Login failed: {}", e);
            app.store.dispatch(Action::Auth(AuthAction::LoginRejected));
            Err(e)
        }
    }
}

/// Dismiss a failed login.
pub fn clear_error(app: &AppState) {
    app.store.dispatch(Action::Auth(AuthAction::ClearError));
}

/// Logout: tell the server (best-effort), then drop token, session and the
/// persisted blob.
pub async fn logout(app: &AppState) {
    log::info!("Logging out");

    let has_token = matches!(app.api.tokens().get(), Ok(Some(_)));
    if has_token {
        let resp = app
            .api
            .post::<serde_json::Value, _>(routes::LOGOUT, &serde_json::json!({}))
            .await;
        if let Err(e) = resp {
            log::warn!("Logout request failed (will continue local cleanup): {}", e);
        }
    }

    if let Err(e) = app.api.tokens().clear() {
        log::error!("Failed to clear access token: {}", e);
    }
    app.store.dispatch(Action::Auth(AuthAction::Logout));
    app.persistor.purge();

    log::info!("Logout complete");
}
