//! HTTP client with bearer token injection and envelope normalization.
//!
//! Every outbound API call goes through `ApiClient::send`. Callers get
//! back either a decoded `Envelope<T>` or an `ApiError` carrying a
//! `success=false` envelope; transport errors never escape raw.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::error::{ApiError, FailureKind, TRANSPORT_FAILURE_CODE};
use super::routes;
use super::token::TokenStore;
use super::types::{Envelope, Meta};
use crate::notify::{Notice, Notifier, Severity};

/// Content of the notice shown when no response arrives.
pub const NO_RESPONSE_MESSAGE: &str = "No server response.";

/// Fallback text for error statuses without a server message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// One outbound call: method, path relative to the API prefix, query, JSON body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::POST, path).with_json(body)
    }

    pub fn put<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::PUT, path).with_json(body)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| {
            ApiError::new(
                FailureKind::Encode,
                0,
                format!("Request body could not be serialized: {}", e),
            )
        })?;
        self.body = Some(value);
        Ok(self)
    }

    fn normalized_path(&self) -> &str {
        self.path.trim_matches('/')
    }
}

/// HTTP client wrapper for Inventaris API communication.
///
/// Holds the base URL, reads the bearer token from the token store
/// before each call, and reports failures to the notifier.
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    /// Create a client. `timeout` bounds the whole request; `None` leaves
    /// it to the transport.
    pub fn new(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
        timeout: Option<Duration>,
    ) -> Self {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            log::warn!("HTTP client builder failed ({}), using defaults", e);
            Client::new()
        });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            notifier,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Perform a call and decode the envelope.
    pub async fn send<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.url(&request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        match self.tokens.get() {
            Ok(Some(token)) => builder = builder.bearer_auth(token),
            Ok(None) => {}
            Err(e) => log::warn!("Token store unreadable, sending without token: {}", e),
        }

        log::debug!("{} {}", request.method, request.path);

        let resp = match builder.send().await {
            Ok(resp) => resp,
            Err(e) => return Err(self.transport_failure(request, e)),
        };
        let status = resp.status().as_u16();
        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.transport_failure(request, e)),
        };

        log::debug!("{} {} -> {}", request.method, request.path, status);

        if !(200..300).contains(&status) {
            return Err(self.status_failure(status, &bytes));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Envelope {
                meta: Meta {
                    success: true,
                    code: status,
                    message: String::new(),
                },
                data: None,
            });
        }

        let raw: Value = serde_json::from_slice(&bytes).map_err(|e| {
            log::warn!("Malformed response from {}: {}", request.path, e);
            ApiError::new(FailureKind::Decode, status, format!("Malformed response: {}", e))
        })?;

        if request.normalized_path() == routes::LOGIN {
            self.capture_login_token(&raw);
        }

        serde_json::from_value(raw).map_err(|e| {
            log::warn!("Unexpected response shape from {}: {}", request.path, e);
            ApiError::new(FailureKind::Decode, status, format!("Malformed response: {}", e))
        })
    }

    /// `GET path?query`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        query: Vec<(String, String)>,
    ) -> Result<Envelope<T>, ApiError> {
        self.send(&ApiRequest::get(path).with_query(query)).await
    }

    /// `POST path` with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        self.send(&ApiRequest::post(path, body)?).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        self.send(&ApiRequest::put(path, body)?).await
    }

    /// `DELETE path`.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
    ) -> Result<Envelope<T>, ApiError> {
        self.send(&ApiRequest::delete(path)).await
    }

    /// Login side effect: keep the access token for subsequent calls.
    fn capture_login_token(&self, raw: &Value) {
        let token = raw
            .pointer("/data/access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty());
        if let Some(token) = token {
            if let Err(e) = self.tokens.set(token) {
                log::error!("Failed to store access token: {}", e);
            }
        }
    }

    fn transport_failure(&self, request: &ApiRequest, err: reqwest::Error) -> ApiError {
        log::warn!(
            "No response for {} {}: {}",
            request.method,
            request.path,
            err
        );
        self.notifier
            .notify(Notice::new(Severity::Fatal, "Network Error", NO_RESPONSE_MESSAGE));
        ApiError::new(
            FailureKind::Transport,
            TRANSPORT_FAILURE_CODE,
            NO_RESPONSE_MESSAGE,
        )
    }

    fn status_failure(&self, status: u16, body: &[u8]) -> ApiError {
        let server_message = server_message(body);
        let kind = FailureKind::from_status(status);

        match kind {
            FailureKind::Unauthorized => {
                self.notifier.notify(Notice::new(
                    Severity::Warning,
                    "Unauthorized",
                    server_message.clone().unwrap_or_default(),
                ));
                if let Err(e) = self.tokens.clear() {
                    log::error!("Failed to clear access token: {}", e);
                }
                self.notifier.redirect(routes::LOGIN_SCREEN);
            }
            FailureKind::Forbidden => self.notifier.notify(Notice::new(
                Severity::Fatal,
                "Forbidden",
                "You lack permission.",
            )),
            FailureKind::Server => self.notifier.notify(Notice::new(
                Severity::Fatal,
                "Server Error",
                "Internal server error.",
            )),
            _ => self.notifier.notify(Notice::new(
                Severity::Transient,
                "Error",
                server_message
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            )),
        }

        log::warn!(
            "Request failed with status {}: {}",
            status,
            server_message.as_deref().unwrap_or("-")
        );

        ApiError::new(
            kind,
            status,
            server_message
                .unwrap_or_else(|| format!("Request failed with status code {}", status)),
        )
    }
}

/// `meta.message` from an error body, falling back to a top-level `message`.
fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/meta/message")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::token::StorageTokenStore;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        client: ApiClient,
        tokens: Arc<StorageTokenStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(base_url: &str) -> Harness {
        let tokens = Arc::new(StorageTokenStore::new(Arc::new(MemoryStorage::new())));
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ApiClient::new(base_url, tokens.clone(), notifier.clone(), None);
        Harness {
            client,
            tokens,
            notifier,
        }
    }

    fn ok_envelope(data: Value) -> Value {
        json!({"meta": {"success": true, "code": 200, "message": "OK"}, "data": data})
    }

    #[tokio::test]
    async fn test_no_token_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!([]))))
            .mount(&server)
            .await;

        let h = harness(&format!("{}/api/", server.uri()));
        let env: Envelope<Value> = h.client.get("categories", vec![]).await.unwrap();
        assert!(env.meta.success);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_token_attached_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard"))
            .and(header("Authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({}))))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&format!("{}/api", server.uri()));
        h.tokens.set("abc123").unwrap();
        let result: Result<Envelope<Value>, _> = h.client.get("dashboard", vec![]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_query_and_json_body_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inventories"))
            .and(query_param("search", "laptop"))
            .and(query_param("limit", "10"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!(null))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/categories"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"name": "Elektronik", "description": "Alat"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "meta": {"success": true, "code": 201, "message": "Created"},
                "data": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let query = crate::api::types::ListQuery::new("laptop", 10, 2).to_pairs();
        let _: Envelope<Value> = h.client.get("inventories", query).await.unwrap();
        let env: Envelope<Value> = h
            .client
            .post(
                "categories",
                &json!({"name": "Elektronik", "description": "Alat"}),
            )
            .await
            .unwrap();
        assert_eq!(env.code(), 201);
    }

    #[tokio::test]
    async fn test_login_response_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({
                "access_token": "abc123",
                "role": "admin",
                "menus": []
            }))))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let _: Envelope<Value> = h
            .client
            .post("login", &json!({"username": "admin", "password": "secret"}))
            .await
            .unwrap();
        assert_eq!(h.tokens.get().unwrap().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_non_login_token_field_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/menus"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_envelope(json!({"access_token": "sneaky"}))),
            )
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let _: Envelope<Value> = h.client.get("menus", vec![]).await.unwrap();
        assert!(h.tokens.get().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token_and_redirects_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inventories"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "meta": {"success": false, "code": 401, "message": "Token expired"},
                "data": null
            })))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.tokens.set("stale").unwrap();
        let err = h
            .client
            .get::<Value>("inventories", vec![])
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::Unauthorized);
        assert_eq!(err.code(), 401);
        assert_eq!(err.message(), "Token expired");
        assert!(!err.envelope.meta.success);
        assert!(h.tokens.get().unwrap().is_none());
        assert_eq!(h.notifier.redirects(), vec![routes::LOGIN_SCREEN.to_string()]);
        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_forbidden_and_server_errors_are_fatal() {
        let server = MockServer::start().await;
        Mock::given(path("/suppliers"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(path("/locations"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.tokens.set("abc").unwrap();

        let err = h.client.get::<Value>("suppliers", vec![]).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Forbidden);
        assert_eq!(err.message(), "Request failed with status code 403");

        let err = h.client.get::<Value>("locations", vec![]).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Server);
        assert_eq!(err.code(), 500);

        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].title, "Forbidden");
        assert_eq!(notices[1].title, "Server Error");
        assert!(notices.iter().all(|n| n.severity == Severity::Fatal));
        // only 401 touches the token
        assert_eq!(h.tokens.get().unwrap().as_deref(), Some("abc"));
        assert!(h.notifier.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_validation_message_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/categories"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "meta": {"success": false, "code": 422, "message": "The name field is required."},
                "data": null
            })))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let err = h
            .client
            .post::<Value, _>("categories", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Rejected);
        assert_eq!(err.message(), "The name field is required.");

        let notices = h.notifier.notices();
        assert_eq!(notices[0].severity, Severity::Transient);
        assert_eq!(notices[0].content, "The name field is required.");
    }

    #[tokio::test]
    async fn test_unknown_error_fallback_notice() {
        let server = MockServer::start().await;
        Mock::given(path("/borrowings/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let err = h.client.delete::<Value>("borrowings/9").await.unwrap_err();
        assert_eq!(err.code(), 404);
        assert_eq!(h.notifier.notices()[0].content, UNKNOWN_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_network_failure_normalized() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let h = harness(&format!("http://127.0.0.1:{}", port));
        let err = h.client.get::<Value>("dashboard", vec![]).await.unwrap_err();

        assert_eq!(err.kind, FailureKind::Transport);
        assert!(!err.envelope.meta.success);
        assert_eq!(err.message(), NO_RESPONSE_MESSAGE);
        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Network Error");
    }

    #[tokio::test]
    async fn test_empty_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/categories/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let env: Envelope<Value> = h.client.delete("categories/1").await.unwrap();
        assert!(env.meta.success);
        assert_eq!(env.code(), 204);
        assert!(env.data.is_none());
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(path("/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let err = h.client.get::<Value>("dashboard", vec![]).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
        assert_eq!(err.code(), 200);
        assert!(h.notifier.notices().is_empty());
    }
}
