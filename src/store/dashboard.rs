//! Dashboard slice: aggregate statistics for the landing page.

use super::Action;
use crate::api::error::ApiError;
use crate::api::routes;
use crate::api::types::Dashboard;
use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub is_loading: bool,
    pub is_error: bool,
    pub data: Option<Dashboard>,
}

#[derive(Debug, Clone)]
pub enum DashboardAction {
    Pending,
    Loaded(Dashboard),
    Rejected,
}

impl DashboardState {
    pub(crate) fn reduce(&mut self, action: DashboardAction) {
        match action {
            DashboardAction::Pending => {
                self.is_loading = true;
                self.is_error = false;
            }
            DashboardAction::Loaded(data) => {
                self.is_loading = false;
                self.is_error = false;
                self.data = Some(data);
            }
            DashboardAction::Rejected => {
                self.is_loading = false;
                self.is_error = true;
            }
        }
    }
}

/// GET dashboard. A missing `data` block reads as all-zero statistics.
pub async fn fetch(app: &AppState) -> Result<Dashboard, ApiError> {
    app.store.dispatch(Action::Dashboard(DashboardAction::Pending));
    match app.api.get::<Dashboard>(routes::DASHBOARD, Vec::new()).await {
        Ok(env) => {
            let data = env.data.unwrap_or_default();
            app.store
                .dispatch(Action::Dashboard(DashboardAction::Loaded(data.clone())));
            Ok(data)
        }
        Err(e) => {
            app.store.dispatch(Action::Dashboard(DashboardAction::Rejected));
            app.handle_failure(&e);
            Err(e)
        }
    }
}
