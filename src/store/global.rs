//! Global slice: sidebar menus, per-menu permissions, and the two public
//! flows reached by QR code (barcode lookup and the borrowing request form).

use std::collections::BTreeMap;

use super::Action;
use crate::api::error::ApiError;
use crate::api::routes;
use crate::api::types::{
    BorrowingReceipt, BorrowingRequest, Envelope, FunctionPermission, InventoryBorrowing,
    MenuItem, Permissions,
};
use crate::state::AppState;

/// A value fetched on demand together with its in-flight flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Loadable<T> {
    pub loading: bool,
    pub data: Option<T>,
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self {
            loading: false,
            data: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalState {
    pub sider_collapsed: bool,
    pub menus: Loadable<Vec<MenuItem>>,
    /// Keyed by menu key.
    pub permissions: BTreeMap<String, Permissions>,
    pub borrowing_request: Loadable<BorrowingReceipt>,
    pub inventory_by_barcode: Loadable<InventoryBorrowing>,
}

#[derive(Debug, Clone)]
pub enum GlobalAction {
    ToggleSider,
    MenusPending,
    MenusLoaded(Vec<MenuItem>),
    MenusFailed,
    PermissionLoaded(FunctionPermission),
    BorrowingRequestPending,
    BorrowingRequestDone(Option<BorrowingReceipt>),
    BorrowingRequestFailed,
    BarcodePending,
    BarcodeLoaded(InventoryBorrowing),
    BarcodeFailed,
}

impl GlobalState {
    pub(crate) fn reduce(&mut self, action: GlobalAction) {
        match action {
            GlobalAction::ToggleSider => self.sider_collapsed = !self.sider_collapsed,
            GlobalAction::MenusPending => self.menus.loading = true,
            GlobalAction::MenusLoaded(menus) => {
                self.menus.loading = false;
                self.menus.data = Some(menus);
            }
            GlobalAction::MenusFailed => self.menus.loading = false,
            GlobalAction::PermissionLoaded(p) => {
                self.permissions.insert(p.menu, p.permissions);
            }
            GlobalAction::BorrowingRequestPending => self.borrowing_request.loading = true,
            GlobalAction::BorrowingRequestDone(receipt) => {
                self.borrowing_request.loading = false;
                self.borrowing_request.data = receipt;
            }
            GlobalAction::BorrowingRequestFailed => self.borrowing_request.loading = false,
            GlobalAction::BarcodePending => self.inventory_by_barcode.loading = true,
            GlobalAction::BarcodeLoaded(item) => {
                self.inventory_by_barcode.loading = false;
                self.inventory_by_barcode.data = Some(item);
            }
            GlobalAction::BarcodeFailed => self.inventory_by_barcode.loading = false,
        }
    }

    /// Whether `menu` allows `check`; unknown menus allow nothing.
    pub fn can(&self, menu: &str, check: impl Fn(&Permissions) -> bool) -> bool {
        self.permissions.get(menu).map(check).unwrap_or(false)
    }
}

/// GET menus.
pub async fn fetch_menus(app: &AppState) -> Result<Vec<MenuItem>, ApiError> {
    app.store.dispatch(Action::Global(GlobalAction::MenusPending));
    match app.api.get::<Vec<MenuItem>>(routes::MENUS, Vec::new()).await {
        Ok(env) => {
            let menus = env.data.unwrap_or_default();
            app.store
                .dispatch(Action::Global(GlobalAction::MenusLoaded(menus.clone())));
            Ok(menus)
        }
        Err(e) => {
            app.store.dispatch(Action::Global(GlobalAction::MenusFailed));
            app.handle_failure(&e);
            Err(e)
        }
    }
}

/// GET permission?menu=<key>.
pub async fn fetch_permission(app: &AppState, menu: &str) -> Result<Permissions, ApiError> {
    let query = vec![("menu".to_string(), menu.to_string())];
    let result = app
        .api
        .get::<FunctionPermission>(routes::PERMISSION, query)
        .await;
    match result {
        Ok(env) => {
            let permission = env.data.unwrap_or_else(|| FunctionPermission {
                menu: menu.to_string(),
                permissions: Permissions::default(),
            });
            let flags = permission.permissions.clone();
            app.store
                .dispatch(Action::Global(GlobalAction::PermissionLoaded(permission)));
            Ok(flags)
        }
        Err(e) => {
            app.handle_failure(&e);
            Err(e)
        }
    }
}

/// GET inventories/barcode/<id>: the item a QR code points at, with its
/// borrowing history.
pub async fn inventory_by_barcode(
    app: &AppState,
    id: u64,
) -> Result<Option<InventoryBorrowing>, ApiError> {
    app.store.dispatch(Action::Global(GlobalAction::BarcodePending));
    match app
        .api
        .get::<InventoryBorrowing>(routes::inventory_by_barcode(id), Vec::new())
        .await
    {
        Ok(env) => {
            match env.data {
                Some(ref item) => app
                    .store
                    .dispatch(Action::Global(GlobalAction::BarcodeLoaded(item.clone()))),
                None => app.store.dispatch(Action::Global(GlobalAction::BarcodeFailed)),
            }
            Ok(env.data)
        }
        Err(e) => {
            app.store.dispatch(Action::Global(GlobalAction::BarcodeFailed));
            app.handle_failure(&e);
            Err(e)
        }
    }
}

/// POST the public borrowing request form.
///
/// The caller gets the whole envelope: the status (201 on success) and the
/// generated `kode_peminjaman` to show the requester.
pub async fn create_borrowing_request(
    app: &AppState,
    payload: &BorrowingRequest,
) -> Result<Envelope<BorrowingReceipt>, ApiError> {
    app.store
        .dispatch(Action::Global(GlobalAction::BorrowingRequestPending));
    match app
        .api
        .post::<BorrowingReceipt, _>(routes::BORROWING_REQUEST, payload)
        .await
    {
        Ok(env) => {
            app.store.dispatch(Action::Global(GlobalAction::BorrowingRequestDone(
                env.data.clone(),
            )));
            Ok(env)
        }
        Err(e) => {
            app.store
                .dispatch(Action::Global(GlobalAction::BorrowingRequestFailed));
            app.handle_failure(&e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_sider() {
        let mut state = GlobalState::default();
        state.reduce(GlobalAction::ToggleSider);
        assert!(state.sider_collapsed);
        state.reduce(GlobalAction::ToggleSider);
        assert!(!state.sider_collapsed);
    }

    #[test]
    fn test_permissions_by_menu() {
        let mut state = GlobalState::default();
        state.reduce(GlobalAction::PermissionLoaded(FunctionPermission {
            menu: "inventories".into(),
            permissions: Permissions {
                index: true,
                show: true,
                store: false,
                update: false,
                delete: false,
            },
        }));
        assert!(state.can("inventories", |p| p.index));
        assert!(!state.can("inventories", |p| p.delete));
        assert!(!state.can("suppliers", |p| p.index));
    }

    #[test]
    fn test_borrowing_request_lifecycle() {
        let mut state = GlobalState::default();
        state.reduce(GlobalAction::BorrowingRequestPending);
        assert!(state.borrowing_request.loading);
        state.reduce(GlobalAction::BorrowingRequestDone(Some(BorrowingReceipt {
            kode_peminjaman: "BRW-001".into(),
        })));
        assert!(!state.borrowing_request.loading);
        assert_eq!(
            state.borrowing_request.data.as_ref().map(|r| r.kode_peminjaman.as_str()),
            Some("BRW-001")
        );
    }
}
