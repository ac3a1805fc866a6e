//! Canonical REST route table, relative to the versioned API prefix.

/// Default API origin and prefix.
pub const DEFAULT_BASE_URL: &str = "https://sistem-inventaris.my.id/api/";

pub const LOGIN: &str = "login";
pub const LOGOUT: &str = "logout";
pub const MENUS: &str = "menus";
pub const PERMISSION: &str = "permission";
pub const DASHBOARD: &str = "dashboard";

/// Public, unauthenticated endpoint behind the QR-code borrowing form.
pub const BORROWING_REQUEST: &str = "borrowings";

/// Browser path the admin panel sends users to after a 401.
pub const LOGIN_SCREEN: &str = "/auth/login";

/// Routes for a resource following the index/show/store/update/destroy shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRoutes {
    pub collection: &'static str,
}

impl ResourceRoutes {
    pub const fn new(collection: &'static str) -> Self {
        Self { collection }
    }

    /// GET, list with `search`/`limit`/`page`.
    pub fn index(&self) -> String {
        self.collection.to_string()
    }

    /// GET by id.
    pub fn show(&self, id: u64) -> String {
        format!("{}/{}", self.collection, id)
    }

    /// POST.
    pub fn store(&self) -> String {
        self.collection.to_string()
    }

    /// PUT by id.
    pub fn update(&self, id: u64) -> String {
        self.show(id)
    }

    /// DELETE by id.
    pub fn destroy(&self, id: u64) -> String {
        self.show(id)
    }
}

pub const CATEGORIES: ResourceRoutes = ResourceRoutes::new("categories");
pub const LOCATIONS: ResourceRoutes = ResourceRoutes::new("locations");
pub const SUPPLIERS: ResourceRoutes = ResourceRoutes::new("suppliers");
pub const INVENTORIES: ResourceRoutes = ResourceRoutes::new("inventories");
pub const BORROWINGS: ResourceRoutes = ResourceRoutes::new("borrowings");

/// GET an inventory item (with its borrowing history) by scanned barcode.
pub fn inventory_by_barcode(id: u64) -> String {
    format!("{}/barcode/{}", INVENTORIES.collection, id)
}
