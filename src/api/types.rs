//! Request and response types for the Inventaris backend API.
//!
//! Field names follow the API's JSON exactly: snake_case for resources,
//! camelCase for the dashboard statistics.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `meta` block carried by every API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub success: bool,
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// `{ meta, data }` wrapper every response (and every failure) is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: Meta,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Failure envelope: `success=false`, no payload.
    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self {
            meta: Meta {
                success: false,
                code,
                message: message.into(),
            },
            data: None,
        }
    }

    pub fn code(&self) -> u16 {
        self.meta.code
    }

    pub fn message(&self) -> &str {
        &self.meta.message
    }
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_records: u64,
    pub limit: u32,
}

/// `data` payload of every `index` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "Vec::new")]
    pub page_data: Vec<T>,
    #[serde(default)]
    pub page_info: PageInfo,
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query parameters accepted by `index` endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

impl ListQuery {
    pub fn new(search: impl Into<String>, limit: u32, page: u32) -> Self {
        Self {
            search: Some(search.into()),
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Flatten into query pairs in a stable order.
    ///
    /// An empty search string is still sent, matching what the admin
    /// panel's search box does on clear.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(ref search) = self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(ref sort) = self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order".to_string(), order.as_str().to_string()));
        }
        pairs
    }
}

/// The backend is inconsistent about quoting numeric columns; accept both.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

// ── Auth ────────────────────────────────────────────────────────────────

/// Login request body sent to POST login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// Sidebar menu node returned at login and by GET menus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub key: String,
    #[serde(default)]
    pub icon: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MenuItem>>,
}

/// Login response `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub menus: Vec<MenuItem>,
}

/// Per-menu CRUD permission flags from GET permission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Permissions {
    pub index: bool,
    pub show: bool,
    pub store: bool,
    pub update: bool,
    pub delete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionPermission {
    pub menu: String,
    pub permissions: Permissions,
}

// ── Master data ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRequest {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

// ── Inventory ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub supplier_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub supplier: Option<Supplier>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRequest {
    pub name: String,
    pub category_id: String,
    pub location_id: String,
    pub supplier_id: String,
    pub quantity: String,
    pub unit: String,
    pub condition: String,
}

/// One borrowing row nested in a barcode lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowingEntry {
    pub id: u64,
    pub kode_peminjaman: String,
    pub nama: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub divisi: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nomor_identitas: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub qty: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tgl_peminjaman: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tgl_pengembalian: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub approved: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// GET inventories/barcode/:id payload: an item with its borrowing history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryBorrowing {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub borrowings: Vec<BorrowingEntry>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

// ── Borrowing ───────────────────────────────────────────────────────────

/// Inventory summary embedded in a borrowing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowedItem {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrowing {
    pub id: u64,
    pub kode_peminjaman: String,
    pub nama: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub divisi: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nomor_identitas: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub inventory_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub qty: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tgl_peminjaman: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tgl_pengembalian: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub approved: Option<String>,
    #[serde(default)]
    pub inventory: Option<BorrowedItem>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Body for creating or updating a borrowing, also used by the public
/// QR-code request form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kode_peminjaman: Option<String>,
    pub nama: String,
    pub email: String,
    pub divisi: String,
    pub nomor_identitas: String,
    pub inventory_id: u64,
    pub qty: u32,
    pub tgl_peminjaman: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tgl_pengembalian: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<Value>,
}

/// What the public borrowing endpoint hands back to the requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowingReceipt {
    pub kode_peminjaman: String,
}

// ── Dashboard ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MostBorrowed {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_borrowed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistic {
    pub total_inventories: u64,
    pub total_categories: u64,
    pub total_locations: u64,
    pub total_suppliers: u64,
    pub total_borrowings: u64,
    pub pending_approvals: u64,
    pub borrowing_today: u64,
    pub most_borrowed: MostBorrowed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub name: String,
    pub stock: i64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dashboard {
    pub statistic: Statistic,
    pub low_stock_items: Vec<LowStockItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_null_data() {
        let env: Envelope<Category> = serde_json::from_value(json!({
            "meta": {"success": false, "code": 404, "message": "Not found"},
            "data": null
        }))
        .unwrap();
        assert!(env.data.is_none());
        assert_eq!(env.code(), 404);
    }

    #[test]
    fn test_envelope_missing_message() {
        let env: Envelope<Value> =
            serde_json::from_value(json!({"meta": {"success": true, "code": 200}})).unwrap();
        assert_eq!(env.message(), "");
        assert!(env.data.is_none());
    }

    #[test]
    fn test_inventory_accepts_numeric_columns() {
        let inv: Inventory = serde_json::from_value(json!({
            "id": 4,
            "name": "Proyektor",
            "category_id": 2,
            "location_id": "3",
            "supplier_id": 1,
            "quantity": 12,
            "unit": "pcs",
            "condition": "baik"
        }))
        .unwrap();
        assert_eq!(inv.category_id, "2");
        assert_eq!(inv.location_id, "3");
        assert_eq!(inv.quantity, "12");
        assert!(inv.category.is_none());
    }

    #[test]
    fn test_borrowing_approved_variants() {
        let b: Borrowing = serde_json::from_value(json!({
            "id": 1,
            "kode_peminjaman": "BRW-001",
            "nama": "Budi",
            "approved": null,
            "tgl_pengembalian": null
        }))
        .unwrap();
        assert!(b.approved.is_none());

        let b: Borrowing = serde_json::from_value(json!({
            "id": 2,
            "kode_peminjaman": "BRW-002",
            "nama": "Sari",
            "approved": 1
        }))
        .unwrap();
        assert_eq!(b.approved.as_deref(), Some("1"));
    }

    #[test]
    fn test_list_query_pairs() {
        let q = ListQuery::new("", 10, 1);
        assert_eq!(
            q.to_pairs(),
            vec![
                ("search".to_string(), "".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("page".to_string(), "1".to_string()),
            ]
        );

        let q = ListQuery {
            sort: Some("name".into()),
            order: Some(SortOrder::Desc),
            ..ListQuery::default()
        };
        assert_eq!(
            q.to_pairs(),
            vec![
                ("sort".to_string(), "name".to_string()),
                ("order".to_string(), "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_auth_response_defaults() {
        let auth: AuthResponse = serde_json::from_value(json!({
            "access_token": "abc123",
            "role": "admin",
            "menus": []
        }))
        .unwrap();
        assert_eq!(auth.access_token.as_deref(), Some("abc123"));
        assert_eq!(auth.token_type, "");
        assert!(auth.menus.is_empty());
    }

    #[test]
    fn test_dashboard_camel_case() {
        let d: Dashboard = serde_json::from_value(json!({
            "statistic": {
                "totalInventories": 40,
                "pendingApprovals": 2,
                "mostBorrowed": {"name": "Laptop", "totalBorrowed": 9}
            },
            "lowStockItems": [{"name": "Kabel HDMI", "stock": 1, "unit": "pcs"}]
        }))
        .unwrap();
        assert_eq!(d.statistic.total_inventories, 40);
        assert_eq!(d.statistic.total_categories, 0);
        assert_eq!(d.statistic.most_borrowed.total_borrowed, 9);
        assert_eq!(d.low_stock_items.len(), 1);
    }
}
