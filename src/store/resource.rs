//! CRUD slices shared by categories, locations, suppliers, inventories
//! and borrowings.
//!
//! Each resource keeps the same list/detail/pagination state and goes
//! through the same five operations. Mutations hand the server's envelope
//! back to the caller instead of a callback.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{Action, RootState};
use crate::api::error::{ApiError, FailureKind};
use crate::api::routes::{self, ResourceRoutes};
use crate::api::types::{
    Borrowing, BorrowingRequest, Category, CategoryRequest, Envelope, Inventory,
    InventoryRequest, ListQuery, Location, LocationRequest, PageInfo, Paged, Supplier,
    SupplierRequest,
};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub is_loading: bool,
    pub is_error: bool,
    pub list: Vec<T>,
    pub detail: Option<T>,
    pub pagination: Option<PageInfo>,
    /// Generation of the newest list request issued.
    pub list_generation: u64,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            is_loading: false,
            is_error: false,
            list: Vec::new(),
            detail: None,
            pagination: None,
            list_generation: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResourceAction<T> {
    ListRequested { generation: u64 },
    ListLoaded { generation: u64, page: Paged<T> },
    ListFailed { generation: u64 },
    /// A show/store/update/destroy call started.
    Pending,
    DetailLoaded(T),
    /// A store/update/destroy call succeeded.
    Settled,
    Rejected,
}

impl<T> ResourceState<T> {
    pub(crate) fn reduce(&mut self, action: ResourceAction<T>) {
        match action {
            ResourceAction::ListRequested { generation } => {
                self.list_generation = self.list_generation.max(generation);
                self.is_loading = true;
                self.is_error = false;
            }
            ResourceAction::ListLoaded { generation, page } => {
                if generation != self.list_generation {
                    log::debug!(
                        "Discarding stale list response (generation {} < {})",
                        generation,
                        self.list_generation
                    );
                    return;
                }
                self.is_loading = false;
                self.is_error = false;
                self.list = page.page_data;
                self.pagination = Some(page.page_info);
            }
            ResourceAction::ListFailed { generation } => {
                if generation == self.list_generation {
                    self.is_loading = false;
                    self.is_error = true;
                }
            }
            ResourceAction::Pending => {
                self.is_loading = true;
                self.is_error = false;
            }
            ResourceAction::DetailLoaded(item) => {
                self.is_loading = false;
                self.is_error = false;
                self.detail = Some(item);
            }
            ResourceAction::Settled => {
                self.is_loading = false;
                self.is_error = false;
            }
            ResourceAction::Rejected => {
                self.is_loading = false;
                self.is_error = true;
            }
        }
    }
}

/// A resource with the standard REST shape and its own slice.
pub trait Resource: Clone + DeserializeOwned + Serialize + Send + Sync + 'static {
    /// Body for store/update.
    type Request: Serialize + Sync;

    const NAME: &'static str;
    const ROUTES: ResourceRoutes;

    fn action(action: ResourceAction<Self>) -> Action;
    fn slice(state: &RootState) -> &ResourceState<Self>;
}

impl Resource for Category {
    type Request = CategoryRequest;
    const NAME: &'static str = "category";
    const ROUTES: ResourceRoutes = routes::CATEGORIES;

    fn action(action: ResourceAction<Self>) -> Action {
        Action::Category(action)
    }

    fn slice(state: &RootState) -> &ResourceState<Self> {
        &state.category
    }
}

impl Resource for Location {
    type Request = LocationRequest;
    const NAME: &'static str = "location";
    const ROUTES: ResourceRoutes = routes::LOCATIONS;

    fn action(action: ResourceAction<Self>) -> Action {
        Action::Location(action)
    }

    fn slice(state: &RootState) -> &ResourceState<Self> {
        &state.location
    }
}

impl Resource for Supplier {
    type Request = SupplierRequest;
    const NAME: &'static str = "supplier";
    const ROUTES: ResourceRoutes = routes::SUPPLIERS;

    fn action(action: ResourceAction<Self>) -> Action {
        Action::Supplier(action)
    }

    fn slice(state: &RootState) -> &ResourceState<Self> {
        &state.supplier
    }
}

impl Resource for Inventory {
    type Request = InventoryRequest;
    const NAME: &'static str = "inventory";
    const ROUTES: ResourceRoutes = routes::INVENTORIES;

    fn action(action: ResourceAction<Self>) -> Action {
        Action::Inventory(action)
    }

    fn slice(state: &RootState) -> &ResourceState<Self> {
        &state.inventory
    }
}

impl Resource for Borrowing {
    type Request = BorrowingRequest;
    const NAME: &'static str = "borrowing";
    const ROUTES: ResourceRoutes = routes::BORROWINGS;

    fn action(action: ResourceAction<Self>) -> Action {
        Action::Borrowing(action)
    }

    fn slice(state: &RootState) -> &ResourceState<Self> {
        &state.borrowing
    }
}

/// Whether a list response made it into the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    Applied,
    /// A newer list request was issued before this one resolved.
    Stale,
}

/// GET the resource index and replace the slice's list and pagination.
pub async fn fetch_list<R: Resource>(
    app: &AppState,
    query: &ListQuery,
) -> Result<ListOutcome, ApiError> {
    let generation = app.store.next_generation();
    app.store
        .dispatch(R::action(ResourceAction::ListRequested { generation }));

    match app.api.get::<Paged<R>>(R::ROUTES.index(), query.to_pairs()).await {
        Ok(env) => {
            let page = env.data.unwrap_or(Paged {
                page_data: Vec::new(),
                page_info: PageInfo::default(),
            });
            log::debug!("{} list: {} rows", R::NAME, page.page_data.len());
            app.store
                .dispatch(R::action(ResourceAction::ListLoaded { generation, page }));
            let current = app.store.select(|s| R::slice(s).list_generation);
            Ok(if current == generation {
                ListOutcome::Applied
            } else {
                ListOutcome::Stale
            })
        }
        Err(e) => {
            app.store
                .dispatch(R::action(ResourceAction::ListFailed { generation }));
            app.handle_failure(&e);
            Err(e)
        }
    }
}

/// GET one record into the slice's detail.
pub async fn fetch_one<R: Resource>(app: &AppState, id: u64) -> Result<R, ApiError> {
    app.store.dispatch(R::action(ResourceAction::Pending));

    let result = app
        .api
        .get::<R>(R::ROUTES.show(id), Vec::new())
        .await
        .and_then(|env| {
            let code = env.code();
            env.data.ok_or_else(|| {
                ApiError::new(
                    FailureKind::Decode,
                    code,
                    format!("{} {} response carried no data", R::NAME, id),
                )
            })
        });

    match result {
        Ok(item) => {
            app.store
                .dispatch(R::action(ResourceAction::DetailLoaded(item.clone())));
            Ok(item)
        }
        Err(e) => {
            app.store.dispatch(R::action(ResourceAction::Rejected));
            app.handle_failure(&e);
            Err(e)
        }
    }
}

/// POST a new record.
pub async fn create<R: Resource>(
    app: &AppState,
    payload: &R::Request,
) -> Result<Envelope<Value>, ApiError> {
    app.store.dispatch(R::action(ResourceAction::Pending));
    let result = app.api.post(R::ROUTES.store(), payload).await;
    settle::<R>(app, result)
}

/// PUT an existing record.
pub async fn update<R: Resource>(
    app: &AppState,
    id: u64,
    payload: &R::Request,
) -> Result<Envelope<Value>, ApiError> {
    app.store.dispatch(R::action(ResourceAction::Pending));
    let result = app.api.put(R::ROUTES.update(id), payload).await;
    settle::<R>(app, result)
}

/// DELETE a record. Deleting an id that no longer exists comes back as
/// the server's failure envelope.
pub async fn destroy<R: Resource>(app: &AppState, id: u64) -> Result<Envelope<Value>, ApiError> {
    app.store.dispatch(R::action(ResourceAction::Pending));
    let result = app.api.delete(R::ROUTES.destroy(id)).await;
    settle::<R>(app, result)
}

fn settle<R: Resource>(
    app: &AppState,
    result: Result<Envelope<Value>, ApiError>,
) -> Result<Envelope<Value>, ApiError> {
    match result {
        Ok(env) => {
            log::info!("{} {}: {}", R::NAME, env.code(), env.message());
            app.store.dispatch(R::action(ResourceAction::Settled));
            Ok(env)
        }
        Err(e) => {
            app.store.dispatch(R::action(ResourceAction::Rejected));
            app.handle_failure(&e);
            Err(e)
        }
    }
}
