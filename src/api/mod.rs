pub mod products;

use axum::{middleware::from_fn, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::controllers::products::ProductController;
use crate::dao::{ProductsDao, SqlProductsDao, Table};
use crate::middleware::logging::logging_middleware;
use crate::session::SessionStore;
use products::products_router;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub products: Arc<dyn ProductsDao>,
    pub product_controller: ProductController,
}

impl AppState {
    pub fn new(shared_db: Arc<DatabaseConnection>) -> Self {
        let products: Arc<dyn ProductsDao> = Arc::new(SqlProductsDao::new(Table::new(shared_db)));
        let sessions = Arc::new(SessionStore::new());
        let product_controller = ProductController::new(products.clone(), sessions.clone());

        Self {
            sessions,
            products,
            product_controller,
        }
    }
}

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .merge(products_router(state))
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
