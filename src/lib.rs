pub mod api;
pub mod config;
pub mod controllers;
pub mod dao;
pub mod entities;
pub mod middleware;
pub mod session;
pub mod views;

use axum::Router;
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;

use crate::api::{create_api_router, AppState};
use crate::entities::setup_schema;

/// Creates the schema if needed and builds the full router.
pub async fn build_app(db: DatabaseConnection) -> Result<Router, DbErr> {
    setup_schema(&db).await?;
    let shared_db = Arc::new(db);
    Ok(create_api_router(AppState::new(shared_db)))
}
