//! Order service: the HTTP side of checkout.
//!
//! Serves the catalog and accepts the order payload the storefront builds,
//! persisting it and notifying the shop by email.

pub mod error;
pub mod handlers;
pub mod mailer;
pub mod repository;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::catalog::Catalog;
use mailer::Mailer;
use repository::OrderRepository;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub catalog: Arc<Catalog>,
    pub notify_recipient: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/products", get(handlers::list_products))
        .route("/functions/v1/create-order", post(handlers::create_order))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
