//! HTTP API module
//!
//! Turns HTTP requests into worker events: lifecycle, messages, notification
//! clicks and, for every other path, fetches of the app's assets.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sw/install", post(install_handler))
        .route("/sw/activate", post(activate_handler))
        .route("/sw/message", post(message_handler))
        .route("/sw/notificationclick", post(notification_click_handler))
        .route("/sw/clients", get(clients_handler))
        .route("/sw/notifications", get(notifications_handler))
        .route("/sw/state", get(state_handler))
        .route("/health", get(health_handler))
        .fallback(fetch_handler)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
