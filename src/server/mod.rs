//! HTTP command surface.
//!
//! Thin translation layer between JSON command bodies and the connection
//! pool; all state lives in [`AppState`].

mod messages;
mod rest;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::ble::ConnectionPool;

pub use self::messages::{
    BrightnessSetRequest, ConnectionCountResponse, DisconnectAllResponse, ErrorResponse,
    OkResponse, RawWriteRequest, ToggleSetRequest, ToggleValue,
};
pub use self::rest::ApiError;

/// Shared state handed to every request handler.
pub struct AppState {
    pub pool: Arc<ConnectionPool>,
}

/// Builds the gateway router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(rest::health))
        // Command endpoints
        .route("/api/write", post(rest::raw_write))
        .route("/api/brightness", post(rest::brightness_set))
        .route("/api/toggle", post(rest::toggle_set))
        // Pool management
        .route("/api/disconnect", post(rest::disconnect_all))
        .route("/api/connections", get(rest::count_connections))
        .with_state(state)
}
