//! # Culturaft API
//!
//! REST server for the marketplace shop and its admin dashboard.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Server                                     │
//! │                                                                         │
//! │  Request                                                                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  TraceLayer → CorsLayer → expose_error_details                   │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                                 ▼                                       │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  products      │  │  orders        │  │  admin                     ││
//! │  │                │  │                │  │                            ││
//! │  │ • list / get   │  │ • checkout     │  │ • all orders               ││
//! │  │ • create       │  │ • my orders    │  │ • notification feed        ││
//! │  │ • update       │  │ • status       │  │ • mark read                ││
//! │  │ • delete       │  │ • invoice      │  │ • legacy cleanup           ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                     culturaft-db (SQLite)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`].

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use culturaft_core::ShippingPolicy;
use culturaft_db::Database;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }

    pub fn shipping_policy(&self) -> ShippingPolicy {
        self.config.shipping_policy()
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    routes::routes()
        .layer(middleware::map_response_with_state(
            state.clone(),
            expose_error_details,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Swaps the generic 500 body for the real one when configured to.
async fn expose_error_details(State(state): State<AppState>, mut response: Response) -> Response {
    if !state.config.expose_errors {
        return response;
    }

    match response.extensions_mut().remove::<error::ExposedError>() {
        Some(error::ExposedError(body)) => (response.status(), Json(body)).into_response(),
        None => response,
    }
}
