//! HTTP route handlers.
//!
//! ```text
//! /health                                 health
//! /api/products[/{id}]                    products  (writes: admin)
//! /api/orders, /api/orders/my             orders    (signed-in)
//! /api/orders/{id}/status                 orders    (admin)
//! /api/orders/{id}/invoice                orders    (owner)
//! /api/admin/...                          admin
//! ```

pub mod admin;
pub mod health;
pub mod orders;
pub mod products;

use axum::Router;

use crate::AppState;

/// All routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .nest("/api/products", products::routes())
        .nest("/api/orders", orders::routes())
        .nest("/api/admin", admin::routes())
}
