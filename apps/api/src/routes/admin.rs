//! Admin dashboard routes. Every handler requires [`AdminIdentity`].

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use culturaft_core::{Notification, Order};

use crate::error::ApiResult;
use crate::identity::AdminIdentity;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(all_orders))
        .route("/orders/legacy", delete(remove_legacy_orders))
        .route("/notifications", get(notifications))
        .route("/notifications/{id}/read", put(mark_read))
}

async fn all_orders(
    State(state): State<AppState>,
    _admin: AdminIdentity,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.db.orders().list_all().await?))
}

/// Drops orders that predate shipping/payment capture.
async fn remove_legacy_orders(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
) -> ApiResult<Json<CleanupResponse>> {
    let removed = state.db.orders().delete_legacy().await?;
    info!(admin = %admin.user_id, removed = removed, "Legacy orders removed by admin");
    Ok(Json(CleanupResponse { removed }))
}

async fn notifications(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Notification>>> {
    let Query(query) = query?;
    Ok(Json(state.db.notifications().recent(query.limit).await?))
}

async fn mark_read(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(state.db.notifications().mark_read(&id).await?))
}
