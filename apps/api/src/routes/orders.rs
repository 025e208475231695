//! Order routes: checkout, the customer's history, status changes and
//! invoices.
//!
//! ## Checkout Flow
//! ```text
//! POST /api/orders  { items, shippingAddress, paymentDetails, shippingCostCents? }
//!      │
//!      ├── shippingCostCents given? → ShippingCharge::Fixed
//!      │                      else  → ShippingCharge::Policy (config)
//!      ▼
//! db.orders().place_order()   (validation, pricing, stock, notification)
//!      │
//!      ▼
//! 201 Order
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use culturaft_core::validation::validate_shipping_cost_cents;
use culturaft_core::{
    project_invoice, CartLineRequest, CoreError, InvoiceView, Money, Order, OrderStatus,
    PaymentDetails, ShippingAddress, ShippingCharge, ShippingPolicy,
};
use culturaft_db::NewOrder;

use crate::error::ApiResult;
use crate::identity::{AdminIdentity, Identity};
use crate::AppState;

/// Checkout body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartLineRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_details: PaymentDetails,
    #[serde(default)]
    pub shipping_cost_cents: Option<i64>,
}

impl CheckoutRequest {
    /// A quoted cost wins; otherwise the policy decides.
    pub fn shipping_charge(&self, policy: ShippingPolicy) -> ApiResult<ShippingCharge> {
        match self.shipping_cost_cents {
            Some(cents) => {
                validate_shipping_cost_cents(cents)?;
                Ok(ShippingCharge::Fixed(Money::from_cents(cents)))
            }
            None => Ok(ShippingCharge::Policy(policy)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub order: Order,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(place_order))
        .route("/my", get(my_orders))
        .route("/{id}/status", put(update_status))
        .route("/{id}/invoice", get(invoice))
}

async fn place_order(
    State(state): State<AppState>,
    Identity(requester): Identity,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let Json(request) = payload?;
    let shipping = request.shipping_charge(state.shipping_policy())?;

    let new_order = NewOrder {
        user_id: requester.user_id,
        lines: request.items,
        shipping_address: request.shipping_address,
        payment_details: request.payment_details,
        shipping,
    };

    let order = state.db.orders().place_order(&new_order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn my_orders(
    State(state): State<AppState>,
    Identity(requester): Identity,
) -> ApiResult<Json<Vec<Order>>> {
    let orders = state.db.orders().list_for_user(&requester.user_id).await?;
    Ok(Json(orders))
}

async fn update_status(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(request) = payload?;
    let next: OrderStatus = request.status.parse()?;

    let update = state.db.orders().set_status(&id, next).await?;

    let message = if update.transition.is_change() {
        info!(admin = %admin.user_id, order_id = %id, status = %next, "Order status updated by admin");
        "Order status updated"
    } else {
        "Order status unchanged"
    };

    Ok(Json(StatusResponse {
        message: message.to_string(),
        order: update.order,
    }))
}

async fn invoice(
    State(state): State<AppState>,
    Identity(requester): Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceView>> {
    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.clone()))?;

    let view = project_invoice(&order, &requester)?;
    if view.is_degraded() {
        warn!(
            order_id = %id,
            fields = ?view.degraded_fields,
            "Invoice rendered with fallback values"
        );
    }

    Ok(Json(view))
}
