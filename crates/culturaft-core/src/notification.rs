//! # Notifications
//!
//! Admin-facing records emitted as a side effect of checkout and status
//! changes. The payload shapes are what the admin dashboard reads.
//!
//! ```text
//! new_order     { orderId, user, userName, shippingCity, totalCents }
//! order_status  { orderId, status, userName }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use ts_rs::TS;

use crate::types::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrder,
    OrderStatus,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewOrder => "new_order",
            NotificationKind::OrderStatus => "order_status",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[ts(type = "unknown")]
    pub data: Value,
    pub read: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A notification not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub data: Value,
}

impl NotificationDraft {
    /// Summary of a freshly placed order.
    pub fn new_order(order: &Order) -> Self {
        let shipping_city = order
            .shipping_address
            .as_ref()
            .map(|a| a.city.as_str())
            .unwrap_or_default();

        Self {
            kind: NotificationKind::NewOrder,
            data: json!({
                "orderId": order.id,
                "user": order.user_id,
                "userName": order.customer_name(),
                "shippingCity": shipping_city,
                "totalCents": order.totals.total_cents,
            }),
        }
    }

    /// The order has moved to its current status.
    pub fn order_status(order: &Order) -> Self {
        Self {
            kind: NotificationKind::OrderStatus,
            data: json!({
                "orderId": order.id,
                "status": order.status.as_str(),
                "userName": order.customer_name(),
            }),
        }
    }
}
