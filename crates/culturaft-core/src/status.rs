//! # Order Status
//!
//! The order lifecycle as an explicit transition table.
//!
//! ```text
//! ┌──────────┐      ┌──────────┐      ┌──────────┐      ┌───────────┐
//! │ pending  │ ───► │ accepted │ ───► │ shipped  │ ───► │ delivered │
//! └──────────┘      └──────────┘      └──────────┘      └───────────┘
//! ```
//!
//! Only single forward steps are allowed. Re-applying the current status is a
//! no-op; every other request is rejected before anything is written.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, waiting for the seller.
    #[default]
    Pending,
    Accepted,
    Shipped,
    Delivered,
}

/// Outcome of a permitted status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested status equals the current one; nothing to write.
    Unchanged(OrderStatus),
    Advanced { from: OrderStatus, to: OrderStatus },
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// The single status this one may advance to, if any.
    pub fn allowed_next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Accepted),
            OrderStatus::Accepted => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_none()
    }

    /// Checks a requested status against the transition table.
    ///
    /// ## Returns
    /// * `Ok(Transition::Unchanged)` - `next` is already the status
    /// * `Ok(Transition::Advanced)` - `next` is the allowed successor
    /// * `Err(CoreError::InvalidStatusTransition)` - skip, reversal, or move out of `delivered`
    pub fn transition_to(self, next: OrderStatus) -> Result<Transition, CoreError> {
        if self == next {
            return Ok(Transition::Unchanged(self));
        }

        if self.allowed_next() == Some(next) {
            return Ok(Transition::Advanced { from: self, to: next });
        }

        Err(CoreError::InvalidStatusTransition {
            from: self.as_str().to_string(),
            to: next.as_str().to_string(),
        })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

impl Transition {
    /// The status the order ends up in.
    pub fn target(&self) -> OrderStatus {
        match self {
            Transition::Unchanged(status) => *status,
            Transition::Advanced { to, .. } => *to,
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Transition::Advanced { .. })
    }
}
