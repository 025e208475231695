//! # culturaft-core: Pure Business Logic for Culturaft
//!
//! This crate holds the marketplace's business rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Culturaft Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    SPA (shop + admin dashboard)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    /api/products, /api/orders, /api/admin/...                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ culturaft-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │  status   │  │  invoice  │  │ validation│  │   │
//! │  │   │ SGST/CGST │  │ pending → │  │ InvoiceVw │  │   rules   │  │   │
//! │  │   │  totals   │  │ delivered │  │ fallbacks │  │  masking  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                culturaft-db (Database Layer)                    │   │
//! │  │       SQLite, migrations, repositories, checkout transaction    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, PaymentDetails, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Order Pricing Engine and shipping policy
//! - [`status`] - Order status transition table
//! - [`invoice`] - Invoice projection
//! - [`notification`] - Admin notification payloads
//! - [`error`] - Domain error types and the error taxonomy
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use culturaft_core::money::Money;
//! use culturaft_core::types::TaxRate;
//!
//! let line_total = Money::from_cents(17000); // ₹170.00
//! let sgst = line_total.calculate_tax(TaxRate::from_bps(250)); // 2.5%
//! assert_eq!(sgst, Some(Money::from_cents(425)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod notification;
pub mod pricing;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use invoice::{project_invoice, InvoiceView};
pub use money::Money;
pub use notification::{Notification, NotificationDraft, NotificationKind};
pub use pricing::{
    price_order, price_order_with, PricedOrder, ProductLookup, ShippingCharge, ShippingPolicy,
};
pub use status::{OrderStatus, Transition};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single checkout.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typos like 1000 instead of 10 before stock is reserved.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest catalog price in minor units (₹1,00,00,000.00).
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// How many notifications the admin feed returns by default.
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;
