//! # Domain Types
//!
//! Core domain types used throughout Culturaft.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │  Notification   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  kind           │       │
//! │  │  title          │   │  user_id        │   │  data (JSON)    │       │
//! │  │  price_cents    │   │  items[]        │   │  read           │       │
//! │  │  sgst/cgst bps  │   │  status, totals │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ PricedLineItem  │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  price snapshot │   │  Card           │       │
//! │  │  250 = 2.5%     │   │  rate snapshots │   │  Paypal         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are stored as `i64` minor units (`*_cents`) and tax rates as
//! `u32` basis points (`*_bps`); accessor methods lift them into [`Money`] and
//! [`TaxRate`] for arithmetic.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::status::OrderStatus;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000.
/// SGST 2.5% = 250 bps, CGST 9% = 900 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display title shown in the shop and on invoices.
    pub title: String,

    pub description: Option<String>,

    /// Shop category ("Textiles", "Pottery", ...).
    pub category: String,

    /// Price in minor units.
    pub price_cents: i64,

    /// Units available for sale.
    pub stock: i64,

    /// State GST rate in basis points.
    pub sgst_rate_bps: u32,

    /// Central GST rate in basis points.
    pub cgst_rate_bps: u32,

    /// Shown on the home page.
    pub featured: bool,

    /// Image URLs (uploaded elsewhere).
    pub images: Vec<String>,

    /// Region or workshop the piece comes from.
    pub origin: Option<String>,

    /// Long-form maker story shown on the product page.
    pub artisan_story: Option<String>,

    pub materials_care: Option<String>,

    pub shipping_returns: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn sgst_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.sgst_rate_bps)
    }

    #[inline]
    pub fn cgst_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.cgst_rate_bps)
    }

    /// Checks whether `quantity` units can be taken from stock.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Create/update payload for a catalog product.
///
/// Missing tax rates default to zero, matching how the catalog treats
/// untaxed items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub sgst_rate_bps: u32,
    #[serde(default)]
    pub cgst_rate_bps: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub artisan_story: Option<String>,
    #[serde(default)]
    pub materials_care: Option<String>,
    #[serde(default)]
    pub shipping_returns: Option<String>,
}

// =============================================================================
// Checkout Inputs
// =============================================================================

/// One line of the client's cart: which product and how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLineRequest {
    /// Product ID.
    pub product: String,
    pub qty: i64,
}

/// Where the order ships. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Paypal,
}

impl PaymentMethod {
    /// Wire/storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
        }
    }

    /// Capitalized label printed on invoices ("Card", "Paypal").
    pub fn label(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "card" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            _ => Err(ValidationError::NotAllowed {
                field: "paymentDetails.method".to_string(),
                allowed: vec!["card".to_string(), "paypal".to_string()],
            }),
        }
    }
}

/// Payment details captured at checkout.
///
/// Card fields are only kept for `card`. The card number is stored masked to
/// its last four digits and the CVC is never kept in clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub cvc: Option<String>,
}

// =============================================================================
// Priced Line Item
// =============================================================================

/// An order line whose price and tax rates are frozen at purchase time.
///
/// ## Snapshot Pattern
/// Later catalog edits (price, SGST/CGST) never touch these values; the
/// amounts were computed once by the pricing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedLineItem {
    pub product_id: String,
    pub qty: i64,
    /// Unit price at time of purchase (frozen).
    pub unit_price_cents: i64,
    pub sgst_rate_bps: u32,
    pub cgst_rate_bps: u32,
    pub sgst_amount_cents: i64,
    pub cgst_amount_cents: i64,
}

impl PricedLineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity, before tax.
    ///
    /// Priced lines were overflow-checked by the pricing engine, so this
    /// saturates rather than failing.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents.saturating_mul(self.qty))
    }

    #[inline]
    pub fn sgst_amount(&self) -> Money {
        Money::from_cents(self.sgst_amount_cents)
    }

    #[inline]
    pub fn cgst_amount(&self) -> Money {
        Money::from_cents(self.cgst_amount_cents)
    }

    pub fn total_tax(&self) -> Money {
        self.sgst_amount() + self.cgst_amount()
    }

    pub fn total_with_tax(&self) -> Money {
        self.line_total() + self.total_tax()
    }
}

/// The money summary of an order.
///
/// ## Invariants
/// - `total_tax == sgst_total + cgst_total`
/// - `total == subtotal + shipping_cost + total_tax`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal_cents: i64,
    pub shipping_cost_cents: i64,
    pub sgst_total_cents: i64,
    pub cgst_total_cents: i64,
    pub total_tax_cents: i64,
    pub total_cents: i64,
}

impl OrderTotals {
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn shipping_cost(&self) -> Money {
        Money::from_cents(self.shipping_cost_cents)
    }

    pub fn total_tax(&self) -> Money {
        Money::from_cents(self.total_tax_cents)
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// Catalog data joined onto an order line for display.
///
/// `None` on [`OrderItem::product`] means the product has since been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSummary {
    pub title: String,
    pub category: String,
}

/// A persisted order line: the frozen pricing plus the current catalog view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    #[serde(flatten)]
    pub priced: PricedLineItem,
    pub product: Option<ProductSummary>,
}

/// An order as stored.
///
/// `shipping_address`, `payment_details` and `created_at` are optional only so
/// that rows written before those columns existed can still be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_details: Option<PaymentDetails>,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub totals: OrderTotals,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Name to show in notifications and admin lists.
    pub fn customer_name(&self) -> &str {
        self.shipping_address
            .as_ref()
            .map(|a| a.full_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or("Customer")
    }
}

// =============================================================================
// Identity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["user".to_string(), "admin".to_string()],
            }),
        }
    }
}

/// The already-authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: String,
    pub role: Role,
    pub email: Option<String>,
}

impl Requester {
    pub fn user(user_id: impl Into<String>) -> Self {
        Requester {
            user_id: user_id.into(),
            role: Role::User,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
