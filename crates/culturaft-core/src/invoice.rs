//! # Invoice Projection
//!
//! Derives the printable invoice for a stored order. Nothing here is
//! persisted; the view is rebuilt on every request.
//!
//! ## Projection Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order (persisted) + Requester                                          │
//! │        │                                                                │
//! │        ├── requester != owner?           → Forbidden                    │
//! │        ├── no shipping / payment data?   → MissingInvoiceData           │
//! │        ▼                                                                │
//! │  Derive each field independently:                                       │
//! │    invoice number   INV-<last 8 of id>     or INV-UNKNOWN               │
//! │    invoice date     "January 5, 2026"      or N/A                       │
//! │    due date         invoice date + 30 days or N/A                       │
//! │    address fields   trimmed value          or N/A                       │
//! │    item name/cat    joined product         or Product / N/A             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  InvoiceView { ..., degraded_fields }                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A field that falls back never fails the projection. Its name is kept in
//! [`InvoiceView::degraded_fields`] so the caller can log it.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::status::OrderStatus;
use crate::types::{Order, OrderItem, OrderTotals, Requester};

/// Days between the invoice date and the due date.
pub const INVOICE_DUE_DAYS: i64 = 30;

/// Placeholder for any text field that cannot be derived.
pub const NOT_AVAILABLE: &str = "N/A";

const UNKNOWN_INVOICE_NUMBER: &str = "INV-UNKNOWN";
const DELETED_PRODUCT_NAME: &str = "Product";

// =============================================================================
// View Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub product_name: String,
    pub product_category: String,
    pub quantity: i64,
    pub price_cents: i64,
    /// `quantity × price`, before tax.
    pub total_cents: i64,
    pub sgst_rate_bps: u32,
    pub cgst_rate_bps: u32,
    pub sgst_amount_cents: i64,
    pub cgst_amount_cents: i64,
    pub total_with_tax_cents: i64,
}

/// Everything the invoice page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    pub invoice_number: String,
    pub invoice_date: String,
    pub due_date: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: InvoiceAddress,
    pub payment_method: String,
    pub items: Vec<InvoiceItem>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    /// Fields that fell back to a default. Not sent to clients.
    #[serde(skip)]
    pub degraded_fields: Vec<String>,
}

impl InvoiceView {
    pub fn is_degraded(&self) -> bool {
        !self.degraded_fields.is_empty()
    }
}

// =============================================================================
// Derived Field Helper
// =============================================================================

/// A derived field: either computed from the order or its documented default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derived<T> {
    Exact(T),
    Fallback(T),
}

impl<T> Derived<T> {
    /// Uses `value` when present, otherwise `fallback()`.
    pub fn or_else(value: Option<T>, fallback: impl FnOnce() -> T) -> Self {
        match value {
            Some(v) => Derived::Exact(v),
            None => Derived::Fallback(fallback()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Derived::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Derived::Exact(v) | Derived::Fallback(v) => v,
        }
    }

    /// Unwraps the value, noting `field` in `degraded` if it fell back.
    pub fn record(self, field: impl Into<String>, degraded: &mut Vec<String>) -> T {
        if self.is_fallback() {
            degraded.push(field.into());
        }
        self.into_inner()
    }
}

fn text_or_na(value: Option<&str>) -> Derived<String> {
    Derived::or_else(
        value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string),
        || NOT_AVAILABLE.to_string(),
    )
}

// =============================================================================
// Field Derivations
// =============================================================================

/// `INV-` followed by the last eight characters of the order ID, uppercased.
pub fn invoice_number(order_id: &str) -> Derived<String> {
    let id = order_id.trim();
    let suffix = (!id.is_empty()).then(|| {
        let chars: Vec<char> = id.chars().collect();
        let start = chars.len().saturating_sub(8);
        chars[start..].iter().collect::<String>().to_uppercase()
    });

    Derived::or_else(suffix.map(|s| format!("INV-{}", s)), || {
        UNKNOWN_INVOICE_NUMBER.to_string()
    })
}

/// Long US-style date, e.g. `January 5, 2026`.
pub fn long_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

fn invoice_dates(created_at: Option<DateTime<Utc>>) -> (Derived<String>, Derived<String>) {
    let issued = created_at.map(long_date);
    let due = created_at
        .and_then(|at| at.checked_add_signed(Duration::days(INVOICE_DUE_DAYS)))
        .map(long_date);

    (
        Derived::or_else(issued, || NOT_AVAILABLE.to_string()),
        Derived::or_else(due, || NOT_AVAILABLE.to_string()),
    )
}

fn project_item(index: usize, item: &OrderItem, degraded: &mut Vec<String>) -> InvoiceItem {
    let priced = &item.priced;
    let summary = item.product.as_ref();

    let product_name = Derived::or_else(
        summary
            .map(|p| p.title.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        || DELETED_PRODUCT_NAME.to_string(),
    )
    .record(format!("items[{}].productName", index), degraded);

    let product_category = text_or_na(summary.map(|p| p.category.as_str()))
        .record(format!("items[{}].productCategory", index), degraded);

    InvoiceItem {
        product_name,
        product_category,
        quantity: priced.qty,
        price_cents: priced.unit_price_cents,
        total_cents: priced.line_total().cents(),
        sgst_rate_bps: priced.sgst_rate_bps,
        cgst_rate_bps: priced.cgst_rate_bps,
        sgst_amount_cents: priced.sgst_amount_cents,
        cgst_amount_cents: priced.cgst_amount_cents,
        total_with_tax_cents: priced.total_with_tax().cents(),
    }
}

// =============================================================================
// Projection
// =============================================================================

/// Builds the invoice for `order` as seen by `requester`.
///
/// ## Errors
/// - `Forbidden` when the requester does not own the order
/// - `MissingInvoiceData` for legacy orders without shipping or payment data
pub fn project_invoice(order: &Order, requester: &Requester) -> CoreResult<InvoiceView> {
    if order.user_id != requester.user_id {
        return Err(CoreError::Forbidden);
    }

    let (Some(address), Some(payment)) = (&order.shipping_address, &order.payment_details)
    else {
        return Err(CoreError::MissingInvoiceData {
            order_id: order.id.clone(),
        });
    };

    let mut degraded = Vec::new();

    let invoice_number = invoice_number(&order.id).record("invoiceNumber", &mut degraded);
    let (issued, due) = invoice_dates(order.created_at);
    let invoice_date = issued.record("invoiceDate", &mut degraded);
    let due_date = due.record("dueDate", &mut degraded);

    let shipping_address = InvoiceAddress {
        full_name: text_or_na(Some(address.full_name.as_str()))
            .record("shippingAddress.fullName", &mut degraded),
        address: text_or_na(Some(address.address.as_str()))
            .record("shippingAddress.address", &mut degraded),
        city: text_or_na(Some(address.city.as_str())).record("shippingAddress.city", &mut degraded),
        postal_code: text_or_na(Some(address.postal_code.as_str()))
            .record("shippingAddress.postalCode", &mut degraded),
    };

    let customer_email =
        text_or_na(requester.email.as_deref()).record("customerEmail", &mut degraded);

    let items = order
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| project_item(i, item, &mut degraded))
        .collect();

    Ok(InvoiceView {
        invoice_number,
        invoice_date,
        due_date,
        order_number: order.id.clone(),
        status: order.status,
        customer_name: shipping_address.full_name.clone(),
        customer_email,
        shipping_address,
        payment_method: payment.method.label(),
        items,
        totals: order.totals,
        degraded_fields: degraded,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
