//! # Order Pricing Engine
//!
//! Turns a client's cart into frozen, taxed line items and order totals.
//! The client never supplies prices; every amount comes from the catalog.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  [{product, qty}, ...]                                                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  validate lines (non-empty, ≤ 100 lines, 1 ≤ qty ≤ 999)                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  resolve each product ──► ProductNotFound / InsufficientStock           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  snapshot price + SGST/CGST rates                                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  per line: line_total, sgst_amount, cgst_amount (rounded per line)      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  OrderTotals { subtotal, shipping, sgst, cgst, tax, total }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is only *checked* here. The database layer re-checks it with a
//! conditional decrement inside the checkout transaction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartLineRequest, OrderTotals, PricedLineItem, Product};
use crate::validation::{validate_cart_size, validate_quantity, validate_shipping_cost_cents};

// =============================================================================
// Product Lookup
// =============================================================================

/// Read access to the catalog, keyed by product ID.
///
/// The checkout transaction implements this over rows it has just read; tests
/// use a plain `HashMap`.
pub trait ProductLookup {
    fn find_product(&self, id: &str) -> Option<&Product>;
}

impl ProductLookup for HashMap<String, Product> {
    fn find_product(&self, id: &str) -> Option<&Product> {
        self.get(id)
    }
}

impl ProductLookup for [Product] {
    fn find_product(&self, id: &str) -> Option<&Product> {
        self.iter().find(|p| p.id == id)
    }
}

impl ProductLookup for Vec<Product> {
    fn find_product(&self, id: &str) -> Option<&Product> {
        self.as_slice().find_product(id)
    }
}

// =============================================================================
// Priced Order
// =============================================================================

/// Output of [`price_order`], ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    /// Same order as the input lines.
    pub items: Vec<PricedLineItem>,
    pub totals: OrderTotals,
}

impl PricedOrder {
    /// Total units requested per product, summed over duplicate lines.
    pub fn quantities_by_product(&self) -> Vec<(&str, i64)> {
        let mut out: Vec<(&str, i64)> = Vec::new();
        for item in &self.items {
            match out.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, qty)) => *qty += item.qty,
                None => out.push((item.product_id.as_str(), item.qty)),
            }
        }
        out
    }
}

/// Prices a cart against the catalog.
///
/// ## Errors
/// - `EmptyCart` when `lines` is empty
/// - `Validation` for bad quantities, too many lines, negative shipping,
///   or amounts too large to represent
/// - `ProductNotFound` for an unknown product ID
/// - `InsufficientStock` when the requested units (summed across duplicate
///   lines) exceed the product's stock
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use chrono::Utc;
/// use culturaft_core::money::Money;
/// use culturaft_core::pricing::price_order;
/// use culturaft_core::types::{CartLineRequest, Product};
///
/// let product = Product {
///     id: "p1".into(),
///     title: "Kantha Throw".into(),
///     description: None,
///     category: "Textiles".into(),
///     price_cents: 8500,
///     stock: 10,
///     sgst_rate_bps: 250,
///     cgst_rate_bps: 250,
///     featured: false,
///     images: vec![],
///     origin: None,
///     artisan_story: None,
///     materials_care: None,
///     shipping_returns: None,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
/// let catalog = HashMap::from([(product.id.clone(), product)]);
/// let lines = [CartLineRequest { product: "p1".into(), qty: 2 }];
///
/// let priced = price_order(&lines, &catalog, Money::from_cents(1200)).unwrap();
/// assert_eq!(priced.totals.total_cents, 19050);
/// ```
pub fn price_order<C>(
    lines: &[CartLineRequest],
    catalog: &C,
    shipping_cost: Money,
) -> CoreResult<PricedOrder>
where
    C: ProductLookup + ?Sized,
{
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    validate_cart_size(lines.len())?;
    validate_shipping_cost_cents(shipping_cost.cents())?;

    let mut requested: HashMap<&str, i64> = HashMap::new();
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        validate_quantity(line.qty)?;

        let product = catalog
            .find_product(&line.product)
            .ok_or_else(|| CoreError::ProductNotFound(line.product.clone()))?;

        let wanted = requested.entry(product.id.as_str()).or_insert(0);
        *wanted += line.qty;
        if !product.has_stock_for(*wanted) {
            return Err(CoreError::InsufficientStock {
                product: product.title.clone(),
                available: product.stock,
                requested: *wanted,
            });
        }

        items.push(price_line(product, line.qty)?);
    }

    let totals = summarize(&items, shipping_cost)?;

    Ok(PricedOrder { items, totals })
}

/// Prices one line from a product snapshot.
///
/// Fails with `Validation` when `price × qty` or its tax overflows.
pub fn price_line(product: &Product, qty: i64) -> CoreResult<PricedLineItem> {
    let line_total = product
        .price()
        .checked_mul(qty)
        .ok_or_else(|| too_large("lineTotalCents"))?;
    let sgst = line_total
        .calculate_tax(product.sgst_rate())
        .ok_or_else(|| too_large("sgstAmountCents"))?;
    let cgst = line_total
        .calculate_tax(product.cgst_rate())
        .ok_or_else(|| too_large("cgstAmountCents"))?;

    Ok(PricedLineItem {
        product_id: product.id.clone(),
        qty,
        unit_price_cents: product.price_cents,
        sgst_rate_bps: product.sgst_rate_bps,
        cgst_rate_bps: product.cgst_rate_bps,
        sgst_amount_cents: sgst.cents(),
        cgst_amount_cents: cgst.cents(),
    })
}

/// Aggregates already-rounded line amounts into order totals.
pub fn summarize(items: &[PricedLineItem], shipping_cost: Money) -> CoreResult<OrderTotals> {
    let mut subtotal = Money::zero();
    let mut sgst_total = Money::zero();
    let mut cgst_total = Money::zero();

    for item in items {
        let line_total = item
            .unit_price()
            .checked_mul(item.qty)
            .ok_or_else(|| too_large("lineTotalCents"))?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or_else(|| too_large("subtotalCents"))?;
        sgst_total = sgst_total
            .checked_add(item.sgst_amount())
            .ok_or_else(|| too_large("sgstTotalCents"))?;
        cgst_total = cgst_total
            .checked_add(item.cgst_amount())
            .ok_or_else(|| too_large("cgstTotalCents"))?;
    }

    let total_tax = sgst_total
        .checked_add(cgst_total)
        .ok_or_else(|| too_large("totalTaxCents"))?;
    let total = subtotal
        .checked_add(shipping_cost)
        .and_then(|sum| sum.checked_add(total_tax))
        .ok_or_else(|| too_large("totalCents"))?;

    Ok(OrderTotals {
        subtotal_cents: subtotal.cents(),
        shipping_cost_cents: shipping_cost.cents(),
        sgst_total_cents: sgst_total.cents(),
        cgst_total_cents: cgst_total.cents(),
        total_tax_cents: total_tax.cents(),
        total_cents: total.cents(),
    })
}

fn too_large(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Shipping Policy
// =============================================================================

/// Shipping fee applied when the checkout request does not carry one.
///
/// Orders strictly above `free_threshold` ship free; everything else pays
/// `flat_fee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub free_threshold: Money,
    pub flat_fee: Money,
}

impl ShippingPolicy {
    pub const DEFAULT_FREE_THRESHOLD_CENTS: i64 = 15_000;
    pub const DEFAULT_FLAT_FEE_CENTS: i64 = 1_200;

    pub fn new(free_threshold: Money, flat_fee: Money) -> Self {
        Self {
            free_threshold,
            flat_fee,
        }
    }

    pub fn quote(&self, subtotal: Money) -> Money {
        if subtotal > self.free_threshold {
            Money::zero()
        } else {
            self.flat_fee
        }
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self::new(
            Money::from_cents(Self::DEFAULT_FREE_THRESHOLD_CENTS),
            Money::from_cents(Self::DEFAULT_FLAT_FEE_CENTS),
        )
    }
}

/// How the shipping cost of a checkout is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingCharge {
    /// The caller quoted a cost; it is used as-is.
    Fixed(Money),
    /// Quote from the policy once the subtotal is known.
    Policy(ShippingPolicy),
}

impl ShippingCharge {
    pub fn resolve(&self, subtotal: Money) -> Money {
        match self {
            ShippingCharge::Fixed(cost) => *cost,
            ShippingCharge::Policy(policy) => policy.quote(subtotal),
        }
    }
}

/// [`price_order`] with the shipping cost decided by `charge`.
pub fn price_order_with<C>(
    lines: &[CartLineRequest],
    catalog: &C,
    charge: ShippingCharge,
) -> CoreResult<PricedOrder>
where
    C: ProductLookup + ?Sized,
{
    let mut priced = price_order(lines, catalog, Money::zero())?;
    let shipping = charge.resolve(priced.totals.subtotal());
    validate_shipping_cost_cents(shipping.cents())?;
    priced.totals = summarize(&priced.items, shipping)?;
    Ok(priced)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, title: &str, price: i64, stock: i64, sgst: u32, cgst: u32) -> Product {
        Product {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            category: "Textiles".to_string(),
            price_cents: price,
            stock,
            sgst_rate_bps: sgst,
            cgst_rate_bps: cgst,
            featured: false,
            images: vec![],
            origin: None,
            artisan_story: None,
            materials_care: None,
            shipping_returns: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    fn line(product: &str, qty: i64) -> CartLineRequest {
        CartLineRequest {
            product: product.to_string(),
            qty,
        }
    }

    #[test]
    fn test_single_line_scenario() {
        let catalog = catalog(vec![product("a", "Kantha Throw", 8500, 10, 250, 250)]);

        let priced = price_order(&[line("a", 2)], &catalog, Money::from_cents(1200)).unwrap();

        assert_eq!(priced.items.len(), 1);
        let item = &priced.items[0];
        assert_eq!(item.unit_price_cents, 8500);
        assert_eq!(item.sgst_amount_cents, 425);
        assert_eq!(item.cgst_amount_cents, 425);

        let t = priced.totals;
        assert_eq!(t.subtotal_cents, 17000);
        assert_eq!(t.shipping_cost_cents, 1200);
        assert_eq!(t.sgst_total_cents, 425);
        assert_eq!(t.cgst_total_cents, 425);
        assert_eq!(t.total_tax_cents, 850);
        assert_eq!(t.total_cents, 19050);
    }

    #[test]
    fn test_totals_invariants_hold_across_lines() {
        let catalog = catalog(vec![
            product("a", "Kantha Throw", 1010, 50, 250, 250),
            product("b", "Brass Diya", 1030, 50, 600, 600),
            product("c", "Jute Bag", 499, 50, 0, 0),
        ]);
        let lines = [line("a", 1), line("b", 3), line("c", 7)];

        let priced = price_order(&lines, &catalog, Money::zero()).unwrap();
        let t = priced.totals;

        assert_eq!(t.total_tax_cents, t.sgst_total_cents + t.cgst_total_cents);
        assert_eq!(
            t.total_cents,
            t.subtotal_cents + t.shipping_cost_cents + t.total_tax_cents
        );
        // rounding happens per line: 1010 @ 2.5% = 25.25 → 25
        assert_eq!(priced.items[0].sgst_amount_cents, 25);
        // 3090 @ 6% = 185.4 → 185
        assert_eq!(priced.items[1].sgst_amount_cents, 185);
        assert_eq!(priced.items[2].sgst_amount_cents, 0);
        // line order is preserved
        let ids: Vec<_> = priced.items.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insufficient_stock_names_product() {
        let catalog = catalog(vec![product("a", "Kantha Throw", 8500, 10, 250, 250)]);

        let err = price_order(&[line("a", 11)], &catalog, Money::zero()).unwrap_err();

        match err {
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                assert_eq!(product, "Kantha Throw");
                assert_eq!(available, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_lines_count_against_stock_together() {
        let catalog = catalog(vec![product("a", "Kantha Throw", 8500, 10, 250, 250)]);

        let err = price_order(&[line("a", 6), line("a", 5)], &catalog, Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { requested: 11, .. }));

        let priced = price_order(&[line("a", 6), line("a", 4)], &catalog, Money::zero()).unwrap();
        assert_eq!(priced.quantities_by_product(), vec![("a", 10)]);
    }

    #[test]
    fn test_unknown_product() {
        let catalog = catalog(vec![]);
        let err = price_order(&[line("ghost", 1)], &catalog, Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_empty_cart_and_bad_quantity() {
        let catalog = catalog(vec![product("a", "Kantha Throw", 8500, 10, 250, 250)]);

        assert!(matches!(
            price_order(&[], &catalog, Money::zero()),
            Err(CoreError::EmptyCart)
        ));
        assert!(matches!(
            price_order(&[line("a", 0)], &catalog, Money::zero()),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            price_order(&[line("a", 1)], &catalog, Money::from_cents(-1)),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_rates_are_frozen_on_the_line() {
        let mut catalog = catalog(vec![product("a", "Kantha Throw", 8500, 10, 250, 250)]);
        let priced = price_order(&[line("a", 2)], &catalog, Money::zero()).unwrap();

        if let Some(p) = catalog.get_mut("a") {
            p.sgst_rate_bps = 900;
            p.price_cents = 9900;
        }

        let item = &priced.items[0];
        assert_eq!(item.sgst_rate_bps, 250);
        assert_eq!(item.unit_price_cents, 8500);
        assert_eq!(item.sgst_amount_cents, 425);
    }

    #[test]
    fn test_slice_lookup() {
        let products = vec![product("a", "Kantha Throw", 100, 1, 0, 0)];
        let priced = price_order(&[line("a", 1)], products.as_slice(), Money::zero()).unwrap();
        assert_eq!(priced.totals.total_cents, 100);
    }

    #[test]
    fn test_policy_shipping_is_added_to_total() {
        let catalog = catalog(vec![product("a", "Jute Bag", 4000, 10, 0, 0)]);

        let cheap = price_order_with(
            &[line("a", 1)],
            &catalog,
            ShippingCharge::Policy(ShippingPolicy::default()),
        )
        .unwrap();
        assert_eq!(cheap.totals.shipping_cost_cents, 1200);
        assert_eq!(cheap.totals.total_cents, 5200);

        let free = price_order_with(
            &[line("a", 4)],
            &catalog,
            ShippingCharge::Policy(ShippingPolicy::default()),
        )
        .unwrap();
        assert_eq!(free.totals.shipping_cost_cents, 0);
        assert_eq!(free.totals.total_cents, 16000);

        let fixed = price_order_with(
            &[line("a", 4)],
            &catalog,
            ShippingCharge::Fixed(Money::from_cents(500)),
        )
        .unwrap();
        assert_eq!(fixed.totals.total_cents, 16500);
    }

    #[test]
    fn test_overflowing_line_is_rejected() {
        let catalog = catalog(vec![product("a", "Gold Zari Saree", i64::MAX / 2, 10, 250, 250)]);

        let err = price_order(&[line("a", 3)], &catalog, Money::zero()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "lineTotalCents"
        ));
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        let catalog = catalog(vec![
            product("a", "Gold Zari Saree", i64::MAX / 2, 10, 0, 0),
            product("b", "Silver Anklet", i64::MAX / 2, 10, 0, 0),
        ]);

        let err = price_order(&[line("a", 1), line("b", 1)], &catalog, Money::from_cents(10))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "totalCents"
        ));

        let err = price_order_with(
            &[line("a", 1)],
            &catalog,
            ShippingCharge::Fixed(Money::from_cents(i64::MAX)),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_shipping_charge_resolve() {
        let policy = ShippingCharge::Policy(ShippingPolicy::default());
        assert_eq!(policy.resolve(Money::from_cents(500)).cents(), 1200);
        assert_eq!(policy.resolve(Money::from_cents(15_001)), Money::zero());

        let fixed = ShippingCharge::Fixed(Money::from_cents(300));
        assert_eq!(fixed.resolve(Money::from_cents(99_999)).cents(), 300);
    }

    #[test]
    fn test_shipping_policy() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.quote(Money::from_cents(17000)), Money::zero());
        assert_eq!(policy.quote(Money::from_cents(15000)).cents(), 1200);
        assert_eq!(policy.quote(Money::from_cents(500)).cents(), 1200);
    }
}
