//! # Validation Module
//!
//! Input validation for checkout and catalog payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: SPA forms                                                    │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (axum)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field rules, normalisation, card masking             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Conditional stock decrement                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators that normalise their input return the cleaned value, so the
//! caller stores exactly what was checked.
//!
//! ## Usage
//! ```rust
//! use culturaft_core::validation::{validate_quantity, mask_card_number};
//!
//! validate_quantity(2).unwrap();
//! assert_eq!(mask_card_number("4242 4242 4242 4242").unwrap(), "**** **** **** 4242");
//! ```

use crate::error::ValidationError;
use crate::types::{PaymentDetails, PaymentMethod, ProductDraft, ShippingAddress};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Placeholder persisted in place of a supplied CVC.
pub const REDACTED_CVC: &str = "***";

const MAX_TITLE_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 60;
const MAX_ADDRESS_FIELD_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

fn required_trimmed(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a product title.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use culturaft_core::validation::validate_product_title;
///
/// assert!(validate_product_title("Madhubani Wall Panel").is_ok());
/// assert!(validate_product_title("   ").is_err());
/// ```
pub fn validate_product_title(title: &str) -> ValidationResult<String> {
    required_trimmed("title", title, MAX_TITLE_LEN)
}

pub fn validate_category(category: &str) -> ValidationResult<String> {
    required_trimmed("category", category, MAX_CATEGORY_LEN)
}

/// Validates and trims a shipping address. Every field is required.
pub fn validate_shipping_address(address: &ShippingAddress) -> ValidationResult<ShippingAddress> {
    Ok(ShippingAddress {
        full_name: required_trimmed(
            "shippingAddress.fullName",
            &address.full_name,
            MAX_ADDRESS_FIELD_LEN,
        )?,
        address: required_trimmed(
            "shippingAddress.address",
            &address.address,
            MAX_ADDRESS_FIELD_LEN,
        )?,
        city: required_trimmed("shippingAddress.city", &address.city, MAX_ADDRESS_FIELD_LEN)?,
        postal_code: required_trimmed(
            "shippingAddress.postalCode",
            &address.postal_code,
            20,
        )?,
    })
}

// =============================================================================
// Payment Validators
// =============================================================================

/// Masks a card number down to its last four digits.
///
/// Spaces and hyphens are ignored; anything else non-numeric is rejected.
///
/// ## Example
/// ```rust
/// use culturaft_core::validation::mask_card_number;
///
/// assert_eq!(mask_card_number("4242-4242-4242-4242").unwrap(), "**** **** **** 4242");
/// assert!(mask_card_number("4242").is_err());
/// ```
pub fn mask_card_number(raw: &str) -> ValidationResult<String> {
    let field = "paymentDetails.cardNumber";
    let digits: String = raw.chars().filter(|c| *c != ' ' && *c != '-').collect();

    if digits.is_empty() {
        return Err(ValidationError::required(field));
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) || !(12..=19).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be 12 to 19 digits".to_string(),
        });
    }

    let last_four = &digits[digits.len() - 4..];
    Ok(format!("**** **** **** {}", last_four))
}

fn validate_expiry(raw: &str) -> ValidationResult<String> {
    let field = "paymentDetails.expiry";
    let expiry = raw.trim();

    if expiry.is_empty() {
        return Err(ValidationError::required(field));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be MM/YY".to_string(),
    };

    let (month, year) = expiry.split_once('/').ok_or_else(invalid)?;
    let month: u32 = month.trim().parse().map_err(|_| invalid())?;
    let year = year.trim();

    if !(1..=12).contains(&month) || year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    Ok(format!("{:02}/{}", month, year))
}

fn validate_cvc(raw: &str) -> ValidationResult<()> {
    let field = "paymentDetails.cvc";
    let cvc = raw.trim();

    if cvc.is_empty() {
        return Err(ValidationError::required(field));
    }

    if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be 3 or 4 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates payment details and returns the form safe to persist.
///
/// ## Rules
/// - `card`: number, expiry and CVC are all required; the number is masked
///   and the CVC is replaced by `***`
/// - `paypal`: card fields are dropped
///
/// ## Example
/// ```rust
/// use culturaft_core::types::{PaymentDetails, PaymentMethod};
/// use culturaft_core::validation::validate_payment_details;
///
/// let stored = validate_payment_details(&PaymentDetails {
///     method: PaymentMethod::Card,
///     card_number: Some("4111 1111 1111 1111".into()),
///     expiry: Some("09/28".into()),
///     cvc: Some("123".into()),
/// })
/// .unwrap();
///
/// assert_eq!(stored.card_number.as_deref(), Some("**** **** **** 1111"));
/// assert_eq!(stored.cvc.as_deref(), Some("***"));
/// ```
pub fn validate_payment_details(details: &PaymentDetails) -> ValidationResult<PaymentDetails> {
    match details.method {
        PaymentMethod::Paypal => Ok(PaymentDetails {
            method: PaymentMethod::Paypal,
            card_number: None,
            expiry: None,
            cvc: None,
        }),
        PaymentMethod::Card => {
            let card_number = mask_card_number(details.card_number.as_deref().unwrap_or(""))?;
            let expiry = validate_expiry(details.expiry.as_deref().unwrap_or(""))?;
            validate_cvc(details.cvc.as_deref().unwrap_or(""))?;

            Ok(PaymentDetails {
                method: PaymentMethod::Card,
                card_number: Some(card_number),
                expiry: Some(expiry),
                cvc: Some(REDACTED_CVC.to_string()),
            })
        }
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout                                                               │
/// │                                                                         │
/// │  Cart line: { product: "…", qty: 5 }                                   │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0?   → Error: "quantity must be positive"             │
/// │       ├── qty > 999?  → Error: "quantity must be between 1 and 999"    │
/// │       └── OK → price_order                                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units. Zero is allowed, up to
/// [`MAX_PRICE_CENTS`].
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "priceCents".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
/// - GST halves are usually 0-1400 (0% to 14%)
pub fn validate_tax_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

pub fn validate_shipping_cost_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "shippingCostCents".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a checkout.
///
/// ## Rules
/// - At least one line
/// - Must not exceed MAX_CART_ITEMS (100)
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::required("items"));
    }

    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates a catalog payload and returns it trimmed.
pub fn validate_product_draft(draft: &ProductDraft) -> ValidationResult<ProductDraft> {
    let title = validate_product_title(&draft.title)?;
    let category = validate_category(&draft.category)?;
    validate_price_cents(draft.price_cents)?;
    validate_stock(draft.stock)?;
    validate_tax_rate_bps("sgstRateBps", draft.sgst_rate_bps)?;
    validate_tax_rate_bps("cgstRateBps", draft.cgst_rate_bps)?;

    let non_blank = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Ok(ProductDraft {
        title,
        description: non_blank(&draft.description),
        category,
        price_cents: draft.price_cents,
        stock: draft.stock,
        sgst_rate_bps: draft.sgst_rate_bps,
        cgst_rate_bps: draft.cgst_rate_bps,
        featured: draft.featured,
        images: draft
            .images
            .iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect(),
        origin: non_blank(&draft.origin),
        artisan_story: non_blank(&draft.artisan_story),
        materials_care: non_blank(&draft.materials_care),
        shipping_returns: non_blank(&draft.shipping_returns),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "  Asha Rao ".to_string(),
            address: "12 Lake Road".to_string(),
            city: "Pune".to_string(),
            postal_code: "411001".to_string(),
        }
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            title: " Kantha Throw ".to_string(),
            description: Some("   ".to_string()),
            category: "Textiles".to_string(),
            price_cents: 8500,
            stock: 10,
            sgst_rate_bps: 250,
            cgst_rate_bps: 250,
            featured: false,
            images: vec![" https://cdn.example/a.jpg ".to_string(), "".to_string()],
            origin: Some("Bengal".to_string()),
            artisan_story: None,
            materials_care: None,
            shipping_returns: None,
        }
    }

    #[test]
    fn test_validate_product_title() {
        assert_eq!(validate_product_title(" Brass Diya ").unwrap(), "Brass Diya");
        assert!(validate_product_title("").is_err());
        assert!(validate_product_title(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_ok());
        assert!(validate_cart_size(0).is_err());
        assert!(validate_cart_size(MAX_CART_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_shipping_address() {
        let cleaned = validate_shipping_address(&address()).unwrap();
        assert_eq!(cleaned.full_name, "Asha Rao");

        let mut missing_city = address();
        missing_city.city = "  ".to_string();
        let err = validate_shipping_address(&missing_city).unwrap_err();
        assert_eq!(err.to_string(), "shippingAddress.city is required");
    }

    #[test]
    fn test_mask_card_number() {
        assert_eq!(
            mask_card_number("4242 4242 4242 4242").unwrap(),
            "**** **** **** 4242"
        );
        assert!(mask_card_number("").is_err());
        assert!(mask_card_number("4242 abcd 4242 4242").is_err());
        assert!(mask_card_number("1234").is_err());
    }

    #[test]
    fn test_card_payment_is_redacted() {
        let stored = validate_payment_details(&PaymentDetails {
            method: PaymentMethod::Card,
            card_number: Some("5555555555554444".to_string()),
            expiry: Some("3/27".to_string()),
            cvc: Some("321".to_string()),
        })
        .unwrap();

        assert_eq!(stored.card_number.as_deref(), Some("**** **** **** 4444"));
        assert_eq!(stored.expiry.as_deref(), Some("03/27"));
        assert_eq!(stored.cvc.as_deref(), Some(REDACTED_CVC));
    }

    #[test]
    fn test_card_payment_requires_fields() {
        let err = validate_payment_details(&PaymentDetails {
            method: PaymentMethod::Card,
            card_number: Some("5555555555554444".to_string()),
            expiry: Some("13/27".to_string()),
            cvc: Some("321".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));

        let err = validate_payment_details(&PaymentDetails {
            method: PaymentMethod::Card,
            card_number: Some("5555555555554444".to_string()),
            expiry: Some("03/27".to_string()),
            cvc: None,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "paymentDetails.cvc is required");
    }

    #[test]
    fn test_paypal_drops_card_fields() {
        let stored = validate_payment_details(&PaymentDetails {
            method: PaymentMethod::Paypal,
            card_number: Some("4242424242424242".to_string()),
            expiry: None,
            cvc: Some("123".to_string()),
        })
        .unwrap();

        assert_eq!(stored.card_number, None);
        assert_eq!(stored.cvc, None);
    }

    #[test]
    fn test_validate_product_draft() {
        let cleaned = validate_product_draft(&draft()).unwrap();
        assert_eq!(cleaned.title, "Kantha Throw");
        assert_eq!(cleaned.description, None);
        assert_eq!(cleaned.images, vec!["https://cdn.example/a.jpg".to_string()]);

        let mut bad = draft();
        bad.price_cents = -1;
        assert!(validate_product_draft(&bad).is_err());

        let mut bad = draft();
        bad.cgst_rate_bps = 10_001;
        assert!(validate_product_draft(&bad).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());

        assert!(validate_price_cents(-1).is_err());
        let err = validate_price_cents(i64::MAX / 2).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange { max: MAX_PRICE_CENTS, .. }
        ));
    }

    #[test]
    fn test_product_story_fields_are_trimmed() {
        let mut story = draft();
        story.artisan_story = Some("  Stitched by the Sonar family  ".to_string());
        story.materials_care = Some("   ".to_string());
        story.shipping_returns = None;

        let cleaned = validate_product_draft(&story).unwrap();
        assert_eq!(cleaned.artisan_story.as_deref(), Some("Stitched by the Sonar family"));
        assert_eq!(cleaned.materials_care, None);
        assert_eq!(cleaned.shipping_returns, None);
    }
}
