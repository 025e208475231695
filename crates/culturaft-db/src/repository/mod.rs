//! # Repository Module
//!
//! Database repository implementations for Culturaft.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.orders().place_order(&new_order)                           │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── place_order(&self, new_order)   (one transaction)                 │
//! │  ├── get_by_id / list_for_user / list_all                              │
//! │  ├── set_status(&self, id, next)                                       │
//! │  └── delete_legacy(&self)                                              │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD
//! - [`OrderRepository`](order::OrderRepository) - Checkout, listings, status
//! - [`NotificationRepository`](notification::NotificationRepository) - Admin feed

pub mod notification;
pub mod order;
pub mod product;

#[cfg(test)]
pub(crate) mod test_support {
    use culturaft_core::{
        CartLineRequest, Money, PaymentDetails, PaymentMethod, ProductDraft, ShippingAddress,
        ShippingCharge,
    };

    use super::order::NewOrder;
    use crate::{Database, DbConfig};

    /// Fresh in-memory database; `in_memory()` migrates on open.
    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn draft(title: &str, price_cents: i64, stock: i64) -> ProductDraft {
        ProductDraft {
            title: title.to_string(),
            description: Some("Hand-stitched".to_string()),
            category: "Textiles".to_string(),
            price_cents,
            stock,
            sgst_rate_bps: 250,
            cgst_rate_bps: 250,
            featured: false,
            images: vec!["https://cdn.example/kantha.jpg".to_string()],
            origin: None,
            artisan_story: None,
            materials_care: None,
            shipping_returns: None,
        }
    }

    pub fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Asha Rao".to_string(),
            address: "12 MG Road".to_string(),
            city: "Kolkata".to_string(),
            postal_code: "700001".to_string(),
        }
    }

    pub fn card() -> PaymentDetails {
        PaymentDetails {
            method: PaymentMethod::Card,
            card_number: Some("4242 4242 4242 4242".to_string()),
            expiry: Some("12/29".to_string()),
            cvc: Some("123".to_string()),
        }
    }

    /// Single-line order with a fixed ₹12.00 shipping charge.
    pub fn new_order(user_id: &str, product_id: &str, qty: i64) -> NewOrder {
        NewOrder {
            user_id: user_id.to_string(),
            lines: vec![CartLineRequest {
                product: product_id.to_string(),
                qty,
            }],
            shipping_address: address(),
            payment_details: card(),
            shipping: ShippingCharge::Fixed(Money::from_cents(1200)),
        }
    }
}
