//! # Order Repository
//!
//! Checkout, order listings and status changes.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │             SINGLE IMMEDIATE TRANSACTION (place_order)                  │
//! │                                                                         │
//! │  0. BEGIN IMMEDIATE (take the write lock, wait up to busy_timeout)      │
//! │  1. SELECT products for every cart line                                 │
//! │  2. price_order_with(lines, catalog, shipping)   ← culturaft-core       │
//! │  3. UPDATE products SET stock = stock - ?qty                            │
//! │       WHERE id = ? AND stock >= ?qty                                    │
//! │       └── 0 rows? → ROLLBACK, InsufficientStock                         │
//! │  4. INSERT orders, INSERT order_items (position-ordered)                │
//! │  5. SAVEPOINT                                                           │
//! │       INSERT notifications (new_order)                                  │
//! │       └── failed? → ROLLBACK TO SAVEPOINT, warn, keep going             │
//! │  6. COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkouts take SQLite's write lock before reading, so they run one after
//! another: a deferred transaction would fail with "database is locked" when
//! upgrading its read to a write after another checkout committed. The
//! conditional decrement in step 3 still refuses to take stock below zero.
//!
//! ## Status Changes
//! `set_status` checks the transition table, then writes with
//! `WHERE status = ?from` so two admins cannot both advance the same state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::notification::NotificationRepository;
use crate::repository::product::{ProductRow, PRODUCT_COLUMNS};
use culturaft_core::validation::{validate_payment_details, validate_shipping_address};
use culturaft_core::{
    price_order_with, CartLineRequest, CoreError, NotificationDraft, Order, OrderItem, OrderStatus,
    OrderTotals, PaymentDetails, PaymentMethod, PricedLineItem, Product, ProductSummary,
    ShippingAddress, ShippingCharge, Transition,
};

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// Everything checkout needs from the caller.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub lines: Vec<CartLineRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_details: PaymentDetails,
    pub shipping: ShippingCharge,
}

/// Result of [`OrderRepository::set_status`].
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub order: Order,
    pub transition: Transition,
}

// =============================================================================
// Rows
// =============================================================================

const ORDER_COLUMNS: &str = r#"
    id, user_id, status,
    shipping_full_name, shipping_address, shipping_city, shipping_postal_code,
    payment_method, payment_card_number, payment_expiry, payment_cvc,
    subtotal_cents, shipping_cost_cents, sgst_total_cents, cgst_total_cents,
    total_tax_cents, total_cents,
    created_at, updated_at
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    status: OrderStatus,
    shipping_full_name: Option<String>,
    shipping_address: Option<String>,
    shipping_city: Option<String>,
    shipping_postal_code: Option<String>,
    payment_method: Option<PaymentMethod>,
    payment_card_number: Option<String>,
    payment_expiry: Option<String>,
    payment_cvc: Option<String>,
    subtotal_cents: i64,
    shipping_cost_cents: i64,
    sgst_total_cents: i64,
    cgst_total_cents: i64,
    total_tax_cents: i64,
    total_cents: i64,
    created_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn shipping(&self) -> Option<ShippingAddress> {
        let parts = [
            &self.shipping_full_name,
            &self.shipping_address,
            &self.shipping_city,
            &self.shipping_postal_code,
        ];
        if parts.iter().all(|p| p.is_none()) {
            return None;
        }

        Some(ShippingAddress {
            full_name: self.shipping_full_name.clone().unwrap_or_default(),
            address: self.shipping_address.clone().unwrap_or_default(),
            city: self.shipping_city.clone().unwrap_or_default(),
            postal_code: self.shipping_postal_code.clone().unwrap_or_default(),
        })
    }

    fn payment(&self) -> Option<PaymentDetails> {
        self.payment_method.map(|method| PaymentDetails {
            method,
            card_number: self.payment_card_number.clone(),
            expiry: self.payment_expiry.clone(),
            cvc: self.payment_cvc.clone(),
        })
    }

    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            shipping_address: self.shipping(),
            payment_details: self.payment(),
            totals: OrderTotals {
                subtotal_cents: self.subtotal_cents,
                shipping_cost_cents: self.shipping_cost_cents,
                sgst_total_cents: self.sgst_total_cents,
                cgst_total_cents: self.cgst_total_cents,
                total_tax_cents: self.total_tax_cents,
                total_cents: self.total_cents,
            },
            id: self.id,
            user_id: self.user_id,
            items,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// An `order_items` row joined with whatever is left of the product.
#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderItemRow {
    product_id: String,
    qty: i64,
    unit_price_cents: i64,
    sgst_rate_bps: i64,
    cgst_rate_bps: i64,
    sgst_amount_cents: i64,
    cgst_amount_cents: i64,
    product_title: Option<String>,
    product_category: Option<String>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DbError;

    fn try_from(row: OrderItemRow) -> DbResult<Self> {
        let sgst_rate_bps = u32::try_from(row.sgst_rate_bps)
            .map_err(|e| DbError::corrupt("order_items.sgst_rate_bps", &row.product_id, e))?;
        let cgst_rate_bps = u32::try_from(row.cgst_rate_bps)
            .map_err(|e| DbError::corrupt("order_items.cgst_rate_bps", &row.product_id, e))?;

        let product = match (row.product_title, row.product_category) {
            (Some(title), Some(category)) => Some(ProductSummary { title, category }),
            _ => None,
        };

        Ok(OrderItem {
            priced: PricedLineItem {
                product_id: row.product_id,
                qty: row.qty,
                unit_price_cents: row.unit_price_cents,
                sgst_rate_bps,
                cgst_rate_bps,
                sgst_amount_cents: row.sgst_amount_cents,
                cgst_amount_cents: row.cgst_amount_cents,
            },
            product,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders and checkout.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Places an order atomically.
    ///
    /// ## Errors
    /// - `DbError::Core(Validation | EmptyCart)` for bad input
    /// - `DbError::Core(ProductNotFound)` for unknown products
    /// - `DbError::Core(InsufficientStock)` when stock runs out, even if it
    ///   ran out between pricing and the decrement
    ///
    /// On any error nothing is written: no stock change, no order, no
    /// notification.
    pub async fn place_order(&self, new_order: &NewOrder) -> DbResult<Order> {
        let shipping_address = validate_shipping_address(&new_order.shipping_address)
            .map_err(CoreError::from)?;
        let payment_details =
            validate_payment_details(&new_order.payment_details).map_err(CoreError::from)?;

        debug!(
            user_id = %new_order.user_id,
            lines = new_order.lines.len(),
            "Placing order"
        );

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let catalog = load_catalog(&mut tx, &new_order.lines).await?;
        let priced = price_order_with(&new_order.lines, &catalog, new_order.shipping)?;

        for (product_id, qty) in priced.quantities_by_product() {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(product_id)
            .bind(qty)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let err = stock_shortfall(&mut tx, &catalog, product_id, qty).await?;
                tx.rollback().await?;
                warn!(product_id = %product_id, requested = qty, "Stock ran out during checkout");
                return Err(err.into());
            }
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();

        let items: Vec<OrderItem> = priced
            .items
            .into_iter()
            .map(|priced| {
                let product = catalog.get(&priced.product_id).map(|p| ProductSummary {
                    title: p.title.clone(),
                    category: p.category.clone(),
                });
                OrderItem { priced, product }
            })
            .collect();

        let order = Order {
            id: order_id,
            user_id: new_order.user_id.clone(),
            items,
            shipping_address: Some(shipping_address),
            payment_details: Some(payment_details),
            status: OrderStatus::Pending,
            totals: priced.totals,
            created_at: Some(now),
            updated_at: now,
        };

        insert_order(&mut tx, &order).await?;

        // The notification may fail on its own; the order must not.
        let mut savepoint = Connection::begin(&mut *tx).await?;
        match NotificationRepository::emit_on(&mut savepoint, &NotificationDraft::new_order(&order))
            .await
        {
            Ok(_) => savepoint.commit().await?,
            Err(err) => {
                warn!(order_id = %order.id, error = %err, "Failed to record new_order notification");
                savepoint.rollback().await?;
            }
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total_cents = order.totals.total_cents,
            "Order placed"
        );

        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets an order by ID, including its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        debug!(id = %id, "Getting order by ID");

        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// A customer's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        debug!(user_id = %user_id, "Listing orders for user");

        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate_all(rows).await
    }

    /// Every order, newest first (admin).
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        debug!("Listing all orders");

        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, rowid DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate_all(rows).await
    }

    async fn hydrate_all(&self, rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.hydrate(row).await?);
        }
        Ok(orders)
    }

    async fn hydrate(&self, row: OrderRow) -> DbResult<Order> {
        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT
                i.product_id,
                i.qty,
                i.unit_price_cents,
                i.sgst_rate_bps,
                i.cgst_rate_bps,
                i.sgst_amount_cents,
                i.cgst_amount_cents,
                p.title AS product_title,
                p.category AS product_category
            FROM order_items i
            LEFT JOIN products p ON p.id = i.product_id
            WHERE i.order_id = ?1
            ORDER BY i.position
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<DbResult<Vec<_>>>()?;

        Ok(row.into_order(items))
    }

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------

    /// Moves an order along the status table.
    ///
    /// Re-applying the current status succeeds without writing or notifying.
    /// A successful change emits an `order_status` notification; a failure to
    /// record it is logged only.
    pub async fn set_status(&self, id: &str, next: OrderStatus) -> DbResult<StatusUpdate> {
        let order = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;

        let transition = order.status.transition_to(next)?;

        let Transition::Advanced { from, to } = transition else {
            debug!(id = %id, status = %next, "Status unchanged");
            return Ok(StatusUpdate { order, transition });
        };

        let result = sqlx::query(
            r#"
            UPDATE orders SET status = ?3, updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Someone else changed the status since we read it.
            let current = self
                .get_by_id(id)
                .await?
                .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;

            if current.status == to {
                return Ok(StatusUpdate {
                    order: current,
                    transition: Transition::Unchanged(to),
                });
            }
            return Err(CoreError::InvalidStatusTransition {
                from: current.status.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        let order = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;

        info!(order_id = %id, from = %from, to = %to, "Order status changed");

        let notifications = NotificationRepository::new(self.pool.clone());
        if let Err(err) = notifications
            .emit(&NotificationDraft::order_status(&order))
            .await
        {
            warn!(order_id = %id, error = %err, "Failed to record order_status notification");
        }

        Ok(StatusUpdate { order, transition })
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Deletes orders written before shipping and payment were captured.
    ///
    /// Their items go with them (cascade). Returns how many orders were removed.
    pub async fn delete_legacy(&self) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM orders
            WHERE shipping_full_name IS NULL OR payment_method IS NULL
            "#,
        )
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected();
        info!(removed = removed, "Removed legacy orders");
        Ok(removed)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Reads every product a cart mentions, inside the checkout transaction.
async fn load_catalog(
    conn: &mut SqliteConnection,
    lines: &[CartLineRequest],
) -> DbResult<HashMap<String, Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let mut catalog = HashMap::new();

    for line in lines {
        if catalog.contains_key(&line.product) {
            continue;
        }

        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&line.product)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(row) = row {
            let product = Product::try_from(row)?;
            catalog.insert(product.id.clone(), product);
        }
    }

    Ok(catalog)
}

/// Builds the error for a conditional decrement that matched no row.
async fn stock_shortfall(
    conn: &mut SqliteConnection,
    catalog: &HashMap<String, Product>,
    product_id: &str,
    requested: i64,
) -> DbResult<CoreError> {
    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    let title = catalog
        .get(product_id)
        .map(|p| p.title.clone())
        .unwrap_or_else(|| product_id.to_string());

    Ok(match available {
        Some(available) => CoreError::InsufficientStock {
            product: title,
            available,
            requested,
        },
        None => CoreError::ProductNotFound(product_id.to_string()),
    })
}

async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    let address = order.shipping_address.as_ref();
    let payment = order.payment_details.as_ref();

    let sql = format!(
        r#"
        INSERT INTO orders ({ORDER_COLUMNS})
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
        "#
    );

    sqlx::query(&sql)
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(address.map(|a| a.full_name.as_str()))
        .bind(address.map(|a| a.address.as_str()))
        .bind(address.map(|a| a.city.as_str()))
        .bind(address.map(|a| a.postal_code.as_str()))
        .bind(payment.map(|p| p.method))
        .bind(payment.and_then(|p| p.card_number.as_deref()))
        .bind(payment.and_then(|p| p.expiry.as_deref()))
        .bind(payment.and_then(|p| p.cvc.as_deref()))
        .bind(order.totals.subtotal_cents)
        .bind(order.totals.shipping_cost_cents)
        .bind(order.totals.sgst_total_cents)
        .bind(order.totals.cgst_total_cents)
        .bind(order.totals.total_tax_cents)
        .bind(order.totals.total_cents)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

    for (position, item) in order.items.iter().enumerate() {
        let priced = &item.priced;

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, position, product_id, qty, unit_price_cents,
                sgst_rate_bps, cgst_rate_bps, sgst_amount_cents, cgst_amount_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&order.id)
        .bind(position as i64)
        .bind(&priced.product_id)
        .bind(priced.qty)
        .bind(priced.unit_price_cents)
        .bind(i64::from(priced.sgst_rate_bps))
        .bind(i64::from(priced.cgst_rate_bps))
        .bind(priced.sgst_amount_cents)
        .bind(priced.cgst_amount_cents)
        .execute(&mut *conn)
        .await?;
    }

    debug!(order_id = %order.id, items = order.items.len(), "Order rows inserted");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{draft, new_order, test_db};
    use crate::{Database, DbConfig};
    use culturaft_core::{NotificationKind, ShippingPolicy};
    use tempfile::TempDir;

    async fn seeded(db: &Database, price: i64, stock: i64) -> Product {
        db.products()
            .insert(&draft("Kantha Throw", price, stock))
            .await
            .unwrap()
    }

    /// Pooled connections over one database file, as the server runs it.
    async fn file_db(dir: &TempDir) -> Database {
        let config = DbConfig::new(dir.path().join("culturaft.db")).max_connections(8);
        Database::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_place_order_scenario() {
        let db = test_db().await;
        let product = seeded(&db, 8500, 10).await;

        let order = db
            .orders()
            .place_order(&new_order("user-1", &product.id, 2))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.totals.subtotal_cents, 17000);
        assert_eq!(order.totals.sgst_total_cents, 425);
        assert_eq!(order.totals.cgst_total_cents, 425);
        assert_eq!(order.totals.total_tax_cents, 850);
        assert_eq!(order.totals.total_cents, 19050);

        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 8);

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.totals, order.totals);
        assert_eq!(stored.items[0].priced.sgst_amount_cents, 425);
        assert_eq!(
            stored.items[0].product.as_ref().map(|p| p.title.as_str()),
            Some("Kantha Throw")
        );

        let payment = stored.payment_details.unwrap();
        assert_eq!(payment.card_number.as_deref(), Some("**** **** **** 4242"));
        assert_eq!(payment.cvc.as_deref(), Some("***"));

        let feed = db.notifications().recent(None).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, NotificationKind::NewOrder);
        assert_eq!(feed[0].data["orderId"], order.id.as_str());
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let db = test_db().await;
        let product = seeded(&db, 8500, 10).await;

        let err = db
            .orders()
            .place_order(&new_order("user-1", &product.id, 11))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { available: 10, requested: 11, .. })
        ));
        assert!(err.to_string().contains("Kantha Throw"));

        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 10);
        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert_eq!(db.notifications().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_and_bad_payment() {
        let db = test_db().await;

        let err = db
            .orders()
            .place_order(&new_order("user-1", "missing", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::ProductNotFound(_))));

        let product = seeded(&db, 8500, 10).await;
        let mut bad = new_order("user-1", &product.id, 1);
        bad.payment_details.cvc = None;
        let err = db.orders().place_order(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_policy_shipping_and_frozen_rates() {
        let db = test_db().await;
        let product = seeded(&db, 4000, 10).await;

        let mut request = new_order("user-1", &product.id, 1);
        request.shipping = ShippingCharge::Policy(ShippingPolicy::default());
        let order = db.orders().place_order(&request).await.unwrap();
        assert_eq!(order.totals.shipping_cost_cents, 1200);

        let mut repriced = draft("Kantha Throw", 9999, 9);
        repriced.sgst_rate_bps = 900;
        db.products().update(&product.id, &repriced).await.unwrap();

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].priced.unit_price_cents, 4000);
        assert_eq!(stored.items[0].priced.sgst_rate_bps, 250);
        assert_eq!(stored.items[0].priced.sgst_amount_cents, 100);
    }

    #[tokio::test]
    async fn test_deleted_product_leaves_order_readable() {
        let db = test_db().await;
        let product = seeded(&db, 8500, 10).await;
        let order = db
            .orders()
            .place_order(&new_order("user-1", &product.id, 1))
            .await
            .unwrap();

        db.products().delete(&product.id).await.unwrap();

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);
        assert!(stored.items[0].product.is_none());
    }

    #[tokio::test]
    async fn test_listings() {
        let db = test_db().await;
        let product = seeded(&db, 1000, 50).await;
        let repo = db.orders();

        let first = repo.place_order(&new_order("user-1", &product.id, 1)).await.unwrap();
        let second = repo.place_order(&new_order("user-1", &product.id, 2)).await.unwrap();
        repo.place_order(&new_order("user-2", &product.id, 3)).await.unwrap();

        let mine = repo.list_for_user("user-1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, second.id);
        assert_eq!(mine[1].id, first.id);

        assert_eq!(repo.list_all().await.unwrap().len(), 3);
        assert!(repo.list_for_user("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let db = test_db().await;
        let product = seeded(&db, 1000, 5).await;
        let repo = db.orders();
        let order = repo.place_order(&new_order("user-1", &product.id, 1)).await.unwrap();

        let accepted = repo.set_status(&order.id, OrderStatus::Accepted).await.unwrap();
        assert_eq!(accepted.order.status, OrderStatus::Accepted);
        assert!(accepted.transition.is_change());

        // new_order + order_status
        assert_eq!(db.notifications().count().await.unwrap(), 2);
        let latest = &db.notifications().recent(Some(1)).await.unwrap()[0];
        assert_eq!(latest.data["status"], "accepted");
        assert_eq!(latest.data["userName"], "Asha Rao");

        let again = repo.set_status(&order.id, OrderStatus::Accepted).await.unwrap();
        assert!(!again.transition.is_change());
        assert_eq!(db.notifications().count().await.unwrap(), 2);

        let err = repo.set_status(&order.id, OrderStatus::Delivered).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidStatusTransition { .. })));

        let stored = repo.get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Accepted);

        let err = repo.set_status("missing", OrderStatus::Accepted).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_legacy() {
        let db = test_db().await;
        let product = seeded(&db, 1000, 5).await;
        let kept = db
            .orders()
            .place_order(&new_order("user-1", &product.id, 1))
            .await
            .unwrap();

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, subtotal_cents, total_cents, updated_at)
            VALUES ('legacy-1', 'user-1', 'pending', 500, 500, ?1)
            "#,
        )
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let legacy = db.orders().get_by_id("legacy-1").await.unwrap().unwrap();
        assert!(legacy.shipping_address.is_none());
        assert!(legacy.created_at.is_none());

        assert_eq!(db.orders().delete_legacy().await.unwrap(), 1);
        assert!(db.orders().get_by_id("legacy-1").await.unwrap().is_none());
        assert!(db.orders().get_by_id(&kept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_order() {
        let db = test_db().await;
        let product = seeded(&db, 8500, 10).await;
        sqlx::query("DROP TABLE notifications")
            .execute(db.pool())
            .await
            .unwrap();

        let order = db
            .orders()
            .place_order(&new_order("user-1", &product.id, 2))
            .await
            .unwrap();

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.totals.total_cents, 19050);
        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 8);

        let accepted = db
            .orders()
            .set_status(&order.id, OrderStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.order.status, OrderStatus::Accepted);
    }

    #[tokio::test]
    async fn test_overflowing_price_is_rejected() {
        let db = test_db().await;
        // inserted without the admin route's price cap
        let product = seeded(&db, i64::MAX / 2, 10).await;

        let err = db
            .orders()
            .place_order(&new_order("user-1", &product.id, 3))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 10);
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_on_different_products() {
        let dir = TempDir::new().unwrap();
        let db = file_db(&dir).await;

        let mut products = Vec::new();
        for i in 0..8 {
            let product = db
                .products()
                .insert(&draft(&format!("Piece {i}"), 1000, 5))
                .await
                .unwrap();
            products.push(product);
        }

        let handles: Vec<_> = products
            .iter()
            .map(|product| {
                let repo = db.orders();
                let request = new_order("user-1", &product.id, 1);
                tokio::spawn(async move { repo.place_order(&request).await })
            })
            .collect();

        for handle in handles {
            if let Err(err) = handle.await.unwrap() {
                panic!("checkout failed: {err}");
            }
        }

        assert_eq!(db.orders().count().await.unwrap(), 8);
        for product in &products {
            let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
            assert_eq!(stock, 4);
        }

        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_buyers_cannot_oversell() {
        let dir = TempDir::new().unwrap();
        let db = file_db(&dir).await;
        let product = seeded(&db, 8500, 3).await;

        let handles: Vec<_> = (0..8)
            .map(|buyer| {
                let repo = db.orders();
                let request = new_order(&format!("buyer-{buyer}"), &product.id, 1);
                tokio::spawn(async move { repo.place_order(&request).await })
            })
            .collect();

        let mut placed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(DbError::Core(CoreError::InsufficientStock { .. })) => {}
                Err(err) => panic!("unexpected error: {err}"),
            }
        }

        assert_eq!(placed, 3);
        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 0);
        assert_eq!(db.orders().count().await.unwrap(), 3);
        assert_eq!(db.notifications().count().await.unwrap(), 3);

        db.close().await;
    }
}
