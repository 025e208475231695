//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Listing with optional category / featured filters
//! - CRUD operations (admin)
//! - Row ↔ domain mapping (JSON image list, bps columns)
//!
//! Stock is never written here except through a full update; checkout
//! decrements it inside its own transaction (see [`super::order`]).
//!
//! ## Hard Delete
//! ```text
//! DELETE FROM products WHERE id = ?
//!       │
//!       ▼
//! order_items.product_id still holds the ID (no foreign key)
//!       │
//!       ▼
//! order loads LEFT JOIN products → product: None
//!       │
//!       ▼
//! invoice prints "Product" / "N/A" for that line
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use culturaft_core::{Product, ProductDraft};

pub(crate) const PRODUCT_COLUMNS: &str = r#"
    id, title, description, category, price_cents, stock,
    sgst_rate_bps, cgst_rate_bps, featured, images, origin,
    artisan_story, materials_care, shipping_returns,
    created_at, updated_at
"#;

/// Optional filters for [`ProductRepository::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

/// Raw `products` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub stock: i64,
    pub sgst_rate_bps: i64,
    pub cgst_rate_bps: i64,
    pub featured: bool,
    pub images: String,
    pub origin: Option<String>,
    pub artisan_story: Option<String>,
    pub materials_care: Option<String>,
    pub shipping_returns: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        let images: Vec<String> = serde_json::from_str(&row.images)
            .map_err(|e| DbError::corrupt("products.images", &row.id, e))?;
        let sgst_rate_bps = u32::try_from(row.sgst_rate_bps)
            .map_err(|e| DbError::corrupt("products.sgst_rate_bps", &row.id, e))?;
        let cgst_rate_bps = u32::try_from(row.cgst_rate_bps)
            .map_err(|e| DbError::corrupt("products.cgst_rate_bps", &row.id, e))?;

        Ok(Product {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            price_cents: row.price_cents,
            stock: row.stock,
            sgst_rate_bps,
            cgst_rate_bps,
            featured: row.featured,
            images,
            origin: row.origin,
            artisan_story: row.artisan_story,
            materials_care: row.materials_care,
            shipping_returns: row.shipping_returns,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn images_json(images: &[String]) -> DbResult<String> {
    serde_json::to_string(images).map_err(|e| DbError::Internal(e.to_string()))
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let textiles = repo
///     .list(&ProductFilter { category: Some("Textiles".into()), featured: None })
///     .await?;
///
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products, newest first.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        debug!(category = ?filter.category, featured = ?filter.featured, "Listing products");

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR featured = ?2)
            ORDER BY created_at DESC, id
            "#
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(filter.category.as_deref())
            .bind(filter.featured)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Gets a product by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(product))` - Product found
    /// * `Ok(None)` - Product not found
    /// * `Err(DbError)` - Database error
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        debug!(id = %id, "Getting product by ID");

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Inserts a new product from an already validated draft.
    pub async fn insert(&self, draft: &ProductDraft) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            price_cents: draft.price_cents,
            stock: draft.stock,
            sgst_rate_bps: draft.sgst_rate_bps,
            cgst_rate_bps: draft.cgst_rate_bps,
            featured: draft.featured,
            images: draft.images.clone(),
            origin: draft.origin.clone(),
            artisan_story: draft.artisan_story.clone(),
            materials_care: draft.materials_care.clone(),
            shipping_returns: draft.shipping_returns.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, title = %product.title, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, title, description, category, price_cents, stock,
                sgst_rate_bps, cgst_rate_bps, featured, images, origin,
                artisan_story, materials_care, shipping_returns,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(i64::from(product.sgst_rate_bps))
        .bind(i64::from(product.cgst_rate_bps))
        .bind(product.featured)
        .bind(images_json(&product.images)?)
        .bind(&product.origin)
        .bind(&product.artisan_story)
        .bind(&product.materials_care)
        .bind(&product.shipping_returns)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %product.id, "Product created");
        Ok(product)
    }

    /// Replaces a product's editable fields.
    ///
    /// Existing orders keep their frozen price and tax snapshots.
    pub async fn update(&self, id: &str, draft: &ProductDraft) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                title = ?2,
                description = ?3,
                category = ?4,
                price_cents = ?5,
                stock = ?6,
                sgst_rate_bps = ?7,
                cgst_rate_bps = ?8,
                featured = ?9,
                images = ?10,
                origin = ?11,
                artisan_story = ?12,
                materials_care = ?13,
                shipping_returns = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(draft.price_cents)
        .bind(draft.stock)
        .bind(i64::from(draft.sgst_rate_bps))
        .bind(i64::from(draft.cgst_rate_bps))
        .bind(draft.featured)
        .bind(images_json(&draft.images)?)
        .bind(&draft.origin)
        .bind(&draft.artisan_story)
        .bind(&draft.materials_care)
        .bind(&draft.shipping_returns)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product permanently.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{draft, test_db};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(&draft("Kantha Throw", 8500, 10)).await.unwrap();
        let loaded = repo.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(loaded.title, "Kantha Throw");
        assert_eq!(loaded.price_cents, 8500);
        assert_eq!(loaded.sgst_rate_bps, 250);
        assert_eq!(loaded.images, vec!["https://cdn.example/kantha.jpg".to_string()]);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let repo = db.products();

        let mut featured = draft("Brass Diya", 1200, 5);
        featured.category = "Decor".to_string();
        featured.featured = true;
        repo.insert(&featured).await.unwrap();
        repo.insert(&draft("Kantha Throw", 8500, 10)).await.unwrap();

        assert_eq!(repo.list(&ProductFilter::default()).await.unwrap().len(), 2);

        let decor = repo
            .list(&ProductFilter {
                category: Some("Decor".to_string()),
                featured: None,
            })
            .await
            .unwrap();
        assert_eq!(decor.len(), 1);
        assert_eq!(decor[0].title, "Brass Diya");

        let only_featured = repo
            .list(&ProductFilter {
                category: None,
                featured: Some(true),
            })
            .await
            .unwrap();
        assert_eq!(only_featured.len(), 1);
        assert!(only_featured[0].featured);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(&draft("Kantha Throw", 8500, 10)).await.unwrap();

        let mut changes = draft("Kantha Throw (Large)", 9900, 4);
        changes.cgst_rate_bps = 600;
        let updated = repo.update(&created.id, &changes).await.unwrap();
        assert_eq!(updated.title, "Kantha Throw (Large)");
        assert_eq!(updated.cgst_rate_bps, 600);
        assert_eq!(updated.stock, 4);

        repo.delete(&created.id).await.unwrap();
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());

        let err = repo.delete(&created.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        let err = repo.update("missing", &changes).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_story_fields_round_trip() {
        let db = test_db().await;
        let repo = db.products();

        let mut with_story = draft("Dokra Horse", 4500, 3);
        with_story.artisan_story = Some("Cast by lost-wax in Bankura".to_string());
        with_story.materials_care = Some("Brass; wipe dry".to_string());
        let created = repo.insert(&with_story).await.unwrap();

        let loaded = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.artisan_story.as_deref(), Some("Cast by lost-wax in Bankura"));
        assert_eq!(loaded.materials_care.as_deref(), Some("Brass; wipe dry"));
        assert_eq!(loaded.shipping_returns, None);

        let mut changes = with_story.clone();
        changes.artisan_story = None;
        changes.shipping_returns = Some("Returns within 7 days".to_string());
        let updated = repo.update(&created.id, &changes).await.unwrap();
        assert_eq!(updated.artisan_story, None);
        assert_eq!(updated.shipping_returns.as_deref(), Some("Returns within 7 days"));
    }
}
