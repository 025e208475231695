//! Catalog routes. Reads are public; writes need an admin.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use culturaft_core::validation::validate_product_draft;
use culturaft_core::{CoreError, Product, ProductDraft};
use culturaft_db::ProductFilter;

use crate::error::ApiResult;
use crate::identity::AdminIdentity;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        ProductFilter {
            category: query
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            featured: query.featured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(query) = query?;
    let products = state.db.products().list(&query.into()).await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;
    Ok(Json(product))
}

async fn create_product(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(draft) = payload?;
    let draft = validate_product_draft(&draft)?;

    let product = state.db.products().insert(&draft).await?;
    info!(admin = %admin.user_id, product_id = %product.id, "Product created by admin");

    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(draft) = payload?;
    let draft = validate_product_draft(&draft)?;

    let product = state.db.products().update(&id, &draft).await?;
    info!(admin = %admin.user_id, product_id = %id, "Product updated by admin");

    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.products().delete(&id).await?;
    info!(admin = %admin.user_id, product_id = %id, "Product deleted by admin");

    Ok(Json(MessageResponse {
        message: "Product removed".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_to_filter() {
        let filter: ProductFilter = ProductQuery {
            category: Some("  ".to_string()),
            featured: Some(true),
        }
        .into();
        assert_eq!(filter.category, None);
        assert_eq!(filter.featured, Some(true));

        let filter: ProductFilter = ProductQuery {
            category: Some(" Textiles ".to_string()),
            featured: None,
        }
        .into();
        assert_eq!(filter.category.as_deref(), Some("Textiles"));
    }
}
