//! Catalog route handlers.
//!
//! Browsing is public; creating products needs an admin session.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Category, NewProduct, Product, ProductPage, ProductQuery};
use crate::services::CatalogService;
use crate::state::AppState;

/// List all categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CatalogService::new(state.store()).list_categories().await?;
    Ok(Json(categories))
}

/// List products with paging and filters.
#[instrument(skip(state, query))]
pub async fn products(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<ProductPage>> {
    let Query(query) = query?;
    let page = CatalogService::new(state.store())
        .list_products(query)
        .await?;
    Ok(Json(page))
}

/// Show a product by category slug and product slug.
#[instrument(skip(state, slugs))]
pub async fn product(
    State(state): State<AppState>,
    slugs: std::result::Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<Product>> {
    let Path((category, product)) = slugs?;
    let product = CatalogService::new(state.store())
        .get_product(&category, &product)
        .await?;
    Ok(Json(product))
}

/// Create a product (admin only).
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let Json(input) = payload?;
    let product = CatalogService::new(state.store())
        .create_product(&user, input)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}
