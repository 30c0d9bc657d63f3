//! Cart route handlers.
//!
//! Every handler acts on the signed-in user's own cart.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use printloom_core::{CartItemId, Customization, CustomizationSet, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{CartSummary, CartView, ItemUpdate};
use crate::services::{CartService, CommerceError};
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub customizations: Vec<Customization>,
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// Acknowledgement for cart mutations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAck {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<CartItemId>,
}

/// Get the current cart with priced lines.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.store()).read_cart(&user).await?;
    Ok(Json(cart))
}

/// Get the cart with subtotal, tax, shipping and total.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartSummary>> {
    let summary = CartService::new(state.store())
        .cart_summary(&user, &state.config().tax_policy)
        .await?;
    Ok(Json(summary))
}

/// Add an item to the cart.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<Json<CartAck>> {
    let Json(request) = payload?;
    let customizations =
        CustomizationSet::new(request.customizations).map_err(CommerceError::from)?;

    let item_id = CartService::new(state.store())
        .add_item(&user, request.product_id, request.quantity, customizations)
        .await?;

    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("product_id", &request.product_id.to_string())]),
    );

    Ok(Json(CartAck {
        success: true,
        message: "Item added to cart",
        item_id: Some(item_id),
    }))
}

/// Change an item's quantity; zero removes it.
#[instrument(skip(state, user, id, payload), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    id: std::result::Result<Path<CartItemId>, PathRejection>,
    payload: std::result::Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Path(item_id) = id?;
    let Json(request) = payload?;

    let update = CartService::new(state.store())
        .update_item_quantity(&user, item_id, request.quantity)
        .await?;

    Ok(Json(match update {
        ItemUpdate::Updated {
            id,
            quantity,
            price,
            total,
        } => json!({ "id": id, "quantity": quantity, "price": price, "total": total }),
        ItemUpdate::Removed { .. } => {
            json!({ "success": true, "message": "Item removed from cart" })
        }
    }))
}

/// Remove an item from the cart.
#[instrument(skip(state, user, id), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    id: std::result::Result<Path<CartItemId>, PathRejection>,
) -> Result<Json<CartAck>> {
    let Path(item_id) = id?;
    CartService::new(state.store())
        .remove_item(&user, item_id)
        .await?;

    Ok(Json(CartAck {
        success: true,
        message: "Item removed from cart",
        item_id: None,
    }))
}
