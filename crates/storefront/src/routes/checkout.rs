//! Checkout route handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use printloom_core::{CartId, PaymentDetails, ShippingInfo};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::OrderReceipt;
use crate::services::{CheckoutInput, CheckoutService};
use crate::state::AppState;

/// Checkout request body.
///
/// `subtotal`, `tax` and `shipping` are accepted for compatibility with
/// clients that echo the summary back; only `total` is compared, and none of
/// them are stored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub cart_id: CartId,
    pub shipping_info: Option<ShippingInfo>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub total: Option<Decimal>,
    pub payment: Option<PaymentDetails>,
}

impl From<CheckoutRequest> for CheckoutInput {
    fn from(request: CheckoutRequest) -> Self {
        Self {
            cart_id: request.cart_id,
            shipping_info: request.shipping_info,
            expected_total: request.total,
            payment: request.payment,
        }
    }
}

/// Place an order from the cart.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderReceipt>)> {
    let Json(request) = payload?;

    let order = CheckoutService::new(state.store(), &state.config().tax_policy)
        .checkout(&user, request.into())
        .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );

    Ok((StatusCode::CREATED, Json(OrderReceipt::from(&order))))
}
