//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use tracing::instrument;

use printloom_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{OrderSummary, OrderView};
use crate::services::OrderService;
use crate::state::AppState;

/// List the signed-in user's orders.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderService::new(state.store()).list_orders(&user).await?;
    Ok(Json(orders))
}

/// Show one order with its items and shipping details.
///
/// Admins may read any order; everyone else only their own.
#[instrument(skip(state, user, id), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    id: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderView>> {
    let Path(order_id) = id?;
    let order = OrderService::new(state.store())
        .get_order(&user, order_id)
        .await?;
    Ok(Json(order))
}
