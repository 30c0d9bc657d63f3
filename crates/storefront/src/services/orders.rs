//! Order retrieval.

use tracing::instrument;

use printloom_core::OrderId;

use super::error::CommerceError;
use super::store::OrderStore;
use crate::models::{CurrentUser, OrderSummary, OrderView};

/// Read access to placed orders.
pub struct OrderService<'a, S> {
    store: &'a S,
}

impl<'a, S: OrderStore> OrderService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Get an order with its items and shipping details.
    ///
    /// Admins may read any order; everyone else only their own.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if the order does not exist.
    /// Returns `CommerceError::Forbidden` if the requester may not see it.
    #[instrument(skip(self, requester), fields(user_id = %requester.id))]
    pub async fn get_order(
        &self,
        requester: &CurrentUser,
        order_id: OrderId,
    ) -> Result<OrderView, CommerceError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(CommerceError::NotFound("order"))?;

        if order.user_id != requester.id && !requester.is_admin() {
            return Err(CommerceError::Forbidden("order"));
        }

        Ok(OrderView::from(order))
    }

    /// The requester's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if storage fails.
    pub async fn list_orders(
        &self,
        requester: &CurrentUser,
    ) -> Result<Vec<OrderSummary>, CommerceError> {
        Ok(self.store.orders_for_user(requester.id).await?)
    }
}
