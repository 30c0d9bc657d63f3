//! Checkout: convert a cart into an order.
//!
//! All validation happens before anything is written. The write itself is a
//! single [`OrderStore::place_order`] call, which creates the order, its
//! items and empties the cart atomically.

use rust_decimal::Decimal;
use tracing::instrument;

use printloom_core::{
    CartId, OrderId, OrderItemId, OrderTotals, PaymentDetails, ShippingInfo, TaxPolicy, pricing,
};

use super::error::CommerceError;
use super::store::{CartStore, OrderStore};
use crate::db::RepositoryError;
use crate::models::{CurrentUser, NewOrder, NewOrderItem, Order};

/// A checkout request after deserialization.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub cart_id: CartId,
    pub shipping_info: Option<ShippingInfo>,
    /// Grand total the client displayed, if it sent one.
    pub expected_total: Option<Decimal>,
    pub payment: Option<PaymentDetails>,
}

/// Places orders from carts.
pub struct CheckoutService<'a, S> {
    store: &'a S,
    policy: &'a TaxPolicy,
}

impl<'a, S> CheckoutService<'a, S>
where
    S: CartStore + OrderStore,
{
    #[must_use]
    pub const fn new(store: &'a S, policy: &'a TaxPolicy) -> Self {
        Self { store, policy }
    }

    /// Turn the user's cart into a pending order and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::InvalidInput` if shipping or payment details
    /// are invalid, the cart is empty, the total is too large to record, or
    /// the client total disagrees with the server total by more than a cent.
    /// Returns `CommerceError::NotFound` if the cart does not exist.
    /// Returns `CommerceError::Forbidden` if the cart belongs to another user.
    /// Returns `CommerceError::Conflict` if the cart changed while the order
    /// was being written; nothing is written in that case.
    #[instrument(skip(self, user, input), fields(user_id = %user.id, cart_id = %input.cart_id))]
    pub async fn checkout(
        &self,
        user: &CurrentUser,
        input: CheckoutInput,
    ) -> Result<Order, CommerceError> {
        let shipping_info = input
            .shipping_info
            .ok_or_else(|| CommerceError::InvalidInput("shipping information is required".into()))?
            .validate()?;
        if let Some(payment) = &input.payment {
            payment.validate()?;
        }

        let cart = self
            .store
            .find_cart(input.cart_id)
            .await?
            .ok_or(CommerceError::NotFound("cart"))?;
        if cart.user_id != user.id {
            tracing::warn!("checkout attempted on another user's cart");
            return Err(CommerceError::Forbidden("cart"));
        }

        let lines = self.store.cart_lines(cart.id).await?;
        if lines.is_empty() {
            return Err(CommerceError::InvalidInput("cart is empty".into()));
        }

        let items = lines
            .into_iter()
            .map(|line| {
                Ok(NewOrderItem {
                    id: OrderItemId::generate(),
                    cart_item_id: line.id,
                    price: line.unit_price()?,
                    product_id: line.product.id,
                    product_name: line.product.name,
                    quantity: line.quantity,
                    customizations: line.customizations,
                })
            })
            .collect::<Result<Vec<_>, CommerceError>>()?;

        let subtotal = pricing::cart_subtotal(items.iter().map(|item| (item.price, item.quantity)));
        let totals = OrderTotals::compute(subtotal, self.policy);
        if !totals.fits_ledger() {
            return Err(CommerceError::InvalidInput(format!(
                "order total cannot exceed {}",
                pricing::max_order_amount()
            )));
        }
        if let Some(expected) = input.expected_total
            && !totals.matches(expected)
        {
            tracing::info!(%expected, server_total = %totals.total, "client total mismatch");
            return Err(CommerceError::InvalidInput(format!(
                "order total has changed to {}; please review your cart",
                totals.total
            )));
        }

        let new_order = NewOrder {
            id: OrderId::generate(),
            user_id: user.id,
            cart_id: cart.id,
            totals,
            shipping_info,
            items,
        };

        let order = self
            .store
            .place_order(&new_order)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => CommerceError::Conflict(msg),
                RepositoryError::NotFound => CommerceError::NotFound("cart"),
                other => CommerceError::Repository(other),
            })?;

        tracing::info!(
            order_id = %order.id,
            items = order.items.len(),
            total = %order.totals.total,
            "order placed"
        );
        Ok(order)
    }
}
