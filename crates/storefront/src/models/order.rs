//! Order types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use printloom_core::{
    CartId, CartItemId, CustomizationSet, OrderId, OrderItemId, OrderStatus, OrderTotals, Price,
    ProductId, ShippingInfo, UserId,
};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub totals: OrderTotals,
    pub shipping_info: Option<ShippingInfo>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One line of a placed order. Prices are snapshots taken at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Price,
    pub customizations: CustomizationSet,
}

/// Everything needed to write an order in one transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub cart_id: CartId,
    pub totals: OrderTotals,
    pub shipping_info: ShippingInfo,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// The cart items this order consumes, with the quantities that were priced.
    #[must_use]
    pub fn consumed_items(&self) -> Vec<(CartItemId, u32)> {
        let mut consumed: Vec<_> = self
            .items
            .iter()
            .map(|item| (item.cart_item_id, item.quantity))
            .collect();
        consumed.sort_unstable();
        consumed
    }
}

/// A priced cart line about to become an order item.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub id: OrderItemId,
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Price,
    pub customizations: CustomizationSet,
}

/// Response to a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Price,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderReceipt {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            status: order.status,
            total: order.totals.total,
            created_at: order.created_at,
        }
    }
}

/// An order as shown to its owner or an admin.
///
/// `shipping_info` is always present; orders without a snapshot show
/// "Not provided" in every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub subtotal: Price,
    pub tax: Price,
    pub shipping: Price,
    pub total: Price,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub shipping_info: ShippingInfo,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            subtotal: order.totals.subtotal,
            tax: order.totals.tax,
            shipping: order.totals.shipping,
            total: order.totals.total,
            created_at: order.created_at,
            items: order.items,
            shipping_info: order.shipping_info.unwrap_or_else(ShippingInfo::placeholder),
        }
    }
}

/// A row in the order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Price,
    pub item_count: u32,
    pub created_at: DateTime<Utc>,
}
