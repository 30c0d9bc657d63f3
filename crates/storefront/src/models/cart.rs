//! Cart types.

use serde::Serialize;

use printloom_core::pricing::{self, OrderTotals};
use printloom_core::{
    CartId, CartItemId, CustomizationError, CustomizationSet, Price, ProductId, UserId,
};

use super::catalog::{CategoryRef, Product};

/// A user's cart. Exactly one exists per user once they touch the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
}

/// A cart item joined with its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub quantity: u32,
    pub customizations: CustomizationSet,
    pub product: Product,
}

impl CartLine {
    /// Current unit price from the product's base price and area surcharges.
    ///
    /// # Errors
    ///
    /// Returns `CustomizationError` if the stored customizations no longer fit
    /// the product's areas.
    pub fn unit_price(&self) -> Result<Price, CustomizationError> {
        pricing::unit_price(
            self.product.base_price,
            &self.product.customizable_areas,
            &self.customizations,
        )
    }

    /// Price this line for display.
    ///
    /// # Errors
    ///
    /// See [`CartLine::unit_price`].
    pub fn view(&self) -> Result<CartItemView, CustomizationError> {
        let unit_price = self.unit_price()?;
        Ok(CartItemView {
            id: self.id,
            product_id: self.product.id,
            quantity: self.quantity,
            customizations: self.customizations.clone(),
            product: CartProduct {
                name: self.product.name.clone(),
                slug: self.product.slug.clone(),
                image: self.product.images.first().cloned(),
                category: self.product.category.clone(),
            },
            unit_price,
            line_total: pricing::line_total(unit_price, self.quantity),
        })
    }
}

/// A cart line together with the user who owns its cart.
#[derive(Debug, Clone)]
pub struct OwnedCartLine {
    pub owner: UserId,
    pub line: CartLine,
}

/// Product fields shown next to a cart item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub category: CategoryRef,
}

/// A priced cart item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub customizations: CustomizationSet,
    pub product: CartProduct,
    pub unit_price: Price,
    pub line_total: Price,
}

/// The cart as shown to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub items: Vec<CartItemView>,
    /// Sum of line totals.
    pub total: Price,
    /// Number of distinct lines.
    pub item_count: usize,
    /// Sum of quantities.
    pub total_quantity: u32,
}

impl CartView {
    #[must_use]
    pub fn new(id: CartId, items: Vec<CartItemView>) -> Self {
        let total = items.iter().map(|item| item.line_total).sum();
        let total_quantity = items.iter().map(|item| item.quantity).sum();
        Self {
            id,
            item_count: items.len(),
            items,
            total,
            total_quantity,
        }
    }
}

/// The cart plus the order totals checkout would charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub cart: CartView,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Result of changing a cart item's quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUpdate {
    /// The item now has the given quantity.
    Updated {
        id: CartItemId,
        quantity: u32,
        price: Price,
        total: Price,
    },
    /// Quantity zero removed the item.
    Removed { id: CartItemId },
}
