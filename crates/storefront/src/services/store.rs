//! Storage traits the services are written against.
//!
//! `PgStore` implements them over Postgres; tests use an in-memory store.

use std::future::Future;

use printloom_core::{
    CartId, CartItemId, CategoryId, CustomizationSet, OrderId, ProductId, UserId,
};

use crate::db::RepositoryError;
use crate::models::{
    Cart, CartLine, Category, NewOrder, Order, OrderSummary, OwnedCartLine, Product, ProductDraft,
    ProductFilter,
};

/// Read and write access to categories and products.
pub trait CatalogStore: Send + Sync {
    fn categories(&self) -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    fn category(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    fn product_by_slugs(
        &self,
        category_slug: &str,
        product_slug: &str,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// One page of matching products plus the total number of matches.
    fn search_products(
        &self,
        filter: &ProductFilter,
    ) -> impl Future<Output = Result<(Vec<Product>, u64), RepositoryError>> + Send;

    /// Fails with `RepositoryError::Conflict` if the slug is taken.
    fn insert_product(
        &self,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;
}

/// Carts and cart items.
pub trait CartStore: Send + Sync {
    /// The user's cart, created on first use.
    fn ensure_cart(&self, user_id: UserId)
    -> impl Future<Output = Result<Cart, RepositoryError>> + Send;

    fn find_cart(
        &self,
        id: CartId,
    ) -> impl Future<Output = Result<Option<Cart>, RepositoryError>> + Send;

    /// Items of a cart with their products, oldest first.
    fn cart_lines(
        &self,
        cart_id: CartId,
    ) -> impl Future<Output = Result<Vec<CartLine>, RepositoryError>> + Send;

    fn find_line(
        &self,
        item_id: CartItemId,
    ) -> impl Future<Output = Result<Option<OwnedCartLine>, RepositoryError>> + Send;

    /// Insert an item, or add `quantity` to the item with the same product
    /// and customization set.
    ///
    /// Returns `None` and leaves the cart unchanged when the merged quantity
    /// would exceed `max_quantity`.
    fn add_or_merge_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
        max_quantity: u32,
        customizations: &CustomizationSet,
    ) -> impl Future<Output = Result<Option<CartItemId>, RepositoryError>> + Send;

    /// Fails with `RepositoryError::NotFound` if the item is gone.
    fn set_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Returns whether an item was deleted.
    fn delete_item(
        &self,
        item_id: CartItemId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Orders.
pub trait OrderStore: Send + Sync {
    /// Write the order and its items and delete the consumed cart items, all
    /// or nothing.
    ///
    /// Fails with `RepositoryError::Conflict` if the cart no longer holds
    /// exactly the items in `order`.
    fn place_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    fn find_order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Newest first.
    fn orders_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<OrderSummary>, RepositoryError>> + Send;
}
