//! Domain models for the storefront.
//!
//! These are the validated shapes that flow between repositories, services
//! and route handlers. Database row types stay private to `db`.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItemView, CartLine, CartSummary, CartView, ItemUpdate, OwnedCartLine};
pub use catalog::{
    Category, CategoryRef, NewArea, NewProduct, Pagination, Product, ProductDraft, ProductFilter,
    ProductPage, ProductQuery, ProductSort,
};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderReceipt, OrderSummary, OrderView};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
