//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Accounts (register, login) with argon2 password hashes
//! - `catalog` - Category and product browsing, product creation
//! - `cart` - The per-user cart aggregate
//! - `checkout` - Cart to order conversion
//! - `orders` - Order retrieval
//!
//! Commerce services are generic over the store traits in [`store`] and take
//! the caller's identity explicitly as `&CurrentUser`.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod orders;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

pub use auth::{AuthError, AuthService, Registration};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::{CheckoutInput, CheckoutService};
pub use error::CommerceError;
pub use orders::OrderService;
pub use store::{CartStore, CatalogStore, OrderStore};
