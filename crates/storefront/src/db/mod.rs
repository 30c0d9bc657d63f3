//! Database operations for storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` - Storefront accounts
//! - `tower_sessions.session` - Tower-sessions storage
//! - `categories`, `products`, `customizable_areas` - Catalog
//! - `carts`, `cart_items` - One cart per user
//! - `orders`, `order_items` - Placed orders
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p printloom-cli -- migrate
//! ```

pub mod carts;
pub mod catalog;
pub mod orders;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use users::UserRepository;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email) or a concurrent change.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, keeping other errors as-is.
    pub(crate) fn unique_violation(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Convert a stored `INTEGER` quantity into a `u32`.
pub(crate) fn quantity_from_db(quantity: i32) -> Result<u32, RepositoryError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| RepositoryError::DataCorruption(format!("invalid quantity: {quantity}")))
}

/// Convert a `u32` quantity into the `INTEGER` column type.
pub(crate) fn quantity_to_db(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity {quantity} is too large")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Postgres-backed implementation of the storefront's store traits.
///
/// Cloning is cheap; the pool is reference-counted.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_conversions() {
        assert_eq!(quantity_from_db(3).ok(), Some(3));
        assert!(matches!(
            quantity_from_db(0),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            quantity_from_db(-2),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert_eq!(quantity_to_db(7).ok(), Some(7));
        assert!(quantity_to_db(u32::MAX).is_err());
    }
}
