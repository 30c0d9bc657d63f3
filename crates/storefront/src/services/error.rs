//! Errors raised by the cart, checkout, order and catalog services.

use thiserror::Error;

use printloom_core::{CustomizationError, PaymentError, ShippingError};

use crate::db::RepositoryError;

/// Errors that can occur in commerce operations.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The request is malformed or violates a business rule.
    #[error("{0}")]
    InvalidInput(String),

    /// A customization does not fit the product.
    #[error(transparent)]
    InvalidCustomization(#[from] CustomizationError),

    /// The named entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The entity exists but belongs to someone else.
    #[error("you do not have access to this {0}")]
    Forbidden(&'static str),

    /// A concurrent change invalidated the operation; the caller may retry.
    #[error("{0}")]
    Conflict(String),

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<ShippingError> for CommerceError {
    fn from(err: ShippingError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<PaymentError> for CommerceError {
    fn from(err: PaymentError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
