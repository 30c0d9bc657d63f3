//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! pl-cli admin create -e admin@example.com -n "Admin User" -p 'Admin123!'
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use thiserror::Error;

use printloom_core::{Email, UserId, UserRole};
use printloom_storefront::db::{RepositoryError, UserRepository};
use printloom_storefront::services::AuthError;
use printloom_storefront::services::auth::{hash_password, validate_password};

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password rejected or could not be hashed.
    #[error("Password rejected: {0}")]
    Password(#[from] AuthError),

    /// User already exists.
    #[error("A user already exists with email: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new admin user.
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns an error if the email or password is invalid, the email is
/// already registered, or the database is unreachable.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    if users.get_by_email(&email).await?.is_some() {
        return Err(AdminError::UserExists(email.to_string()));
    }

    tracing::info!("Creating admin user: {}", email);

    let user = users
        .create(&email, name.trim(), &password_hash, UserRole::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id)
}
