//! Authentication service.
//!
//! Email and password accounts, hashed with argon2.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;

use printloom_core::{Email, UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum display name length.
const MIN_NAME_LENGTH: usize = 2;

/// Registration form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new shopper account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidField` if the name is too short or the
    /// passwords differ.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, form: &Registration) -> Result<User, AuthError> {
        let (name, email) = validate_registration(form)?;
        let password_hash = hash_password(&form.password)?;

        let user = self
            .users
            .create(&email, &name, &password_hash, UserRole::User)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        // A malformed email cannot belong to an account.
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Check a registration form, returning the trimmed name and parsed email.
fn validate_registration(form: &Registration) -> Result<(String, Email), AuthError> {
    let name = form.name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AuthError::InvalidField(format!(
            "name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    let email = Email::parse(&form.email)?;
    validate_password(&form.password)?;
    if form.password != form.confirm_password {
        return Err(AuthError::InvalidField("passwords do not match".to_string()));
    }
    Ok((name.to_string(), email))
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` naming the first unmet rule.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let rules: [(fn(&char) -> bool, &str); 4] = [
        (char::is_ascii_uppercase, "an uppercase letter"),
        (char::is_ascii_lowercase, "a lowercase letter"),
        (char::is_ascii_digit, "a digit"),
        (|c: &char| !c.is_alphanumeric(), "a special character"),
    ];
    for (rule, what) in rules {
        if !password.chars().any(|c| rule(&c)) {
            return Err(AuthError::WeakPassword(format!(
                "password must contain {what}"
            )));
        }
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;

    Ok(hash.to_string())
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(password: &str) -> Registration {
        Registration {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_password_requirements() {
        assert!(validate_password("Str0ng!pass").is_ok());
        assert!(validate_password("Sh0rt!").is_err());
        assert!(validate_password("nouppercase1!").is_err());
        assert!(validate_password("NOLOWERCASE1!").is_err());
        assert!(validate_password("NoDigits!!").is_err());
        assert!(validate_password("NoSpecial123").is_err());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let password = "Correct-Horse-9";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).is_ok());
        assert!(matches!(
            verify_password("Wrong-Horse-9", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("Same-Pass-1").unwrap();
        let b = hash_password("Same-Pass-1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_registration() {
        let (name, email) = validate_registration(&form("Str0ng!pass")).unwrap();
        assert_eq!(name, "Ada Lovelace");
        assert_eq!(email.as_str(), "ada@example.com");

        let mut short_name = form("Str0ng!pass");
        short_name.name = " A ".to_string();
        assert!(matches!(
            validate_registration(&short_name),
            Err(AuthError::InvalidField(_))
        ));

        let mut mismatch = form("Str0ng!pass");
        mismatch.confirm_password = "Str0ng!pasz".to_string();
        assert!(matches!(
            validate_registration(&mismatch),
            Err(AuthError::InvalidField(_))
        ));

        let mut bad_email = form("Str0ng!pass");
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            validate_registration(&bad_email),
            Err(AuthError::InvalidEmail(_))
        ));
    }
}
