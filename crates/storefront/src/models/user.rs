//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use printloom_core::{Email, UserId, UserRole};

/// A storefront account.
///
/// The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
