//! Shipping address snapshot.

use serde::{Deserialize, Serialize};

use super::email::Email;

/// Text shown for every field of an order that has no shipping snapshot.
pub const NOT_PROVIDED: &str = "Not provided";

/// Errors raised by [`ShippingInfo::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShippingError {
    #[error("shipping field `{0}` is required")]
    MissingField(&'static str),

    #[error("shipping email is invalid")]
    InvalidEmail,
}

/// Where an order ships to, captured at checkout.
///
/// Stored verbatim on the order; later profile edits never change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingInfo {
    /// Check that every field is filled in and the email parses.
    ///
    /// Returns a copy with surrounding whitespace trimmed.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::MissingField` naming the first blank field, or
    /// `ShippingError::InvalidEmail`.
    pub fn validate(&self) -> Result<Self, ShippingError> {
        let fields = [
            ("fullName", &self.full_name),
            ("email", &self.email),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
            ("country", &self.country),
            ("phone", &self.phone),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ShippingError::MissingField(*name));
        }

        let email = Email::parse(&self.email).map_err(|_| ShippingError::InvalidEmail)?;

        Ok(Self {
            full_name: self.full_name.trim().to_owned(),
            email: email.into_inner(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self.zip_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
        })
    }

    /// A snapshot with every field set to [`NOT_PROVIDED`].
    #[must_use]
    pub fn placeholder() -> Self {
        let np = || NOT_PROVIDED.to_owned();
        Self {
            full_name: np(),
            email: np(),
            address: np(),
            city: np(),
            state: np(),
            zip_code: np(),
            country: np(),
            phone: np(),
        }
    }
}
