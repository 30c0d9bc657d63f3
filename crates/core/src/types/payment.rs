//! Card details submitted at checkout.
//!
//! There is no payment processor behind Printloom. Card fields are only
//! format-checked so that obviously mistyped input is caught before an order
//! is created; they are never persisted or logged.

use core::fmt;

use serde::Deserialize;

/// Errors raised by [`PaymentDetails::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("card number must be 16 digits")]
    InvalidCardNumber,

    #[error("card holder name is required")]
    MissingHolder,

    #[error("expiry date must be in MM/YY format")]
    InvalidExpiry,

    #[error("CVV must be 3 or 4 digits")]
    InvalidCvv,
}

/// Card fields as typed into the checkout form.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub card_number: String,
    pub card_holder: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl PaymentDetails {
    /// Check the format of every field.
    ///
    /// Spaces inside the card number are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first `PaymentError` found.
    pub fn validate(&self) -> Result<(), PaymentError> {
        let digits: String = self.card_number.chars().filter(|c| *c != ' ').collect();
        if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::InvalidCardNumber);
        }

        if self.card_holder.trim().is_empty() {
            return Err(PaymentError::MissingHolder);
        }

        if !is_expiry(self.expiry_date.trim()) {
            return Err(PaymentError::InvalidExpiry);
        }

        let cvv = self.cvv.trim();
        if !matches!(cvv.len(), 3 | 4) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::InvalidCvv);
        }

        Ok(())
    }
}

fn is_expiry(value: &str) -> bool {
    let Some((month, year)) = value.split_once('/') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    two_digits(month)
        && two_digits(year)
        && month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m))
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits: String = self.card_number.chars().filter(char::is_ascii_digit).collect();
        let last4 = digits.get(digits.len().saturating_sub(4)..).unwrap_or("");
        f.debug_struct("PaymentDetails")
            .field("card_number", &format_args!("**** {last4}"))
            .field("card_holder", &"[REDACTED]")
            .field("expiry_date", &"[REDACTED]")
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}
