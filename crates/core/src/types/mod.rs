//! Core types for Printloom.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod area;
pub mod customization;
pub mod email;
pub mod id;
pub mod payment;
pub mod price;
pub mod shipping;
pub mod status;

pub use area::CustomizableArea;
pub use customization::{Customization, CustomizationError, CustomizationKind, CustomizationSet};
pub use email::{Email, EmailError};
pub use id::*;
pub use payment::{PaymentDetails, PaymentError};
pub use price::{Price, PriceError};
pub use shipping::{NOT_PROVIDED, ShippingError, ShippingInfo};
pub use status::*;
