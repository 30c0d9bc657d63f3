//! Printloom Core - Shared domain types and pricing rules.
//!
//! This crate provides the types used across all Printloom components:
//! - `storefront` - Public-facing customizable-product shop
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Everything money-related is computed here so that the
//! storefront, the CLI and the tests agree on every cent.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, statuses, customizations, shipping
//! - [`pricing`] - Unit prices, line totals and order totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{OrderTotals, TaxPolicy};
pub use types::*;
