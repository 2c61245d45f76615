//! Core types for Midnight Magnolia.
//!
//! This module provides type-safe wrappers for common commerce concepts.

pub mod catalog;
pub mod checkout;
pub mod id;
pub mod price;
pub mod quantity;

pub use catalog::{Collection, Image, Product, Variant};
pub use checkout::{Checkout, LineItem};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use quantity::{MAX_UI_QUANTITY, Quantity, QuantityError};
