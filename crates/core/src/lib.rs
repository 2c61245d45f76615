//! Midnight Magnolia Core - Shared types library.
//!
//! This crate provides common types used across all Midnight Magnolia components:
//! - `cart` - Cart/checkout session manager used by the front end
//! - `storefront` - Backend-for-frontend API in front of Shopify
//! - `cli` - Command-line cart client
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, quantities, prices, catalog and checkout entities
//! - [`wire`] - JSON request and response bodies for the storefront API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod wire;

pub use types::*;
