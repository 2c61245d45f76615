//! Midnight Magnolia storefront API.
//!
//! A thin backend-for-frontend in front of the Shopify Storefront API. It
//! exposes checkout mutations and catalog reads as JSON under `/api` and
//! keeps no shopper state: the checkout ID travels with every request.
//!
//! The binary in `main.rs` wires configuration, Sentry and tracing around
//! [`app::app`]; integration tests build the same router over their own
//! [`backend::CommerceBackend`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod shopify;
pub mod state;

pub use app::app;
pub use backend::CommerceBackend;
pub use state::AppState;
