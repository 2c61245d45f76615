//! Midnight Magnolia cart session manager.
//!
//! Keeps a shopper's checkout consistent with the commerce provider:
//!
//! - [`session_store`] - remembers the checkout ID across restarts
//! - [`client`] - checkout and catalog calls against the storefront API
//! - [`state`] - observable cart state driven by a reducer
//! - [`session`] - the [`CartSession`] facade presentation code talks to
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use magnolia_cart::{CartConfig, CartSession, FileSessionStore, HttpCheckoutClient};
//! use magnolia_core::VariantId;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CartConfig::from_env()?;
//! let client = HttpCheckoutClient::new(&config)?;
//! let sessions = FileSessionStore::new("/tmp/magnolia-session.json");
//!
//! let cart = CartSession::open(Arc::new(client), Arc::new(sessions), &config).await;
//! cart.add_item_to_checkout(&VariantId::new("gid://shopify/ProductVariant/1"), 1)
//!     .await?;
//! println!("{:?}", cart.checkout_url());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod session_store;
pub mod state;

pub use client::{CatalogProvider, CheckoutProvider, HttpCheckoutClient};
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, ClientError, StorageError};
pub use session::CartSession;
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use state::{CartAction, CartState, CartStore};
