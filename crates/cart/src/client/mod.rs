//! Checkout session client.
//!
//! Translates cart intents into calls against the commerce API and returns
//! the full, provider-confirmed [`Checkout`] for every mutation. There is no
//! retry logic at this layer; failures are reported to the caller as
//! [`ClientError`]s.
//!
//! # Traits
//!
//! - [`CheckoutProvider`] - create, fetch and mutate checkout sessions
//! - [`CatalogProvider`] - read-only product and collection lookups
//!
//! [`HttpCheckoutClient`] implements both against the storefront API.

mod http;

use async_trait::async_trait;
use magnolia_core::wire::{LineItemInput, LineItemUpdate};
use magnolia_core::{Checkout, CheckoutId, Collection, LineItemId, Product};

use crate::error::ClientError;

pub use http::HttpCheckoutClient;

/// Checkout session operations against the commerce provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Request a brand-new, empty checkout.
    async fn create_session(&self) -> Result<Checkout, ClientError>;

    /// Fetch an existing checkout by ID.
    ///
    /// Returns `Ok(None)` when the provider no longer knows the checkout
    /// (expired, or converted into an order).
    async fn fetch_session(&self, id: &CheckoutId) -> Result<Option<Checkout>, ClientError>;

    /// Append or merge variant/quantity pairs into the checkout.
    ///
    /// Adding a variant that is already present is provider-defined; Shopify
    /// adds the quantities together.
    async fn add_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemInput>,
    ) -> Result<Checkout, ClientError>;

    /// Set absolute quantities for existing line items.
    async fn update_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemUpdate>,
    ) -> Result<Checkout, ClientError>;

    /// Delete line items.
    async fn remove_line_items(
        &self,
        id: &CheckoutId,
        line_item_ids: Vec<LineItemId>,
    ) -> Result<Checkout, ClientError>;
}

/// Read-only catalog lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// First page of products.
    async fn products(&self) -> Result<Vec<Product>, ClientError>;

    /// A single product by handle.
    async fn product(&self, handle: &str) -> Result<Product, ClientError>;

    /// First page of collections.
    async fn collections(&self) -> Result<Vec<Collection>, ClientError>;

    /// A single collection by handle.
    async fn collection(&self, handle: &str) -> Result<Collection, ClientError>;
}
