//! Commerce backend seam.
//!
//! Route handlers talk to the commerce provider only through
//! [`CommerceBackend`]. Production uses [`crate::shopify::ShopifyClient`];
//! tests substitute mocks or in-memory backends.

use async_trait::async_trait;
use magnolia_core::wire::{LineItemInput, LineItemUpdate};
use magnolia_core::{Checkout, CheckoutId, Collection, LineItemId, Product};

use crate::shopify::ShopifyError;

/// Checkout and catalog operations served by the API.
///
/// Lookups that find nothing return [`ShopifyError::NotFound`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// Create an empty checkout.
    async fn create_checkout(&self) -> Result<Checkout, ShopifyError>;

    /// Fetch a checkout by ID.
    async fn checkout(&self, id: &CheckoutId) -> Result<Checkout, ShopifyError>;

    /// Add variant/quantity pairs to a checkout.
    async fn add_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemInput>,
    ) -> Result<Checkout, ShopifyError>;

    /// Set absolute quantities on existing line items.
    async fn update_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemUpdate>,
    ) -> Result<Checkout, ShopifyError>;

    /// Delete line items from a checkout.
    async fn remove_line_items(
        &self,
        id: &CheckoutId,
        line_item_ids: Vec<LineItemId>,
    ) -> Result<Checkout, ShopifyError>;

    /// First page of products.
    async fn products(&self) -> Result<Vec<Product>, ShopifyError>;

    /// A product by handle.
    async fn product(&self, handle: &str) -> Result<Product, ShopifyError>;

    /// First page of collections.
    async fn collections(&self) -> Result<Vec<Collection>, ShopifyError>;

    /// A collection, with its first page of products, by handle.
    async fn collection(&self, handle: &str) -> Result<Collection, ShopifyError>;

    /// Verify the provider is reachable and our credentials are accepted.
    async fn ping(&self) -> Result<(), ShopifyError>;
}
