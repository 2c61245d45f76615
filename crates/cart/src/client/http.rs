//! HTTP implementation of the checkout and catalog providers.
//!
//! Talks to the storefront API (`/api/checkout`, `/api/products`,
//! `/api/collections`) with `reqwest`, decoding the `{ checkout }`-style
//! envelopes and `{ error }` bodies defined in [`magnolia_core::wire`].

use std::sync::Arc;

use async_trait::async_trait;
use magnolia_core::wire::{
    AddLineItemsRequest, CheckoutEnvelope, CollectionEnvelope, CollectionsEnvelope, ErrorBody,
    LineItemInput, LineItemUpdate, ProductEnvelope, ProductsEnvelope, RemoveLineItemsRequest,
    UpdateLineItemsRequest,
};
use magnolia_core::{Checkout, CheckoutId, Collection, LineItemId, Product};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{CatalogProvider, CheckoutProvider};
use crate::config::CartConfig;
use crate::error::ClientError;

/// Maximum number of body characters copied into logs and error messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// Checkout and catalog client for the storefront API.
///
/// Cheaply cloneable; clones share the connection pool.
#[derive(Clone)]
pub struct HttpCheckoutClient {
    inner: Arc<HttpCheckoutClientInner>,
}

struct HttpCheckoutClientInner {
    client: reqwest::Client,
    checkout_url: Url,
    products_url: Url,
    collections_url: Url,
}

impl std::fmt::Debug for HttpCheckoutClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCheckoutClient")
            .field("checkout_url", &self.inner.checkout_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpCheckoutClient {
    /// Create a client for the API rooted at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URLs cannot be derived from the base
    /// URL or the HTTP client cannot be built.
    pub fn new(config: &CartConfig) -> Result<Self, ClientError> {
        let join = |path: &str| {
            config
                .api_url
                .join(path)
                .map_err(|e| ClientError::Validation(format!("invalid API URL: {e}")))
        };

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpCheckoutClientInner {
                client,
                checkout_url: join("api/checkout")?,
                products_url: join("api/products")?,
                collections_url: join("api/collections")?,
            }),
        })
    }

    /// Send a request and decode a 2xx body into `T`.
    ///
    /// Non-2xx responses are mapped by status: 400 to `Validation`, 404 to
    /// `NotFound`, everything else to `ProviderUnavailable`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            debug!(status = %status, message = %message, "Storefront API returned an error");

            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    ClientError::Validation(message)
                }
                StatusCode::NOT_FOUND => ClientError::NotFound(message),
                _ => ClientError::ProviderUnavailable(message),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %preview(&body),
                "Failed to parse storefront API response"
            );
            ClientError::Protocol(e.to_string())
        })
    }

    fn checkout_lookup_url(&self, id: &CheckoutId) -> Url {
        let mut url = self.inner.checkout_url.clone();
        url.query_pairs_mut().append_pair("id", id.as_str());
        url
    }

    fn handle_lookup_url(base: &Url, handle: &str) -> Url {
        let mut url = base.clone();
        url.query_pairs_mut().append_pair("handle", handle);
        url
    }
}

#[async_trait]
impl CheckoutProvider for HttpCheckoutClient {
    #[instrument(skip(self))]
    async fn create_session(&self) -> Result<Checkout, ClientError> {
        let request = self.inner.client.post(self.inner.checkout_url.clone());
        let envelope: CheckoutEnvelope = self.send(request).await?;
        debug!(checkout_id = %envelope.checkout.id, "Created checkout");
        Ok(envelope.checkout)
    }

    #[instrument(skip(self), fields(checkout_id = %id))]
    async fn fetch_session(&self, id: &CheckoutId) -> Result<Option<Checkout>, ClientError> {
        let request = self.inner.client.get(self.checkout_lookup_url(id));
        match self.send::<CheckoutEnvelope>(request).await {
            Ok(envelope) => Ok(Some(envelope.checkout)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, items), fields(checkout_id = %id, lines = items.len()))]
    async fn add_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemInput>,
    ) -> Result<Checkout, ClientError> {
        let body = AddLineItemsRequest {
            checkout_id: Some(id.clone()),
            line_items: Some(items),
        };
        let request = self
            .inner
            .client
            .put(self.inner.checkout_url.clone())
            .json(&body);
        let envelope: CheckoutEnvelope = self.send(request).await?;
        Ok(envelope.checkout)
    }

    #[instrument(skip(self, items), fields(checkout_id = %id, lines = items.len()))]
    async fn update_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemUpdate>,
    ) -> Result<Checkout, ClientError> {
        let body = UpdateLineItemsRequest {
            checkout_id: Some(id.clone()),
            line_items: Some(items),
        };
        let request = self
            .inner
            .client
            .patch(self.inner.checkout_url.clone())
            .json(&body);
        let envelope: CheckoutEnvelope = self.send(request).await?;
        Ok(envelope.checkout)
    }

    #[instrument(skip(self, line_item_ids), fields(checkout_id = %id, lines = line_item_ids.len()))]
    async fn remove_line_items(
        &self,
        id: &CheckoutId,
        line_item_ids: Vec<LineItemId>,
    ) -> Result<Checkout, ClientError> {
        let body = RemoveLineItemsRequest {
            checkout_id: Some(id.clone()),
            line_item_ids: Some(line_item_ids),
        };
        let request = self
            .inner
            .client
            .delete(self.inner.checkout_url.clone())
            .json(&body);
        let envelope: CheckoutEnvelope = self.send(request).await?;
        Ok(envelope.checkout)
    }
}

#[async_trait]
impl CatalogProvider for HttpCheckoutClient {
    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<Product>, ClientError> {
        let request = self.inner.client.get(self.inner.products_url.clone());
        let envelope: ProductsEnvelope = self.send(request).await?;
        Ok(envelope.products)
    }

    #[instrument(skip(self))]
    async fn product(&self, handle: &str) -> Result<Product, ClientError> {
        let url = Self::handle_lookup_url(&self.inner.products_url, handle);
        let envelope: ProductEnvelope = self.send(self.inner.client.get(url)).await?;
        Ok(envelope.product)
    }

    #[instrument(skip(self))]
    async fn collections(&self) -> Result<Vec<Collection>, ClientError> {
        let request = self.inner.client.get(self.inner.collections_url.clone());
        let envelope: CollectionsEnvelope = self.send(request).await?;
        Ok(envelope.collections)
    }

    #[instrument(skip(self))]
    async fn collection(&self, handle: &str) -> Result<Collection, ClientError> {
        let url = Self::handle_lookup_url(&self.inner.collections_url, handle);
        let envelope: CollectionEnvelope = self.send(self.inner.client.get(url)).await?;
        Ok(envelope.collection)
    }
}

/// Extract the `{ error }` message from a failed response, falling back to
/// the status line and a body preview.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|e| e.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}: {}", preview(body)))
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_body() {
        let message = error_message(StatusCode::BAD_REQUEST, r#"{"error":"checkoutId is required"}"#);
        assert_eq!(message, "checkoutId is required");
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let message = error_message(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert_eq!(message, "HTTP 502 Bad Gateway: <html>upstream down</html>");
    }

    #[test]
    fn test_error_message_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let message = error_message(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(message.len() < 300);
    }

    #[test]
    fn test_endpoint_urls() {
        let config = CartConfig::default()
            .with_api_url("https://magnolia.example/bff")
            .unwrap();
        let client = HttpCheckoutClient::new(&config).unwrap();

        assert_eq!(
            client.inner.checkout_url.as_str(),
            "https://magnolia.example/bff/api/checkout"
        );
        assert_eq!(
            client
                .checkout_lookup_url(&CheckoutId::new("gid://shopify/Cart/1?key=a"))
                .as_str(),
            "https://magnolia.example/bff/api/checkout?id=gid%3A%2F%2Fshopify%2FCart%2F1%3Fkey%3Da"
        );
        assert_eq!(
            HttpCheckoutClient::handle_lookup_url(&client.inner.products_url, "magnolia-candle")
                .as_str(),
            "https://magnolia.example/bff/api/products?handle=magnolia-candle"
        );
    }
}
