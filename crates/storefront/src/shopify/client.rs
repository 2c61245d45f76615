//! Shopify Storefront API client implementation.
//!
//! Sends the documents in [`super::queries`] with `reqwest` 0.13 and decodes
//! the responses with `serde`. Caches products and collections using `moka`
//! (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use magnolia_core::wire::{LineItemInput, LineItemUpdate};
use magnolia_core::{Checkout, CheckoutId, Collection, LineItemId, Product};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::conversions::{convert_cart, convert_cart_payload, convert_collection, convert_product};
use super::queries;
use super::types::{
    CartCreateData, CartData, CartLinesAddData, CartLinesRemoveData, CartLinesUpdateData,
    CollectionData, CollectionsData, GraphQLResponse, ProductData, ProductsData, ShopData,
};
use super::ShopifyError;
use crate::backend::CommerceBackend;
use crate::config::ShopifyConfig;

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const PRODUCTS_PAGE_SIZE: i64 = 50;
const COLLECTIONS_PAGE_SIZE: i64 = 50;
const COLLECTION_PRODUCT_COUNT: i64 = 50;

/// Characters of a response body copied into logs.
const LOG_BODY_CHARS: usize = 500;

/// Cache key for products and collections.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(String),
    Products,
    Collection(String),
    Collections,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
    Collection(Box<Collection>),
    Collections(Arc<Vec<Collection>>),
}

// =============================================================================
// ShopifyClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Serves checkouts through the Cart API and caches catalog reads for five
/// minutes.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl ShopifyClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        Self::with_endpoint(config.endpoint(), config.storefront_private_token.clone())
    }

    /// Create a client for an explicit GraphQL endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        access_token: SecretString,
    ) -> Result<Self, ShopifyError> {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                endpoint: endpoint.into(),
                access_token,
                cache,
            }),
        })
    }

    /// Execute a GraphQL document.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ShopifyError> {
        let request_body = json!({ "query": query, "variables": variables });

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            // See: https://shopify.dev/docs/storefronts/headless/building-with-the-storefront-api/getting-started
            .header(
                "Shopify-Storefront-Private-Token",
                self.inner.access_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %preview(&response_text),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::graphql(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: GraphQLResponse<T> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %preview(&response_text),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(errors));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %preview(&response_text),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::graphql("No data in response")
        })
    }
}

#[async_trait]
impl CommerceBackend for ShopifyClient {
    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    #[instrument(skip(self))]
    async fn create_checkout(&self) -> Result<Checkout, ShopifyError> {
        let data: CartCreateData = self
            .execute(queries::CART_CREATE, json!({ "input": {} }))
            .await?;
        convert_cart_payload(data.cart_create, "cartCreate")
    }

    #[instrument(skip(self), fields(cart_id = %id))]
    async fn checkout(&self, id: &CheckoutId) -> Result<Checkout, ShopifyError> {
        let data: CartData = self
            .execute(queries::CART, json!({ "cartId": id.as_str() }))
            .await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {id}")))
    }

    #[instrument(skip(self, items), fields(cart_id = %id, lines = items.len()))]
    async fn add_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemInput>,
    ) -> Result<Checkout, ShopifyError> {
        let lines: Vec<Value> = items
            .iter()
            .map(|item| {
                json!({
                    "merchandiseId": item.variant_id.as_str(),
                    "quantity": item.quantity.get(),
                })
            })
            .collect();

        let data: CartLinesAddData = self
            .execute(
                queries::CART_LINES_ADD,
                json!({ "cartId": id.as_str(), "lines": lines }),
            )
            .await?;
        convert_cart_payload(data.cart_lines_add, "cartLinesAdd")
    }

    #[instrument(skip(self, items), fields(cart_id = %id, lines = items.len()))]
    async fn update_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemUpdate>,
    ) -> Result<Checkout, ShopifyError> {
        let lines: Vec<Value> = items
            .iter()
            .map(|item| json!({ "id": item.id.as_str(), "quantity": item.quantity.get() }))
            .collect();

        let data: CartLinesUpdateData = self
            .execute(
                queries::CART_LINES_UPDATE,
                json!({ "cartId": id.as_str(), "lines": lines }),
            )
            .await?;
        convert_cart_payload(data.cart_lines_update, "cartLinesUpdate")
    }

    #[instrument(skip(self, line_item_ids), fields(cart_id = %id, lines = line_item_ids.len()))]
    async fn remove_line_items(
        &self,
        id: &CheckoutId,
        line_item_ids: Vec<LineItemId>,
    ) -> Result<Checkout, ShopifyError> {
        let line_ids: Vec<&str> = line_item_ids.iter().map(LineItemId::as_str).collect();

        let data: CartLinesRemoveData = self
            .execute(
                queries::CART_LINES_REMOVE,
                json!({ "cartId": id.as_str(), "lineIds": line_ids }),
            )
            .await?;
        convert_cart_payload(data.cart_lines_remove, "cartLinesRemove")
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<Product>, ShopifyError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let data: ProductsData = self
            .execute(queries::PRODUCTS, json!({ "first": PRODUCTS_PAGE_SIZE }))
            .await?;
        let products: Vec<Product> = data.products.nodes.into_iter().map(convert_product).collect();

        self.inner
            .cache
            .insert(
                CacheKey::Products,
                CacheValue::Products(Arc::new(products.clone())),
            )
            .await;

        Ok(products)
    }

    #[instrument(skip(self), fields(handle = %handle))]
    async fn product(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = CacheKey::Product(handle.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data: ProductData = self
            .execute(queries::PRODUCT_BY_HANDLE, json!({ "handle": handle }))
            .await?;

        let product = data
            .product
            .map(convert_product)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    #[instrument(skip(self))]
    async fn collections(&self) -> Result<Vec<Collection>, ShopifyError> {
        if let Some(CacheValue::Collections(collections)) =
            self.inner.cache.get(&CacheKey::Collections).await
        {
            debug!("Cache hit for collections");
            return Ok(collections.as_ref().clone());
        }

        let data: CollectionsData = self
            .execute(queries::COLLECTIONS, json!({ "first": COLLECTIONS_PAGE_SIZE }))
            .await?;
        let collections: Vec<Collection> = data
            .collections
            .nodes
            .into_iter()
            .map(convert_collection)
            .collect();

        self.inner
            .cache
            .insert(
                CacheKey::Collections,
                CacheValue::Collections(Arc::new(collections.clone())),
            )
            .await;

        Ok(collections)
    }

    #[instrument(skip(self), fields(handle = %handle))]
    async fn collection(&self, handle: &str) -> Result<Collection, ShopifyError> {
        let cache_key = CacheKey::Collection(handle.to_string());

        if let Some(CacheValue::Collection(collection)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let data: CollectionData = self
            .execute(
                queries::COLLECTION_BY_HANDLE,
                json!({ "handle": handle, "productCount": COLLECTION_PRODUCT_COUNT }),
            )
            .await?;

        let collection = data
            .collection
            .map(convert_collection)
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Collection(Box::new(collection.clone())),
            )
            .await;

        Ok(collection)
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), ShopifyError> {
        let data: ShopData = self.execute(queries::SHOP, json!({})).await?;
        debug!(shop = %data.shop.name, "Shopify reachable");
        Ok(())
    }
}

fn preview(body: &str) -> String {
    body.chars().take(LOG_BODY_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use magnolia_core::{Quantity, VariantId};
    use testresult::TestResult;

    use super::*;

    type Reply = Arc<dyn Fn(&Value) -> Response + Send + Sync>;

    #[derive(Clone)]
    struct Upstream {
        hits: Arc<AtomicUsize>,
        reply: Reply,
    }

    async fn graphql(
        State(upstream): State<Upstream>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        upstream.hits.fetch_add(1, Ordering::SeqCst);
        if headers.get("shopify-storefront-private-token").is_none() {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        (upstream.reply)(&body)
    }

    /// Serve a fake Storefront API on an ephemeral port.
    async fn spawn(
        reply: impl Fn(&Value) -> Response + Send + Sync + 'static,
    ) -> (ShopifyClient, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let upstream = Upstream {
            hits: Arc::clone(&hits),
            reply: Arc::new(reply),
        };
        let app = Router::new()
            .route("/graphql.json", post(graphql))
            .with_state(upstream);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let client = ShopifyClient::with_endpoint(
            format!("http://{addr}/graphql.json"),
            SecretString::from("test-token"),
        )
        .unwrap();
        (client, hits)
    }

    fn cart_json(quantity: u64) -> Value {
        json!({
            "id": "gid://shopify/Cart/1",
            "checkoutUrl": "https://midnight-magnolia.myshopify.com/cart/c/1",
            "cost": { "subtotalAmount": { "amount": "18.5", "currencyCode": "USD" } },
            "lines": { "nodes": [{
                "id": "gid://shopify/CartLine/1",
                "quantity": quantity,
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/7",
                    "title": "Default Title",
                    "availableForSale": true,
                    "price": { "amount": "18.5", "currencyCode": "USD" }
                }
            }] }
        })
    }

    fn ok(data: Value) -> Response {
        Json(json!({ "data": data })).into_response()
    }

    #[tokio::test]
    async fn test_create_checkout_maps_cart() -> TestResult {
        let (client, _) = spawn(|body| {
            if body["query"].as_str().unwrap_or_default().contains("cartCreate") {
                ok(json!({ "cartCreate": { "cart": cart_json(1), "userErrors": [] } }))
            } else {
                StatusCode::BAD_REQUEST.into_response()
            }
        })
        .await;

        let checkout = client.create_checkout().await?;

        assert_eq!(checkout.id.as_str(), "gid://shopify/Cart/1");
        assert_eq!(
            checkout.web_url,
            "https://midnight-magnolia.myshopify.com/cart/c/1"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_add_line_items_sends_merchandise_and_quantity() -> TestResult {
        let (client, _) = spawn(|body| {
            let line = &body["variables"]["lines"][0];
            if line["merchandiseId"] != "gid://shopify/ProductVariant/7" {
                return StatusCode::BAD_REQUEST.into_response();
            }
            let quantity = line["quantity"].as_u64().unwrap_or_default();
            ok(json!({ "cartLinesAdd": { "cart": cart_json(quantity), "userErrors": [] } }))
        })
        .await;

        let checkout = client
            .add_line_items(
                &CheckoutId::new("gid://shopify/Cart/1"),
                vec![LineItemInput {
                    variant_id: VariantId::new("gid://shopify/ProductVariant/7"),
                    quantity: Quantity::coerce(3),
                }],
            )
            .await?;

        assert_eq!(checkout.item_count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_cart_is_not_found() {
        let (client, _) = spawn(|_| ok(json!({ "cart": null }))).await;

        let result = client.checkout(&CheckoutId::new("gid://shopify/Cart/gone")).await;

        assert!(matches!(result, Err(ShopifyError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_user_errors_are_reported() {
        let (client, _) = spawn(|_| {
            ok(json!({ "cartLinesRemove": {
                "cart": null,
                "userErrors": [{ "field": ["lineIds"], "message": "Line not found" }]
            } }))
        })
        .await;

        let result = client
            .remove_line_items(
                &CheckoutId::new("gid://shopify/Cart/1"),
                vec![LineItemId::new("gid://shopify/CartLine/404")],
            )
            .await;

        assert!(matches!(result, Err(ShopifyError::UserError(m)) if m.contains("Line not found")));
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let (client, _) = spawn(|_| {
            (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", "7")],
                "slow down",
            )
                .into_response()
        })
        .await;

        let result = client.products().await;

        assert!(matches!(result, Err(ShopifyError::RateLimited(7))));
    }

    #[tokio::test]
    async fn test_graphql_errors_are_surfaced() {
        let (client, _) = spawn(|_| {
            Json(json!({ "errors": [{ "message": "Throttled" }] })).into_response()
        })
        .await;

        let err = client.collections().await.unwrap_err();

        assert!(matches!(err, ShopifyError::GraphQL(_)));
        assert!(err.to_string().contains("Throttled"));
    }

    #[tokio::test]
    async fn test_server_error_is_graphql_error() {
        let (client, _) =
            spawn(|_| (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response())
                .await;

        let err = client.ping().await.unwrap_err();

        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_catalog_reads_are_cached() -> TestResult {
        let (client, hits) = spawn(|_| {
            ok(json!({ "products": { "nodes": [{
                "id": "gid://shopify/Product/9",
                "handle": "magnolia-candle",
                "title": "Magnolia Candle"
            }] } }))
        })
        .await;

        let first = client.products().await?;
        let second = client.products().await?;

        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cart_reads_are_not_cached() -> TestResult {
        let (client, hits) = spawn(|_| ok(json!({ "cart": cart_json(1) }))).await;
        let id = CheckoutId::new("gid://shopify/Cart/1");

        client.checkout(&id).await?;
        client.checkout(&id).await?;

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        Ok(())
    }
}
