//! End-to-end test support for Midnight Magnolia.
//!
//! The tests in `tests/` run the real storefront router on a loopback port
//! over [`InMemoryShop`], a [`CommerceBackend`] that behaves like Shopify's
//! Cart API (additive adds, not-found for expired carts), and drive it with
//! the real `HttpCheckoutClient` and `CartSession`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p magnolia-integration-tests
//! ```
//!
//! No network access or Shopify credentials are needed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use magnolia_cart::CartConfig;
use magnolia_core::wire::{LineItemInput, LineItemUpdate};
use magnolia_core::{
    Checkout, CheckoutId, Collection, CollectionId, LineItem, LineItemId, Product, ProductId,
    Variant, VariantId,
};
use magnolia_storefront::shopify::ShopifyError;
use magnolia_storefront::{AppState, CommerceBackend};
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Candle variant, $12, in stock.
pub const CANDLE_VARIANT: &str = "variant-A";
/// Large candle variant, $18, sold out.
pub const SOLD_OUT_VARIANT: &str = "variant-B";
/// Soap variant, $8, in stock.
pub const SOAP_VARIANT: &str = "variant-C";

// =============================================================================
// In-memory commerce backend
// =============================================================================

/// Shopify stand-in holding carts in memory.
#[derive(Debug)]
pub struct InMemoryShop {
    carts: Mutex<HashMap<CheckoutId, Checkout>>,
    products: Vec<Product>,
    collections: Vec<Collection>,
    next_id: AtomicU64,
    down: AtomicBool,
    creates: AtomicUsize,
    mutations: AtomicUsize,
}

impl Default for InMemoryShop {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryShop {
    /// A shop with a small seeded catalog and no carts.
    #[must_use]
    pub fn new() -> Self {
        let candle = Product {
            id: ProductId::new("gid://shopify/Product/1"),
            handle: "magnolia-candle".to_string(),
            title: "Magnolia Candle".to_string(),
            description: "Hand-poured soy candle.".to_string(),
            images: vec![],
            variants: vec![
                variant(CANDLE_VARIANT, "Small", 12, true),
                variant(SOLD_OUT_VARIANT, "Large", 18, false),
            ],
            tags: vec!["candles".to_string()],
        };
        let soap = Product {
            id: ProductId::new("gid://shopify/Product/2"),
            handle: "gardenia-soap".to_string(),
            title: "Gardenia Soap".to_string(),
            description: String::new(),
            images: vec![],
            variants: vec![variant(SOAP_VARIANT, "Default Title", 8, true)],
            tags: vec![],
        };
        let collection = Collection {
            id: CollectionId::new("gid://shopify/Collection/1"),
            handle: "home".to_string(),
            title: "Home".to_string(),
            description: String::new(),
            image: None,
            products: vec![candle.clone(), soap.clone()],
        };

        Self {
            carts: Mutex::new(HashMap::new()),
            products: vec![candle, soap],
            collections: vec![collection],
            next_id: AtomicU64::new(1),
            down: AtomicBool::new(false),
            creates: AtomicUsize::new(0),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Make every call fail as if Shopify were unreachable.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Forget a cart, as Shopify does once it expires or becomes an order.
    pub fn expire(&self, id: &CheckoutId) {
        self.carts().remove(id);
    }

    /// Number of carts created so far.
    #[must_use]
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of line item mutations received so far.
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Stored copy of a cart.
    #[must_use]
    pub fn cart(&self, id: &CheckoutId) -> Option<Checkout> {
        self.carts().get(id).cloned()
    }

    fn carts(&self) -> MutexGuard<'_, HashMap<CheckoutId, Checkout>> {
        self.carts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_up(&self) -> Result<(), ShopifyError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ShopifyError::graphql("HTTP 503 Service Unavailable: shop is down"));
        }
        Ok(())
    }

    fn find_variant(&self, id: &VariantId) -> Option<&Variant> {
        self.products.iter().find_map(|product| product.variant(id))
    }

    /// Apply `change` to a stored cart and return the recomputed result.
    fn with_cart(
        &self,
        id: &CheckoutId,
        change: impl FnOnce(&mut Checkout) -> Result<(), ShopifyError>,
    ) -> Result<Checkout, ShopifyError> {
        self.check_up()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);

        let mut carts = self.carts();
        let cart = carts
            .get_mut(id)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {id}")))?;
        change(cart)?;
        cart.subtotal_price = cart.line_items.iter().map(LineItem::line_price).sum();
        Ok(cart.clone())
    }
}

fn variant(id: &str, title: &str, price: i64, available: bool) -> Variant {
    Variant {
        id: VariantId::new(id),
        price: Decimal::from(price),
        title: Some(title.to_string()),
        image: None,
        available,
    }
}

#[async_trait]
impl CommerceBackend for InMemoryShop {
    async fn create_checkout(&self) -> Result<Checkout, ShopifyError> {
        self.check_up()?;
        self.creates.fetch_add(1, Ordering::SeqCst);

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let checkout = Checkout::empty(
            CheckoutId::new(format!("gid://shopify/Cart/{n}")),
            format!("https://checkout.midnightmagnolia.example/cart/{n}"),
        );
        self.carts().insert(checkout.id.clone(), checkout.clone());
        Ok(checkout)
    }

    async fn checkout(&self, id: &CheckoutId) -> Result<Checkout, ShopifyError> {
        self.check_up()?;
        self.cart(id)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {id}")))
    }

    async fn add_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemInput>,
    ) -> Result<Checkout, ShopifyError> {
        self.with_cart(id, |cart| {
            for item in items {
                let variant = self.find_variant(&item.variant_id).ok_or_else(|| {
                    ShopifyError::UserError(format!(
                        "The merchandise with id {} does not exist. (lines.0.merchandiseId)",
                        item.variant_id
                    ))
                })?;

                match cart
                    .line_items
                    .iter_mut()
                    .find(|line| line.variant.id == item.variant_id)
                {
                    Some(line) => line.quantity = line.quantity.saturating_add(item.quantity.get()),
                    None => {
                        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                        cart.line_items.push(LineItem {
                            id: LineItemId::new(format!("gid://shopify/CartLine/{n}")),
                            quantity: item.quantity.get(),
                            variant: variant.clone(),
                        });
                    }
                }
            }
            Ok(())
        })
    }

    async fn update_line_items(
        &self,
        id: &CheckoutId,
        items: Vec<LineItemUpdate>,
    ) -> Result<Checkout, ShopifyError> {
        self.with_cart(id, |cart| {
            for item in items {
                let line = cart
                    .line_items
                    .iter_mut()
                    .find(|line| line.id == item.id)
                    .ok_or_else(|| {
                        ShopifyError::UserError(format!("Line {} does not exist. (lines.0.id)", item.id))
                    })?;
                line.quantity = item.quantity.get();
            }
            Ok(())
        })
    }

    async fn remove_line_items(
        &self,
        id: &CheckoutId,
        line_item_ids: Vec<LineItemId>,
    ) -> Result<Checkout, ShopifyError> {
        self.with_cart(id, |cart| {
            cart.line_items.retain(|line| !line_item_ids.contains(&line.id));
            Ok(())
        })
    }

    async fn products(&self) -> Result<Vec<Product>, ShopifyError> {
        self.check_up()?;
        Ok(self.products.clone())
    }

    async fn product(&self, handle: &str) -> Result<Product, ShopifyError> {
        self.check_up()?;
        self.products
            .iter()
            .find(|product| product.handle == handle)
            .cloned()
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))
    }

    async fn collections(&self) -> Result<Vec<Collection>, ShopifyError> {
        self.check_up()?;
        Ok(self.collections.clone())
    }

    async fn collection(&self, handle: &str) -> Result<Collection, ShopifyError> {
        self.check_up()?;
        self.collections
            .iter()
            .find(|collection| collection.handle == handle)
            .cloned()
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))
    }

    async fn ping(&self) -> Result<(), ShopifyError> {
        self.check_up()
    }
}

// =============================================================================
// Test server
// =============================================================================

/// The storefront API served on a loopback port. Stops when dropped.
#[derive(Debug)]
pub struct TestServer {
    /// Base URL ending in `/`.
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve the storefront API over `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if no loopback port can be bound.
    pub async fn spawn(backend: Arc<dyn CommerceBackend>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = magnolia_storefront::app(AppState::new(backend), None);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!(error = %e, "Test server stopped");
            }
        });

        Ok(Self {
            base_url: format!("http://{addr}/"),
            handle,
        })
    }

    /// Absolute URL for `path` (no leading slash).
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Cart configuration pointing at this server.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is rejected, which cannot happen for
    /// a loopback `http` address.
    pub fn cart_config(&self) -> Result<CartConfig, magnolia_cart::ConfigError> {
        CartConfig::default().with_api_url(&self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
