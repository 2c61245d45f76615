//! Cart commands.
//!
//! Quantities typed by the shopper are clamped to `1..=MAX_UI_QUANTITY`
//! here, before they reach the cart session.

use std::sync::Arc;

use magnolia_cart::{CartSession, CatalogProvider};
use magnolia_core::{Checkout, LineItemId, Quantity, VariantId};

use tracing::warn;

use super::{CommandError, render};

fn current_checkout(session: &CartSession) -> Result<Arc<Checkout>, CommandError> {
    let state = session.state();
    state.checkout.ok_or_else(|| {
        CommandError::NoCheckout(
            state
                .error
                .unwrap_or_else(|| "the cart has not been created".to_string()),
        )
    })
}

fn require_line(checkout: &Checkout, line_item_id: &LineItemId) -> Result<(), CommandError> {
    checkout
        .line_item(line_item_id)
        .map(|_| ())
        .ok_or_else(|| CommandError::UnknownLineItem(line_item_id.clone()))
}

/// Show the cart.
pub fn show(session: &CartSession) -> Result<String, CommandError> {
    Ok(render::checkout(&*current_checkout(session)?))
}

/// Add a variant unless the catalog lists it as sold out.
///
/// The catalog listing is a single page, so a variant missing from it is
/// passed through and the provider decides whether it exists.
pub async fn add(
    session: &CartSession,
    catalog: &dyn CatalogProvider,
    variant_id: &VariantId,
    quantity: i64,
) -> Result<String, CommandError> {
    current_checkout(session)?;

    match catalog.products().await {
        Ok(products) => {
            let sold_out = products
                .iter()
                .find_map(|product| product.variant(variant_id))
                .is_some_and(|variant| !variant.available);
            if sold_out {
                return Err(CommandError::SoldOut(variant_id.clone()));
            }
        }
        Err(e) => warn!(error = %e, "Catalog unavailable, skipping availability check"),
    }

    let quantity = Quantity::clamp_for_display(quantity);
    let checkout = session
        .add_item_to_checkout(variant_id, i64::from(quantity.get()))
        .await?;
    Ok(render::checkout(&checkout))
}

/// Set a line item's quantity.
pub async fn update(
    session: &CartSession,
    line_item_id: &LineItemId,
    quantity: i64,
) -> Result<String, CommandError> {
    require_line(&*current_checkout(session)?, line_item_id)?;

    let quantity = Quantity::clamp_for_display(quantity);
    let checkout = session
        .update_checkout_item(line_item_id, i64::from(quantity.get()))
        .await?;
    Ok(render::checkout(&checkout))
}

/// Remove a line item.
pub async fn remove(
    session: &CartSession,
    line_item_id: &LineItemId,
) -> Result<String, CommandError> {
    require_line(&*current_checkout(session)?, line_item_id)?;

    let checkout = session.remove_checkout_item(line_item_id).await?;
    Ok(render::checkout(&checkout))
}

/// Print the hosted checkout URL for payment.
pub fn checkout(session: &CartSession) -> Result<String, CommandError> {
    let checkout = current_checkout(session)?;
    if checkout.is_empty() {
        return Err(CommandError::EmptyCart);
    }
    Ok(format!("Complete your purchase at:\n{}", checkout.web_url))
}

/// Flip the cart drawer.
pub fn toggle(session: &CartSession) -> String {
    session.toggle_cart();
    let state = session.state();
    if !state.is_cart_open {
        return "Cart closed.".to_string();
    }
    state
        .checkout
        .map_or_else(|| "Cart opened.".to_string(), |checkout| render::checkout(&checkout))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use magnolia_cart::{CartConfig, CheckoutProvider, ClientError, MemorySessionStore};
    use magnolia_core::wire::{LineItemInput, LineItemUpdate};
    use magnolia_core::{CheckoutId, Collection, LineItem, Product, ProductId, Variant};
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    /// In-process shop: one checkout, a fixed catalog, and a call log.
    struct StubShop {
        checkout: Mutex<Checkout>,
        products: Vec<Product>,
        mutations: AtomicUsize,
        sent_quantities: Mutex<Vec<u32>>,
    }

    impl StubShop {
        fn new() -> Self {
            let product = Product {
                id: ProductId::new("p1"),
                handle: "magnolia-candle".to_string(),
                title: "Magnolia Candle".to_string(),
                description: String::new(),
                images: vec![],
                variants: vec![variant("variant-A", true), variant("variant-B", false)],
                tags: vec![],
            };
            Self {
                checkout: Mutex::new(Checkout::empty(
                    CheckoutId::new("c1"),
                    "https://pay.example/c1",
                )),
                products: vec![product],
                mutations: AtomicUsize::new(0),
                sent_quantities: Mutex::new(Vec::new()),
            }
        }

        fn with_line(self, line: &str, quantity: u32) -> Self {
            {
                let mut checkout = self.checkout.lock().unwrap();
                checkout.line_items.push(LineItem {
                    id: LineItemId::new(line),
                    quantity,
                    variant: variant("variant-A", true),
                });
                recompute(&mut checkout);
            }
            self
        }
    }

    fn variant(id: &str, available: bool) -> Variant {
        Variant {
            id: VariantId::new(id),
            price: Decimal::from(12),
            title: None,
            image: None,
            available,
        }
    }

    fn recompute(checkout: &mut Checkout) {
        checkout.subtotal_price = checkout.line_items.iter().map(LineItem::line_price).sum();
    }

    #[async_trait]
    impl CheckoutProvider for StubShop {
        async fn create_session(&self) -> Result<Checkout, ClientError> {
            Ok(self.checkout.lock().unwrap().clone())
        }

        async fn fetch_session(&self, _id: &CheckoutId) -> Result<Option<Checkout>, ClientError> {
            Ok(Some(self.checkout.lock().unwrap().clone()))
        }

        async fn add_line_items(
            &self,
            _id: &CheckoutId,
            items: Vec<LineItemInput>,
        ) -> Result<Checkout, ClientError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut checkout = self.checkout.lock().unwrap();
            for item in items {
                self.sent_quantities.lock().unwrap().push(item.quantity.get());
                let id = LineItemId::new(format!("line-{}", checkout.line_items.len() + 1));
                checkout.line_items.push(LineItem {
                    id,
                    quantity: item.quantity.get(),
                    variant: variant(item.variant_id.as_str(), true),
                });
            }
            recompute(&mut checkout);
            Ok(checkout.clone())
        }

        async fn update_line_items(
            &self,
            _id: &CheckoutId,
            items: Vec<LineItemUpdate>,
        ) -> Result<Checkout, ClientError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut checkout = self.checkout.lock().unwrap();
            for item in items {
                self.sent_quantities.lock().unwrap().push(item.quantity.get());
                if let Some(line) = checkout.line_items.iter_mut().find(|l| l.id == item.id) {
                    line.quantity = item.quantity.get();
                }
            }
            recompute(&mut checkout);
            Ok(checkout.clone())
        }

        async fn remove_line_items(
            &self,
            _id: &CheckoutId,
            line_item_ids: Vec<LineItemId>,
        ) -> Result<Checkout, ClientError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut checkout = self.checkout.lock().unwrap();
            checkout.line_items.retain(|line| !line_item_ids.contains(&line.id));
            recompute(&mut checkout);
            Ok(checkout.clone())
        }
    }

    #[async_trait]
    impl CatalogProvider for StubShop {
        async fn products(&self) -> Result<Vec<Product>, ClientError> {
            Ok(self.products.clone())
        }

        async fn product(&self, handle: &str) -> Result<Product, ClientError> {
            self.products
                .iter()
                .find(|p| p.handle == handle)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(handle.to_string()))
        }

        async fn collections(&self) -> Result<Vec<Collection>, ClientError> {
            Ok(vec![])
        }

        async fn collection(&self, handle: &str) -> Result<Collection, ClientError> {
            Err(ClientError::NotFound(handle.to_string()))
        }
    }

    async fn open(shop: &Arc<StubShop>) -> CartSession {
        CartSession::open(
            shop.clone(),
            Arc::new(MemorySessionStore::new()),
            &CartConfig::default(),
        )
        .await
    }

    #[tokio::test]
    async fn test_update_clamps_to_ten() -> TestResult {
        let shop = Arc::new(StubShop::new().with_line("line-1", 1));
        let session = open(&shop).await;

        let output = update(&session, &LineItemId::new("line-1"), 15).await?;

        assert_eq!(*shop.sent_quantities.lock().unwrap(), vec![10]);
        assert!(output.contains("10 x variant-A"));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_clamps_low_quantities_to_one() -> TestResult {
        let shop = Arc::new(StubShop::new());
        let session = open(&shop).await;

        add(&session, shop.as_ref(), &VariantId::new("variant-A"), -4).await?;

        assert_eq!(*shop.sent_quantities.lock().unwrap(), vec![1]);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_refuses_sold_out_variant() {
        let shop = Arc::new(StubShop::new());
        let session = open(&shop).await;

        let result = add(&session, shop.as_ref(), &VariantId::new("variant-B"), 1).await;

        assert!(matches!(result, Err(CommandError::SoldOut(_))));
        assert_eq!(shop.mutations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_add_passes_variant_missing_from_listing() -> TestResult {
        // Listed catalog is the first page only; this variant lives further on.
        let shop = Arc::new(StubShop::new());
        let session = open(&shop).await;

        let output = add(&session, shop.as_ref(), &VariantId::new("variant-Z"), 2).await?;

        assert_eq!(shop.mutations.load(Ordering::SeqCst), 1);
        assert_eq!(*shop.sent_quantities.lock().unwrap(), vec![2]);
        assert!(output.contains("2 x variant-Z"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_line_makes_no_call() {
        let shop = Arc::new(StubShop::new());
        let session = open(&shop).await;

        let result = remove(&session, &LineItemId::new("line-9")).await;

        assert!(matches!(result, Err(CommandError::UnknownLineItem(_))));
        assert_eq!(shop.mutations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remove_last_line_empties_cart() -> TestResult {
        let shop = Arc::new(StubShop::new().with_line("line-1", 2));
        let session = open(&shop).await;

        let output = remove(&session, &LineItemId::new("line-1")).await?;

        assert_eq!(output, "Your cart is empty.");
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_requires_items() -> TestResult {
        let shop = Arc::new(StubShop::new());
        let session = open(&shop).await;
        assert!(matches!(checkout(&session), Err(CommandError::EmptyCart)));

        let shop = Arc::new(StubShop::new().with_line("line-1", 1));
        let session = open(&shop).await;
        assert!(checkout(&session)?.ends_with("https://pay.example/c1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_and_makes_no_calls() {
        let shop = Arc::new(StubShop::new());
        let session = open(&shop).await;

        assert_eq!(toggle(&session), "Your cart is empty.");
        assert_eq!(toggle(&session), "Cart closed.");
        assert!(!session.state().is_cart_open);
        assert_eq!(shop.mutations.load(Ordering::SeqCst), 0);
    }
}
