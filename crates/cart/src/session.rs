//! Cart facade.
//!
//! [`CartSession`] is the only entry point presentation code uses to change
//! the cart. It is constructed explicitly with its collaborators and torn down
//! with [`CartSession::close`]; there is no ambient global cart.
//!
//! # Lifecycle
//!
//! ```text
//! open ─► load stored id ─┬─ found ─► fetch_session ─┬─ Some ─► SetCheckout
//!                         │                          └─ None / Err ─┐
//!                         └─ absent ────────────────────────────────┴─► create_session
//!                                                                        ├─ Ok  ─► save id, SetCheckout
//!                                                                        └─ Err ─► SetError (cart disabled)
//! ```
//!
//! # Mutations
//!
//! Each mutation takes the session's mutation gate, a FIFO-fair async mutex,
//! so at most one provider mutation is in flight per session and responses
//! are applied in call order. Every provider call is bounded by the configured
//! request timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use magnolia_core::wire::{LineItemInput, LineItemUpdate};
use magnolia_core::{Checkout, CheckoutId, LineItemId, Quantity, VariantId};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::client::{CatalogProvider, CheckoutProvider};
use crate::config::CartConfig;
use crate::error::{CartError, ClientError};
use crate::session_store::SessionStore;
use crate::state::{CartAction, CartState, CartStore};

/// A shopper's cart session.
pub struct CartSession {
    provider: Arc<dyn CheckoutProvider>,
    sessions: Arc<dyn SessionStore>,
    store: CartStore,
    mutations: Mutex<()>,
    request_timeout: Duration,
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession")
            .field("state", &self.store.snapshot())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl CartSession {
    /// Open a session, rehydrating the stored checkout or creating a new one.
    ///
    /// Never fails: if no checkout can be established the session opens in a
    /// degraded state with `error` set and every mutation returns
    /// [`CartError::NoSession`].
    #[instrument(skip_all)]
    pub async fn open(
        provider: Arc<dyn CheckoutProvider>,
        sessions: Arc<dyn SessionStore>,
        config: &CartConfig,
    ) -> Self {
        let session = Self {
            provider,
            sessions,
            store: CartStore::default(),
            mutations: Mutex::new(()),
            request_timeout: config.request_timeout,
        };
        session.initialize().await;
        session
    }

    async fn initialize(&self) {
        self.store.dispatch(CartAction::SetLoading(true));

        if let Some(stored) = self.sessions.load() {
            match self.bounded(self.provider.fetch_session(&stored)).await {
                Ok(Some(checkout)) => {
                    info!(checkout_id = %checkout.id, "Rehydrated stored checkout");
                    self.install(checkout);
                    return;
                }
                Ok(None) => {
                    info!(checkout_id = %stored, "Stored checkout no longer exists, creating a new one");
                }
                Err(e) => {
                    warn!(checkout_id = %stored, error = %e, "Could not rehydrate stored checkout, creating a new one");
                }
            }
        }

        match self.bounded(self.provider.create_session()).await {
            Ok(checkout) => {
                info!(checkout_id = %checkout.id, "Created checkout");
                self.install(checkout);
            }
            Err(e) => {
                warn!(error = %e, "Could not create checkout, cart features disabled");
                self.store
                    .dispatch(CartAction::SetError(e.user_message().to_string()));
            }
        }
    }

    // =========================================================================
    // Facade
    // =========================================================================

    /// Add `quantity` units of a variant.
    ///
    /// The quantity is coerced to at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NoSession`] without touching state if no checkout
    /// exists, or [`CartError::Client`] if the provider call fails (the
    /// previous checkout stays in place and `error` is set).
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn add_item_to_checkout(
        &self,
        variant_id: &VariantId,
        quantity: i64,
    ) -> Result<Arc<Checkout>, CartError> {
        let items = vec![LineItemInput {
            variant_id: variant_id.clone(),
            quantity: Quantity::coerce(quantity),
        }];
        self.mutate("add", move |id| async move {
            self.provider.add_line_items(&id, items).await
        })
        .await
    }

    /// Set the absolute quantity of a line item.
    ///
    /// The quantity is coerced to at least 1; no upper bound is applied here.
    ///
    /// # Errors
    ///
    /// Same as [`CartSession::add_item_to_checkout`].
    #[instrument(skip(self), fields(line_item_id = %line_item_id))]
    pub async fn update_checkout_item(
        &self,
        line_item_id: &LineItemId,
        quantity: i64,
    ) -> Result<Arc<Checkout>, CartError> {
        let items = vec![LineItemUpdate {
            id: line_item_id.clone(),
            quantity: Quantity::coerce(quantity),
        }];
        self.mutate("update", move |id| async move {
            self.provider.update_line_items(&id, items).await
        })
        .await
    }

    /// Remove a line item.
    ///
    /// # Errors
    ///
    /// Same as [`CartSession::add_item_to_checkout`].
    #[instrument(skip(self), fields(line_item_id = %line_item_id))]
    pub async fn remove_checkout_item(
        &self,
        line_item_id: &LineItemId,
    ) -> Result<Arc<Checkout>, CartError> {
        let ids = vec![line_item_id.clone()];
        self.mutate("remove", move |id| async move {
            self.provider.remove_line_items(&id, ids).await
        })
        .await
    }

    /// Open or close the cart drawer. No network.
    pub fn toggle_cart(&self) {
        self.store.dispatch(CartAction::ToggleCart);
    }

    /// Load the first page of products and collections into state.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Client`] if either lookup fails; `error` is set
    /// and the previous catalog lists are kept.
    #[instrument(skip_all)]
    pub async fn refresh_catalog(&self, catalog: &dyn CatalogProvider) -> Result<(), CartError> {
        let result = async {
            let products = self.bounded(catalog.products()).await?;
            let collections = self.bounded(catalog.collections()).await?;
            Ok::<_, ClientError>((products, collections))
        }
        .await;

        match result {
            Ok((products, collections)) => {
                debug!(
                    products = products.len(),
                    collections = collections.len(),
                    "Catalog refreshed"
                );
                self.store.dispatch(CartAction::SetProducts(products));
                self.store.dispatch(CartAction::SetCollections(collections));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Catalog refresh failed");
                self.store
                    .dispatch(CartAction::SetError(e.user_message().to_string()));
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.store.snapshot()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.store.subscribe()
    }

    /// Current checkout, if one has been established.
    #[must_use]
    pub fn checkout(&self) -> Option<Arc<Checkout>> {
        self.store.snapshot().checkout
    }

    /// Hosted checkout URL for the payment handoff.
    #[must_use]
    pub fn checkout_url(&self) -> Option<String> {
        self.checkout().map(|checkout| checkout.web_url.clone())
    }

    /// Tear down the session, returning its final state.
    ///
    /// The stored checkout ID is kept so the cart survives into the next
    /// session.
    pub fn close(self) -> CartState {
        let state = self.store.snapshot();
        debug!(
            checkout_id = ?state.checkout.as_ref().map(|c| c.id.as_str()),
            "Cart session closed"
        );
        state
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run one serialized mutation against the current checkout.
    async fn mutate<F, Fut>(&self, operation: &'static str, call: F) -> Result<Arc<Checkout>, CartError>
    where
        F: FnOnce(CheckoutId) -> Fut + Send,
        Fut: Future<Output = Result<Checkout, ClientError>> + Send,
    {
        let _gate = self.mutations.lock().await;

        let Some(id) = self.checkout().map(|checkout| checkout.id.clone()) else {
            debug!(operation, "No checkout session, ignoring cart mutation");
            return Err(CartError::NoSession);
        };

        self.store.dispatch(CartAction::SetLoading(true));
        let loading = LoadingGuard::new(&self.store);

        let result = self.bounded(call(id)).await;
        loading.settle();

        match result {
            Ok(checkout) => Ok(self.install(checkout)),
            Err(e) => {
                warn!(operation, error = %e, "Cart mutation failed, keeping last confirmed checkout");
                self.store
                    .dispatch(CartAction::SetError(e.user_message().to_string()));
                Err(e.into())
            }
        }
    }

    /// Replace the held checkout, persisting its ID if it changed.
    fn install(&self, checkout: Checkout) -> Arc<Checkout> {
        let previous = self.checkout().map(|c| c.id.clone());
        if previous.as_ref() != Some(&checkout.id) {
            self.sessions.save(&checkout.id);
        }

        let checkout = Arc::new(checkout);
        self.store
            .dispatch(CartAction::SetCheckout(Arc::clone(&checkout)));
        checkout
    }

    /// Bound a provider call by the request timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| ClientError::Timeout(self.request_timeout))?
    }
}

/// Clears `loading` if a mutation is dropped before its result is applied.
///
/// A caller may abandon the mutation future (a `select!`, an outer timeout);
/// without this the flag would stay set until the next mutation finished.
struct LoadingGuard<'a> {
    store: &'a CartStore,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    const fn new(store: &'a CartStore) -> Self {
        Self { store, armed: true }
    }

    /// The provider answered; the caller now dispatches the outcome.
    fn settle(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Cart mutation abandoned in flight");
            self.store.dispatch(CartAction::SetLoading(false));
        }
    }
}
