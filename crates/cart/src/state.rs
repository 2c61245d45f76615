//! Cart state container.
//!
//! Holds the last provider-confirmed [`Checkout`] plus UI flags. All changes
//! go through [`CartState::reduce`], a total function of `(state, action)`;
//! the checkout itself is only ever replaced wholesale by
//! [`CartAction::SetCheckout`], so the container can never hold line items
//! the provider did not confirm.

use std::sync::Arc;

use magnolia_core::{Checkout, Collection, Product};
use tokio::sync::watch;

/// Snapshot of the cart as seen by presentation code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Whether the cart drawer is open.
    pub is_cart_open: bool,
    /// Last checkout confirmed by the provider.
    pub checkout: Option<Arc<Checkout>>,
    /// Catalog products loaded for display.
    pub products: Vec<Product>,
    /// Catalog collections loaded for display.
    pub collections: Vec<Collection>,
    /// A provider call is in flight.
    pub loading: bool,
    /// Shopper-facing message from the last failed call.
    pub error: Option<String>,
}

/// State transitions.
#[derive(Debug, Clone)]
pub enum CartAction {
    SetLoading(bool),
    SetError(String),
    SetCheckout(Arc<Checkout>),
    SetProducts(Vec<Product>),
    SetCollections(Vec<Collection>),
    ToggleCart,
}

impl CartState {
    /// Apply an action, producing the next state.
    #[must_use]
    pub fn reduce(self, action: CartAction) -> Self {
        match action {
            CartAction::SetLoading(loading) => Self { loading, ..self },
            CartAction::SetError(message) => Self {
                error: Some(message),
                loading: false,
                ..self
            },
            // A confirmed checkout supersedes any earlier failure.
            CartAction::SetCheckout(checkout) => Self {
                checkout: Some(checkout),
                loading: false,
                error: None,
                ..self
            },
            CartAction::SetProducts(products) => Self { products, ..self },
            CartAction::SetCollections(collections) => Self {
                collections,
                ..self
            },
            CartAction::ToggleCart => Self {
                is_cart_open: !self.is_cart_open,
                ..self
            },
        }
    }

    /// Number of units in the cart, zero without a checkout.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.checkout.as_deref().map_or(0, Checkout::item_count)
    }
}

/// Observable holder for [`CartState`].
///
/// Subscribers receive every new state; only [`CartStore::dispatch`] writes.
#[derive(Debug)]
pub struct CartStore {
    tx: watch::Sender<CartState>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(CartState::default())
    }
}

impl CartStore {
    /// Create a store holding `initial`.
    #[must_use]
    pub fn new(initial: CartState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Reduce `action` into the held state and notify subscribers.
    pub fn dispatch(&self, action: CartAction) {
        self.tx.send_modify(|state| {
            let current = std::mem::take(state);
            *state = current.reduce(action);
        });
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every subsequent state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.tx.subscribe()
    }
}
