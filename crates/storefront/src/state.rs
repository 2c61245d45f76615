//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::CommerceBackend;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The server holds no per-shopper
/// state; the checkout ID travels with every request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    backend: Arc<dyn CommerceBackend>,
}

impl AppState {
    /// Create a new application state over a commerce backend.
    #[must_use]
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { backend }),
        }
    }

    /// Get a reference to the commerce backend.
    #[must_use]
    pub fn backend(&self) -> &dyn CommerceBackend {
        self.inner.backend.as_ref()
    }
}
