//! Error types for the cart session manager.
//!
//! Three layers, mirroring the components:
//! - [`StorageError`] - session persistence failures. Logged and swallowed,
//!   never surfaced to the shopper.
//! - [`ClientError`] - checkout provider failures. Surfaced to the shopper
//!   through [`ClientError::user_message`].
//! - [`CartError`] - facade results.

use std::time::Duration;

use thiserror::Error;

/// Session persistence failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage could not be read or written (permissions, read-only media,
    /// missing home directory).
    #[error("session storage unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// Storage was readable but its contents could not be decoded.
    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Checkout provider failure.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The provider could not be reached or returned a server-side failure.
    #[error("commerce provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider rejected the request as malformed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The requested checkout, product or collection does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The provider did not answer in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with a body we could not understand.
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Short, non-empty message suitable for showing to a shopper.
    ///
    /// Provider details stay in the logs.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable(_) | Self::Protocol(_) => {
                "We couldn't reach the store right now. Your cart is unchanged; please try again."
            }
            Self::Timeout(_) => {
                "The store is taking too long to respond. Your cart is unchanged; please try again."
            }
            Self::Validation(_) => "That cart update wasn't accepted. Please check and try again.",
            // Raised for missing checkouts, products and collections alike.
            Self::NotFound(_) => {
                "We couldn't find that in the store. Please refresh and try again."
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Protocol(err.to_string())
        } else {
            Self::ProviderUnavailable(err.to_string())
        }
    }
}

/// Result of a cart facade operation.
#[derive(Debug, Error)]
pub enum CartError {
    /// No checkout session has been established; the call had no effect.
    #[error("no checkout session")]
    NoSession,

    /// The provider call failed; the previous checkout is still in place.
    #[error(transparent)]
    Client(#[from] ClientError),
}
