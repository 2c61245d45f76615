//! Command implementations.
//!
//! Each command returns the text to print; `main` decides where it goes.

pub mod cart;
pub mod catalog;
mod render;

use magnolia_cart::{CartError, ClientError, ConfigError};
use magnolia_core::{LineItemId, VariantId};
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("No checkout available: {0}")]
    NoCheckout(String),

    #[error("Variant {0} is sold out")]
    SoldOut(VariantId),

    #[error("Line item {0} is not in the cart")]
    UnknownLineItem(LineItemId),

    #[error("Your cart is empty")]
    EmptyCart,
}

impl CommandError {
    /// Message for the shopper. Provider details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) | Self::Cart(CartError::Client(e)) => e.user_message().to_string(),
            Self::Cart(CartError::NoSession) => {
                "The cart is unavailable because the store could not be reached.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Print command output to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(output: &str) {
    println!("{output}");
}

/// Print a failed command's message to stderr.
#[allow(clippy::print_stderr)]
pub fn emit_error(error: &CommandError) {
    eprintln!("error: {}", error.user_message());
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_user_message_hides_provider_detail() {
        let err = CommandError::Cart(CartError::Client(ClientError::ProviderUnavailable(
            "HTTP 502 from storefront".to_string(),
        )));
        assert!(!err.user_message().contains("502"));

        let err = CommandError::Client(ClientError::Timeout(Duration::from_secs(10)));
        assert!(err.user_message().contains("too long"));
    }

    #[test]
    fn test_local_errors_keep_their_text() {
        let err = CommandError::SoldOut(VariantId::new("v1"));
        assert_eq!(err.user_message(), "Variant v1 is sold out");
    }
}
