//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - GraphQL documents are plain strings in [`queries`]; responses are decoded
//!   with `serde` into the raw shapes in `types` and converted to
//!   `magnolia_core` types in `conversions`
//! - Shopify is source of truth - NO local sync, direct API calls
//! - Products and collections are cached in memory via `moka` (5 minute TTL);
//!   carts are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use magnolia_storefront::shopify::ShopifyClient;
//!
//! let client = ShopifyClient::new(&config.shopify)?;
//!
//! let product = client.product("magnolia-candle").await?;
//! let checkout = client.create_checkout().await?;
//! ```

mod client;
mod conversions;
pub mod queries;
mod types;

pub use client::ShopifyClient;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),
}

impl ShopifyError {
    /// A single synthetic GraphQL error carrying `message`.
    #[must_use]
    pub fn graphql(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }])
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Source locations in the query.
    #[serde(default)]
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("Cart not found: gid://shopify/Cart/1".to_string());
        assert_eq!(err.to_string(), "Not found: Cart not found: gid://shopify/Cart/1");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_deserializes_path_and_location() {
        let json = r#"{"path":["cartLinesAdd",0],"locations":[{"line":5,"column":10}]}"#;
        let error: GraphQLError = serde_json::from_str(json).unwrap();
        let err = ShopifyError::GraphQL(vec![error]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: cartLinesAdd.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_no_details() {
        let err = ShopifyError::graphql("");
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");
    }

    #[test]
    fn test_graphql_error_empty_vec() {
        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
