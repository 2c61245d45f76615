//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`;
//! every error leaves as a `{ "error": "…" }` JSON body.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use magnolia_core::wire::ErrorBody;
use thiserror::Error;

use crate::shopify::ShopifyError;

/// Application-level error type for the storefront API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The route exists but not for this method. Carries the `Allow` value.
    #[error("Method not allowed")]
    MethodNotAllowed(Option<HeaderValue>),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Lift Shopify's own not-found and throttling into client-facing errors.
    fn normalize(self) -> Self {
        match self {
            Self::Shopify(ShopifyError::NotFound(what)) => Self::NotFound(what),
            Self::Shopify(ShopifyError::RateLimited(_)) => Self::RateLimited,
            other => other,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shopify(ShopifyError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Shopify(ShopifyError::RateLimited(_)) | Self::RateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let this = self.normalize();

        // Capture server errors to Sentry
        if matches!(this, Self::Internal(_) | Self::Shopify(_)) {
            let event_id = sentry::capture_error(&this);
            tracing::error!(
                error = %this,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = this.status();

        // Don't expose internal error details to clients
        let message = match &this {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Shopify(_) => "External service error".to_string(),
            Self::NotFound(what) => what.clone(),
            Self::BadRequest(reason) => reason.clone(),
            Self::MethodNotAllowed(_) | Self::RateLimited => this.to_string(),
        };

        let mut response = (status, Json(ErrorBody::new(message))).into_response();
        if let Self::MethodNotAllowed(Some(allow)) = this {
            response.headers_mut().insert(ALLOW, allow);
        }
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for cart actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added line items", Some(&[("checkout_id", id.as_str())]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
