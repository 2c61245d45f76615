//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness check
//! GET    /health/ready           - Readiness check (Shopify reachable)
//!
//! # Checkout (mounted under /api)
//! POST   /api/checkout           - Create an empty checkout (201)
//! GET    /api/checkout?id=       - Fetch a checkout
//! PUT    /api/checkout           - Add line items
//! PATCH  /api/checkout           - Update line item quantities
//! DELETE /api/checkout           - Remove line items
//!
//! # Catalog (mounted under /api)
//! GET    /api/products[?handle=]    - Product list, or one product
//! GET    /api/collections[?handle=] - Collection list, or one collection
//! ```
//!
//! Every response body is JSON. Errors are `{ "error": "…" }`.

pub mod catalog;
pub mod checkout;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections are `400 { error }`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections are `400 { error }`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route(
        "/checkout",
        post(checkout::create)
            .get(checkout::show)
            .put(checkout::add)
            .patch(checkout::update)
            .delete(checkout::remove),
    )
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products))
        .route("/collections", get(catalog::collections))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(checkout_routes())
        .merge(catalog_routes())
}
