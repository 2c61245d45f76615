//! Catalog route handlers.
//!
//! Read-only product and collection lookups. With `?handle=` the response
//! is a single `{ product }` / `{ collection }`, otherwise the full list.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use magnolia_core::wire::{
    CollectionEnvelope, CollectionsEnvelope, HandleQuery, ProductEnvelope, ProductsEnvelope,
};
use tracing::instrument;

use super::ApiQuery;
use crate::error::Result;
use crate::state::AppState;

fn requested_handle(query: HandleQuery) -> Option<String> {
    query
        .handle
        .map(|handle| handle.trim().to_string())
        .filter(|handle| !handle.is_empty())
}

/// List products, or fetch one by handle.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HandleQuery>,
) -> Result<Response> {
    match requested_handle(query) {
        Some(handle) => {
            let product = state.backend().product(&handle).await?;
            Ok(Json(ProductEnvelope { product }).into_response())
        }
        None => {
            let products = state.backend().products().await?;
            Ok(Json(ProductsEnvelope { products }).into_response())
        }
    }
}

/// List collections, or fetch one by handle.
#[instrument(skip(state))]
pub async fn collections(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HandleQuery>,
) -> Result<Response> {
    match requested_handle(query) {
        Some(handle) => {
            let collection = state.backend().collection(&handle).await?;
            Ok(Json(CollectionEnvelope { collection }).into_response())
        }
        None => {
            let collections = state.backend().collections().await?;
            Ok(Json(CollectionsEnvelope { collections }).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use magnolia_core::{Product, ProductId};
    use serde_json::Value;
    use testresult::TestResult;
    use tower::ServiceExt;

    use super::*;
    use crate::backend::MockCommerceBackend;
    use crate::routes::api_routes;
    use crate::shopify::ShopifyError;

    fn app(backend: MockCommerceBackend) -> Router {
        Router::new()
            .nest("/api", api_routes())
            .with_state(AppState::new(Arc::new(backend)))
    }

    fn product(handle: &str) -> Product {
        Product {
            id: ProductId::new(format!("gid://shopify/Product/{handle}")),
            handle: handle.to_string(),
            title: "Magnolia Candle".to_string(),
            description: String::new(),
            images: vec![],
            variants: vec![],
            tags: vec![],
        }
    }

    async fn get_json(app: Router, uri: &str) -> TestResult<(StatusCode, Value)> {
        let response = app.oneshot(Request::get(uri).body(Body::empty())?).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    #[tokio::test]
    async fn test_products_list() -> TestResult {
        let mut backend = MockCommerceBackend::new();
        backend
            .expect_products()
            .once()
            .return_once(|| Ok(vec![product("candle"), product("soap")]));

        let (status, body) = get_json(app(backend), "/api/products").await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"].as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_product_by_handle() -> TestResult {
        let mut backend = MockCommerceBackend::new();
        backend.expect_products().never();
        backend
            .expect_product()
            .withf(|handle| handle == "candle")
            .once()
            .return_once(|handle| Ok(product(handle)));

        let (status, body) = get_json(app(backend), "/api/products?handle=candle").await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["product"]["handle"], "candle");
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_handle_lists() -> TestResult {
        let mut backend = MockCommerceBackend::new();
        backend.expect_product().never();
        backend.expect_products().once().return_once(|| Ok(vec![]));

        let (status, body) = get_json(app(backend), "/api/products?handle=").await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"], Value::Array(vec![]));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_collection_is_404() -> TestResult {
        let mut backend = MockCommerceBackend::new();
        backend
            .expect_collection()
            .once()
            .return_once(|handle| Err(ShopifyError::NotFound(format!("Collection not found: {handle}"))));

        let (status, body) = get_json(app(backend), "/api/collections?handle=nope").await?;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Collection not found: nope");
        Ok(())
    }
}
