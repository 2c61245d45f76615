//! Router assembly.
//!
//! [`app`] builds the complete service: health checks, the `/api` routes
//! behind the rate limiter, and the middleware stack described in
//! [`crate::middleware`]. The binary serves it; tests drive it directly.

use std::time::Duration;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, Uri, header::CONTENT_TYPE},
    middleware as axum_middleware,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::middleware::{
    api_rate_limiter, json_error_bodies, request_id_middleware, security_headers_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Build the storefront API router.
///
/// `allowed_origin` enables CORS for exactly that origin (the shop front
/// end). Without it no CORS headers are sent.
pub fn app(state: AppState, allowed_origin: Option<&str>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", routes::api_routes().layer(api_rate_limiter()))
        .fallback(not_found)
        .layer(axum_middleware::map_response(json_error_bodies));

    if let Some(cors) = allowed_origin.and_then(cors_layer) {
        router = router.layer(cors);
    }

    router
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    let Ok(origin) = HeaderValue::from_str(origin) else {
        tracing::warn!(origin, "Ignoring allowed origin that is not a valid header value");
        return None;
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([CONTENT_TYPE])
            .max_age(Duration::from_secs(600)),
    )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if Shopify cannot be reached.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::header::{
        ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD, ALLOW,
        CONTENT_SECURITY_POLICY, ORIGIN,
    };
    use magnolia_core::wire::ErrorBody;
    use testresult::TestResult;
    use tower::ServiceExt;

    use super::*;
    use crate::backend::MockCommerceBackend;
    use crate::middleware::request_id::REQUEST_ID_HEADER;
    use crate::shopify::ShopifyError;

    const SHOP_ORIGIN: &str = "https://midnightmagnolia.example";

    fn build(backend: MockCommerceBackend) -> Router {
        app(AppState::new(Arc::new(backend)), Some(SHOP_ORIGIN))
    }

    async fn error_body(response: axum::response::Response) -> TestResult<ErrorBody> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn test_health() -> TestResult {
        let response = build(MockCommerceBackend::new())
            .oneshot(Request::get("/health").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        Ok(())
    }

    #[tokio::test]
    async fn test_readiness_reflects_ping() -> TestResult {
        let mut up = MockCommerceBackend::new();
        up.expect_ping().once().return_once(|| Ok(()));
        let response = build(up)
            .oneshot(Request::get("/health/ready").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let mut down = MockCommerceBackend::new();
        down.expect_ping()
            .once()
            .return_once(|| Err(ShopifyError::graphql("HTTP 503: unavailable")));
        let response = build(down)
            .oneshot(Request::get("/health/ready").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_405_with_allow() -> TestResult {
        let response = build(MockCommerceBackend::new())
            .oneshot(Request::post("/api/products").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let allow = response.headers().get(ALLOW).unwrap().to_str()?.to_string();
        assert!(allow.contains("GET"));
        assert_eq!(error_body(response).await?.error, "Method not allowed");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() -> TestResult {
        let response = build(MockCommerceBackend::new())
            .oneshot(Request::get("/api/orders").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_body(response).await?.error, "No route for /api/orders");
        Ok(())
    }

    #[tokio::test]
    async fn test_api_responses_carry_security_headers() -> TestResult {
        let mut backend = MockCommerceBackend::new();
        backend.expect_collections().once().return_once(|| Ok(vec![]));

        let response = build(backend)
            .oneshot(Request::get("/api/collections").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(CONTENT_SECURITY_POLICY));
        Ok(())
    }

    #[tokio::test]
    async fn test_cors_preflight_for_shop_origin() -> TestResult {
        let response = build(MockCommerceBackend::new())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/checkout")
                    .header(ORIGIN, SHOP_ORIGIN)
                    .header(ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            SHOP_ORIGIN
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_no_cors_without_origin_config() -> TestResult {
        let mut backend = MockCommerceBackend::new();
        backend.expect_products().once().return_once(|| Ok(vec![]));

        let response = app(AppState::new(Arc::new(backend)), None)
            .oneshot(
                Request::get("/api/products")
                    .header(ORIGIN, SHOP_ORIGIN)
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        Ok(())
    }
}
