//! JSON bodies for error responses built outside the handlers.
//!
//! axum answers a wrong method with an empty 405 and governor answers an
//! exhausted bucket with a plain-text 429. Clients expect `{ "error": … }`
//! on every non-2xx, so those two are rewritten here.

use axum::{
    http::{
        HeaderValue, StatusCode,
        header::{ALLOW, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};

use crate::error::AppError;

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Rewrite bare 405 and 429 responses as `AppError` bodies.
pub async fn json_error_bodies(response: Response) -> Response {
    if is_json(&response) {
        return response;
    }

    match response.status() {
        StatusCode::METHOD_NOT_ALLOWED => {
            let allow: Option<HeaderValue> = response.headers().get(ALLOW).cloned();
            AppError::MethodNotAllowed(allow).into_response()
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let mut rewritten = AppError::RateLimited.into_response();
            for (name, value) in response.headers() {
                if name.as_str().starts_with("x-ratelimit") || name.as_str() == "retry-after" {
                    rewritten.headers_mut().insert(name.clone(), value.clone());
                }
            }
            rewritten
        }
        _ => response,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        extract::Request,
        middleware,
        routing::get,
    };
    use magnolia_core::wire::ErrorBody;
    use testresult::TestResult;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/thing", get(|| async { "ok" }).post(|| async { "ok" }))
            .route(
                "/busy",
                get(|| async { (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "3")], "slow down") }),
            )
            .layer(middleware::map_response(json_error_bodies))
    }

    #[tokio::test]
    async fn test_method_not_allowed_gets_json_and_allow() -> TestResult {
        let response = app()
            .oneshot(Request::delete("/thing").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let allow = response.headers().get(ALLOW).unwrap().to_str()?.to_string();
        assert!(allow.contains("GET"));
        assert!(allow.contains("POST"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body: ErrorBody = serde_json::from_slice(&bytes)?;
        assert_eq!(body.error, "Method not allowed");
        Ok(())
    }

    #[tokio::test]
    async fn test_plain_429_gets_json_and_keeps_retry_after() -> TestResult {
        let response = app()
            .oneshot(Request::get("/busy").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("retry-after").unwrap(), "3");
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body: ErrorBody = serde_json::from_slice(&bytes)?;
        assert_eq!(body.error, "Rate limited");
        Ok(())
    }

    #[tokio::test]
    async fn test_success_passes_through() -> TestResult {
        let response = app()
            .oneshot(Request::get("/thing").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&bytes[..], b"ok");
        Ok(())
    }
}
