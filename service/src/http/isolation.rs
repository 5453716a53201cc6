//! Cross-origin isolation headers middleware.
//!
//! Browsers only expose `SharedArrayBuffer` and high-resolution timers to a
//! document that is cross-origin isolated, which requires both
//! `Cross-Origin-Opener-Policy: same-origin` and
//! `Cross-Origin-Embedder-Policy: require-corp` on the responses that make up
//! the page. This module stamps those two headers on every response.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
    Extension,
};

pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
pub const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");

/// The fixed header set that makes a response cross-origin isolated.
///
/// Returns an `Arc`-wrapped list that can be shared across requests via
/// Axum's `Extension` layer.
#[must_use]
pub fn isolation_headers() -> Arc<Vec<(HeaderName, HeaderValue)>> {
    Arc::new(vec![
        (
            CROSS_ORIGIN_OPENER_POLICY,
            HeaderValue::from_static("same-origin"),
        ),
        (
            CROSS_ORIGIN_EMBEDDER_POLICY,
            HeaderValue::from_static("require-corp"),
        ),
    ])
}

/// Middleware to add the isolation headers to all responses.
///
/// Runs after the inner service has produced its complete header set and
/// uses `insert`, so each header ends up present exactly once whatever the
/// inner layers did. It should be the outermost layer so that error pages,
/// redirects and listings are covered as well.
///
/// # Example
///
/// ```ignore
/// use axum::{middleware, Router, Extension};
/// use coi_serve::http::isolation::{isolation_headers, isolation_headers_middleware};
///
/// let app = Router::new()
///     // ... routes ...
///     .layer(middleware::from_fn(isolation_headers_middleware))
///     .layer(Extension(isolation_headers()));
/// ```
pub async fn isolation_headers_middleware(
    Extension(headers): Extension<Arc<Vec<(HeaderName, HeaderValue)>>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let response_headers = response.headers_mut();
    for (name, value) in headers.iter() {
        response_headers.insert(name.clone(), value.clone());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app(inner: Router) -> Router {
        inner
            .layer(middleware::from_fn(isolation_headers_middleware))
            .layer(Extension(isolation_headers()))
    }

    async fn get_headers(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        (response.status(), response.headers().clone())
    }

    #[test]
    fn test_isolation_header_values() {
        let headers = isolation_headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].0.as_str(), "cross-origin-opener-policy");
        assert_eq!(headers[0].1, "same-origin");
        assert_eq!(headers[1].0.as_str(), "cross-origin-embedder-policy");
        assert_eq!(headers[1].1, "require-corp");
    }

    #[tokio::test]
    async fn test_headers_added_to_success_and_fallback() {
        let app = app(Router::new().route("/ok", get(|| async { "ok" })));

        for uri in ["/ok", "/missing"] {
            let (_, headers) = get_headers(app.clone(), uri).await;
            assert_eq!(
                headers.get_all(CROSS_ORIGIN_OPENER_POLICY).iter().count(),
                1,
                "{uri}"
            );
            assert_eq!(
                headers.get(CROSS_ORIGIN_EMBEDDER_POLICY),
                Some(&HeaderValue::from_static("require-corp")),
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_headers_replace_inner_values() {
        let inner = Router::new().route(
            "/",
            get(|| async {
                (
                    [
                        (CROSS_ORIGIN_OPENER_POLICY, "unsafe-none"),
                        (CROSS_ORIGIN_EMBEDDER_POLICY, "credentialless"),
                    ],
                    "inner",
                )
            }),
        );
        let (status, headers) = get_headers(app(inner), "/").await;

        assert_eq!(status, StatusCode::OK);
        let coop: Vec<_> = headers.get_all(CROSS_ORIGIN_OPENER_POLICY).iter().collect();
        let coep: Vec<_> = headers.get_all(CROSS_ORIGIN_EMBEDDER_POLICY).iter().collect();
        assert_eq!(coop, vec![&HeaderValue::from_static("same-origin")]);
        assert_eq!(coep, vec![&HeaderValue::from_static("require-corp")]);
    }
}
