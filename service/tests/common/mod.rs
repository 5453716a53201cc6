//! Common test utilities for integration tests.
//!
//! - [`TestSite`] - a throwaway directory tree served through the production router
//! - [`send`] - drive a router with one request and collect the full response
//! - [`assert_isolated`] - check the two cross-origin isolation headers
//!
//! # Usage
//!
//! ```ignore
//! use crate::common::{send, TestSite};
//!
//! #[tokio::test]
//! async fn test_with_site() {
//!     let site = TestSite::new().file("index.html", "<h1>hi</h1>");
//!     let response = send(site.app(), Method::GET, "/").await;
//! }
//! ```
//!
//! The served root is `<tempdir>/site`, so tests can place files next to it
//! (in the temp dir itself) to check that they are unreachable.

#![allow(dead_code, clippy::expect_used)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode},
    Router,
};
use coi_serve::{build_router, files::StaticSite};
use tempfile::TempDir;
use tower::ServiceExt;

pub const COOP: &str = "cross-origin-opener-policy";
pub const COEP: &str = "cross-origin-embedder-policy";

/// A directory tree on disk, removed when dropped.
pub struct TestSite {
    dir: TempDir,
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSite {
    /// Create an empty site root.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("site")).expect("create site root");
        Self { dir }
    }

    /// Directory being served.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("site")
    }

    /// Directory containing the served root.
    #[must_use]
    pub fn outside(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the site root, creating parent directories.
    #[must_use]
    pub fn file(self, relative: &str, contents: impl AsRef<[u8]>) -> Self {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, contents).expect("write file");
        self
    }

    /// Create a directory relative to the site root.
    #[must_use]
    pub fn dir(self, relative: &str) -> Self {
        fs::create_dir_all(self.root().join(relative)).expect("create dir");
        self
    }

    /// Write a file next to (outside of) the site root.
    #[must_use]
    pub fn outside_file(self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        fs::write(self.outside().join(name), contents).expect("write outside file");
        self
    }

    /// Build the production router for this site.
    #[must_use]
    pub fn app(&self) -> Router {
        build_router(StaticSite::new(self.root()).expect("static site"))
    }
}

/// A fully buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Send a bodyless request through `app`.
pub async fn send(app: Router, method: Method, uri: &str) -> TestResponse {
    send_request(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    )
    .await
}

/// Send an arbitrary request through `app`.
pub async fn send_request(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    TestResponse {
        status,
        headers,
        body,
    }
}

/// Assert that each isolation header is present exactly once with its fixed value.
pub fn assert_isolated(headers: &HeaderMap) {
    let coop: Vec<&HeaderValue> = headers.get_all(COOP).iter().collect();
    let coep: Vec<&HeaderValue> = headers.get_all(COEP).iter().collect();
    assert_eq!(coop, vec![&HeaderValue::from_static("same-origin")], "{COOP}");
    assert_eq!(coep, vec![&HeaderValue::from_static("require-corp")], "{COEP}");
}
