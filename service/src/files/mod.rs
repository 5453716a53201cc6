//! Static file serving rooted at a directory.
//!
//! Regular files, MIME types, conditional requests, byte ranges and the
//! method check are delegated to `tower_http`'s [`ServeDir`]. This module
//! adds what it does not do: path containment with an explicit 403,
//! directory listings, the `index.htm` fallback and HTML error bodies.

pub mod resolve;

use std::{
    io,
    path::{Path, PathBuf},
};

use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION},
        HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    Extension,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::{
    error::ServeError,
    http::pages::{self, ListingEntry},
};

pub use resolve::resolve;

/// Index documents tried, in order, when a directory is requested.
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// A directory tree served over HTTP. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct StaticSite {
    root: PathBuf,
    serve_dir: ServeDir,
}

impl StaticSite {
    /// Serve `root`, which is canonicalized once up front.
    ///
    /// # Errors
    /// Returns an error if `root` does not exist or cannot be canonicalized.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        let serve_dir = ServeDir::new(&root).append_index_html_on_directories(true);
        Ok(Self { root, serve_dir })
    }

    /// Canonical directory this site serves from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Answer one request.
    ///
    /// # Errors
    /// Returns a `ServeError` for requests rejected before reaching the file
    /// layer (traversal, undecodable path, unreadable directory).
    pub async fn respond(&self, mut request: Request) -> Result<Response, ServeError> {
        let method = request.method().clone();
        if method != Method::GET && method != Method::HEAD {
            return Ok(self.delegate(request).await);
        }

        let uri_path = request.uri().path().to_owned();
        let target = resolve(&self.root, &uri_path)?;

        let is_dir = tokio::fs::metadata(&target)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            // A trailing slash only names directories.
            if uri_path.ends_with('/') {
                return Err(ServeError::NotFound(uri_path));
            }
            return Ok(self.delegate(request).await);
        }

        if !uri_path.ends_with('/') {
            return Ok(redirect_to_slash(request.uri()));
        }

        for index in INDEX_FILES {
            if is_file(&target.join(index)).await {
                let rewritten = with_path(request.uri(), &format!("{uri_path}{index}"));
                *request.uri_mut() = rewritten;
                return Ok(self.delegate(request).await);
            }
        }

        let display_path = resolve::decode_path(&uri_path)?;
        let html = pages::directory_listing(&display_path, &read_entries(&target).await?);
        let mut response = pages::html_response(StatusCode::OK, html);
        if method == Method::HEAD {
            *response.body_mut() = Body::empty();
        }
        Ok(response)
    }

    /// Hand the request to `ServeDir`, replacing its empty error bodies with
    /// HTML error pages.
    async fn delegate(&self, request: Request) -> Response {
        let is_head = request.method() == Method::HEAD;
        let response = match self.serve_dir.clone().oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        };

        let status = response.status();
        if !(status.is_client_error() || status.is_server_error()) {
            return response;
        }

        tracing::debug!(%status, "file layer returned an error status");
        let html = pages::error_page(status);
        let (mut parts, _) = response.into_parts();
        parts
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(html.len()));
        let body = if is_head { Body::empty() } else { Body::from(html) };
        Response::from_parts(parts, body)
    }
}

/// Fallback handler serving every path from the [`StaticSite`] extension.
pub async fn serve_static(Extension(site): Extension<StaticSite>, request: Request) -> Response {
    match site.respond(request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

async fn read_entries(dir: &Path) -> Result<Vec<ListingEntry>, ServeError> {
    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(|err| match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            ServeError::NotFound(format!("No permission to list directory {}", dir.display()))
        }
        _ => ServeError::Io(err),
    })?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let is_symlink = entry
            .file_type()
            .await
            .is_ok_and(|file_type| file_type.is_symlink());
        // Follows symlinks, so a link to a directory is listed as one.
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .is_ok_and(|meta| meta.is_dir());
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }
    Ok(entries)
}

fn redirect_to_slash(uri: &Uri) -> Response {
    let location = match uri.query() {
        Some(query) => format!("{}/?{query}", uri.path()),
        None => format!("{}/", uri.path()),
    };
    match HeaderValue::try_from(location) {
        Ok(location) => (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response(),
        Err(_) => pages::error_response(StatusCode::BAD_REQUEST),
    }
}

fn with_path(uri: &Uri, path: &str) -> Uri {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_owned(),
    };
    path_and_query.parse().unwrap_or_else(|_| uri.clone())
}
