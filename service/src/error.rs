//! Error types for request handling and server startup.

use std::{io, net::SocketAddr, path::PathBuf};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::http::pages;

/// A failure while answering a single request.
///
/// These never escape the request handler: each one is rendered as an HTTP
/// status with an HTML error body.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("path escapes the server root: {0}")]
    ForbiddenPath(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ServeError {
    /// HTTP status this error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ForbiddenPath(_) => StatusCode::FORBIDDEN,
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Io(err) => match err.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        pages::error_response(status)
    }
}

/// A failure that stops the server process.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid bind address '{host}'")]
    InvalidAddress { host: String },

    #[error("cannot open server root '{}': {source}", path.display())]
    Root { path: PathBuf, source: io::Error },

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}
