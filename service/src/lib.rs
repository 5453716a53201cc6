//! Static file server that makes every response cross-origin isolated.
//!
//! Each response produced by [`build_router`] carries exactly one
//! `Cross-Origin-Opener-Policy: same-origin` and one
//! `Cross-Origin-Embedder-Policy: require-corp` header: files, directory
//! listings, redirects, 304s and every error page alike.
//!
//! The guarantee covers requests that parse as HTTP. A request the HTTP/1
//! codec cannot parse (a garbage request line, oversized headers) is answered
//! by hyper with a bare `400 Bad Request` and the connection is closed; that
//! response never passes through the router and has no isolation headers.

#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod server;

pub use config::Config;
pub use error::{ServeError, ServerError};
pub use server::{build_router, Server};
