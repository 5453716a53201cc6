//! HTTP utilities and middleware.
//!
//! This module provides the response decoration shared by every route: the
//! cross-origin isolation headers and the generated HTML pages.

pub mod isolation;
pub mod pages;

pub use isolation::{isolation_headers, isolation_headers_middleware};
