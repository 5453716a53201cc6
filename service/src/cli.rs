//! Command-line surface.
//!
//! Every flag is optional; anything left unset falls through to the
//! environment and then to the compiled-in defaults (see [`crate::config`]).

use std::path::PathBuf;

use clap::Parser;

/// Serve a directory over HTTP with cross-origin isolation headers on every response.
#[derive(Debug, Default, Parser)]
#[command(name = "coi-serve", version, about)]
pub struct Cli {
    /// Port to listen on [default: 8000]
    pub port: Option<u16>,

    /// Address to bind to [default: 0.0.0.0]
    #[arg(short, long, value_name = "ADDRESS")]
    pub bind: Option<String>,

    /// Directory to serve [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `tower_http=debug`
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}
