//! Listening socket, router assembly and the accept loop.

use std::{
    future::Future,
    net::{IpAddr, SocketAddr},
};

use axum::{
    http::{header::SERVER, HeaderValue},
    middleware, Extension, Router,
};
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    error::ServerError,
    files::{serve_static, StaticSite},
    http::{isolation_headers, isolation_headers_middleware},
};

const SERVER_NAME: &str = concat!("coi-serve/", env!("CARGO_PKG_VERSION"));

/// Build the application router for `site`.
///
/// Layer ordering (innermost first):
/// 1. Static file fallback handler
/// 2. Request tracing
/// 3. `Server` header (only when absent)
/// 4. Cross-origin isolation headers (outermost, so every response gets them)
#[must_use]
pub fn build_router(site: StaticSite) -> Router {
    Router::new()
        .fallback(serve_static)
        .layer(Extension(site))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            SERVER,
            HeaderValue::from_static(SERVER_NAME),
        ))
        .layer(middleware::from_fn(isolation_headers_middleware))
        .layer(Extension(isolation_headers()))
}

/// A bound server that has not started accepting connections yet.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    /// Open the site root and bind the listening socket.
    ///
    /// # Errors
    /// Returns `InvalidAddress` for an unparseable host, `Root` if the root
    /// directory cannot be opened and `Bind` if the port is taken or the
    /// process lacks permission to bind it.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let ip: IpAddr = config
            .host
            .parse()
            .map_err(|_| ServerError::InvalidAddress {
                host: config.host.clone(),
            })?;
        let addr = SocketAddr::new(ip, config.port);

        let site = StaticSite::new(&config.root).map_err(|source| ServerError::Root {
            path: config.root.clone(),
            source,
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::debug!(root = %site.root().display(), %addr, "server bound");

        Ok(Self {
            listener,
            router: build_router(site),
        })
    }

    /// Address actually bound, which differs from the configured one when
    /// port 0 was requested.
    ///
    /// # Errors
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process receives SIGINT or SIGTERM (Ctrl-C elsewhere).
    ///
    /// # Errors
    /// Returns an error if the signal handlers cannot be installed or the
    /// accept loop fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = shutdown_signal()?;
        self.run_until(shutdown).await
    }

    /// Serve until `shutdown` resolves, then stop accepting and let in-flight
    /// requests finish.
    ///
    /// # Errors
    /// Returns an error if the accept loop fails.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("server stopped");
        Ok(())
    }
}

/// Install the termination signal handlers and return a future that resolves
/// once one of them fires.
///
/// Handlers are registered before this returns, so a signal that arrives
/// between this call and the first poll of the future is not lost.
///
/// # Errors
/// Returns an error if a handler cannot be registered.
#[cfg(unix)]
pub fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static, ServerError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => tracing::info!("interrupt received, shutting down"),
            _ = terminate.recv() => tracing::info!("terminate received, shutting down"),
        }
    })
}

/// Return a future that resolves on Ctrl-C.
///
/// # Errors
/// Never fails on this platform; the signature matches the unix variant.
#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
pub fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static, ServerError> {
    Ok(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        tracing::info!("interrupt received, shutting down");
    })
}
