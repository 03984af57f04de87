//! The HTTP server, handler and routes.
//!
//! This file itself contains fairly little business logic and just sets up the
//! `hyper` server and catches errors. The main logic is in `handlers.rs`.

use bytes::Bytes;
use futures::FutureExt;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::{conn::auto, graceful::GracefulShutdown},
};
use std::{
    convert::Infallible,
    future::Future,
    net::{IpAddr, SocketAddr},
    panic::AssertUnwindSafe,
    sync::Arc,
    time::Duration,
};
use tokio::net::TcpListener;

use crate::{
    cms::ContentSource,
    collections::CollectionRegistry,
    config::Config,
    metrics::Metrics,
    model::ImageUrls,
    prelude::*,
};
use self::{
    assets::Assets,
    handlers::handle,
    response::internal_server_error,
};


mod assets;
mod feeds;
mod handlers;
mod log;
mod response;


/// HTTP server configuration.
#[derive(Debug, Clone, confique::Config)]
pub(crate) struct HttpConfig {
    /// The TCP port the HTTP server should listen on.
    #[config(default = 3080)]
    pub(crate) port: u16,

    /// The bind address to listen on.
    #[config(default = "127.0.0.1")]
    pub(crate) address: IpAddr,

    /// How long to wait for open connections to finish after receiving a
    /// shutdown signal.
    #[config(default = "10s", deserialize_with = crate::config::deserialize_duration)]
    pub(crate) shutdown_timeout: Duration,
}


// All our responses have a fully buffered body.
type Response<T = Full<Bytes>> = hyper::Response<T>;
type Request<T = hyper::body::Incoming> = hyper::Request<T>;


/// Context that the request handler has access to.
pub(crate) struct Context {
    pub(crate) config: Config,
    pub(crate) registry: CollectionRegistry,
    pub(crate) source: Arc<dyn ContentSource>,
    pub(crate) images: ImageUrls,
    pub(crate) assets: Assets,
    pub(crate) metrics: Metrics,
}

impl Context {
    pub(crate) fn new(
        config: Config,
        registry: CollectionRegistry,
        source: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            images: config.cms.image_urls(),
            assets: Assets::new(),
            metrics: Metrics::new(),
            config,
            registry,
            source,
        }
    }
}


/// Starts the HTTP server. The future returned by this function must be
/// awaited to actually run it. It resolves after a shutdown signal (Ctrl+C)
/// was received and open connections were closed.
pub(crate) async fn serve(
    config: Config,
    registry: CollectionRegistry,
    source: Arc<dyn ContentSource>,
) -> Result<()> {
    let http_config = config.http.clone();
    let ctx = Arc::new(Context::new(config, registry, source));

    let addr = SocketAddr::new(http_config.address, http_config.port);
    let listener = TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    // Every connection gets its own `service_fn`. All our logic is encoded in
    // the function `handle`. The only thing we are doing here is to pass the
    // context to that function and catch panics.
    let builder = auto::Builder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("Failed to accept connection: {e}");
                        continue;
                    }
                };

                let ctx = Arc::clone(&ctx);
                let service = service_fn(move |req| {
                    handle_internal_errors(handle(req, Arc::clone(&ctx)))
                });
                let conn = builder.serve_connection(TokioIo::new(stream), service).into_owned();
                let conn = graceful.watch(conn);
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        debug!("Error serving connection from {peer}: {e}");
                    }
                });
            }

            _ = &mut shutdown => {
                info!("Received shutdown signal, waiting for open connections to finish...");
                break;
            }
        }
    }

    tokio::select! {
        _ = graceful.shutdown() => info!("All connections closed, stopping server"),
        _ = tokio::time::sleep(http_config.shutdown_timeout) => {
            warn!("Timed out waiting for connections to close, stopping server anyway");
        }
    }

    Ok(())
}

/// This just wraps another future and catches all panics that might occur when
/// resolving/polling that given future. This ensures that we always answer with
/// `500` instead of just crashing the thread and closing the connection.
async fn handle_internal_errors(
    future: impl Future<Output = Response>,
) -> Result<Response, Infallible> {
    // The `AssertUnwindSafe` is unfortunately necessary. The whole story of
    // unwind safety is strange. What we are basically saying here is: "if the
    // future panicks, the global/remaining application state is not 'broken'.
    // It is safe to continue with the program in case of a panic."
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(response) => Ok(response),
        Err(panic) => {
            // The `panic` information is just an `Any` object representing the
            // value the panic was invoked with. For most panics (which use
            // `panic!` like `println!`), this is either `&str` or `String`.
            let msg = panic.downcast_ref::<String>()
                .map(|s| s.as_str())
                .or(panic.downcast_ref::<&str>().copied());

            match msg {
                Some(msg) => error!("INTERNAL SERVER ERROR: HTTP handler panicked: '{}'", msg),
                None => error!("INTERNAL SERVER ERROR: HTTP handler panicked"),
            }

            Ok(internal_server_error())
        }
    }
}
