use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{Config, ServerConfig};
use crate::error::{ProxyError, Result};
use crate::proxy::context::AppState;
use crate::proxy::guards::ConnectionGuard;
use crate::proxy::handler::handle_request;
use crate::proxy::snippet::log_snippet;
use crate::tls::build_tls_acceptor;

/// Resolves once SIGTERM or SIGINT is received
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(|e| {
        ProxyError::Io(std::io::Error::other(format!("Failed to setup SIGTERM handler: {e}")))
    })?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).map_err(|e| {
        ProxyError::Io(std::io::Error::other(format!("Failed to setup SIGINT handler: {e}")))
    })?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
        }
    })
}

/// Bind the configured address and serve until SIGTERM or SIGINT
pub async fn run(config: &Config, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(config.server.listen)
        .await
        .map_err(ProxyError::Io)?;

    log_snippet(&state.routes);

    serve(listener, &config.server, state, shutdown_signal()?).await
}

/// Accept connections on `listener` until `shutdown` resolves, then wait up to
/// the shutdown timeout for open connections to finish.
pub async fn serve<S>(
    listener: TcpListener,
    server: &ServerConfig,
    state: Arc<AppState>,
    shutdown: S,
) -> Result<()>
where
    S: Future<Output = ()>,
{
    let addr = listener.local_addr().map_err(ProxyError::Io)?;
    let tls_acceptor = match &server.tls {
        Some(t) => Some(build_tls_acceptor(t)?),
        None => None,
    };

    let mut builder = ConnBuilder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(server.read_timeout());

    let active_connections = Arc::new(AtomicUsize::new(0));
    let (closed_tx, mut closed_rx) = watch::channel(());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    info!(
        ?addr,
        tls = tls_acceptor.is_some(),
        write_timeout = server.write_timeout,
        read_timeout = server.read_timeout,
        "starting analytics proxy (h1/h2)"
    );

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };

                let guard = ConnectionGuard::new(
                    active_connections.clone(),
                    closed_tx.clone(),
                    state.metrics.clone(),
                );
                let builder = builder.clone();
                let state = state.clone();
                let tls_acceptor = tls_acceptor.clone();
                let shutdown_rx = shutdown_rx.clone();

                tokio::spawn(async move {
                    let _guard = guard;
                    match tls_acceptor {
                        Some(acceptor) => match acceptor.accept(stream).await {
                            Ok(tls) => serve_connection(&builder, tls, peer, state, shutdown_rx).await,
                            Err(e) => warn!(?peer, error = %e, "tls accept error"),
                        },
                        None => serve_connection(&builder, stream, peer, state, shutdown_rx).await,
                    }
                });
            }
        }
    }

    drop(listener);
    let _ = shutdown_tx.send(true);

    let shutdown_timeout = server.shutdown_timeout();
    info!(
        active_connections = active_connections.load(Ordering::Relaxed),
        "Waiting for active connections to finish (timeout: {}s)", server.shutdown_timeout
    );

    let drained = tokio::time::timeout(shutdown_timeout, async {
        while active_connections.load(Ordering::Relaxed) > 0 {
            if closed_rx.changed().await.is_err() {
                break;
            }
        }
    })
    .await;

    match drained {
        Ok(()) => info!("All connections closed, shutdown complete"),
        Err(_) => warn!(
            active_connections = active_connections.load(Ordering::Relaxed),
            "Shutdown timeout reached"
        ),
    }

    info!("Proxy server stopped");
    Ok(())
}

async fn serve_connection<IO>(
    builder: &ConnBuilder<TokioExecutor>,
    io: IO,
    peer: SocketAddr,
    state: Arc<AppState>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
        let state = state.clone();
        async move { Ok::<_, hyper::Error>(handle_request(req, peer, &state).await) }
    });

    let conn = builder.serve_connection(TokioIo::new(io), svc);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!(?peer, error = %e, "serve_connection error");
            }
        }
        _ = async { let _ = shutdown_rx.wait_for(|stop| *stop).await; } => {
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.await {
                debug!(?peer, error = %e, "serve_connection error during shutdown");
            }
        }
    }
}
