use crate::telemetry::{handle_metrics, health_check_response, ready_check_response};
use crate::proxy::synthetic_response::{full_body, RespBody};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

fn internal_error() -> Response<RespBody> {
    let mut resp = Response::new(full_body("Internal Server Error"));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp
}

fn route(path: &str, registry: &Registry, clients: usize) -> Response<RespBody> {
    let result = match path {
        "/health" => health_check_response(),
        "/ready" => ready_check_response(clients),
        "/metrics" => handle_metrics(registry),
        _ => {
            let mut resp = Response::new(full_body("Not Found"));
            *resp.status_mut() = StatusCode::NOT_FOUND;
            return resp;
        }
    };
    result.unwrap_or_else(|e| {
        warn!(path, error = %e, "Observability server: failed to build response");
        internal_error()
    })
}

/// Start the observability server that handles metrics and health checks
/// This server runs on a dedicated port and serves:
/// - `/metrics` - Prometheus metrics
/// - `/health` - Health check endpoint
/// - `/ready` - Readiness check endpoint
pub async fn start_observability_server(
    port: u16,
    registry: Registry,
    clients: usize,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = Arc::new(registry);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(?addr, "Observability server started (metrics + health checks)");

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| std::io::Error::other(format!("Failed to setup SIGTERM handler: {e}")))?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .map_err(|e| std::io::Error::other(format!("Failed to setup SIGINT handler: {e}")))?;

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Observability server: Received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("Observability server: Received SIGINT, shutting down");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "Observability server: accept error");
                        continue;
                    }
                };

                let registry = registry.clone();
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let resp = route(req.uri().path(), &registry, clients);
                        async move { Ok::<_, hyper::Error>(resp) }
                    });

                    let builder = ConnBuilder::new(TokioExecutor::new());
                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "Observability server: serve_connection error");
                    }
                });
            }
        }
    }

    info!("Observability server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_path_is_not_found() {
        let registry = Registry::default();
        assert_eq!(route("/nope", &registry, 1).status(), StatusCode::NOT_FOUND);
        assert_eq!(route("/ready", &registry, 1).status(), StatusCode::OK);
        assert_eq!(route("/metrics", &registry, 1).status(), StatusCode::OK);
    }
}
