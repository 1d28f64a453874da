//! Shared test helpers: a local stand-in for the analytics API and a running proxy
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use pirsch_proxy_lib::config::parse_config;
use pirsch_proxy_lib::{serve, setup_clients, AppState};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const CLIENT_ID: &str = "client";
pub const CLIENT_SECRET: &str = "secret";
pub const STATIC_TOKEN: &str = "static-token";
pub const SCRIPT_BODY: &str = "console.log('pa');";

/// Generate a temporary file path for testing
pub fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_nanos();
    std::env::temp_dir().join(format!("pirsch-test-{nanos}-{name}"))
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct MockState {
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub tokens_issued: AtomicUsize,
    /// Reject this many API calls with 401 regardless of the token
    pub reject_next: AtomicUsize,
    pub script_downloads: AtomicUsize,
    pub script_unavailable: AtomicBool,
}

impl MockState {
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.iter().filter(|req| req.path == path).cloned().collect())
            .unwrap_or_default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.iter().map(|req| req.path.clone()).collect())
            .unwrap_or_default()
    }

    fn is_authorized(&self, authorization: Option<&str>) -> bool {
        let latest = format!("Bearer token-{}", self.tokens_issued.load(Ordering::SeqCst));
        authorization.is_some_and(|auth| auth == format!("Bearer {STATIC_TOKEN}") || auth == latest)
    }
}

pub struct MockApi {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockApi {
    pub async fn start() -> TestResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(MockState::default());

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req| respond(req, state.clone()));
                    let _ = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
        });

        Ok(Self { addr, state })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

fn reply(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body.into()));
    *resp.status_mut() = status;
    resp
}

async fn respond(
    req: Request<Incoming>,
    state: Arc<MockState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let raw = req.into_body().collect().await?.to_bytes();
    let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

    if let Ok(mut requests) = state.requests.lock() {
        requests.push(RecordedRequest {
            method,
            path: path.clone(),
            authorization: authorization.clone(),
            body: body.clone(),
        });
    }

    let resp = match path.as_str() {
        "/api/v1/token" => {
            if body["client_id"] == CLIENT_ID && body["client_secret"] == CLIENT_SECRET {
                let n = state.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
                reply(StatusCode::OK, json!({"access_token": format!("token-{n}")}).to_string())
            } else {
                reply(StatusCode::UNAUTHORIZED, "")
            }
        }
        "/pa.js" => {
            state.script_downloads.fetch_add(1, Ordering::SeqCst);
            if state.script_unavailable.load(Ordering::SeqCst) {
                reply(StatusCode::SERVICE_UNAVAILABLE, "")
            } else {
                reply(StatusCode::OK, SCRIPT_BODY)
            }
        }
        _ => {
            let rejected = state
                .reject_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected || !state.is_authorized(authorization.as_deref()) {
                reply(StatusCode::UNAUTHORIZED, "")
            } else if path == "/api/v1/domain" {
                reply(
                    StatusCode::OK,
                    json!([{"id": "d1", "hostname": "example.com"}]).to_string(),
                )
            } else {
                reply(StatusCode::OK, "")
            }
        }
    };

    Ok(resp)
}

/// A proxy serving on a random local port until `stop` is called
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub api: MockApi,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<pirsch_proxy_lib::Result<()>>,
}

impl RunningProxy {
    /// Start a proxy using a static-token client against a fresh mock API.
    /// `extra` is appended to the generated configuration.
    pub async fn start(extra: &str) -> TestResult<Self> {
        let api = MockApi::start().await?;
        let toml = format!(
            r#"
base_url = "{url}"

[server]
listen = "127.0.0.1:0"
shutdown_timeout = 2

[[clients]]
secret = "{STATIC_TOKEN}"

[upstream]
request_retries = 1

[scripts]
source_url = "{url}"
ttl_secs = 3600

{extra}
"#,
            url = api.url()
        );
        let cfg = parse_config(&toml)?;
        let clients = setup_clients(&cfg).await?;
        let state = Arc::new(AppState::new(&cfg, clients, None)?);

        let listener = TcpListener::bind(cfg.server.listen).await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            serve(listener, &cfg.server, state, async {
                let _ = rx.await;
            })
            .await
        });

        Ok(Self { addr, api, shutdown: Some(tx), handle })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(mut self) -> TestResult {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(5), self.handle).await???;
        Ok(())
    }
}

pub fn http_client() -> TestResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()?)
}
