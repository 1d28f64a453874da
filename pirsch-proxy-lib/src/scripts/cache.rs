use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ScriptsConfig;
use crate::telemetry::metrics::values;
use crate::telemetry::Metrics;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to download script: {0}")]
    Download(#[from] reqwest::Error),

    #[error("script source returned status {0}")]
    Status(u16),

    #[error("script is not available")]
    Unavailable,
}

#[derive(Default)]
struct CachedScript {
    content: Option<Bytes>,
    refresh_at: Option<Instant>,
}

impl CachedScript {
    fn is_fresh(&self, now: Instant) -> bool {
        self.refresh_at.is_some_and(|at| now < at)
    }
}

/// Caches one remote script in memory.
///
/// The refresh deadline is pushed forward before each download, so a failing
/// source is contacted at most once per TTL. A stale copy keeps being served
/// while the source is down.
pub struct ScriptCache {
    http: reqwest::Client,
    url: String,
    ttl: Duration,
    state: RwLock<CachedScript>,
    metrics: Option<Arc<Metrics>>,
}

impl ScriptCache {
    pub fn new(cfg: &ScriptsConfig, timeout: Duration) -> Result<Self, ScriptError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let url = format!(
            "{}/{}",
            cfg.source_url.trim_end_matches('/'),
            cfg.remote_file.trim_start_matches('/')
        );

        Ok(Self {
            http,
            url,
            ttl: Duration::from_secs(cfg.ttl_secs),
            state: RwLock::new(CachedScript::default()),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<Metrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Return the script body, downloading it first if the TTL has elapsed.
    pub async fn get(&self) -> Result<Bytes, ScriptError> {
        {
            let state = self.state.read().await;
            if state.is_fresh(Instant::now()) {
                return state.content.clone().ok_or(ScriptError::Unavailable);
            }
        }

        let mut state = self.state.write().await;
        // another request may have refreshed while we waited for the lock
        if state.is_fresh(Instant::now()) {
            return state.content.clone().ok_or(ScriptError::Unavailable);
        }

        state.refresh_at = Some(Instant::now() + self.ttl);

        match self.download().await {
            Ok(body) => {
                debug!(url = %self.url, bytes = body.len(), "script refreshed");
                self.record(values::RESULT_OK);
                state.content = Some(body.clone());
                Ok(body)
            }
            Err(e) => match &state.content {
                Some(stale) => {
                    warn!(url = %self.url, error = %e, "error downloading script, serving stale copy");
                    self.record(values::RESULT_STALE);
                    Ok(stale.clone())
                }
                None => {
                    warn!(url = %self.url, error = %e, "error downloading script");
                    self.record(values::RESULT_FAILED);
                    Err(e)
                }
            },
        }
    }

    async fn download(&self) -> Result<Bytes, ScriptError> {
        let resp = self.http.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScriptError::Status(status.as_u16()));
        }
        Ok(resp.bytes().await?)
    }

    fn record(&self, result: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_script_refresh(result);
        }
    }
}
