use std::sync::Arc;
use std::time::Duration;

use crate::analytics::AnalyticsClient;
use crate::client_ip::ClientIpResolver;
use crate::config::{Config, PathsConfig};
use crate::error::Result;
use crate::scripts::ScriptCache;
use crate::telemetry::Metrics;

/// Endpoint a request path maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    PageView,
    Event,
    Session,
    Script,
}

impl Route {
    /// Metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::PageView => "page_view",
            Route::Event => "event",
            Route::Session => "session",
            Route::Script => "script",
        }
    }
}

/// Absolute request paths of the four endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    pub page_view: String,
    pub event: String,
    pub session: String,
    pub script: String,
}

impl From<&PathsConfig> for Routes {
    fn from(paths: &PathsConfig) -> Self {
        Self {
            page_view: paths.page_view(),
            event: paths.event(),
            session: paths.session(),
            script: paths.script(),
        }
    }
}

impl Routes {
    pub fn pick(&self, path: &str) -> Option<Route> {
        if path == self.page_view {
            Some(Route::PageView)
        } else if path == self.event {
            Some(Route::Event)
        } else if path == self.session {
            Some(Route::Session)
        } else if path == self.script {
            Some(Route::Script)
        } else {
            None
        }
    }
}

/// Everything a request handler needs, shared by all connections
pub struct AppState {
    pub resolver: ClientIpResolver,
    pub clients: Vec<AnalyticsClient>,
    pub scripts: ScriptCache,
    pub routes: Routes,
    /// Upper bound for producing one response
    pub handler_timeout: Duration,
    pub metrics: Option<Arc<Metrics>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        clients: Vec<AnalyticsClient>,
        metrics: Option<Arc<Metrics>>,
    ) -> Result<Self> {
        let resolver = ClientIpResolver::from_config(&config.network)?;
        let scripts = ScriptCache::new(&config.scripts, config.upstream.timeout())?
            .with_metrics(metrics.clone());

        Ok(Self {
            resolver,
            clients,
            scripts,
            routes: Routes::from(&config.paths),
            handler_timeout: config.server.write_timeout(),
            metrics,
        })
    }
}
