use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address and port to listen on
    /// Example: "0.0.0.0:8080"
    #[serde(default = "default_listen", alias = "host")]
    pub listen: SocketAddr,
    /// Maximum time to produce a response, in seconds
    /// Default: 5
    #[serde(default = "default_io_timeout")]
    pub write_timeout: u64,
    /// Maximum time to receive request headers, in seconds
    /// Default: 5
    #[serde(default = "default_io_timeout")]
    pub read_timeout: u64,
    /// Graceful shutdown timeout in seconds
    /// Default: 10
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
    /// TLS termination (optional)
    /// If not provided, the proxy serves plain HTTP
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            write_timeout: default_io_timeout(),
            read_timeout: default_io_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
            tls: None,
        }
    }
}

impl ServerConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

/// TLS termination configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TlsConfig {
    /// Path to TLS certificate file (PEM format)
    pub cert_path: String,
    /// Path to TLS private key file (PEM format)
    pub key_path: String,
    /// ALPN protocols offered to clients
    /// Default: ["h2", "http/1.1"]
    #[serde(default = "default_alpn")]
    pub alpn: Vec<String>,
}

/// Credentials for one analytics API client.
///
/// With an empty `id` the secret is used directly as a bearer token.
#[derive(Deserialize, Clone, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub id: String,
    pub secret: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Outbound analytics API settings
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Request timeout in seconds
    /// Default: 5
    #[serde(default = "default_io_timeout")]
    pub timeout_secs: u64,
    /// Attempts per request, token refreshes included
    /// Default: 5
    #[serde(default = "default_request_retries")]
    pub request_retries: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { timeout_secs: default_io_timeout(), request_retries: default_request_retries() }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Client IP resolution settings
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Forwarding headers to trust, highest priority first
    /// One of: CF-Connecting-IP, True-Client-IP, X-Forwarded-For, Forwarded, X-Real-IP
    /// (case-insensitive)
    /// Default: empty (always use the connection peer)
    #[serde(default)]
    pub header: Vec<String>,
    /// CIDR ranges of trusted proxies, e.g. ["10.0.0.0/8"]
    /// Default: empty, which trusts forwarding headers from any peer
    #[serde(default)]
    pub subnets: Vec<String>,
}

/// Public endpoint paths
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    /// Default: "/p"
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Default: "pv"
    #[serde(default = "default_page_view_path")]
    pub page_view_path: String,
    /// Default: "e"
    #[serde(default = "default_event_path")]
    pub event_path: String,
    /// Default: "s"
    #[serde(default = "default_session_path")]
    pub session_path: String,
    /// Default: "pa.js"
    #[serde(default = "default_js_filename")]
    pub js_filename: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            page_view_path: default_page_view_path(),
            event_path: default_event_path(),
            session_path: default_session_path(),
            js_filename: default_js_filename(),
        }
    }
}

impl PathsConfig {
    pub fn page_view(&self) -> String {
        join_path(&self.base_path, &self.page_view_path)
    }

    pub fn event(&self) -> String {
        join_path(&self.base_path, &self.event_path)
    }

    pub fn session(&self) -> String {
        join_path(&self.base_path, &self.session_path)
    }

    pub fn script(&self) -> String {
        join_path(&self.base_path, &self.js_filename)
    }
}

fn join_path(base: &str, name: &str) -> String {
    let base = base.trim_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        format!("/{name}")
    } else {
        format!("/{base}/{name}")
    }
}

/// Tracking script cache
#[derive(Debug, Deserialize, Clone)]
pub struct ScriptsConfig {
    /// Where scripts are downloaded from
    /// Default: "https://api.pirsch.io"
    #[serde(default = "default_base_url")]
    pub source_url: String,
    /// Name of the remote script
    /// Default: "pa.js"
    #[serde(default = "default_js_filename")]
    pub remote_file: String,
    /// Seconds before a cached script is downloaded again
    /// Default: 3600
    #[serde(default = "default_script_ttl")]
    pub ttl_secs: u64,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            source_url: default_base_url(),
            remote_file: default_js_filename(),
            ttl_secs: default_script_ttl(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Show module path (target) in log messages
    /// Default: false
    #[serde(default)]
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), show_target: false }
    }
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Port of the observability server (/metrics, /health, /ready)
    /// Default: None (disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
    /// Log level applied to the opentelemetry crates
    /// Default: "warn"
    #[serde(default = "default_otel_log_level")]
    pub otel_log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { metrics_port: None, otel_log_level: default_otel_log_level() }
    }
}

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Analytics API base URL
    /// Default: "https://api.pirsch.io"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub server: ServerConfig,
    /// Every event is sent through each client, in order
    /// At least one client is required
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

pub(super) fn default_io_timeout() -> u64 {
    5
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_alpn() -> Vec<String> {
    vec!["h2".to_string(), "http/1.1".to_string()]
}

fn default_request_retries() -> u32 {
    5
}

fn default_base_url() -> String {
    "https://api.pirsch.io".to_string()
}

pub(super) fn default_base_path() -> String {
    "/p".to_string()
}

pub(super) fn default_page_view_path() -> String {
    "pv".to_string()
}

pub(super) fn default_event_path() -> String {
    "e".to_string()
}

pub(super) fn default_session_path() -> String {
    "s".to_string()
}

pub(super) fn default_js_filename() -> String {
    "pa.js".to_string()
}

fn default_script_ttl() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_otel_log_level() -> String {
    "warn".to_string()
}
