mod loader;
mod types;

pub use loader::{load_from_path, parse_config};
pub use types::{
    ClientConfig, Config, LoggingConfig, NetworkConfig, PathsConfig, ScriptsConfig, ServerConfig,
    TelemetryConfig, TlsConfig, UpstreamConfig,
};
