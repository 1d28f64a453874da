#![forbid(unsafe_code)]

pub mod analytics;
pub mod client_ip;
pub mod config;
pub mod error;
pub mod proxy;
pub mod scripts;
pub mod telemetry;
pub mod tls;

pub use analytics::{setup_clients, AnalyticsClient};
pub use client_ip::{ClientIpResolver, HeaderParser, TrustedSubnets};
pub use config::{load_from_path, Config};
pub use error::{ProxyError, Result};
pub use proxy::{run, serve, AppState};
pub use scripts::ScriptCache;
pub use tls::build_tls_acceptor;
