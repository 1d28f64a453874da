use thiserror::Error;

use crate::analytics::AnalyticsError;
use crate::scripts::ScriptError;

/// Errors that can occur in the proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown IP header '{0}'")]
    UnknownIpHeader(String),

    #[error("Invalid subnet '{subnet}': {source}")]
    InvalidSubnet {
        subnet: String,
        #[source]
        source: ipnet::AddrParseError,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("No analytics clients configured")]
    NoClients,

    #[error("No private key found in key file")]
    NoPrivateKey,
}

pub type Result<T> = std::result::Result<T, ProxyError>;
