use std::fs;
use std::path::Path;

use super::types::{
    default_base_path, default_event_path, default_io_timeout, default_js_filename,
    default_page_view_path, default_session_path,
};
use crate::client_ip::{HeaderParser, TrustedSubnets};
use crate::config::{Config, NetworkConfig};
use crate::error::{ProxyError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| ProxyError::Config(format!("Failed to read config file: {e}")))?;
    parse_config(&txt)
}

/// Parse, complete and validate a TOML configuration
pub fn parse_config(txt: &str) -> Result<Config> {
    let mut cfg: Config = toml::from_str(txt)
        .map_err(|e| ProxyError::Config(format!("Failed to parse config: {e}")))?;

    apply_defaults(&mut cfg);
    validate_config(&cfg)?;

    Ok(cfg)
}

/// Zero timeouts and blank paths fall back to their defaults
fn apply_defaults(cfg: &mut Config) {
    if cfg.server.write_timeout == 0 {
        cfg.server.write_timeout = default_io_timeout();
    }
    if cfg.server.read_timeout == 0 {
        cfg.server.read_timeout = default_io_timeout();
    }
    if cfg.upstream.timeout_secs == 0 {
        cfg.upstream.timeout_secs = default_io_timeout();
    }

    let paths = &mut cfg.paths;
    for (value, default) in [
        (&mut paths.base_path, default_base_path as fn() -> String),
        (&mut paths.page_view_path, default_page_view_path),
        (&mut paths.event_path, default_event_path),
        (&mut paths.session_path, default_session_path),
        (&mut paths.js_filename, default_js_filename),
    ] {
        if value.trim().is_empty() {
            *value = default();
        }
    }
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.clients.is_empty() {
        return Err(ProxyError::NoClients);
    }

    for (idx, client) in cfg.clients.iter().enumerate() {
        if client.secret.is_empty() {
            return Err(ProxyError::Config(format!("Client #{idx} has no secret")));
        }
    }

    validate_network(&cfg.network)?;

    if let Some(tls) = &cfg.server.tls {
        if !Path::new(&tls.cert_path).exists() {
            return Err(ProxyError::Config(format!(
                "Certificate file not found: {}",
                tls.cert_path
            )));
        }
        if !Path::new(&tls.key_path).exists() {
            return Err(ProxyError::Config(format!("Key file not found: {}", tls.key_path)));
        }
    }

    let routes = [
        cfg.paths.page_view(),
        cfg.paths.event(),
        cfg.paths.session(),
        cfg.paths.script(),
    ];
    for (i, route) in routes.iter().enumerate() {
        if routes[..i].contains(route) {
            return Err(ProxyError::Config(format!("Duplicate endpoint path: {route}")));
        }
    }

    Ok(())
}

fn validate_network(network: &NetworkConfig) -> Result<()> {
    if let Some(unknown) = network
        .header
        .iter()
        .find(|name| HeaderParser::from_name(name).is_none())
    {
        return Err(ProxyError::UnknownIpHeader(unknown.clone()));
    }

    TrustedSubnets::parse(&network.subnets)?;
    Ok(())
}
