use std::fs;

use pirsch_proxy_lib::config::{load_from_path, parse_config};
use pirsch_proxy_lib::ProxyError;

mod helpers;
use helpers::{tmp_path, TestResult};

#[test]
fn loads_minimal_config_with_defaults() -> TestResult {
    let path = tmp_path("minimal.toml");
    fs::write(
        &path,
        r#"
[[clients]]
id = "abc"
secret = "s3cret"
"#,
    )?;

    let cfg = load_from_path(&path)?;
    assert_eq!(cfg.base_url, "https://api.pirsch.io");
    assert_eq!(cfg.server.listen.to_string(), "0.0.0.0:8080");
    assert_eq!(cfg.server.write_timeout, 5);
    assert_eq!(cfg.server.read_timeout, 5);
    assert_eq!(cfg.server.shutdown_timeout, 10);
    assert!(cfg.server.tls.is_none());
    assert_eq!(cfg.upstream.request_retries, 5);
    assert!(cfg.network.header.is_empty());
    assert!(cfg.network.subnets.is_empty());
    assert_eq!(cfg.paths.page_view(), "/p/pv");
    assert_eq!(cfg.paths.event(), "/p/e");
    assert_eq!(cfg.paths.session(), "/p/s");
    assert_eq!(cfg.paths.script(), "/p/pa.js");
    assert_eq!(cfg.scripts.ttl_secs, 3600);
    assert_eq!(cfg.logging.level, "info");
    assert!(cfg.telemetry.metrics_port.is_none());
    Ok(())
}

#[test]
fn loads_full_config() -> TestResult {
    let cfg = parse_config(
        r#"
base_url = "http://localhost:9999"

[server]
host = "127.0.0.1:8081"
write_timeout = 10
read_timeout = 0

[[clients]]
secret = "token-only"

[[clients]]
id = "oauth"
secret = "s3cret"

[network]
header = ["CF-Connecting-IP", "x-forwarded-for"]
subnets = ["10.0.0.0/8", "fd00::/8"]

[paths]
base_path = "/stats/"
page_view_path = "hit"
js_filename = " "

[telemetry]
metrics_port = 9090
"#,
    )?;

    assert_eq!(cfg.server.listen.to_string(), "127.0.0.1:8081");
    assert_eq!(cfg.server.write_timeout, 10);
    // zero falls back to the default
    assert_eq!(cfg.server.read_timeout, 5);
    assert_eq!(cfg.clients.len(), 2);
    assert!(cfg.clients[0].id.is_empty());
    assert_eq!(cfg.network.header, vec!["CF-Connecting-IP", "x-forwarded-for"]);
    assert_eq!(cfg.paths.page_view(), "/stats/hit");
    assert_eq!(cfg.paths.script(), "/stats/pa.js");
    assert_eq!(cfg.telemetry.metrics_port, Some(9090));
    Ok(())
}

#[test]
fn rejects_unknown_header() {
    let result = parse_config(
        r#"
[[clients]]
secret = "x"

[network]
header = ["X-Client-IP"]
"#,
    );
    assert!(matches!(result, Err(ProxyError::UnknownIpHeader(name)) if name == "X-Client-IP"));
}

#[test]
fn rejects_invalid_subnet() {
    let result = parse_config(
        r#"
[[clients]]
secret = "x"

[network]
subnets = ["10.0.0.0/33"]
"#,
    );
    assert!(
        matches!(result, Err(ProxyError::InvalidSubnet { ref subnet, .. }) if subnet == "10.0.0.0/33")
    );
}

#[test]
fn requires_a_client() {
    assert!(matches!(parse_config(""), Err(ProxyError::NoClients)));
}

#[test]
fn requires_client_secret() {
    let result = parse_config(
        r#"
[[clients]]
id = "abc"
secret = ""
"#,
    );
    assert!(matches!(result, Err(ProxyError::Config(_))));
}

#[test]
fn rejects_duplicate_paths() {
    let result = parse_config(
        r#"
[[clients]]
secret = "x"

[paths]
event_path = "pv"
"#,
    );
    assert!(matches!(result, Err(ProxyError::Config(msg)) if msg.contains("/p/pv")));
}

#[test]
fn rejects_missing_tls_files() {
    let result = parse_config(
        r#"
[[clients]]
secret = "x"

[server.tls]
cert_path = "/nonexistent/server.crt"
key_path = "/nonexistent/server.key"
"#,
    );
    assert!(matches!(result, Err(ProxyError::Config(msg)) if msg.contains("server.crt")));
}

#[test]
fn reports_missing_file() {
    let result = load_from_path(tmp_path("does-not-exist.toml"));
    assert!(matches!(result, Err(ProxyError::Config(_))));
}

#[test]
fn example_config_is_valid() -> TestResult {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../config.example.toml");
    let cfg = load_from_path(path)?;
    assert_eq!(cfg.clients.len(), 1);
    assert_eq!(cfg.network.subnets, vec!["10.0.0.0/8"]);
    Ok(())
}
