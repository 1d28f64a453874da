use http_body_util::BodyExt;
use pirsch_proxy_lib::telemetry::{handle_metrics, init_metrics};
use serial_test::serial;

mod helpers;
use helpers::TestResult;

#[tokio::test]
#[serial]
async fn metrics_are_exported_in_prometheus_format() -> TestResult {
    let (metrics, registry) = init_metrics()?;

    metrics.record_request("GET", 200, "page_view", 0.012);
    metrics.record_client_ip_source("X-Forwarded-For");
    metrics.record_upstream_request("/api/v1/hit", 0.05, Some("status"));
    metrics.record_script_refresh("ok");

    let resp = handle_metrics(&registry)?;
    assert_eq!(resp.status(), http::StatusCode::OK);
    let body = resp.into_body().collect().await?.to_bytes();
    let text = String::from_utf8(body.to_vec())?;

    assert!(text.contains("pirsch_proxy_requests_total"));
    assert!(text.contains(r#"route="page_view""#));
    assert!(text.contains("pirsch_proxy_client_ip_resolutions_total"));
    assert!(text.contains(r#"source="X-Forwarded-For""#));
    assert!(text.contains("pirsch_proxy_upstream_errors_total"));
    assert!(text.contains("pirsch_proxy_script_refreshes_total"));
    assert!(text.contains("pirsch_proxy_build_info"));
    Ok(())
}
