use opentelemetry::global;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter, UpDownCounter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

pub mod labels {
    pub const ROUTE: &str = "route";
    pub const METHOD: &str = "method";
    pub const STATUS_CODE: &str = "status_code";
    pub const ENDPOINT: &str = "endpoint";
    pub const ERROR_TYPE: &str = "error_type";
    pub const SOURCE: &str = "source";
    pub const RESULT: &str = "result";
    pub const VERSION: &str = "version";
    pub const RUST_VERSION: &str = "rust_version";
}

pub mod values {
    pub const RESULT_OK: &str = "ok";
    pub const RESULT_STALE: &str = "stale";
    pub const RESULT_FAILED: &str = "failed";
}

#[derive(Clone)]
pub struct Metrics {
    pub connections_total: Counter<u64>,
    pub connections_active: UpDownCounter<i64>,

    pub requests_total: Counter<u64>,
    pub requests_duration_seconds: Histogram<f64>,

    // source label: "peer" | "untrusted_peer" | header name
    pub client_ip_resolutions_total: Counter<u64>,

    pub upstream_requests_total: Counter<u64>,
    pub upstream_errors_total: Counter<u64>,
    pub upstream_duration_seconds: Histogram<f64>,

    pub script_refreshes_total: Counter<u64>,

    pub build_info: Gauge<u64>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            connections_total: meter
                .u64_counter("pirsch_proxy_connections_total")
                .with_description("Total number of connections accepted")
                .build(),
            connections_active: meter
                .i64_up_down_counter("pirsch_proxy_connections_active")
                .with_description("Number of active connections")
                .build(),

            requests_total: meter
                .u64_counter("pirsch_proxy_requests_total")
                .with_description("Total number of requests processed")
                .build(),
            requests_duration_seconds: meter
                .f64_histogram("pirsch_proxy_requests_duration_seconds")
                .with_description("Request duration in seconds")
                .build(),

            client_ip_resolutions_total: meter
                .u64_counter("pirsch_proxy_client_ip_resolutions_total")
                .with_description("Client IP resolutions by the source that produced the address")
                .build(),

            upstream_requests_total: meter
                .u64_counter("pirsch_proxy_upstream_requests_total")
                .with_description("Total number of requests sent to the analytics API")
                .build(),
            upstream_errors_total: meter
                .u64_counter("pirsch_proxy_upstream_errors_total")
                .with_description("Total number of failed analytics API requests")
                .build(),
            upstream_duration_seconds: meter
                .f64_histogram("pirsch_proxy_upstream_duration_seconds")
                .with_description("Analytics API request duration in seconds")
                .build(),

            script_refreshes_total: meter
                .u64_counter("pirsch_proxy_script_refreshes_total")
                .with_description("Tracking script downloads by result")
                .build(),

            build_info: meter
                .u64_gauge("pirsch_proxy_build_info")
                .with_description("Build information (version, rust version)")
                .build(),
        }
    }

    /// Set build info metric with version labels
    pub fn set_build_info(&self) {
        let version = env!("CARGO_PKG_VERSION");
        let rust_version = env!("CARGO_PKG_RUST_VERSION");

        self.build_info.record(
            1,
            &[
                KeyValue::new(labels::VERSION, version),
                KeyValue::new(labels::RUST_VERSION, rust_version),
            ],
        );
    }

    pub fn record_connection_opened(&self) {
        self.connections_total.add(1, &[]);
        self.connections_active.add(1, &[]);
    }

    pub fn record_connection_closed(&self) {
        self.connections_active.add(-1, &[]);
    }

    pub fn record_request(&self, method: &str, status_code: u16, route: &str, duration: f64) {
        let attrs = [
            KeyValue::new(labels::METHOD, method.to_string()),
            KeyValue::new(labels::STATUS_CODE, status_code.to_string()),
            KeyValue::new(labels::ROUTE, route.to_string()),
        ];
        self.requests_total.add(1, &attrs);
        self.requests_duration_seconds.record(duration, &attrs);
    }

    pub fn record_client_ip_source(&self, source: &str) {
        self.client_ip_resolutions_total
            .add(1, &[KeyValue::new(labels::SOURCE, source.to_string())]);
    }

    pub fn record_upstream_request(&self, endpoint: &str, duration: f64, error_type: Option<&str>) {
        let endpoint = KeyValue::new(labels::ENDPOINT, endpoint.to_string());
        self.upstream_requests_total.add(1, std::slice::from_ref(&endpoint));
        self.upstream_duration_seconds
            .record(duration, std::slice::from_ref(&endpoint));
        if let Some(error_type) = error_type {
            self.upstream_errors_total.add(
                1,
                &[endpoint, KeyValue::new(labels::ERROR_TYPE, error_type.to_string())],
            );
        }
    }

    pub fn record_script_refresh(&self, result: &str) {
        self.script_refreshes_total
            .add(1, &[KeyValue::new(labels::RESULT, result.to_string())]);
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("pirsch-proxy");
    let metrics = Arc::new(Metrics::new(meter));

    metrics.set_build_info();

    Ok((metrics, registry))
}
