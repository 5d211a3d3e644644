use std::time::Instant;

use errors::ErrorClass;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub struct Telemetry;

impl Telemetry {
    pub fn record_request(endpoint: &'static str) {
        counter!("quickbrief_requests_total", "endpoint" => endpoint).increment(1);
    }

    pub fn record_error(endpoint: &'static str, class: ErrorClass) {
        counter!(
            "quickbrief_errors_total",
            "endpoint" => endpoint,
            "class" => class.as_str()
        )
        .increment(1);
    }

    pub fn record_latency(endpoint: &'static str, duration_ms: f64) {
        histogram!("quickbrief_request_duration_ms", "endpoint" => endpoint).record(duration_ms);
    }
}

/// Counts a request on creation and records its latency on `finish`.
pub struct RequestTimer {
    start: Instant,
    endpoint: &'static str
}

impl RequestTimer {
    pub fn new(endpoint: &'static str) -> Self {
        Telemetry::record_request(endpoint);
        Self {
            start: Instant::now(),
            endpoint
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed().as_secs_f64() * 1000.0;
        Telemetry::record_latency(self.endpoint, duration);
    }
}

/// Installs the process-wide Prometheus recorder. Call once per process.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
