//! Prometheus metrics for observability.
//!
//! The server registry carries the HTTP request metrics defined here plus
//! the download pipeline metrics from `youcast_core::metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "youcast_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("youcast_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "youcast_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// Item ids are RFC 3339 timestamps, possibly percent-encoded.
static ITEM_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}T[0-9:.%A-Fa-f]+(Z|[+-][0-9:%A-Fa-f]+)").unwrap()
});

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Download pipeline
    for metric in youcast_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    if path.starts_with("/downloads/") {
        return "/downloads/{file}".to_string();
    }
    let result = ITEM_ID_REGEX.replace_all(path, "{id}");
    let result = NUMERIC_REGEX.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_item_id() {
        let path = "/api/v1/jobs/2024-01-01T12:00:00.000000000Z/retry";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}/retry");
    }

    #[test]
    fn test_normalize_path_encoded_item_id() {
        let path = "/api/v1/items/2024-01-01T12%3A00%3A00.000000000Z";
        assert_eq!(normalize_path(path), "/api/v1/items/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/jobs/12345";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_media_file() {
        let path = "/downloads/3f2a9c.mp3";
        assert_eq!(normalize_path(path), "/downloads/{file}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Prometheus only outputs vector metrics that have been accessed
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();
        youcast_core::metrics::JOBS_CLAIMED
            .with_label_values(&["added"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));

        // HTTP metrics
        assert!(output.contains("youcast_http_request_duration_seconds"));
        assert!(output.contains("youcast_http_requests_total"));
        assert!(output.contains("youcast_http_requests_in_flight"));

        // Pipeline metrics
        assert!(output.contains("youcast_jobs_claimed_total"));
        assert!(output.contains("youcast_jobs_enqueued_total"));
    }
}
