//! Metrics and observability utilities
//!
//! Provides Prometheus metrics for provider calls, graph builds,
//! fallbacks, and HTTP requests with standardized naming.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, 
    gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all ScholarNet metrics  
pub const METRICS_PREFIX: &str = "scholarnet";

/// Histogram buckets for provider call latency (in seconds)
pub const PROVIDER_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s - default call timeout
];

/// Buckets for whole-build latency
pub const BUILD_BUCKETS: &[f64] = &[
    0.5,
    1.0,
    2.5,
    5.0,
    10.0,
    20.0,
    30.0,
    60.0,   // default build deadline
];

/// Histogram names paired with their bucket boundaries, for the exporter
pub fn histogram_buckets() -> Vec<(String, &'static [f64])> {
    vec![
        (format!("{}_provider_call_duration_seconds", METRICS_PREFIX), PROVIDER_BUCKETS),
        (format!("{}_build_duration_seconds", METRICS_PREFIX), BUILD_BUCKETS),
    ]
}

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );
    
    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );
    
    // Provider metrics
    describe_counter!(
        format!("{}_provider_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Outbound provider calls by provider, operation, and outcome"
    );
    
    describe_histogram!(
        format!("{}_provider_call_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Provider call latency in seconds"
    );
    
    // Build metrics
    describe_counter!(
        format!("{}_builds_total", METRICS_PREFIX),
        Unit::Count,
        "Graph builds by kind and outcome"
    );
    
    describe_histogram!(
        format!("{}_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Graph build latency in seconds"
    );
    
    describe_gauge!(
        format!("{}_graph_nodes", METRICS_PREFIX),
        Unit::Count,
        "Node count of the most recent graph per kind"
    );
    
    describe_gauge!(
        format!("{}_graph_edges", METRICS_PREFIX),
        Unit::Count,
        "Edge count of the most recent graph per kind"
    );
    
    describe_counter!(
        format!("{}_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Sample graph substitutions by reason"
    );
    
    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );
    
    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );
    
    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }
    
    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();
        
        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);
        
        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record one provider call
pub fn record_provider_call(provider: &str, operation: &str, outcome: &str, duration_secs: f64) {
    counter!(
        format!("{}_provider_calls_total", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    
    histogram!(
        format!("{}_provider_call_duration_seconds", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Helper to record a finished build
pub fn record_build(kind: &str, outcome: &str, duration_secs: f64, nodes: usize, edges: usize) {
    counter!(
        format!("{}_builds_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    
    histogram!(
        format!("{}_build_duration_seconds", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .record(duration_secs);
    
    gauge!(
        format!("{}_graph_nodes", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .set(nodes as f64);
    
    gauge!(
        format!("{}_graph_edges", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .set(edges as f64);
}

/// Helper to record a sample graph substitution
pub fn record_fallback(kind: &str, reason: &str) {
    counter!(
        format!("{}_fallbacks_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_buckets_are_sorted() {
        for buckets in [PROVIDER_BUCKETS, BUILD_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
        
        // Default timeouts should land on a bucket boundary
        assert!(PROVIDER_BUCKETS.contains(&10.0));
        assert!(BUILD_BUCKETS.contains(&60.0));
    }
    
    #[test]
    fn test_histogram_buckets_name_recorded_histograms() {
        let buckets = histogram_buckets();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].0, "scholarnet_provider_call_duration_seconds");
        assert_eq!(buckets[1].1, BUILD_BUCKETS);
    }
    
    #[test]
    fn test_recorders_without_exporter() {
        let metrics = RequestMetrics::start("GET", "/v1/networks/sample");
        metrics.finish(200);
        record_provider_call("openalex", "author_works", "data", 0.2);
        record_build("citation", "ok", 1.5, 10, 20);
        record_fallback("citation", "empty_result");
        // Just verify it runs without panic
    }
}
