use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, register_int_counter,
    register_int_gauge, CounterVec, Encoder, Histogram, HistogramVec, IntCounter, IntGauge,
    TextEncoder,
};

lazy_static! {
    // Ingestion metrics
    pub static ref MESSAGE_COUNTER: CounterVec = register_counter_vec!(
        "orders_messages_total",
        "Total number of order messages handled, by outcome",
        &["outcome"]
    )
    .expect("metric cannot be created");

    pub static ref MESSAGE_DURATION: Histogram = register_histogram!(
        "orders_message_duration_seconds",
        "Order message processing duration in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("metric cannot be created");

    pub static ref CONSUMER_TRANSPORT_ERRORS: IntCounter = register_int_counter!(
        "orders_consumer_transport_errors_total",
        "Total number of failures reading from the message broker"
    )
    .expect("metric cannot be created");

    // Cache metrics
    pub static ref CACHE_REQUEST_COUNTER: CounterVec = register_counter_vec!(
        "orders_cache_requests_total",
        "Total number of order cache lookups",
        &["status"]
    )
    .expect("metric cannot be created");

    pub static ref CACHE_SIZE: IntGauge = register_int_gauge!(
        "orders_cache_size",
        "Number of orders held in the in-process cache"
    )
    .expect("metric cannot be created");

    // Repository metrics
    pub static ref REPOSITORY_OPERATIONS: CounterVec = register_counter_vec!(
        "orders_repository_operations_total",
        "Total number of repository operations",
        &["operation", "status"]
    )
    .expect("metric cannot be created");

    pub static ref REPOSITORY_DURATION: HistogramVec = register_histogram_vec!(
        "orders_repository_duration_seconds",
        "Repository operation duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("metric cannot be created");
}

/// Get all metrics in Prometheus text format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record the outcome of one consumed message
pub fn record_message(outcome: &str, duration_secs: f64) {
    MESSAGE_COUNTER.with_label_values(&[outcome]).inc();
    MESSAGE_DURATION.observe(duration_secs);
}

pub fn record_transport_error() {
    CONSUMER_TRANSPORT_ERRORS.inc();
}

/// Helper function to record cache hit/miss
pub fn record_cache_request(hit: bool) {
    let status = if hit { "hit" } else { "miss" };
    CACHE_REQUEST_COUNTER.with_label_values(&[status]).inc();
}

pub fn set_cache_size(size: usize) {
    CACHE_SIZE.set(size as i64);
}

/// Helper function to record a repository round-trip
pub fn record_repository_operation(operation: &str, success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "error" };
    REPOSITORY_OPERATIONS
        .with_label_values(&[operation, status])
        .inc();
    REPOSITORY_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_metrics() {
        record_message("processed", 0.01);
        let metrics = gather_metrics().unwrap();
        assert!(metrics.contains("orders_"));
    }

    #[test]
    fn test_record_message() {
        let before = MESSAGE_COUNTER.with_label_values(&["validation_error"]).get();
        record_message("validation_error", 0.002);
        let after = MESSAGE_COUNTER.with_label_values(&["validation_error"]).get();

        assert_eq!(after - before, 1.0);
        assert!(gather_metrics().unwrap().contains("orders_messages_total"));
    }

    #[test]
    fn test_record_cache_request() {
        record_cache_request(true);
        record_cache_request(false);
        let metrics = gather_metrics().unwrap();
        assert!(metrics.contains("orders_cache_requests_total"));
    }

    #[test]
    fn test_record_repository_operation() {
        record_repository_operation("save", false, 0.1);
        let metrics = gather_metrics().unwrap();
        assert!(metrics.contains("orders_repository_operations_total"));
        assert!(metrics.contains("orders_repository_duration_seconds"));
    }
}
