//! Prometheus metrics for backoffice-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use service_core::error::AppError;

/// Inventory and account postings by kind and outcome.
pub static POSTINGS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_postings_total",
        "Total number of ledger postings",
        &["kind", "status"] // kind: purchase_invoice, receive_cash, ...; status: ok, error
    )
    .expect("Failed to register postings_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "backoffice_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&POSTINGS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Count a posting attempt and, on failure, its error code.
pub fn record_posting<T>(kind: &str, result: &Result<T, AppError>) {
    match result {
        Ok(_) => POSTINGS_TOTAL.with_label_values(&[kind, "ok"]).inc(),
        Err(err) => {
            POSTINGS_TOTAL.with_label_values(&[kind, "error"]).inc();
            record_error(err);
        }
    }
}

pub fn record_error(err: &AppError) {
    ERRORS_TOTAL
        .with_label_values(&[&err.code().to_lowercase()])
        .inc();
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
