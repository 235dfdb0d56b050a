//! Adapter metrics

use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static::lazy_static! {
    /// Provider API requests by provider, operation and outcome
    pub static ref PROVIDER_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "cobranca_provider_requests_total",
        "Total provider API requests",
        &["provider", "operation", "outcome"]
    )
    .unwrap();

    /// Provider API request latency in seconds
    pub static ref PROVIDER_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "cobranca_provider_request_duration_seconds",
        "Provider API request duration",
        &["provider", "operation"]
    )
    .unwrap();

    /// Token endpoint calls by provider, grant and outcome
    pub static ref TOKEN_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "cobranca_token_requests_total",
        "Token endpoint calls (authenticate/refresh)",
        &["provider", "grant", "outcome"]
    )
    .unwrap();
}
