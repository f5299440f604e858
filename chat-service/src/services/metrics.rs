//! Prometheus metrics for chat-service.

use crate::services::gateways::GatewayError;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use std::time::Duration;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static CHAT_RESPONSES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GATEWAY_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static GATEWAY_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Must be called once at startup.
pub fn init_metrics() {
    let registry = Registry::new();

    let chat_responses = IntCounterVec::new(
        Opts::new("chat_responses_total", "Chat answers by outcome"),
        &["outcome"],
    )
    .expect("Failed to create chat_responses_total metric");

    let gateway_duration = HistogramVec::new(
        HistogramOpts::new(
            "gateway_request_duration_seconds",
            "Hosted gateway call duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["gateway", "operation"],
    )
    .expect("Failed to create gateway_request_duration_seconds metric");

    let gateway_errors = IntCounterVec::new(
        Opts::new("gateway_errors_total", "Total hosted gateway errors"),
        &["gateway", "operation", "error_type"],
    )
    .expect("Failed to create gateway_errors_total metric");

    registry
        .register(Box::new(chat_responses.clone()))
        .expect("Failed to register chat_responses_total");
    registry
        .register(Box::new(gateway_duration.clone()))
        .expect("Failed to register gateway_request_duration_seconds");
    registry
        .register(Box::new(gateway_errors.clone()))
        .expect("Failed to register gateway_errors_total");

    let _ = REGISTRY.set(registry);
    let _ = CHAT_RESPONSES_TOTAL.set(chat_responses);
    let _ = GATEWAY_REQUEST_DURATION_SECONDS.set(gateway_duration);
    let _ = GATEWAY_ERRORS_TOTAL.set(gateway_errors);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record a chat answer by outcome label.
pub fn record_chat_response(outcome: &str) {
    if let Some(counter) = CHAT_RESPONSES_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record one gateway call and, when it failed, its error kind.
pub fn record_gateway_call(
    gateway: &str,
    operation: &str,
    elapsed: Duration,
    error: Option<&GatewayError>,
) {
    if let Some(histogram) = GATEWAY_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[gateway, operation])
            .observe(elapsed.as_secs_f64());
    }
    if let Some(err) = error {
        if let Some(counter) = GATEWAY_ERRORS_TOTAL.get() {
            counter
                .with_label_values(&[gateway, operation, err.kind()])
                .inc();
        }
    }
}
