use once_cell::sync::Lazy;
use prometheus::{Gauge, GaugeVec, HistogramVec, IntCounterVec, IntGaugeVec, Registry, TextEncoder};

use crate::models::{ContainerStats, ProbeOutcome, SystemStats};

// Global Prometheus registry
pub static PROMETHEUS_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();

    registry
        .register(Box::new(SERVICE_UP.clone()))
        .expect("Failed to register service_up");
    registry
        .register(Box::new(SERVICE_RESPONSE_TIME_MS.clone()))
        .expect("Failed to register service_response_time_ms");
    registry
        .register(Box::new(CONTAINER_CPU_PERCENT.clone()))
        .expect("Failed to register container_cpu_percent");
    registry
        .register(Box::new(CONTAINER_MEMORY_PERCENT.clone()))
        .expect("Failed to register container_memory_percent");
    registry
        .register(Box::new(CONTAINER_MEMORY_USAGE_BYTES.clone()))
        .expect("Failed to register container_memory_usage_bytes");
    registry
        .register(Box::new(CONTAINER_NETWORK_RX_BYTES.clone()))
        .expect("Failed to register container_network_rx_bytes");
    registry
        .register(Box::new(CONTAINER_NETWORK_TX_BYTES.clone()))
        .expect("Failed to register container_network_tx_bytes");
    registry
        .register(Box::new(SYSTEM_CPU_PERCENT.clone()))
        .expect("Failed to register system_cpu_percent");
    registry
        .register(Box::new(SYSTEM_MEMORY_PERCENT.clone()))
        .expect("Failed to register system_memory_percent");
    registry
        .register(Box::new(SYSTEM_DISK_USAGE_PERCENT.clone()))
        .expect("Failed to register system_disk_usage_percent");
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register http_request_duration_seconds");

    registry
});

// Service health (1=up, 0=down), labeled by registry key
pub static SERVICE_UP: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        prometheus::Opts::new("ai_stack_service_up", "Service health status (1=up, 0=down)"),
        &["service"],
    )
    .expect("Failed to create service_up metric")
});

pub static SERVICE_RESPONSE_TIME_MS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        prometheus::Opts::new(
            "ai_stack_service_response_time_ms",
            "Service response time in milliseconds",
        ),
        &["service"],
    )
    .expect("Failed to create service_response_time_ms metric")
});

pub static CONTAINER_CPU_PERCENT: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        prometheus::Opts::new("ai_stack_container_cpu_percent", "Container CPU usage percentage"),
        &["container"],
    )
    .expect("Failed to create container_cpu_percent metric")
});

pub static CONTAINER_MEMORY_PERCENT: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        prometheus::Opts::new(
            "ai_stack_container_memory_percent",
            "Container memory usage percentage",
        ),
        &["container"],
    )
    .expect("Failed to create container_memory_percent metric")
});

pub static CONTAINER_MEMORY_USAGE_BYTES: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        prometheus::Opts::new(
            "ai_stack_container_memory_usage_bytes",
            "Container memory usage in bytes",
        ),
        &["container"],
    )
    .expect("Failed to create container_memory_usage_bytes metric")
});

pub static CONTAINER_NETWORK_RX_BYTES: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "ai_stack_container_network_rx_bytes",
            "Container network receive bytes",
        ),
        &["container"],
    )
    .expect("Failed to create container_network_rx_bytes metric")
});

pub static CONTAINER_NETWORK_TX_BYTES: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "ai_stack_container_network_tx_bytes",
            "Container network transmit bytes",
        ),
        &["container"],
    )
    .expect("Failed to create container_network_tx_bytes metric")
});

pub static SYSTEM_CPU_PERCENT: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("ai_stack_system_cpu_percent", "System CPU usage percentage")
        .expect("Failed to create system_cpu_percent metric")
});

pub static SYSTEM_MEMORY_PERCENT: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("ai_stack_system_memory_percent", "System memory usage percentage")
        .expect("Failed to create system_memory_percent metric")
});

pub static SYSTEM_DISK_USAGE_PERCENT: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        prometheus::Opts::new("ai_stack_system_disk_usage_percent", "System disk usage percentage"),
        &["mountpoint"],
    )
    .expect("Failed to create system_disk_usage_percent metric")
});

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("ai_stack_http_requests_total", "Total HTTP requests"),
        &["method", "endpoint", "status"],
    )
    .expect("Failed to create http_requests_total metric")
});

pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "ai_stack_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["method", "endpoint"],
    )
    .expect("Failed to create http_request_duration_seconds histogram")
});

// Helper functions to update metrics

pub fn record_probe_outcome(service_key: &str, outcome: &ProbeOutcome) {
    match outcome {
        ProbeOutcome::Up { response_time_ms } => {
            SERVICE_UP.with_label_values(&[service_key]).set(1.0);
            SERVICE_RESPONSE_TIME_MS
                .with_label_values(&[service_key])
                .set(*response_time_ms);
        }
        ProbeOutcome::Down { .. } => {
            SERVICE_UP.with_label_values(&[service_key]).set(0.0);
        }
        ProbeOutcome::Disabled => {}
    }
}

pub fn update_container_metrics(service_key: &str, stats: &ContainerStats) {
    CONTAINER_CPU_PERCENT
        .with_label_values(&[service_key])
        .set(stats.cpu_percent);
    CONTAINER_MEMORY_PERCENT
        .with_label_values(&[service_key])
        .set(stats.memory_percent);
    CONTAINER_MEMORY_USAGE_BYTES
        .with_label_values(&[service_key])
        .set(stats.memory_usage as f64);
    CONTAINER_NETWORK_RX_BYTES
        .with_label_values(&[service_key])
        .set(stats.network_rx as i64);
    CONTAINER_NETWORK_TX_BYTES
        .with_label_values(&[service_key])
        .set(stats.network_tx as i64);
}

pub fn update_system_metrics(stats: &SystemStats) {
    SYSTEM_CPU_PERCENT.set(stats.cpu_percent);
    SYSTEM_MEMORY_PERCENT.set(stats.memory_percent);
    for (mountpoint, pct) in &stats.disks {
        SYSTEM_DISK_USAGE_PERCENT.with_label_values(&[mountpoint]).set(*pct);
    }
}

pub fn record_http_request(method: &str, endpoint: &str, status: u16) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();
}

pub fn observe_http_request_duration(method: &str, endpoint: &str, seconds: f64) {
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(seconds);
}

/// Encode the registry in Prometheus text exposition format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    encoder.encode_to_string(&metric_families).unwrap_or_else(|e| {
        tracing::error!("Failed to encode Prometheus metrics: {}", e);
        String::new()
    })
}
