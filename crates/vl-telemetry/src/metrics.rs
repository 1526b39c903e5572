//! Prometheus metrics for the command engine.
//!
//! All metrics follow the naming convention: `vl_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., requests_received_total)
//! - **Gauge**: Value that can go up or down (e.g., pending fan-outs)
//! - **Histogram**: Distribution of values (e.g., fan-out completion latency)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // APPLICATION REQUESTS
    // =========================================================================

    /// Requests received from applications, by mobile function
    pub static ref REQUESTS_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("vl_engine_requests_received_total", "Application requests received"),
        &["function"]
    ).expect("metric creation failed");

    /// Requests rejected before any subsystem call
    pub static ref REQUESTS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("vl_engine_requests_rejected_total", "Application requests rejected during validation"),
        &["function", "result"]
    ).expect("metric creation failed");

    /// Terminal responses sent to applications
    pub static ref RESPONSES_SENT: CounterVec = CounterVec::new(
        Opts::new("vl_engine_responses_sent_total", "Terminal responses sent to applications"),
        &["function", "result"]
    ).expect("metric creation failed");

    // =========================================================================
    // SUBSYSTEM FAN-OUT
    // =========================================================================

    /// Calls dispatched to HMI subsystems, by HMI function
    pub static ref SUBSYSTEM_CALLS: CounterVec = CounterVec::new(
        Opts::new("vl_engine_subsystem_calls_total", "Calls dispatched to HMI subsystems"),
        &["function"]
    ).expect("metric creation failed");

    /// Subsystem replies by disposition (pending, completed, duplicate, unknown, unexpected)
    pub static ref SUBSYSTEM_REPLIES: CounterVec = CounterVec::new(
        Opts::new("vl_engine_subsystem_replies_total", "Subsystem replies by disposition"),
        &["disposition"]
    ).expect("metric creation failed");

    /// Fan-outs currently waiting for replies
    pub static ref PENDING_FAN_OUTS: Gauge = Gauge::new(
        "vl_engine_pending_fan_outs",
        "Fan-out records currently held in the correlation table"
    ).expect("metric creation failed");

    /// Fan-outs completed through a forced timeout
    pub static ref FAN_OUT_TIMEOUTS: Counter = Counter::new(
        "vl_engine_fan_out_timeouts_total",
        "Fan-out records completed by injecting timed-out replies"
    ).expect("metric creation failed");

    /// Fan-outs discarded because their application went away
    pub static ref FAN_OUTS_ABANDONED: Counter = Counter::new(
        "vl_engine_fan_outs_abandoned_total",
        "Fan-out records discarded on session teardown"
    ).expect("metric creation failed");

    /// Time between dispatch and the last reply of a fan-out
    pub static ref FAN_OUT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "vl_engine_fan_out_duration_seconds",
            "Time from dispatch until the fan-out record completes"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // FILE STORAGE
    // =========================================================================

    /// Chunk writes by outcome (ok, error)
    pub static ref STORAGE_WRITES: CounterVec = CounterVec::new(
        Opts::new("vl_storage_chunk_writes_total", "Uploaded chunk writes by outcome"),
        &["outcome"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Fails if called twice in the same process.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Requests
        Box::new(REQUESTS_RECEIVED.clone()),
        Box::new(REQUESTS_REJECTED.clone()),
        Box::new(RESPONSES_SENT.clone()),
        // Fan-out
        Box::new(SUBSYSTEM_CALLS.clone()),
        Box::new(SUBSYSTEM_REPLIES.clone()),
        Box::new(PENDING_FAN_OUTS.clone()),
        Box::new(FAN_OUT_TIMEOUTS.clone()),
        Box::new(FAN_OUTS_ABANDONED.clone()),
        Box::new(FAN_OUT_DURATION.clone()),
        // Storage
        Box::new(STORAGE_WRITES.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
