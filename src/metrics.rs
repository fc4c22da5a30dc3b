//! Prometheus metrics for doctor assignment and model lifecycle.
//!
//! # Example
//! ```no_run
//! use clinic_queue_engine::metrics::{init_metrics, gather_metrics, OVERLOAD_PENALTIES_TOTAL};
//!
//! init_metrics().ok();
//! OVERLOAD_PENALTIES_TOTAL.inc();
//! println!("{}", gather_metrics());
//! ```

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};

const NAMESPACE: &str = "clinic_queue";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Doctor assignment attempts
    ///
    /// Labels: outcome (assigned, rejected)
    pub static ref ASSIGNMENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("assignments_total", "Total number of doctor assignment attempts")
            .namespace(NAMESPACE),
        &["outcome"]
    )
    .expect("Failed to create ASSIGNMENTS_TOTAL metric");

    /// Estimated wait handed back for successful assignments
    pub static ref ASSIGNMENT_ESTIMATED_WAIT_MINUTES: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "assignment_estimated_wait_minutes",
            "Estimated wait of the chosen doctor in minutes"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0, 5.0, 10.0, 15.0, 30.0, 45.0, 60.0, 90.0, 120.0, 180.0, 240.0])
    )
    .expect("Failed to create ASSIGNMENT_ESTIMATED_WAIT_MINUTES metric");

    /// Candidates whose predicted wait was inflated for overload
    pub static ref OVERLOAD_PENALTIES_TOTAL: Counter = Counter::with_opts(
        Opts::new("overload_penalties_total", "Candidates penalized for high daily load")
            .namespace(NAMESPACE)
    )
    .expect("Failed to create OVERLOAD_PENALTIES_TOTAL metric");

    /// Retraining attempts
    ///
    /// Labels: outcome (retrained, skipped, failed)
    pub static ref MODEL_RETRAINS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("model_retrains_total", "Total number of model retraining attempts")
            .namespace(NAMESPACE),
        &["outcome"]
    )
    .expect("Failed to create MODEL_RETRAINS_TOTAL metric");

    /// Model saves that failed after an in-memory swap
    pub static ref MODEL_PERSISTENCE_FAILURES_TOTAL: Counter = Counter::with_opts(
        Opts::new("model_persistence_failures_total", "Failed model store saves")
            .namespace(NAMESPACE)
    )
    .expect("Failed to create MODEL_PERSISTENCE_FAILURES_TOTAL metric");

    /// 1 once a model is serving predictions
    pub static ref MODEL_TRAINED: Gauge = Gauge::with_opts(
        Opts::new("model_trained", "Whether a wait-time model is loaded").namespace(NAMESPACE)
    )
    .expect("Failed to create MODEL_TRAINED metric");
}

/// Register all metrics with the global registry
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(ASSIGNMENTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ASSIGNMENT_ESTIMATED_WAIT_MINUTES.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(OVERLOAD_PENALTIES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(MODEL_RETRAINS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(MODEL_PERSISTENCE_FAILURES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(MODEL_TRAINED.clone()))?;

    tracing::info!("Prometheus metrics registered");
    Ok(())
}

/// Render all registered metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
