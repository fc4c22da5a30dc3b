//! Shared fixtures for integration tests
#![allow(dead_code)]

use clinic_queue_engine::config::{Config, StateBackend};
use clinic_queue_engine::ml::{FeatureVector, TrainingSample};
use clinic_queue_engine::models::{ClockReading, DoctorCandidate, FixedClock};
use clinic_queue_engine::queue::QueueManager;
use clinic_queue_engine::state::InMemoryModelStore;
use std::sync::Arc;

/// Config with a forest small enough to fit quickly
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.estimator.n_trees = 10;
    config.estimator.max_depth = 6;
    config.estimator.bootstrap_samples = 300;
    config.state.backend = StateBackend::Memory;
    config.state.path = None;
    config
}

/// Tuesday, 10:00
pub fn morning() -> ClockReading {
    ClockReading::new(10, 1).unwrap()
}

pub fn manager_with_store(config: &Config, store: &InMemoryModelStore) -> QueueManager {
    QueueManager::new(config, Arc::new(store.clone())).with_clock(Arc::new(FixedClock(morning())))
}

/// A small cardiology department
pub fn department() -> Vec<DoctorCandidate> {
    vec![
        DoctorCandidate::new(101, 8, 20.0, 20, 40),
        DoctorCandidate::new(102, 2, 15.0, 35, 40),
        DoctorCandidate::new(103, 5, 12.0, 10, 30),
    ]
}

/// Outcomes whose waits run well above the bootstrap relation
pub fn slow_clinic_outcomes(n: usize) -> Vec<TrainingSample> {
    (0..n)
        .map(|i| {
            let queue = (i % 15) as f64;
            let consult = 10.0 + (i % 4) as f64 * 5.0;
            let features = FeatureVector::from_array([
                queue,
                consult,
                (8 + i % 10) as f64,
                (i % 7) as f64,
                0.75 + (i % 5) as f64 * 0.05,
            ]);
            TrainingSample::new(features, queue * consult * 2.5 + 10.0)
        })
        .collect()
}

/// Check that every HELP line in Prometheus text output is followed by its TYPE line
pub fn validate_exposition_format(output: &str) -> Result<(), String> {
    let lines: Vec<&str> = output.lines().map(str::trim).collect();

    for (i, line) in lines.iter().enumerate() {
        if let Some(rest) = line.strip_prefix("# HELP ") {
            let metric_name = rest.split_whitespace().next().unwrap_or_default();
            let next = lines.get(i + 1).copied().unwrap_or_default();
            if !next.starts_with(&format!("# TYPE {}", metric_name)) {
                return Err(format!(
                    "Line {}: HELP not followed by TYPE for metric {}",
                    i + 1,
                    metric_name
                ));
            }
        }

        if let Some(rest) = line.strip_prefix("# TYPE ") {
            let metric_type = rest.split_whitespace().nth(1).unwrap_or_default();
            let valid_types = ["counter", "gauge", "histogram", "summary", "untyped"];
            if !valid_types.contains(&metric_type) {
                return Err(format!("Line {}: Invalid metric type '{}'", i + 1, metric_type));
            }
        }
    }

    Ok(())
}

/// Extract the sample value from a Prometheus output line
pub fn extract_metric_value(line: &str) -> Option<f64> {
    line.split_whitespace().last()?.parse::<f64>().ok()
}

/// Value of the first sample line starting with `prefix`
pub fn metric_value(output: &str, prefix: &str) -> Option<f64> {
    output
        .lines()
        .find(|line| line.starts_with(prefix))
        .and_then(extract_metric_value)
}
