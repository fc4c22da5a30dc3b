//! Metrics exposed while the queue engine runs

mod common;

use clinic_queue_engine::{
    metrics::{gather_metrics, init_metrics, MODEL_TRAINED},
    models::PatientProfile,
    state::InMemoryModelStore,
};
use common::*;

#[tokio::test]
async fn test_metrics_follow_engine_activity() {
    let _ = init_metrics();

    let manager = manager_with_store(&fast_config(), &InMemoryModelStore::new());
    manager.initialize().await.unwrap();
    assert_eq!(MODEL_TRAINED.get(), 1.0);

    manager
        .assign_doctor(&department(), &PatientProfile::new(40, ""))
        .unwrap();
    let _ = manager.assign_doctor(&[], &PatientProfile::new(40, ""));
    manager.update_model(&slow_clinic_outcomes(10)).await.unwrap();

    let output = gather_metrics();
    validate_exposition_format(&output).unwrap();

    let assigned = metric_value(&output, "clinic_queue_assignments_total{outcome=\"assigned\"}");
    let rejected = metric_value(&output, "clinic_queue_assignments_total{outcome=\"rejected\"}");
    let skipped = metric_value(&output, "clinic_queue_model_retrains_total{outcome=\"skipped\"}");

    assert!(assigned.unwrap() >= 1.0);
    assert!(rejected.unwrap() >= 1.0);
    assert!(skipped.unwrap() >= 1.0);
    assert!(output.contains("clinic_queue_assignment_estimated_wait_minutes_bucket"));
    // Doctor 102 is at 35/40 of capacity
    assert!(metric_value(&output, "clinic_queue_overload_penalties_total").unwrap() >= 1.0);
}

#[test]
fn test_metric_names_are_namespaced() {
    let _ = init_metrics();
    let output = gather_metrics();

    for line in output.lines().filter(|l| l.starts_with("# TYPE")) {
        let name = line.split_whitespace().nth(2).unwrap();
        assert!(name.starts_with("clinic_queue_"), "unexpected metric {}", name);
        if line.ends_with("counter") {
            assert!(name.ends_with("_total"), "counter {} lacks _total", name);
        }
    }
}
