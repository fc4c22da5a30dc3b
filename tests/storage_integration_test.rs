mod common;

use clinic_queue_engine::{
    config::{StateBackend, StateConfig},
    ml::{FeatureVector, ModelSource, WaitTimeEstimator},
    queue::{Initialization, QueueManager},
    state::{create_model_store, InMemoryModelStore, ModelStore, SledModelStore},
};
use common::*;
use std::sync::Arc;
use tempfile::TempDir;

fn probes() -> Vec<FeatureVector> {
    vec![
        FeatureVector::from_array([0.0, 10.0, 8.0, 0.0, 1.0]),
        FeatureVector::from_array([7.0, 18.0, 13.0, 3.0, 0.85]),
        FeatureVector::from_array([19.0, 29.0, 23.0, 6.0, 0.7]),
    ]
}

/// Save, load and compare against any ModelStore implementation
async fn test_round_trip<S: ModelStore + ?Sized>(store: &S) {
    assert!(store.load().await.unwrap().is_none());

    let estimator = WaitTimeEstimator::new(fast_config().estimator);
    let state = estimator.bootstrap().unwrap();
    store.save(&state).await.unwrap();

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded.scaler(), state.scaler());
    assert_eq!(loaded.metadata(), state.metadata());
    assert_eq!(
        loaded.predict_batch(&probes()).unwrap(),
        state.predict_batch(&probes()).unwrap()
    );

    // A second save replaces the first
    let retrained = estimator
        .fit(&slow_clinic_outcomes(60), ModelSource::Retrained, 2)
        .unwrap();
    store.save(&retrained).await.unwrap();
    assert_eq!(store.load().await.unwrap().unwrap().metadata().version, 2);
}

#[tokio::test]
async fn test_in_memory_round_trip() {
    let store = InMemoryModelStore::new();
    test_round_trip(&store).await;
    assert_eq!(store.save_count(), 2);
}

#[tokio::test]
async fn test_sled_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledModelStore::new(temp_dir.path()).unwrap();

    test_round_trip(&store).await;
    store.flush().await.unwrap();
    assert!(store.size_on_disk().unwrap() > 0);
}

#[tokio::test]
async fn test_sled_state_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = StateConfig {
        backend: StateBackend::Sled,
        path: Some(temp_dir.path().to_path_buf()),
    };

    let expected = {
        let store = create_model_store(&config).unwrap();
        let manager = QueueManager::new(&fast_config(), store);
        assert!(matches!(
            manager.initialize().await.unwrap(),
            Initialization::Bootstrapped { .. }
        ));
        manager
            .handle()
            .snapshot()
            .unwrap()
            .predict_batch(&probes())
            .unwrap()
    };

    let store = create_model_store(&config).unwrap();
    let manager = QueueManager::new(&fast_config(), store);
    assert_eq!(
        manager.initialize().await.unwrap(),
        Initialization::Loaded { version: 1 }
    );
    assert!(manager.stats().loaded_from_store);
    assert_eq!(
        manager
            .handle()
            .snapshot()
            .unwrap()
            .predict_batch(&probes())
            .unwrap(),
        expected
    );
}

#[tokio::test]
async fn test_corrupt_blob_falls_back_to_bootstrap() {
    let temp_dir = TempDir::new().unwrap();
    {
        let db = sled::open(temp_dir.path()).unwrap();
        let tree = db.open_tree("models").unwrap();
        tree.insert(b"estimator_state", &b"not a model"[..]).unwrap();
        db.flush().unwrap();
    }

    let store: Arc<dyn ModelStore> = Arc::new(SledModelStore::new(temp_dir.path()).unwrap());
    assert_eq!(store.load().await.unwrap_err().error_code(), "PERSISTENCE_ERROR");

    let manager = QueueManager::new(&fast_config(), store.clone());
    assert!(matches!(
        manager.initialize().await.unwrap(),
        Initialization::Bootstrapped { .. }
    ));
    assert!(store.load().await.unwrap().is_some());
}
