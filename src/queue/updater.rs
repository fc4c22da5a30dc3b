use crate::error::{AppError, Result};
use crate::metrics::{MODEL_PERSISTENCE_FAILURES_TOTAL, MODEL_RETRAINS_TOTAL};
use crate::ml::{EstimatorHandle, ModelSource, RegressionMetrics, TrainingSample, WaitTimeEstimator};
use crate::state::ModelStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Fewest outcomes a retrain will accept
pub const MIN_RETRAIN_SAMPLES: usize = 50;

/// Whether a freshly swapped-in state reached the model store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceOutcome {
    Saved,
    Failed { error: String },
}

impl PersistenceOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistenceOutcome::Saved)
    }
}

/// Result of an update request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UpdateResult {
    /// Too few samples; the current state was left alone
    Skipped { received: usize, required: usize },

    /// A new state was fitted and is now serving
    Retrained {
        version: u64,
        n_samples: usize,
        metrics: RegressionMetrics,
        persistence: PersistenceOutcome,
    },
}

impl UpdateResult {
    pub fn is_skipped(&self) -> bool {
        matches!(self, UpdateResult::Skipped { .. })
    }
}

/// Retrains the estimator from observed outcomes and swaps the result in
pub struct ContinuousLearningUpdater {
    estimator: WaitTimeEstimator,
    writer: Mutex<()>,
}

impl ContinuousLearningUpdater {
    pub fn new(estimator: WaitTimeEstimator) -> Self {
        Self {
            estimator,
            writer: Mutex::new(()),
        }
    }

    /// Exclusive access for anything that publishes a new state
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// Refit on exactly `samples` and publish the result.
    ///
    /// A failed fit leaves the current state serving. A failed save does not
    /// undo the swap; it is reported in the returned outcome.
    pub async fn update(
        &self,
        handle: &EstimatorHandle,
        store: &dyn ModelStore,
        samples: &[TrainingSample],
    ) -> Result<UpdateResult> {
        if samples.len() < MIN_RETRAIN_SAMPLES {
            warn!(
                received = samples.len(),
                required = MIN_RETRAIN_SAMPLES,
                "Too few outcomes for retraining"
            );
            MODEL_RETRAINS_TOTAL.with_label_values(&["skipped"]).inc();
            return Ok(UpdateResult::Skipped {
                received: samples.len(),
                required: MIN_RETRAIN_SAMPLES,
            });
        }

        let _guard = self.lock_writes().await;

        let version = handle
            .try_snapshot()
            .map(|current| current.metadata().version + 1)
            .unwrap_or(1);

        let estimator = self.estimator.clone();
        let batch = samples.to_vec();
        let fitted = tokio::task::spawn_blocking(move || {
            estimator.fit(&batch, ModelSource::Retrained, version)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Training task failed: {}", e)))
        .and_then(|result| result);

        let state = match fitted {
            Ok(state) => Arc::new(state),
            Err(e) => {
                error!("Failed to retrain wait-time model: {}", e);
                MODEL_RETRAINS_TOTAL.with_label_values(&["failed"]).inc();
                return Err(e);
            }
        };

        handle.publish_arc(state.clone());
        MODEL_RETRAINS_TOTAL.with_label_values(&["retrained"]).inc();

        let persistence = match store.save(&state).await {
            Ok(()) => PersistenceOutcome::Saved,
            Err(e) => {
                warn!("Retrained model is serving but could not be saved: {}", e);
                MODEL_PERSISTENCE_FAILURES_TOTAL.inc();
                PersistenceOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let metadata = state.metadata();
        info!(
            version,
            samples = samples.len(),
            mae = metadata.training_metrics.mae,
            persisted = persistence.is_saved(),
            "Model updated with {} new data points",
            samples.len()
        );

        Ok(UpdateResult::Retrained {
            version,
            n_samples: samples.len(),
            metrics: metadata.training_metrics.clone(),
            persistence,
        })
    }
}
