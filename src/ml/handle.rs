use crate::error::{AppError, Result};
use crate::ml::estimator::EstimatorState;
use crate::ml::features::FeatureVector;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared owner of the current estimator state.
///
/// Readers clone the inner `Arc` and work from that snapshot for the rest of
/// the call; writers publish a complete replacement. The lock is only held
/// long enough to copy or swap the pointer.
#[derive(Debug, Default)]
pub struct EstimatorHandle {
    current: RwLock<Option<Arc<EstimatorState>>>,
}

impl EstimatorHandle {
    /// An untrained handle; predictions fail until a state is published
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: EstimatorState) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(state))),
        }
    }

    /// Current state, or `NotTrained` if none has been published
    pub fn snapshot(&self) -> Result<Arc<EstimatorState>> {
        self.try_snapshot().ok_or_else(|| {
            AppError::NotTrained("no wait-time model has been fitted or loaded".to_string())
        })
    }

    pub fn try_snapshot(&self) -> Option<Arc<EstimatorState>> {
        self.current.read().clone()
    }

    /// Replace the current state, returning the one it superseded
    pub fn publish(&self, state: EstimatorState) -> Option<Arc<EstimatorState>> {
        self.publish_arc(Arc::new(state))
    }

    pub fn publish_arc(&self, state: Arc<EstimatorState>) -> Option<Arc<EstimatorState>> {
        self.current.write().replace(state)
    }

    pub fn is_trained(&self) -> bool {
        self.current.read().is_some()
    }

    /// Predict against the current snapshot
    pub fn predict(&self, vector: &FeatureVector) -> Result<f64> {
        self.snapshot()?.predict(vector)
    }
}
