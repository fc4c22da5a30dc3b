use crate::error::{AppError, Result};
use crate::ml::EstimatorState;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Durable home for the estimator state
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Load the last saved state; `None` on a fresh install
    async fn load(&self) -> Result<Option<EstimatorState>>;

    /// Save a state, replacing any previous one
    async fn save(&self, state: &EstimatorState) -> Result<()>;
}

/// In-memory model store (for development and testing)
#[derive(Clone, Default)]
pub struct InMemoryModelStore {
    blob: Arc<Mutex<Option<Vec<u8>>>>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail, to exercise best-effort durability
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.blob.lock().is_none()
    }
}

#[async_trait]
impl ModelStore for InMemoryModelStore {
    async fn load(&self) -> Result<Option<EstimatorState>> {
        let blob = self.blob.lock().clone();
        blob.map(|bytes| EstimatorState::from_bytes(&bytes))
            .transpose()
            .map_err(|e| AppError::Persistence(format!("Failed to decode stored model: {}", e)))
    }

    async fn save(&self, state: &EstimatorState) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::Persistence(
                "in-memory store configured to reject saves".to_string(),
            ));
        }

        let bytes = state.to_bytes()?;
        *self.blob.lock() = Some(bytes);
        self.saves.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(version = state.metadata().version, "Model saved in memory");
        Ok(())
    }
}
