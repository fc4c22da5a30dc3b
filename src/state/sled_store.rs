use crate::error::{AppError, Result};
use crate::ml::EstimatorState;
use crate::state::ModelStore;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

const MODELS_TREE: &str = "models";
const STATE_KEY: &[u8] = b"estimator_state";

/// Persistent model store using Sled embedded database
#[derive(Clone)]
pub struct SledModelStore {
    db: Arc<Db>,
    models_tree: sled::Tree,
}

impl SledModelStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(&path).map_err(|e| {
            AppError::Persistence(format!("Failed to open Sled database: {}", e))
        })?;

        let models_tree = db.open_tree(MODELS_TREE).map_err(|e| {
            AppError::Persistence(format!("Failed to open models tree: {}", e))
        })?;

        tracing::info!("Initialized Sled model store at {:?}", path.as_ref());

        Ok(Self {
            db: Arc::new(db),
            models_tree,
        })
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Persistence(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }

    /// Get database size in bytes
    pub fn size_on_disk(&self) -> Result<u64> {
        self.db.size_on_disk().map_err(|e| {
            AppError::Persistence(format!("Failed to get database size: {}", e))
        })
    }
}

#[async_trait]
impl ModelStore for SledModelStore {
    async fn load(&self) -> Result<Option<EstimatorState>> {
        let bytes = self.models_tree.get(STATE_KEY).map_err(|e| {
            AppError::Persistence(format!("Failed to read model state: {}", e))
        })?;

        match bytes {
            Some(bytes) => {
                let state = EstimatorState::from_bytes(&bytes).map_err(|e| {
                    AppError::Persistence(format!("Failed to decode model state: {}", e))
                })?;
                tracing::info!(
                    version = state.metadata().version,
                    source = %state.metadata().source,
                    "Loaded model from Sled"
                );
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, state: &EstimatorState) -> Result<()> {
        let bytes = state.to_bytes()?;

        self.models_tree.insert(STATE_KEY, bytes).map_err(|e| {
            AppError::Persistence(format!("Failed to write model state: {}", e))
        })?;
        self.flush().await?;

        tracing::debug!(version = state.metadata().version, "Model saved to Sled");
        Ok(())
    }
}
