use crate::config::{StateBackend, StateConfig};
use crate::error::{AppError, Result};
use crate::state::{InMemoryModelStore, ModelStore, SledModelStore};
use std::sync::Arc;

/// Create a model store based on configuration
pub fn create_model_store(config: &StateConfig) -> Result<Arc<dyn ModelStore>> {
    match config.backend {
        StateBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration("Sled backend requires 'path' configuration".to_string())
            })?;

            tracing::info!(path = ?path, "Initializing Sled model store");

            let store = SledModelStore::new(path)?;
            Ok(Arc::new(store))
        }

        StateBackend::Memory => Ok(create_in_memory_store()),
    }
}

/// Create an in-memory store (for testing and development)
pub fn create_in_memory_store() -> Arc<dyn ModelStore> {
    tracing::info!("Initializing in-memory model store");
    Arc::new(InMemoryModelStore::new())
}
