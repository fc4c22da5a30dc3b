//! Wait-time regression for doctor assignment
//!
//! This module provides:
//! - Fixed-order feature vectors built from live doctor counters
//! - Per-feature standardization
//! - A seeded random-forest regressor with synthetic bootstrap training
//! - A snapshot handle that swaps whole estimator states atomically

pub mod estimator;
pub mod features;
pub mod handle;
pub mod models;
pub mod scaler;

pub use estimator::{EstimatorState, ForestModel, WaitTimeEstimator};
pub use features::{FeatureBuilder, FeatureVector, FEATURE_NAMES, N_FEATURES};
pub use handle::EstimatorHandle;
pub use models::{
    ModelMetadata, ModelSource, RegressionMetrics, TrainingDataset, TrainingSample,
};
pub use scaler::StandardScaler;
