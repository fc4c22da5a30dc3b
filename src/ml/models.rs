use crate::error::{AppError, Result};
use crate::ml::features::{FeatureVector, N_FEATURES};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Observed outcome for one completed appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Features captured when the patient was assigned
    pub features: FeatureVector,

    /// Minutes the patient actually waited
    pub actual_wait_minutes: f64,
}

impl TrainingSample {
    pub fn new(features: FeatureVector, actual_wait_minutes: f64) -> Self {
        Self {
            features,
            actual_wait_minutes,
        }
    }

    /// Build a sample from booking and call timestamps.
    ///
    /// The wait is whole minutes, truncated, never negative.
    pub fn from_visit(
        features: FeatureVector,
        booked_at: DateTime<Utc>,
        called_at: DateTime<Utc>,
    ) -> Self {
        let minutes = (called_at - booked_at).num_seconds() / 60;
        Self::new(features, minutes.max(0) as f64)
    }

    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        if !self.actual_wait_minutes.is_finite() || self.actual_wait_minutes < 0.0 {
            return Err(AppError::InvalidFeature(format!(
                "actual_wait_minutes must be finite and non-negative, got {}",
                self.actual_wait_minutes
            )));
        }
        Ok(())
    }
}

/// Training dataset
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix (n_samples × n_features), columns in feature order
    pub features: Array2<f64>,

    /// Observed waits in minutes
    pub targets: Array1<f64>,

    /// Number of samples
    pub n_samples: usize,
}

impl TrainingDataset {
    /// Create a validated dataset from samples
    pub fn from_samples(samples: &[TrainingSample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(AppError::InvalidFeature(
                "training requires at least one sample".to_string(),
            ));
        }

        let n_samples = samples.len();
        let mut features = Array2::zeros((n_samples, N_FEATURES));
        let mut targets = Array1::zeros(n_samples);

        for (i, sample) in samples.iter().enumerate() {
            sample.validate()?;
            for (j, &val) in sample.features.to_array().iter().enumerate() {
                features[[i, j]] = val;
            }
            targets[i] = sample.actual_wait_minutes;
        }

        Ok(Self {
            features,
            targets,
            n_samples,
        })
    }
}

/// In-sample regression metrics recorded at fit time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean absolute error (minutes)
    pub mae: f64,

    /// Root mean squared error (minutes)
    pub rmse: f64,

    /// Coefficient of determination
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn calculate(y_true: &[f64], y_pred: &[f64]) -> Self {
        let n = y_true.len().min(y_pred.len());
        if n == 0 {
            return Self::default();
        }

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            abs_sum += (t - p).abs();
            sq_sum += (t - p).powi(2);
        }

        let mean = y_true.iter().take(n).sum::<f64>() / n as f64;
        let total_var: f64 = y_true.iter().take(n).map(|t| (t - mean).powi(2)).sum();
        let r2 = if total_var > 0.0 {
            1.0 - sq_sum / total_var
        } else {
            0.0
        };

        Self {
            mae: abs_sum / n as f64,
            rmse: (sq_sum / n as f64).sqrt(),
            r2,
        }
    }
}

/// Where a model's training data came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// Synthetic data generated at first startup
    Bootstrap,

    /// Observed appointment outcomes
    Retrained,

    /// Samples handed directly to `fit`
    Manual,
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::Bootstrap => write!(f, "bootstrap"),
            ModelSource::Retrained => write!(f, "retrained"),
            ModelSource::Manual => write!(f, "manual"),
        }
    }
}

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Generation counter, incremented on every retrain
    pub version: u64,

    /// Origin of the training data
    pub source: ModelSource,

    /// Training timestamp
    pub trained_at: DateTime<Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Training metrics
    pub training_metrics: RegressionMetrics,

    /// Hyperparameters
    pub hyperparameters: HashMap<String, String>,
}
