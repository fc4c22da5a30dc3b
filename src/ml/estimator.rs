use crate::config::EstimatorConfig;
use crate::error::{AppError, Result};
use crate::ml::features::{FeatureVector, N_FEATURES};
use crate::ml::models::{
    ModelMetadata, ModelSource, RegressionMetrics, TrainingDataset, TrainingSample,
};
use crate::ml::scaler::StandardScaler;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::HashMap;
use tracing::{debug, info};

/// Forest type used for wait-time regression
pub type ForestModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// A fully trained estimator: normalization and forest fitted together.
///
/// Never mutated after construction; retraining builds a new one.
#[derive(Serialize, Deserialize)]
pub struct EstimatorState {
    scaler: StandardScaler,
    model: ForestModel,
    metadata: ModelMetadata,
}

impl EstimatorState {
    /// Predict the raw wait in minutes for one feature vector
    pub fn predict(&self, vector: &FeatureVector) -> Result<f64> {
        let predictions = self.predict_batch(std::slice::from_ref(vector))?;
        predictions
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Training("Forest returned no prediction".to_string()))
    }

    /// Predict raw waits for several vectors with a single forest call
    pub fn predict_batch(&self, vectors: &[FeatureVector]) -> Result<Vec<f64>> {
        if vectors.is_empty() {
            return Ok(Vec::new());
        }

        let mut x = Array2::zeros((vectors.len(), N_FEATURES));
        for (i, vector) in vectors.iter().enumerate() {
            vector.validate()?;
            for (j, &val) in vector.to_array().iter().enumerate() {
                x[[i, j]] = val;
            }
        }

        let scaled = self.scaler.transform(&x)?;
        let predictions = self
            .model
            .predict(&ndarray_to_densematrix(&scaled))
            .map_err(|e| AppError::Training(format!("Prediction failed: {}", e)))?;

        Ok(predictions)
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Serialize for a model store
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize a blob produced by [`EstimatorState::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let state: Self = bincode::deserialize(bytes)?;
        if state.scaler.mean().len() != N_FEATURES {
            return Err(AppError::Serialization(format!(
                "stored model has {} features, expected {}",
                state.scaler.mean().len(),
                N_FEATURES
            )));
        }
        Ok(state)
    }
}

impl std::fmt::Debug for EstimatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstimatorState")
            .field("scaler", &self.scaler)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Fits wait-time models from samples or from synthetic bootstrap data
#[derive(Debug, Clone, Default)]
pub struct WaitTimeEstimator {
    config: EstimatorConfig,
}

impl WaitTimeEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Fit normalization and forest from scratch on exactly these samples
    pub fn fit(
        &self,
        samples: &[TrainingSample],
        source: ModelSource,
        version: u64,
    ) -> Result<EstimatorState> {
        let dataset = TrainingDataset::from_samples(samples)?;
        let (scaler, scaled) = StandardScaler::fit_transform(&dataset.features)?;

        let x = ndarray_to_densematrix(&scaled);
        let y = dataset.targets.to_vec();

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.config.n_trees)
            .with_max_depth(self.config.max_depth)
            .with_m(N_FEATURES)
            .with_seed(self.config.seed);

        let model = ForestModel::fit(&x, &y, params)
            .map_err(|e| AppError::Training(format!("Failed to train random forest: {}", e)))?;

        let fitted = model
            .predict(&x)
            .map_err(|e| AppError::Training(format!("Prediction failed: {}", e)))?;
        let metrics = RegressionMetrics::calculate(&y, &fitted);

        debug!(
            samples = dataset.n_samples,
            mae = metrics.mae,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            "Random forest fitted"
        );

        Ok(EstimatorState {
            scaler,
            model,
            metadata: ModelMetadata {
                version,
                source,
                trained_at: chrono::Utc::now(),
                n_training_samples: dataset.n_samples,
                n_features: N_FEATURES,
                training_metrics: metrics,
                hyperparameters: self.hyperparameters(),
            },
        })
    }

    /// Fit on deterministic synthetic data so a fresh install can serve immediately
    pub fn bootstrap(&self) -> Result<EstimatorState> {
        info!(
            samples = self.config.bootstrap_samples,
            seed = self.config.seed,
            "Training initial model with synthetic data"
        );
        self.fit(&self.synthetic_samples(), ModelSource::Bootstrap, 1)
    }

    /// Synthetic samples following `wait = queue × consultation × efficiency + noise`
    pub fn synthetic_samples(&self) -> Vec<TrainingSample> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        (0..self.config.bootstrap_samples)
            .map(|_| {
                let queue_length = rng.gen_range(0..20) as f64;
                let avg_consultation = rng.gen_range(10..30) as f64;
                let hour = rng.gen_range(0..24) as f64;
                let weekday = rng.gen_range(0..7) as f64;
                let efficiency = rng.gen_range(0.7..1.3);
                let noise = standard_normal(&mut rng) * self.config.bootstrap_noise_std;

                let wait = (queue_length * avg_consultation * efficiency + noise).max(0.0);

                TrainingSample::new(
                    FeatureVector::from_array([
                        queue_length,
                        avg_consultation,
                        hour,
                        weekday,
                        efficiency,
                    ]),
                    wait,
                )
            })
            .collect()
    }

    fn hyperparameters(&self) -> HashMap<String, String> {
        [
            ("n_trees", self.config.n_trees.to_string()),
            ("max_depth", self.config.max_depth.to_string()),
            ("seed", self.config.seed.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

fn ndarray_to_densematrix(arr: &Array2<f64>) -> DenseMatrix<f64> {
    let shape = arr.shape();
    let data: Vec<f64> = arr.iter().copied().collect();
    DenseMatrix::new(shape[0], shape[1], data, false)
}

/// Box-Muller transform over the seeded generator
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
