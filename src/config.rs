use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Wait-time estimator configuration
    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Continuous-learning configuration
    #[serde(default)]
    pub learning: LearningConfig,

    /// Model state backend configuration
    #[serde(default)]
    pub state: StateConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CLINIC_QUEUE_)
            .add_source(
                config::Environment::with_prefix("CLINIC_QUEUE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

/// Random-forest hyperparameters and bootstrap data settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Number of trees in the forest
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Maximum depth of each tree
    #[serde(default = "default_max_depth")]
    pub max_depth: u16,

    /// Seed for bootstrap sampling and synthetic data
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of synthetic samples used when no model is persisted
    #[serde(default = "default_bootstrap_samples")]
    pub bootstrap_samples: usize,

    /// Standard deviation of the gaussian noise added to synthetic waits
    #[serde(default = "default_bootstrap_noise_std")]
    pub bootstrap_noise_std: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            seed: default_seed(),
            bootstrap_samples: default_bootstrap_samples(),
            bootstrap_noise_std: default_bootstrap_noise_std(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Retrain automatically once enough outcomes are buffered
    #[serde(default = "default_true")]
    pub auto_retrain: bool,

    /// Buffered outcomes that trigger an automatic retrain
    #[serde(default = "default_retrain_batch_size")]
    pub retrain_batch_size: usize,

    /// Maximum outcomes kept in memory while waiting for a retrain
    #[serde(default = "default_max_buffered_outcomes")]
    pub max_buffered_outcomes: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            auto_retrain: default_true(),
            retrain_batch_size: default_retrain_batch_size(),
            max_buffered_outcomes: default_max_buffered_outcomes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// State backend type
    #[serde(default)]
    pub backend: StateBackend,

    /// Path for embedded database (sled)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: default_true(),
        }
    }
}

fn default_n_trees() -> usize {
    100
}

fn default_max_depth() -> u16 {
    10
}

fn default_seed() -> u64 {
    42
}

fn default_bootstrap_samples() -> usize {
    1000
}

fn default_bootstrap_noise_std() -> f64 {
    5.0
}

fn default_retrain_batch_size() -> usize {
    50
}

fn default_max_buffered_outcomes() -> usize {
    10000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.estimator.n_trees, 100);
        assert_eq!(config.estimator.max_depth, 10);
        assert_eq!(config.estimator.seed, 42);
        assert_eq!(config.learning.retrain_batch_size, 50);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.learning.auto_retrain);
    }

    #[test]
    fn test_state_backend_default() {
        assert_eq!(StateBackend::default(), StateBackend::Sled);
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.estimator.bootstrap_samples, 1000);
        assert_eq!(config.state.backend, StateBackend::Sled);
        assert!(config.state.path.is_some());
    }
}
