use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Prediction requested before any model was fitted or loaded
    #[error("Model not trained: {0}")]
    NotTrained(String),

    /// Empty or otherwise unusable candidate list
    #[error("No candidate: {0}")]
    NoCandidate(String),

    /// Non-finite or out-of-domain input
    #[error("Invalid feature: {0}")]
    InvalidFeature(String),

    /// Model store load/save failures
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Regressor fit or predict failures
    #[error("Training error: {0}")]
    Training(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::NotTrained(_) => "NOT_TRAINED",
            AppError::NoCandidate(_) => "NO_CANDIDATE",
            AppError::InvalidFeature(_) => "INVALID_FEATURE",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Training(_) => "TRAINING_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller supplied bad input (as opposed to a system fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::NoCandidate(_) | AppError::InvalidFeature(_)
        )
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
