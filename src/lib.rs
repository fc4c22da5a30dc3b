//! Clinic queue engine: doctor assignment by predicted wait, patient priority
//! scoring, and a wait-time regressor that retrains from observed outcomes.

pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod queue;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::{Clock, ClockReading, DoctorCandidate, DoctorId, PatientProfile};
pub use queue::{Assignment, QueueManager, UpdateResult};
