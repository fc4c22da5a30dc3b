//! Doctor assignment, priority scoring and continuous learning
//!
//! The selector and scorer are pure functions over their inputs plus one
//! estimator snapshot. The updater is the only writer of estimator state, and
//! [`QueueManager`] ties both sides to a model store and an outcome buffer.

pub mod load;
pub mod priority;
pub mod selector;
pub mod service;
pub mod updater;

pub use load::{department_load, DepartmentLoad, LoadRecommendation, HIGH_LOAD_UTILIZATION};
pub use priority::{PriorityScorer, RankedPatient, URGENT_KEYWORDS};
pub use selector::{
    apply_overload_penalty, Assignment, CandidateEstimate, DoctorSelector, OVERLOAD_MULTIPLIER,
    OVERLOAD_THRESHOLD,
};
pub use service::{Initialization, QueueManager, QueueManagerStats};
pub use updater::{
    ContinuousLearningUpdater, PersistenceOutcome, UpdateResult, MIN_RETRAIN_SAMPLES,
};
