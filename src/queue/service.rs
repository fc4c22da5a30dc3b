use crate::config::Config;
use crate::error::{AppError, Result};
use crate::metrics::{
    ASSIGNMENTS_TOTAL, ASSIGNMENT_ESTIMATED_WAIT_MINUTES, MODEL_PERSISTENCE_FAILURES_TOTAL,
    MODEL_TRAINED, OVERLOAD_PENALTIES_TOTAL,
};
use crate::ml::{EstimatorHandle, ModelSource, TrainingSample, WaitTimeEstimator};
use crate::models::{Clock, ClockReading, DoctorCandidate, PatientProfile, SystemClock};
use crate::queue::load::{department_load, DepartmentLoad};
use crate::queue::priority::PriorityScorer;
use crate::queue::selector::{Assignment, DoctorSelector};
use crate::queue::updater::{
    ContinuousLearningUpdater, PersistenceOutcome, UpdateResult, MIN_RETRAIN_SAMPLES,
};
use crate::state::ModelStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How `initialize` obtained the serving model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Initialization {
    Loaded { version: u64 },
    Bootstrapped { persistence: PersistenceOutcome },
    AlreadyTrained,
}

/// Point-in-time view of the manager for status endpoints and the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueManagerStats {
    pub is_trained: bool,
    pub model_version: Option<u64>,
    pub model_source: Option<ModelSource>,
    pub n_training_samples: Option<usize>,
    pub buffered_outcomes: usize,
    pub retrain_batch_size: usize,

    /// Whether the model served since startup was read back from the store
    pub loaded_from_store: bool,
}

/// Queue engine facade: assignment, priority, load and continuous learning
pub struct QueueManager {
    config: Config,
    handle: Arc<EstimatorHandle>,
    store: Arc<dyn ModelStore>,
    estimator: WaitTimeEstimator,
    updater: ContinuousLearningUpdater,
    outcomes: Mutex<VecDeque<TrainingSample>>,
    clock: Arc<dyn Clock>,
    loaded_from_store: AtomicBool,
}

impl QueueManager {
    /// Create an untrained manager; call [`QueueManager::initialize`] before assigning
    pub fn new(config: &Config, store: Arc<dyn ModelStore>) -> Self {
        let estimator = WaitTimeEstimator::new(config.estimator.clone());

        let threshold = config.learning.retrain_batch_size.max(MIN_RETRAIN_SAMPLES);
        if config.learning.max_buffered_outcomes < threshold {
            warn!(
                max_buffered_outcomes = config.learning.max_buffered_outcomes,
                retrain_batch_size = threshold,
                "Outcome buffer smaller than a retrain batch, raising it to the batch size"
            );
        }

        Self {
            config: config.clone(),
            handle: Arc::new(EstimatorHandle::new()),
            store,
            updater: ContinuousLearningUpdater::new(estimator.clone()),
            estimator,
            outcomes: Mutex::new(VecDeque::new()),
            clock: Arc::new(SystemClock),
            loaded_from_store: AtomicBool::new(false),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn handle(&self) -> &Arc<EstimatorHandle> {
        &self.handle
    }

    /// Load the persisted model, or bootstrap-train one if none is usable.
    ///
    /// A failed load is logged and treated as absence. A failed save after
    /// bootstrap is reported but the bootstrapped model still serves.
    pub async fn initialize(&self) -> Result<Initialization> {
        let _guard = self.updater.lock_writes().await;

        if self.handle.is_trained() {
            return Ok(Initialization::AlreadyTrained);
        }

        match self.store.load().await {
            Ok(Some(state)) => {
                let version = state.metadata().version;
                info!(
                    version,
                    source = %state.metadata().source,
                    samples = state.metadata().n_training_samples,
                    "Loaded persisted wait-time model"
                );
                self.handle.publish(state);
                self.loaded_from_store.store(true, Ordering::SeqCst);
                MODEL_TRAINED.set(1.0);
                return Ok(Initialization::Loaded { version });
            }
            Ok(None) => {
                info!("No persisted model found");
            }
            Err(e) => {
                warn!("Failed to load persisted model, bootstrapping instead: {}", e);
            }
        }

        let estimator = self.estimator.clone();
        let state = tokio::task::spawn_blocking(move || estimator.bootstrap())
            .await
            .map_err(|e| AppError::Internal(format!("Bootstrap task failed: {}", e)))??;
        let state = Arc::new(state);

        self.handle.publish_arc(state.clone());
        MODEL_TRAINED.set(1.0);

        let persistence = match self.store.save(&state).await {
            Ok(()) => PersistenceOutcome::Saved,
            Err(e) => {
                warn!("Bootstrapped model is serving but could not be saved: {}", e);
                MODEL_PERSISTENCE_FAILURES_TOTAL.inc();
                PersistenceOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok(Initialization::Bootstrapped { persistence })
    }

    /// Assign a patient using the manager's clock
    pub fn assign_doctor(
        &self,
        candidates: &[DoctorCandidate],
        patient: &PatientProfile,
    ) -> Result<Assignment> {
        self.assign_doctor_at(candidates, patient, self.clock.now())
    }

    pub fn assign_doctor_at(
        &self,
        candidates: &[DoctorCandidate],
        patient: &PatientProfile,
        now: ClockReading,
    ) -> Result<Assignment> {
        let result = self
            .handle
            .snapshot()
            .and_then(|state| DoctorSelector::select(&state, candidates, patient, now));

        match &result {
            Ok(assignment) => {
                ASSIGNMENTS_TOTAL.with_label_values(&["assigned"]).inc();
                ASSIGNMENT_ESTIMATED_WAIT_MINUTES.observe(assignment.estimated_wait_minutes as f64);
                let penalized = assignment.candidates.iter().filter(|c| c.overloaded).count();
                OVERLOAD_PENALTIES_TOTAL.inc_by(penalized as f64);

                info!(
                    doctor_id = assignment.doctor_id,
                    estimated_wait = assignment.estimated_wait_minutes,
                    candidates = candidates.len(),
                    "Doctor assigned"
                );
            }
            Err(e) => {
                ASSIGNMENTS_TOTAL.with_label_values(&["rejected"]).inc();
                debug!(error_code = e.error_code(), "Assignment rejected: {}", e);
            }
        }

        result
    }

    pub fn calculate_priority(&self, patient: &PatientProfile) -> f64 {
        PriorityScorer::score(patient)
    }

    pub fn department_load(&self, doctors: &[DoctorCandidate]) -> DepartmentLoad {
        department_load(doctors)
    }

    /// Retrain on exactly these samples, bypassing the outcome buffer
    pub async fn update_model(&self, samples: &[TrainingSample]) -> Result<UpdateResult> {
        let result = self
            .updater
            .update(&self.handle, self.store.as_ref(), samples)
            .await?;
        if !result.is_skipped() {
            MODEL_TRAINED.set(1.0);
        }
        Ok(result)
    }

    /// Buffer one observed outcome, retraining once a full batch has built up.
    ///
    /// Returns the update result when this call triggered a retrain. A failed
    /// retrain puts the drained outcomes back in the buffer.
    pub async fn record_outcome(&self, sample: TrainingSample) -> Result<Option<UpdateResult>> {
        sample.validate()?;

        let threshold = self.retrain_threshold();
        let batch = {
            let mut outcomes = self.outcomes.lock();
            outcomes.push_back(sample);
            self.enforce_buffer_cap(&mut outcomes);

            if !self.config.learning.auto_retrain || outcomes.len() < threshold {
                return Ok(None);
            }
            outcomes.drain(..).collect::<Vec<_>>()
        };

        info!(samples = batch.len(), "Outcome batch full, retraining");
        self.update_buffered(batch).await.map(Some)
    }

    /// Retrain on everything buffered so far.
    ///
    /// Below the sample floor this returns `Skipped` and leaves the buffer as it was.
    pub async fn flush_outcomes(&self) -> Result<UpdateResult> {
        let batch: Vec<TrainingSample> = self.outcomes.lock().drain(..).collect();
        self.update_buffered(batch).await
    }

    pub fn buffered_outcomes(&self) -> usize {
        self.outcomes.lock().len()
    }

    pub fn stats(&self) -> QueueManagerStats {
        let snapshot = self.handle.try_snapshot();
        let metadata = snapshot.as_ref().map(|state| state.metadata());

        QueueManagerStats {
            is_trained: snapshot.is_some(),
            model_version: metadata.map(|m| m.version),
            model_source: metadata.map(|m| m.source),
            n_training_samples: metadata.map(|m| m.n_training_samples),
            buffered_outcomes: self.buffered_outcomes(),
            retrain_batch_size: self.retrain_threshold(),
            loaded_from_store: self.loaded_from_store.load(Ordering::SeqCst),
        }
    }

    async fn update_buffered(&self, batch: Vec<TrainingSample>) -> Result<UpdateResult> {
        match self.update_model(&batch).await {
            Ok(result) if result.is_skipped() => {
                self.restore_outcomes(batch);
                Ok(result)
            }
            Ok(result) => Ok(result),
            Err(e) => {
                self.restore_outcomes(batch);
                Err(e)
            }
        }
    }

    /// Put a drained batch back ahead of anything recorded since
    fn restore_outcomes(&self, batch: Vec<TrainingSample>) {
        let mut outcomes = self.outcomes.lock();
        for sample in batch.into_iter().rev() {
            outcomes.push_front(sample);
        }
        self.enforce_buffer_cap(&mut outcomes);
    }

    fn enforce_buffer_cap(&self, outcomes: &mut VecDeque<TrainingSample>) {
        let cap = self.buffer_capacity();
        while outcomes.len() > cap {
            outcomes.pop_front();
        }
    }

    /// Never below one retrain batch, so a full batch can always accumulate
    fn buffer_capacity(&self) -> usize {
        self.config
            .learning
            .max_buffered_outcomes
            .max(self.retrain_threshold())
    }

    fn retrain_threshold(&self) -> usize {
        self.config
            .learning
            .retrain_batch_size
            .max(MIN_RETRAIN_SAMPLES)
    }
}
