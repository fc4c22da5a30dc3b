use crate::error::{AppError, Result};
use crate::ml::{EstimatorState, FeatureBuilder};
use crate::models::{ClockReading, DoctorCandidate, DoctorId, PatientProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Load ratio above which a doctor counts as overloaded
pub const OVERLOAD_THRESHOLD: f64 = 0.8;

/// Factor applied to an overloaded doctor's predicted wait
pub const OVERLOAD_MULTIPLIER: f64 = 1.3;

/// How one candidate scored during selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEstimate {
    pub doctor_id: DoctorId,

    /// Model output before any penalty
    pub raw_wait: f64,

    /// Wait used for comparison
    pub adjusted_wait: f64,

    pub load_ratio: f64,

    /// Whether the overload penalty was applied
    pub overloaded: bool,
}

/// Chosen doctor plus the per-candidate breakdown behind the choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub doctor_id: DoctorId,

    /// Adjusted wait of the chosen doctor, floored to whole minutes
    pub estimated_wait_minutes: u32,

    /// Every candidate in input order
    pub candidates: Vec<CandidateEstimate>,
}

/// Picks the doctor with the smallest penalized predicted wait
#[derive(Debug, Clone, Copy, Default)]
pub struct DoctorSelector;

impl DoctorSelector {
    /// Score every candidate against one estimator snapshot and pick the best.
    ///
    /// Ties go to the earliest candidate. Patient attributes do not influence
    /// the choice.
    pub fn select(
        state: &EstimatorState,
        candidates: &[DoctorCandidate],
        _patient: &PatientProfile,
        now: ClockReading,
    ) -> Result<Assignment> {
        if candidates.is_empty() {
            return Err(AppError::NoCandidate(
                "no available doctors in department".to_string(),
            ));
        }

        for candidate in candidates {
            if !candidate.is_available {
                return Err(AppError::NoCandidate(format!(
                    "doctor {} is not available",
                    candidate.doctor_id
                )));
            }
            candidate.validate()?;
        }

        let vectors: Vec<_> = candidates
            .iter()
            .map(|c| FeatureBuilder::build(c, now))
            .collect();
        let raw_waits = state.predict_batch(&vectors)?;

        let estimates: Vec<CandidateEstimate> = candidates
            .iter()
            .zip(raw_waits)
            .map(|(candidate, raw_wait)| {
                let load_ratio = candidate.load_ratio();
                let (adjusted_wait, overloaded) = apply_overload_penalty(raw_wait, load_ratio);

                debug!(
                    doctor_id = candidate.doctor_id,
                    raw_wait,
                    adjusted_wait,
                    load_ratio,
                    overloaded,
                    "Candidate scored"
                );

                CandidateEstimate {
                    doctor_id: candidate.doctor_id,
                    raw_wait,
                    adjusted_wait,
                    load_ratio,
                    overloaded,
                }
            })
            .collect();

        let mut best = 0;
        for (i, estimate) in estimates.iter().enumerate().skip(1) {
            if estimate.adjusted_wait < estimates[best].adjusted_wait {
                best = i;
            }
        }

        Ok(Assignment {
            doctor_id: estimates[best].doctor_id,
            estimated_wait_minutes: whole_minutes(estimates[best].adjusted_wait),
            candidates: estimates,
        })
    }
}

/// Inflate the wait of doctors past the overload threshold
pub fn apply_overload_penalty(raw_wait: f64, load_ratio: f64) -> (f64, bool) {
    if load_ratio > OVERLOAD_THRESHOLD {
        (raw_wait * OVERLOAD_MULTIPLIER, true)
    } else {
        (raw_wait, false)
    }
}

/// Floor to whole minutes; the estimator itself does not clamp at zero
fn whole_minutes(wait: f64) -> u32 {
    wait.max(0.0).floor() as u32
}
