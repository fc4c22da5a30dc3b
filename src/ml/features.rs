use crate::error::{AppError, Result};
use crate::models::{ClockReading, DoctorCandidate};
use serde::{Deserialize, Serialize};

/// Number of model inputs
pub const N_FEATURES: usize = 5;

/// Column names, in the order the estimator is trained on
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "queue_length",
    "avg_consultation_minutes",
    "hour_of_day",
    "day_of_week",
    "doctor_efficiency",
];

/// Share of efficiency lost at full daily load
pub const EFFICIENCY_LOAD_WEIGHT: f64 = 0.3;

/// Fixed-order model input for one doctor at one moment.
///
/// `to_array` defines the column order used for both training and
/// prediction; changing it invalidates every persisted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub queue_length: f64,
    pub avg_consultation_minutes: f64,
    pub hour_of_day: f64,
    pub day_of_week: f64,
    pub doctor_efficiency: f64,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; N_FEATURES] {
        [
            self.queue_length,
            self.avg_consultation_minutes,
            self.hour_of_day,
            self.day_of_week,
            self.doctor_efficiency,
        ]
    }

    pub fn from_array(values: [f64; N_FEATURES]) -> Self {
        Self {
            queue_length: values[0],
            avg_consultation_minutes: values[1],
            hour_of_day: values[2],
            day_of_week: values[3],
            doctor_efficiency: values[4],
        }
    }

    /// Check every component is finite and inside its domain
    pub fn validate(&self) -> Result<()> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(AppError::InvalidFeature(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        if self.queue_length < 0.0 {
            return Err(AppError::InvalidFeature(format!(
                "queue_length must be non-negative, got {}",
                self.queue_length
            )));
        }
        if self.avg_consultation_minutes <= 0.0 {
            return Err(AppError::InvalidFeature(format!(
                "avg_consultation_minutes must be positive, got {}",
                self.avg_consultation_minutes
            )));
        }
        if !(0.0..=23.0).contains(&self.hour_of_day) {
            return Err(AppError::InvalidFeature(format!(
                "hour_of_day must be in 0..=23, got {}",
                self.hour_of_day
            )));
        }
        if !(0.0..=6.0).contains(&self.day_of_week) {
            return Err(AppError::InvalidFeature(format!(
                "day_of_week must be in 0..=6, got {}",
                self.day_of_week
            )));
        }
        if self.doctor_efficiency <= 0.0 {
            return Err(AppError::InvalidFeature(format!(
                "doctor_efficiency must be positive, got {}",
                self.doctor_efficiency
            )));
        }

        Ok(())
    }
}

/// Turns live doctor counters into feature vectors
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Build the feature vector for a doctor at the given time
    pub fn build(doctor: &DoctorCandidate, now: ClockReading) -> FeatureVector {
        FeatureVector {
            queue_length: doctor.current_queue_length as f64,
            avg_consultation_minutes: doctor.avg_consultation_minutes,
            hour_of_day: now.hour as f64,
            day_of_week: now.weekday as f64,
            doctor_efficiency: Self::efficiency(doctor.load_ratio()),
        }
    }

    /// Efficiency drops linearly with load, bottoming out at 0.7
    pub fn efficiency(load_ratio: f64) -> f64 {
        1.0 - load_ratio.min(1.0) * EFFICIENCY_LOAD_WEIGHT
    }
}
