use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Doctor identifier as issued by the surrounding persistence layer
pub type DoctorId = u64;

/// Live counters for a doctor that may receive the next patient
///
/// Supplied fresh by the caller on every selection; never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorCandidate {
    /// Doctor identifier
    pub doctor_id: DoctorId,

    /// Patients currently waiting for this doctor
    pub current_queue_length: u32,

    /// Average consultation length in minutes
    pub avg_consultation_minutes: f64,

    /// Appointments booked today that are waiting or in progress
    pub appointments_today: u32,

    /// Maximum patients this doctor sees per day
    pub max_daily_capacity: u32,

    /// Whether the doctor is taking patients
    #[serde(default = "default_available")]
    pub is_available: bool,
}

impl DoctorCandidate {
    /// Create an available candidate
    pub fn new(
        doctor_id: DoctorId,
        current_queue_length: u32,
        avg_consultation_minutes: f64,
        appointments_today: u32,
        max_daily_capacity: u32,
    ) -> Self {
        Self {
            doctor_id,
            current_queue_length,
            avg_consultation_minutes,
            appointments_today,
            max_daily_capacity,
            is_available: true,
        }
    }

    pub fn with_availability(mut self, is_available: bool) -> Self {
        self.is_available = is_available;
        self
    }

    /// Today's appointments divided by daily capacity.
    ///
    /// A zero capacity yields 0.0 rather than dividing by zero.
    pub fn load_ratio(&self) -> f64 {
        if self.max_daily_capacity == 0 {
            return 0.0;
        }
        self.appointments_today as f64 / self.max_daily_capacity as f64
    }

    /// Reject counters that cannot produce a meaningful feature vector
    pub fn validate(&self) -> Result<()> {
        if !self.avg_consultation_minutes.is_finite() || self.avg_consultation_minutes <= 0.0 {
            return Err(AppError::InvalidFeature(format!(
                "doctor {}: avg_consultation_minutes must be finite and positive, got {}",
                self.doctor_id, self.avg_consultation_minutes
            )));
        }
        Ok(())
    }
}

fn default_available() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_ratio() {
        let doctor = DoctorCandidate::new(1, 3, 15.0, 12, 40);
        assert!((doctor.load_ratio() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_load_ratio_zero_capacity() {
        let doctor = DoctorCandidate::new(1, 3, 15.0, 12, 0);
        assert_eq!(doctor.load_ratio(), 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_consultation_time() {
        assert!(DoctorCandidate::new(1, 0, 0.0, 0, 10).validate().is_err());
        assert!(DoctorCandidate::new(1, 0, f64::NAN, 0, 10).validate().is_err());
        assert!(DoctorCandidate::new(1, 0, -3.0, 0, 10).validate().is_err());
        assert!(DoctorCandidate::new(1, 0, 12.5, 0, 10).validate().is_ok());
    }

    #[test]
    fn test_deserialize_defaults_to_available() {
        let doctor: DoctorCandidate = serde_json::from_str(
            r#"{"doctor_id":7,"current_queue_length":2,"avg_consultation_minutes":20.0,
                "appointments_today":5,"max_daily_capacity":30}"#,
        )
        .unwrap();
        assert!(doctor.is_available);
        assert_eq!(doctor.doctor_id, 7);
    }
}
