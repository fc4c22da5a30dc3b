use crate::models::DoctorCandidate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Share of total capacity the department queue must stay under to count as optimal
pub const HIGH_LOAD_UTILIZATION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoadRecommendation {
    Optimal,
    HighLoad,
}

/// Snapshot of a department's queue against its daily capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentLoad {
    pub total_queue: u64,
    pub total_capacity: u64,

    /// Waiting patients as a percentage of total daily capacity
    pub capacity_utilization: f64,

    /// Mean of queue length × consultation time across doctors
    pub avg_wait_minutes: f64,

    pub recommendation: LoadRecommendation,
}

/// Summarize department load from the same counters used for assignment
pub fn department_load(doctors: &[DoctorCandidate]) -> DepartmentLoad {
    let total_queue: u64 = doctors.iter().map(|d| d.current_queue_length as u64).sum();
    let total_capacity: u64 = doctors.iter().map(|d| d.max_daily_capacity as u64).sum();

    let capacity_utilization = if total_capacity > 0 {
        total_queue as f64 / total_capacity as f64 * 100.0
    } else {
        0.0
    };

    let avg_wait_minutes = if doctors.is_empty() {
        0.0
    } else {
        doctors
            .iter()
            .map(|d| d.current_queue_length as f64 * d.avg_consultation_minutes)
            .sum::<f64>()
            / doctors.len() as f64
    };

    // An empty department has 0 < 0 false, so it reports high load
    let recommendation = if (total_queue as f64) < total_capacity as f64 * HIGH_LOAD_UTILIZATION {
        LoadRecommendation::Optimal
    } else {
        LoadRecommendation::HighLoad
    };

    DepartmentLoad {
        total_queue,
        total_capacity,
        capacity_utilization,
        avg_wait_minutes,
        recommendation,
    }
}
