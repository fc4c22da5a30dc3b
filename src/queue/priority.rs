use crate::models::PatientProfile;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const BASE_PRIORITY: f64 = 0.5;
pub const MAX_PRIORITY: f64 = 1.0;

/// Patients older than this get the elderly bonus
pub const ELDERLY_AGE: u32 = 65;
pub const ELDERLY_BONUS: f64 = 0.2;

/// Patients younger than this get the young-child bonus
pub const YOUNG_CHILD_AGE: u32 = 5;
pub const YOUNG_CHILD_BONUS: f64 = 0.15;

/// Added once when the history mentions any urgent keyword
pub const HISTORY_BONUS: f64 = 0.1;

/// Matched case-insensitively as substrings of the medical history
pub const URGENT_KEYWORDS: [&str; 8] = [
    "heart",
    "chest pain",
    "breathing",
    "diabetic",
    "emergency",
    "severe",
    "acute",
    "critical",
];

/// A queue entry with its computed priority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPatient<K> {
    pub key: K,
    pub score: f64,
}

/// Scores patient urgency in [0.5, 1.0]
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityScorer;

impl PriorityScorer {
    pub fn score(patient: &PatientProfile) -> f64 {
        let mut priority = BASE_PRIORITY;

        if patient.age > ELDERLY_AGE {
            priority += ELDERLY_BONUS;
        } else if patient.age < YOUNG_CHILD_AGE {
            priority += YOUNG_CHILD_BONUS;
        }

        if Self::matched_keyword(&patient.medical_history).is_some() {
            priority += HISTORY_BONUS;
        }

        priority.min(MAX_PRIORITY)
    }

    /// First urgent keyword found in the history, if any
    pub fn matched_keyword(medical_history: &str) -> Option<&'static str> {
        if medical_history.is_empty() {
            return None;
        }
        let history = medical_history.to_lowercase();
        URGENT_KEYWORDS
            .iter()
            .copied()
            .find(|keyword| history.contains(keyword))
    }

    /// Order queue entries by descending priority, keeping arrival order on ties
    pub fn rank<K: Clone>(entries: &[(K, PatientProfile)]) -> Vec<RankedPatient<K>> {
        let mut ranked: Vec<RankedPatient<K>> = entries
            .iter()
            .map(|(key, patient)| RankedPatient {
                key: key.clone(),
                score: Self::score(patient),
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked
    }
}
