use serde::{Deserialize, Serialize};

/// Patient attributes consulted by the priority scorer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    /// Age in whole years
    pub age: u32,

    /// Free-text medical history, possibly empty
    #[serde(default)]
    pub medical_history: String,
}

impl PatientProfile {
    pub fn new(age: u32, medical_history: impl Into<String>) -> Self {
        Self {
            age,
            medical_history: medical_history.into(),
        }
    }
}
