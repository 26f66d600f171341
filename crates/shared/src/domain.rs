use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field key to the message shown next to that field.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    InProgress,
    Error,
}

impl SubmissionState {
    pub fn is_in_progress(self) -> bool {
        self == Self::InProgress
    }
}

/// Which validation pass last armed or disarmed the submit button.
///
/// Only `ClientValidation` blocks a submit attempt. `ServerValidation` is
/// informational and is replaced by the next client-side pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitGate {
    #[default]
    Open,
    ClientValidation,
    ServerValidation,
}

impl SubmitGate {
    pub fn blocks_submit(self) -> bool {
        self == Self::ClientValidation
    }
}
