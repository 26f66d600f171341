pub mod domain;
pub mod error;
pub mod protocol;

pub use domain::{FieldErrors, SubmissionState, SubmitGate};
pub use error::{FailureKind, TransportError};
pub use protocol::{ServerResponse, SubmitPayload, ValidationResult, NON_FIELD_ERRORS_KEY};
