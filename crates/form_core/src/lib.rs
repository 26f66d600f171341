use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared::{ServerResponse, TransportError, ValidationResult};
use thiserror::Error;

pub mod config;
mod controller;
mod snapshot;
pub mod transport;

pub use config::ControllerOptions;
pub use controller::{
    ActiveMessage, CloseChoice, CloseOutcome, LifecycleController, LifecycleControllerBuilder,
    PendingSubmission, SubmissionDelivery, SubmissionTicket, SubmitOutcome, SubmitResult,
    SubmitStart, CLOSE_CONFIRMATION_PROMPT,
};
pub use snapshot::{values_equal, FormSnapshot};
pub use transport::HttpSubmitter;

/// Supplies the current form data. Called repeatedly; must not mutate anything.
pub trait FormDataSource: Send + Sync {
    fn form_data(&self) -> Value;
}

impl<F> FormDataSource for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn form_data(&self) -> Value {
        self()
    }
}

/// Client-side validation. `None` means "no findings".
pub trait Validator: Send + Sync {
    fn validate(&self, form: &Value) -> Option<ValidationResult>;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> Option<ValidationResult> + Send + Sync,
{
    fn validate(&self, form: &Value) -> Option<ValidationResult> {
        self(form)
    }
}

#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, form: Value) -> Result<ServerResponse, TransportError>;
}

#[async_trait]
impl<T> Submitter for Arc<T>
where
    T: Submitter + ?Sized,
{
    async fn submit(&self, form: Value) -> Result<ServerResponse, TransportError> {
        self.as_ref().submit(form).await
    }
}

/// The user action that triggered a submit, e.g. a form submit event.
pub trait FormEvent {
    fn prevent_default(&mut self);
}

/// Trigger for programmatic submits that have no default action to suppress.
pub struct NoEvent;

impl FormEvent for NoEvent {
    fn prevent_default(&mut self) {}
}

pub type SaveHandler = Box<dyn FnMut(&ServerResponse) + Send>;
pub type CloseHandler = Box<dyn FnMut() + Send>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("submission ticket {ticket:?} was not issued by this controller")]
    ForeignTicket { ticket: SubmissionTicket },
    #[error("invalid submit url '{url}': {source}")]
    InvalidSubmitUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unsupported submit url scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
