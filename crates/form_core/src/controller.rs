use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use serde_json::Value;
use shared::{
    FailureKind, FieldErrors, ServerResponse, SubmissionState, SubmitGate, TransportError,
    ValidationResult,
};
use tracing::{debug, info, warn};

use crate::{
    snapshot::FormSnapshot, CloseHandler, ControllerOptions, FormDataSource, FormEvent,
    LifecycleError, SaveHandler, Submitter, Validator,
};

pub const CLOSE_CONFIRMATION_PROMPT: &str =
    "The form contains unsaved changes. Are you sure you want to close it?";

static NEXT_CONTROLLER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one submission: the controller that issued it and the reset
/// generation it was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionTicket {
    controller_id: u64,
    generation: u64,
}

impl SubmissionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A submission that passed client-side validation and now needs the
/// submitter to run. Can be moved to another task before dispatching.
pub struct PendingSubmission {
    ticket: SubmissionTicket,
    form: Value,
    submitter: Arc<dyn Submitter>,
}

impl PendingSubmission {
    pub fn ticket(&self) -> SubmissionTicket {
        self.ticket
    }

    pub fn form(&self) -> &Value {
        &self.form
    }

    pub async fn dispatch(self) -> SubmissionDelivery {
        let outcome = self.submitter.submit(self.form).await;
        SubmissionDelivery {
            ticket: self.ticket,
            outcome,
        }
    }
}

impl fmt::Debug for PendingSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("ticket", &self.ticket)
            .field("form", &self.form)
            .finish_non_exhaustive()
    }
}

/// Outcome of a dispatched submission, waiting to be applied to its controller.
#[derive(Debug, Clone)]
pub struct SubmissionDelivery {
    pub ticket: SubmissionTicket,
    pub outcome: Result<ServerResponse, TransportError>,
}

#[derive(Debug)]
pub enum SubmitStart {
    /// Client-side validation failed; state is unchanged.
    Blocked,
    /// No submitter is configured; the form was closed instead.
    ClosedWithoutSubmitter,
    Pending(PendingSubmission),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved(ServerResponse),
    ServerRejected(FieldErrors),
    Failed(TransportError),
    /// The controller was reset after the submission was issued.
    Stale,
}

impl SubmitOutcome {
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::ServerRejected(_) => Some(FailureKind::ServerValidation),
            Self::Failed(_) => Some(FailureKind::Transport),
            Self::Saved(_) | Self::Stale => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResult {
    Blocked,
    ClosedWithoutSubmitter,
    Completed(SubmitOutcome),
}

impl SubmitResult {
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Blocked => Some(FailureKind::ClientValidation),
            Self::ClosedWithoutSubmitter => None,
            Self::Completed(outcome) => outcome.failure_kind(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    AwaitingConfirmation,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseChoice {
    Discard,
    KeepEditing,
}

/// The single message category the form should display right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveMessage<'a> {
    None,
    FieldErrors(&'a FieldErrors),
    Summary(&'a str),
}

pub struct LifecycleControllerBuilder {
    data: Arc<dyn FormDataSource>,
    validator: Option<Arc<dyn Validator>>,
    submitter: Option<Arc<dyn Submitter>>,
    on_save: Option<SaveHandler>,
    on_close: Option<CloseHandler>,
    options: ControllerOptions,
}

impl LifecycleControllerBuilder {
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn submitter(mut self, submitter: impl Submitter + 'static) -> Self {
        self.submitter = Some(Arc::new(submitter));
        self
    }

    pub fn on_save(mut self, handler: impl FnMut(&ServerResponse) + Send + 'static) -> Self {
        self.on_save = Some(Box::new(handler));
        self
    }

    pub fn on_close(mut self, handler: impl FnMut() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(handler));
        self
    }

    pub fn options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn confirm_close_if_not_saved(mut self, confirm: bool) -> Self {
        self.options.confirm_close_if_not_saved = confirm;
        self
    }

    pub fn build(self) -> LifecycleController {
        let snapshot = self
            .options
            .confirm_close_if_not_saved
            .then(|| FormSnapshot::capture(&self.data.form_data()));

        LifecycleController {
            id: NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed),
            data: self.data,
            validator: self.validator,
            submitter: self.submitter,
            on_save: self.on_save,
            on_close: self.on_close,
            options: self.options,
            snapshot,
            state: SubmissionState::Idle,
            error_message: None,
            validation: ValidationResult::default(),
            gate: SubmitGate::Open,
            close_confirmation_visible: false,
            generation: 0,
        }
    }
}

/// Sequences validation, submission, server-error re-entry and close
/// confirmation for one form.
///
/// Only one submission is expected in flight at a time; callers keep the
/// submit affordance disabled while [`SubmissionState::InProgress`].
pub struct LifecycleController {
    id: u64,
    data: Arc<dyn FormDataSource>,
    validator: Option<Arc<dyn Validator>>,
    submitter: Option<Arc<dyn Submitter>>,
    on_save: Option<SaveHandler>,
    on_close: Option<CloseHandler>,
    options: ControllerOptions,
    snapshot: Option<FormSnapshot>,
    state: SubmissionState,
    error_message: Option<String>,
    validation: ValidationResult,
    gate: SubmitGate,
    close_confirmation_visible: bool,
    generation: u64,
}

impl LifecycleController {
    pub fn builder(data: impl FormDataSource + 'static) -> LifecycleControllerBuilder {
        LifecycleControllerBuilder {
            data: Arc::new(data),
            validator: None,
            submitter: None,
            on_save: None,
            on_close: None,
            options: ControllerOptions::default(),
        }
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.state
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.validation.errors
    }

    pub fn has_field_error(&self, field: &str) -> bool {
        self.validation.errors.contains_key(field)
    }

    pub fn warnings(&self) -> &[String] {
        &self.validation.warnings
    }

    pub fn info(&self) -> &[String] {
        &self.validation.info
    }

    pub fn submit_gate(&self) -> SubmitGate {
        self.gate
    }

    /// Whether the submit affordance should be enabled. The controller does
    /// not itself refuse a second submit while one is in flight.
    pub fn can_submit(&self) -> bool {
        !self.gate.blocks_submit() && !self.state.is_in_progress()
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    pub fn snapshot(&self) -> Option<&FormSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_close_confirmation_visible(&self) -> bool {
        self.close_confirmation_visible
    }

    pub fn active_message(&self) -> ActiveMessage<'_> {
        if self.state == SubmissionState::Error {
            if let Some(message) = self.error_message.as_deref() {
                return ActiveMessage::Summary(message);
            }
        }
        if !self.validation.errors.is_empty() {
            return ActiveMessage::FieldErrors(&self.validation.errors);
        }
        ActiveMessage::None
    }

    /// Compares the current form data against the construction-time snapshot.
    /// Always false when dirty-tracking is disabled.
    pub fn is_dirty(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.is_modified(&self.data.form_data()))
    }

    /// Runs client-side validation and stores its findings. Returns whether
    /// a submit would be allowed.
    pub fn run_validation(&mut self) -> bool {
        let Some(validator) = self.validator.clone() else {
            self.gate = SubmitGate::Open;
            return true;
        };

        let result = validator
            .validate(&self.data.form_data())
            .unwrap_or_default();
        let blocked = result.blocks_submit();
        self.validation = result;
        self.gate = if blocked {
            SubmitGate::ClientValidation
        } else {
            SubmitGate::Open
        };
        !blocked
    }

    /// Validates and, if allowed, moves to `InProgress` and hands back the
    /// submission to dispatch.
    pub fn begin_submit(&mut self, event: &mut dyn FormEvent) -> SubmitStart {
        event.prevent_default();

        if !self.run_validation() {
            debug!(
                errors = self.validation.errors.len(),
                prevent_submit = self.validation.prevent_submit,
                "form: submit blocked by client-side validation"
            );
            return SubmitStart::Blocked;
        }

        self.state = SubmissionState::InProgress;
        self.error_message = None;

        let Some(submitter) = self.submitter.clone() else {
            info!("form: no submitter configured, closing");
            self.state = SubmissionState::Idle;
            self.request_close(false);
            return SubmitStart::ClosedWithoutSubmitter;
        };

        let ticket = SubmissionTicket {
            controller_id: self.id,
            generation: self.generation,
        };
        debug!(generation = ticket.generation, "form: submission started");
        SubmitStart::Pending(PendingSubmission {
            ticket,
            form: self.data.form_data(),
            submitter,
        })
    }

    /// Applies a submission outcome in delivery order. Outcomes issued before
    /// the last [`reset`](Self::reset), and failures arriving once the form is
    /// back to `Idle`, are dropped as [`SubmitOutcome::Stale`].
    pub fn deliver(
        &mut self,
        delivery: SubmissionDelivery,
    ) -> Result<SubmitOutcome, LifecycleError> {
        if delivery.ticket.controller_id != self.id {
            return Err(LifecycleError::ForeignTicket {
                ticket: delivery.ticket,
            });
        }
        Ok(self.apply_delivery(delivery))
    }

    /// Full submit: validate, dispatch, and apply the outcome.
    pub async fn submit(&mut self, event: &mut dyn FormEvent) -> SubmitResult {
        let pending = match self.begin_submit(event) {
            SubmitStart::Blocked => return SubmitResult::Blocked,
            SubmitStart::ClosedWithoutSubmitter => return SubmitResult::ClosedWithoutSubmitter,
            SubmitStart::Pending(pending) => pending,
        };
        let delivery = pending.dispatch().await;
        SubmitResult::Completed(self.apply_delivery(delivery))
    }

    fn apply_delivery(&mut self, delivery: SubmissionDelivery) -> SubmitOutcome {
        let SubmissionDelivery { ticket, outcome } = delivery;
        // A failure landing on an `Idle` form would overwrite a newer save or
        // server rejection; successes are only dropped across a reset.
        let stale = ticket.generation != self.generation
            || (outcome.is_err() && self.state == SubmissionState::Idle);
        if stale {
            debug!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                state = ?self.state,
                "form: dropping stale submission outcome"
            );
            return SubmitOutcome::Stale;
        }

        match outcome {
            Ok(response) => match response.validation_errors().cloned() {
                Some(errors) => {
                    info!(
                        fields = errors.len(),
                        "form: server rejected submission with validation errors"
                    );
                    self.state = SubmissionState::Idle;
                    self.validation = ValidationResult::from_server_errors(errors.clone());
                    self.gate = SubmitGate::ServerValidation;
                    SubmitOutcome::ServerRejected(errors)
                }
                None => {
                    info!("form: saved");
                    self.state = SubmissionState::Idle;
                    self.error_message = None;
                    if let Some(on_save) = self.on_save.as_mut() {
                        on_save(&response);
                    }
                    self.request_close(false);
                    SubmitOutcome::Saved(response)
                }
            },
            Err(err) => {
                warn!(error = %err, "form: submission failed");
                self.state = SubmissionState::Error;
                self.error_message = Some(err.to_string());
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Closes the form, unless `consider_confirmation` is set and there are
    /// unsaved changes, in which case the confirmation prompt is shown instead.
    pub fn request_close(&mut self, consider_confirmation: bool) -> CloseOutcome {
        if consider_confirmation && self.options.confirm_close_if_not_saved && self.is_dirty() {
            info!("form: unsaved changes, asking for close confirmation");
            self.close_confirmation_visible = true;
            return CloseOutcome::AwaitingConfirmation;
        }

        if let Some(on_close) = self.on_close.as_mut() {
            on_close();
        }
        CloseOutcome::Closed
    }

    /// Resolves a visible close confirmation. Returns `None` when no
    /// confirmation is pending.
    pub fn resolve_close_confirmation(&mut self, choice: CloseChoice) -> Option<CloseOutcome> {
        if !self.close_confirmation_visible {
            warn!(?choice, "form: no close confirmation pending");
            return None;
        }

        self.close_confirmation_visible = false;
        match choice {
            CloseChoice::KeepEditing => {
                debug!("form: close cancelled");
                Some(CloseOutcome::Cancelled)
            }
            CloseChoice::Discard => {
                debug!("form: discarding unsaved changes");
                Some(self.request_close(false))
            }
        }
    }

    /// Back to the construction-time state. Outcomes of submissions issued
    /// before the reset will be dropped. The snapshot is kept.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = SubmissionState::Idle;
        self.error_message = None;
        self.validation = ValidationResult::default();
        self.gate = SubmitGate::Open;
        self.close_confirmation_visible = false;
        debug!(generation = self.generation, "form: reset");
    }
}

impl fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("gate", &self.gate)
            .field("generation", &self.generation)
            .field("error_message", &self.error_message)
            .field("validation", &self.validation)
            .field("close_confirmation_visible", &self.close_confirmation_visible)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
