use serde::Deserialize;

/// Recognized controller options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControllerOptions {
    /// Enables dirty-tracking and the discard-confirmation gate.
    #[serde(alias = "confirmCloseIfNotSaved")]
    pub confirm_close_if_not_saved: bool,
}

impl ControllerOptions {
    pub fn confirm_close_if_not_saved(confirm: bool) -> Self {
        Self {
            confirm_close_if_not_saved: confirm,
        }
    }
}
