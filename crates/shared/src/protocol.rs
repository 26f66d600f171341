use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::FieldErrors;

/// Key used for server errors that are not attached to a single field.
pub const NON_FIELD_ERRORS_KEY: &str = "__all__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationResult {
    pub errors: FieldErrors,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
    #[serde(alias = "preventSubmit")]
    pub prevent_submit: bool,
}

impl ValidationResult {
    pub fn with_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.insert(field.into(), message.into());
        self
    }

    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }

    pub fn with_info(mut self, message: impl Into<String>) -> Self {
        self.info.push(message.into());
        self
    }

    pub fn preventing_submit(mut self) -> Self {
        self.prevent_submit = true;
        self
    }

    pub fn blocks_submit(&self) -> bool {
        self.prevent_submit || !self.errors.is_empty()
    }

    /// Result of a server-side pass: only field errors, nothing advisory.
    pub fn from_server_errors(errors: FieldErrors) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }
}

/// Body posted by HTTP submitters: the form data under a `form` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub form: Value,
}

/// Successful transport-level answer to a submission.
///
/// `errors` is present when the server accepted the request but rejected the
/// form contents.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerResponse {
    pub body: Value,
    pub errors: Option<FieldErrors>,
}

impl ServerResponse {
    pub fn accepted(body: Value) -> Self {
        Self { body, errors: None }
    }

    pub fn rejected(errors: FieldErrors) -> Self {
        let body = serde_json::json!({ "errors": errors });
        Self {
            body,
            errors: Some(errors),
        }
    }

    /// Reads the `errors` member of a JSON body.
    ///
    /// Objects map field keys to messages; a bare string or an array of
    /// strings lands under [`NON_FIELD_ERRORS_KEY`]. Absent, empty or falsy
    /// errors (`null`, `false`, `""`, `0`) mean the submission was accepted.
    pub fn from_body(body: Value) -> Self {
        let errors = body.get("errors").and_then(field_errors_from_value);
        Self { body, errors }
    }

    pub fn validation_errors(&self) -> Option<&FieldErrors> {
        self.errors.as_ref().filter(|errors| !errors.is_empty())
    }

    pub fn is_accepted(&self) -> bool {
        self.validation_errors().is_none()
    }
}

fn field_errors_from_value(value: &Value) -> Option<FieldErrors> {
    let errors: FieldErrors = match value {
        Value::Null | Value::Bool(false) => return None,
        Value::String(text) if text.is_empty() => return None,
        Value::Number(number) if number.as_f64() == Some(0.0) => return None,
        Value::Object(map) => map
            .iter()
            .map(|(field, message)| (field.clone(), message_text(message)))
            .collect(),
        Value::Array(items) if items.is_empty() => return None,
        Value::Array(items) => {
            let joined = items.iter().map(message_text).collect::<Vec<_>>().join("; ");
            FieldErrors::from([(NON_FIELD_ERRORS_KEY.to_string(), joined)])
        }
        other => FieldErrors::from([(NON_FIELD_ERRORS_KEY.to_string(), message_text(other))]),
    };

    (!errors.is_empty()).then_some(errors)
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(message_text).collect::<Vec<_>>().join("; "),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
