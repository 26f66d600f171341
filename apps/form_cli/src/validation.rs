use serde_json::Value;
use shared::ValidationResult;

/// Client-side check that each listed field is present and not blank.
pub fn required_fields(
    fields: Vec<String>,
) -> impl Fn(&Value) -> Option<ValidationResult> + Send + Sync {
    move |form: &Value| {
        let Some(object) = form.as_object() else {
            return Some(
                ValidationResult::default()
                    .with_warning("form data is not an object")
                    .preventing_submit(),
            );
        };

        let result = fields
            .iter()
            .filter(|field| object.get(field.as_str()).map_or(true, is_blank))
            .fold(ValidationResult::default(), |result, field| {
                result.with_error(field.as_str(), format!("{field} is required"))
            });

        if result.errors.is_empty() && result.warnings.is_empty() {
            None
        } else {
            Some(result)
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
