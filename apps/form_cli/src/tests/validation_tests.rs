use super::*;
use serde_json::json;

#[test]
fn complete_form_has_no_findings() {
    let validate = required_fields(vec!["name".into(), "genome_version".into()]);
    assert_eq!(
        validate(&json!({ "name": "Cohort", "genome_version": 38 })),
        None
    );
}

#[test]
fn blank_and_missing_fields_are_errors() {
    let validate = required_fields(vec!["name".into(), "description".into(), "tags".into()]);

    let result = validate(&json!({ "name": "   ", "tags": [] })).expect("findings");

    assert_eq!(result.errors.len(), 3);
    assert_eq!(result.errors["name"], "name is required");
    assert!(result.errors.contains_key("description"));
    assert!(result.blocks_submit());
}

#[test]
fn non_object_form_prevents_submit() {
    let validate = required_fields(Vec::new());
    let result = validate(&json!(["not", "a", "form"])).expect("findings");
    assert!(result.prevent_submit);
    assert!(result.errors.is_empty());
}
