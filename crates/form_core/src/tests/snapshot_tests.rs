use super::*;
use serde_json::json;

#[test]
fn unchanged_data_is_not_modified() {
    let snapshot = FormSnapshot::capture(&json!({ "a": 1 }));
    assert!(!snapshot.is_modified(&json!({ "a": 1 })));
    assert!(snapshot.is_modified(&json!({ "a": 2 })));
}

#[test]
fn recreated_nested_values_compare_equal() {
    let original = json!({
        "name": "Project",
        "collaborators": [{ "email": "a@example.org", "can_edit": true }],
        "meta": { "size": 3, "tags": ["x", "y"] }
    });
    let snapshot = FormSnapshot::capture(&original);

    let rebuilt = json!({
        "meta": { "tags": ["x", "y"], "size": 3 },
        "collaborators": [{ "can_edit": true, "email": "a@example.org" }],
        "name": "Project"
    });
    assert!(!snapshot.is_modified(&rebuilt));
}

#[test]
fn snapshot_is_independent_of_later_edits() {
    let mut data = json!({ "notes": ["first"] });
    let snapshot = FormSnapshot::capture(&data);

    data["notes"]
        .as_array_mut()
        .expect("array")
        .push(json!("second"));

    assert_eq!(snapshot.original(), &json!({ "notes": ["first"] }));
    assert!(snapshot.is_modified(&data));
}

#[test]
fn integers_and_floats_with_same_value_are_equal() {
    assert!(values_equal(&json!(1), &json!(1.0)));
    assert!(values_equal(&json!({ "n": -4 }), &json!({ "n": -4.0 })));
    assert!(!values_equal(&json!(1), &json!(1.5)));
    assert!(!values_equal(&json!(1), &json!("1")));
}

#[test]
fn array_order_and_missing_keys_matter() {
    assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
    assert!(!values_equal(&json!({ "a": 1 }), &json!({ "a": 1, "b": null })));
    assert!(!values_equal(&json!({ "a": null }), &json!({ "b": null })));
}

#[test]
fn integers_beyond_f64_precision_compare_exactly() {
    let snapshot = FormSnapshot::capture(&json!({ "id": 9007199254740993u64 }));
    assert!(snapshot.is_modified(&json!({ "id": 9007199254740992u64 })));
    assert!(!snapshot.is_modified(&json!({ "id": 9007199254740993u64 })));
    assert!(!values_equal(&json!(-9007199254740993i64), &json!(-9007199254740992i64)));
}
