use serde_json::Value;

/// Copy of the form data taken when dirty-tracking starts.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    original: Value,
}

impl FormSnapshot {
    pub fn capture(data: &Value) -> Self {
        Self {
            original: data.clone(),
        }
    }

    pub fn original(&self) -> &Value {
        &self.original
    }

    /// True when `current` differs structurally from the captured data.
    pub fn is_modified(&self, current: &Value) -> bool {
        !values_equal(&self.original, current)
    }
}

/// Deep structural equality over JSON values.
///
/// Object key order is irrelevant and numbers compare by value, so `1` and
/// `1.0` are equal. Two integers compare exactly. Array order matters.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => {
            if a == b {
                return true;
            }
            if !(a.is_f64() || b.is_f64()) {
                return false;
            }
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/snapshot_tests.rs"]
mod tests;
