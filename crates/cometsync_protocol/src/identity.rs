//! Record identity.
//!
//! Ids may arrive as strings or numbers depending on the transport that
//! delivered them, so every comparison normalizes both sides to strings
//! instead of relying on JSON value equality.

use serde_json::Value;

/// String normal form of a scalar JSON value.
pub fn normalized(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Loose equality: string-normalized comparison.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    normalized(a) == normalized(b)
}

/// The `id` field of a record, if present and non-null.
pub fn record_id(record: &Value) -> Option<&Value> {
    record.get("id").filter(|v| !v.is_null())
}

/// True when both records carry an id and the ids compare loosely equal.
pub fn same_id(a: &Value, b: &Value) -> bool {
    match (record_id(a), record_id(b)) {
        (Some(x), Some(y)) => loose_eq(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn string_and_number_forms_match() {
        assert!(loose_eq(&json!(42), &json!("42")));
        assert!(loose_eq(&json!("abc"), &json!("abc")));
        assert!(!loose_eq(&json!(42), &json!("43")));
    }

    #[test]
    fn missing_or_null_id_never_matches() {
        assert!(!same_id(&json!({ "name": "x" }), &json!({ "id": 1 })));
        assert!(!same_id(&json!({ "id": null }), &json!({ "id": null })));
    }

    #[test]
    fn same_id_across_forms() {
        assert!(same_id(&json!({ "id": 7 }), &json!({ "id": "7" })));
        assert!(!same_id(&json!({ "id": 7 }), &json!({ "id": 8 })));
    }

    proptest! {
        #[test]
        fn number_matches_its_string_form(n in any::<i64>()) {
            prop_assert!(loose_eq(&json!(n), &json!(n.to_string())));
        }

        #[test]
        fn loose_eq_is_symmetric(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(
                loose_eq(&json!(a), &json!(b.to_string())),
                loose_eq(&json!(b.to_string()), &json!(a))
            );
        }
    }
}
