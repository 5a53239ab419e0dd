//! Query-document evaluation for the in-memory collection.
//!
//! Supports the operators the document adapter emits: `$and`, `$or`,
//! raw equality, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin` and
//! `$regex` with `$options`.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Value};

/// Orders two scalar values of the same kind; `None` if incomparable.
#[must_use]
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Returns `true` if `document` satisfies the query document `filter`.
#[must_use]
pub fn matches(document: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => clauses(condition).all(|clause| matches(document, clause)),
        "$or" => clauses(condition).any(|clause| matches(document, clause)),
        field => field_matches(document.get(field).unwrap_or(&Value::Null), condition),
    })
}

fn clauses(condition: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    condition
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn equals(left: &Value, right: &Value) -> bool {
    compare_values(left, right) == Some(Ordering::Equal) || left == right
}

fn field_matches(value: &Value, condition: &Value) -> bool {
    match condition {
        Value::Object(operators)
            if !operators.is_empty() && operators.keys().all(|key| key.starts_with('$')) =>
        {
            operators
                .iter()
                .all(|(operator, operand)| operator_matches(value, operator, operand, operators))
        }
        expected => equals(value, expected),
    }
}

fn operator_matches(
    value: &Value,
    operator: &str,
    operand: &Value,
    operators: &Map<String, Value>,
) -> bool {
    let ordering = || compare_values(value, operand);
    match operator {
        "$ne" => !equals(value, operand),
        "$gt" => ordering() == Some(Ordering::Greater),
        "$gte" => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        "$lt" => ordering() == Some(Ordering::Less),
        "$lte" => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        "$in" => list(operand).any(|candidate| equals(value, candidate)),
        "$nin" => !list(operand).any(|candidate| equals(value, candidate)),
        "$regex" => regex_matches(value, operand, operators.get("$options")),
        "$options" => true,
        _ => false,
    }
}

fn list(operand: &Value) -> impl Iterator<Item = &Value> {
    operand.as_array().into_iter().flatten()
}

fn regex_matches(value: &Value, pattern: &Value, options: Option<&Value>) -> bool {
    let (Some(text), Some(pattern)) = (value.as_str(), pattern.as_str()) else {
        return false;
    };
    let pattern = match options.and_then(Value::as_str) {
        Some(flags) if !flags.is_empty() => format!("(?{flags}){pattern}"),
        _ => pattern.to_owned(),
    };
    Regex::new(&pattern).is_ok_and(|regex| regex.is_match(text))
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::matches;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_raw_equality_and_comparisons() {
        let document = object(json!({"name": "Ada", "age": 36}));

        assert!(matches(&document, &object(json!({"name": "Ada"}))));
        assert!(matches(&document, &object(json!({"age": {"$gt": 30, "$lte": 36}}))));
        assert!(!matches(&document, &object(json!({"age": {"$lt": 36}}))));
        assert!(matches(&document, &object(json!({"name": {"$ne": "Bob"}}))));
    }

    #[test]
    fn test_combinators_and_lists() {
        let document = object(json!({"_id": "u2", "tenantId": "t1"}));

        assert!(matches(
            &document,
            &object(json!({"$and": [{"_id": {"$in": ["u1", "u2"]}}, {"tenantId": "t1"}]}))
        ));
        assert!(matches(
            &document,
            &object(json!({"$or": [{"_id": "u9"}, {"tenantId": "t1"}]}))
        ));
        assert!(!matches(&document, &object(json!({"_id": {"$nin": ["u2"]}}))));
    }

    #[test]
    fn test_regex_honours_options() {
        let document = object(json!({"name": "Ada Lovelace"}));

        assert!(matches(
            &document,
            &object(json!({"name": {"$regex": "lOVE", "$options": "im"}}))
        ));
        assert!(!matches(&document, &object(json!({"name": {"$regex": "lOVE"}}))));
    }

    #[test]
    fn test_missing_field_compares_as_null() {
        let document = object(json!({"name": "Ada"}));

        assert!(matches(&document, &object(json!({"deletedAt": null}))));
        assert!(!matches(&document, &object(json!({"age": {"$gt": 1}}))));
    }
}
