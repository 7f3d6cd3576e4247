//! Canonical content digests.
//!
//! Node stores use these to detect whether a re-sourced document actually
//! changed. Two JSON values that differ only in object key order or
//! whitespace produce the same digest.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Canonicalise a JSON value and return its lowercase hex SHA-256 digest.
///
/// 1. Object keys are sorted recursively (lexicographic).
/// 2. Arrays preserve element order.
/// 3. The result is rendered as compact JSON.
/// 4. SHA-256 is computed over the UTF-8 bytes.
///
/// # Examples
/// ```
/// use prismic_source::domain::content_digest;
/// use serde_json::json;
///
/// let a = json!({ "b": 2, "a": 1 });
/// let b = json!({ "a": 1, "b": 2 });
/// assert_eq!(content_digest(&a), content_digest(&b));
/// assert_eq!(content_digest(&a).len(), 64);
/// ```
pub fn content_digest(value: &Value) -> String {
    let canonical = canonicalize(value).to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by_key(|(key, _)| key.as_str());
            let canonical: Map<String, Value> = sorted
                .into_iter()
                .map(|(key, entry)| (key.clone(), canonicalize(entry)))
                .collect();
            Value::Object(canonical)
        }
        Value::Array(entries) => Value::Array(entries.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_key_order_does_not_change_the_digest() {
        let left = json!({ "data": { "title": "x", "body": [1, 2] }, "id": "A" });
        let right = json!({ "id": "A", "data": { "body": [1, 2], "title": "x" } });
        assert_eq!(content_digest(&left), content_digest(&right));
    }

    #[test]
    fn array_order_changes_the_digest() {
        assert_ne!(content_digest(&json!([1, 2])), content_digest(&json!([2, 1])));
    }
}
