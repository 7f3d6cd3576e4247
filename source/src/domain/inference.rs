//! Structural shape inference for fields the custom-type schema cannot
//! describe.
//!
//! Shapes are inferred once, at declaration time, from whatever sample
//! values are available then. Later normalisation conforms values to the
//! recorded shape instead of re-inferring, so a field's schema never drifts
//! with the documents of a particular build.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inferred structure of a field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InferredShape {
    /// Unknown or mixed structure, exposed as raw JSON.
    Json,
    /// Boolean scalar.
    Boolean,
    /// Integer scalar.
    Int,
    /// Floating-point scalar.
    Float,
    /// String scalar.
    String,
    /// Homogeneous list.
    List {
        /// Shape of every element.
        item: Box<InferredShape>,
    },
    /// Object with a fixed key set.
    Object {
        /// Shapes per key, in key order.
        fields: BTreeMap<String, InferredShape>,
    },
}

#[derive(Debug, Clone)]
enum Draft {
    Unknown,
    Json,
    Boolean,
    Int,
    Float,
    String,
    List(Box<Draft>),
    Object(BTreeMap<String, Draft>),
}

impl InferredShape {
    /// Infer a shape from sample values.
    ///
    /// With no usable evidence (no samples, or only nulls) the shape is
    /// [`InferredShape::Json`].
    ///
    /// # Examples
    /// ```
    /// use prismic_source::domain::InferredShape;
    /// use serde_json::json;
    ///
    /// let samples = [json!({ "sku": "A1", "price": 3 }), json!({ "price": 4.5 })];
    /// let shape = InferredShape::infer(samples.iter());
    /// let InferredShape::Object { fields } = shape else { panic!("object expected") };
    /// assert_eq!(fields.get("price"), Some(&InferredShape::Float));
    /// assert_eq!(fields.get("sku"), Some(&InferredShape::String));
    /// ```
    pub fn infer<'a>(samples: impl IntoIterator<Item = &'a Value>) -> Self {
        samples
            .into_iter()
            .map(observe)
            .fold(Draft::Unknown, merge)
            .finish()
    }

    /// Conform `value` to this shape.
    ///
    /// Keys the shape does not know are dropped, missing keys become `null`,
    /// and scalars of the wrong type become `null`. Lists that are absent or
    /// malformed become empty lists.
    pub fn conform(&self, value: &Value) -> Value {
        match (self, value) {
            (Self::Json, _) => value.clone(),
            (Self::Boolean, Value::Bool(_)) | (Self::String, Value::String(_)) => value.clone(),
            (Self::Int, Value::Number(number)) if number.is_i64() || number.is_u64() => {
                value.clone()
            }
            (Self::Float, Value::Number(_)) => value.clone(),
            (Self::List { item }, Value::Array(values)) => {
                Value::Array(values.iter().map(|entry| item.conform(entry)).collect())
            }
            (Self::List { .. }, _) => Value::Array(Vec::new()),
            (Self::Object { fields }, Value::Object(object)) => {
                let conformed: Map<String, Value> = fields
                    .iter()
                    .map(|(key, shape)| {
                        let entry = object.get(key).unwrap_or(&Value::Null);
                        (key.clone(), shape.conform(entry))
                    })
                    .collect();
                Value::Object(conformed)
            }
            _ => Value::Null,
        }
    }
}

fn observe(value: &Value) -> Draft {
    match value {
        Value::Null => Draft::Unknown,
        Value::Bool(_) => Draft::Boolean,
        Value::Number(number) if number.is_i64() || number.is_u64() => Draft::Int,
        Value::Number(_) => Draft::Float,
        Value::String(_) => Draft::String,
        Value::Array(values) => Draft::List(Box::new(
            values.iter().map(observe).fold(Draft::Unknown, merge),
        )),
        Value::Object(object) => Draft::Object(
            object
                .iter()
                .map(|(key, entry)| (key.clone(), observe(entry)))
                .collect(),
        ),
    }
}

fn merge(left: Draft, right: Draft) -> Draft {
    match (left, right) {
        (Draft::Unknown, other) | (other, Draft::Unknown) => other,
        (Draft::Int, Draft::Float) | (Draft::Float, Draft::Int) => Draft::Float,
        (Draft::Boolean, Draft::Boolean) => Draft::Boolean,
        (Draft::Int, Draft::Int) => Draft::Int,
        (Draft::Float, Draft::Float) => Draft::Float,
        (Draft::String, Draft::String) => Draft::String,
        (Draft::List(left), Draft::List(right)) => Draft::List(Box::new(merge(*left, *right))),
        (Draft::Object(mut left), Draft::Object(right)) => {
            for (key, shape) in right {
                let merged = match left.remove(&key) {
                    Some(existing) => merge(existing, shape),
                    None => shape,
                };
                left.insert(key, merged);
            }
            Draft::Object(left)
        }
        _ => Draft::Json,
    }
}

impl Draft {
    fn finish(self) -> InferredShape {
        match self {
            Self::Unknown | Self::Json => InferredShape::Json,
            Self::Boolean => InferredShape::Boolean,
            Self::Int => InferredShape::Int,
            Self::Float => InferredShape::Float,
            Self::String => InferredShape::String,
            Self::List(item) => InferredShape::List {
                item: Box::new(item.finish()),
            },
            Self::Object(fields) => InferredShape::Object {
                fields: fields
                    .into_iter()
                    .map(|(key, shape)| (key, shape.finish()))
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    //! Inference and conformance behaviour.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn no_evidence_yields_json() {
        assert_eq!(InferredShape::infer(std::iter::empty::<&Value>()), InferredShape::Json);
        let nulls = [Value::Null, Value::Null];
        assert_eq!(InferredShape::infer(nulls.iter()), InferredShape::Json);
    }

    #[test]
    fn mixed_scalars_collapse_to_json() {
        let samples = [json!("text"), json!(3)];
        assert_eq!(InferredShape::infer(samples.iter()), InferredShape::Json);
    }

    #[test]
    fn objects_union_their_keys_and_nulls_defer_to_evidence() {
        let samples = [
            json!({ "id": 1, "tags": ["a"], "meta": null }),
            json!({ "id": 2, "meta": { "score": 0.5 } }),
        ];
        let shape = InferredShape::infer(samples.iter());

        let expected = InferredShape::Object {
            fields: BTreeMap::from([
                ("id".to_owned(), InferredShape::Int),
                (
                    "meta".to_owned(),
                    InferredShape::Object {
                        fields: BTreeMap::from([("score".to_owned(), InferredShape::Float)]),
                    },
                ),
                (
                    "tags".to_owned(),
                    InferredShape::List {
                        item: Box::new(InferredShape::String),
                    },
                ),
            ]),
        };
        assert_eq!(shape, expected);
    }

    #[rstest]
    #[case(json!({ "id": 7, "extra": true }), json!({ "id": 7, "name": null }))]
    #[case(json!({ "id": "seven", "name": "x" }), json!({ "id": null, "name": "x" }))]
    #[case(json!("not an object"), Value::Null)]
    fn conform_prunes_to_known_shape(#[case] input: Value, #[case] expected: Value) {
        let shape = InferredShape::Object {
            fields: BTreeMap::from([
                ("id".to_owned(), InferredShape::Int),
                ("name".to_owned(), InferredShape::String),
            ]),
        };
        assert_eq!(shape.conform(&input), expected);
    }

    #[test]
    fn conform_defaults_lists_to_empty() {
        let shape = InferredShape::List {
            item: Box::new(InferredShape::Int),
        };
        assert_eq!(shape.conform(&Value::Null), json!([]));
        assert_eq!(shape.conform(&json!([1, "x"])), json!([1, null]));
    }

    #[test]
    fn shapes_serialise_with_kind_tags() {
        let shape = InferredShape::List {
            item: Box::new(InferredShape::Object {
                fields: BTreeMap::from([("a".to_owned(), InferredShape::Boolean)]),
            }),
        };
        let json = serde_json::to_value(&shape).expect("serialise");
        assert_eq!(
            json,
            json!({ "kind": "list", "item": { "kind": "object", "fields": { "a": { "kind": "boolean" } } } })
        );
    }
}
