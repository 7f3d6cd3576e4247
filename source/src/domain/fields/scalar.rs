//! Scalar field kinds.

use serde_json::Value;

use super::{DeclareContext, FieldResolver, NormalizeContext};
use crate::domain::custom_type::FieldSchema;
use crate::domain::{Error, FieldKind, TypePath, TypePathEntry};

/// Resolver for a field whose value is a single JSON scalar.
pub(super) struct ScalarField {
    kind: FieldKind,
    type_name: &'static str,
    accepts: fn(&Value) -> bool,
}

pub(super) static UID: ScalarField = ScalarField {
    kind: FieldKind::Uid,
    type_name: "String",
    accepts: Value::is_string,
};
pub(super) static TEXT: ScalarField = ScalarField {
    kind: FieldKind::Text,
    type_name: "String",
    accepts: Value::is_string,
};
pub(super) static SELECT: ScalarField = ScalarField {
    kind: FieldKind::Select,
    type_name: "String",
    accepts: Value::is_string,
};
pub(super) static COLOR: ScalarField = ScalarField {
    kind: FieldKind::Color,
    type_name: "String",
    accepts: Value::is_string,
};
pub(super) static NUMBER: ScalarField = ScalarField {
    kind: FieldKind::Number,
    type_name: "Float",
    accepts: Value::is_number,
};
pub(super) static BOOLEAN: ScalarField = ScalarField {
    kind: FieldKind::Boolean,
    type_name: "Boolean",
    accepts: Value::is_boolean,
};
pub(super) static DATE: ScalarField = ScalarField {
    kind: FieldKind::Date,
    type_name: "Date",
    accepts: Value::is_string,
};
pub(super) static TIMESTAMP: ScalarField = ScalarField {
    kind: FieldKind::Timestamp,
    type_name: "Date",
    accepts: Value::is_string,
};

impl FieldResolver for ScalarField {
    fn declare(
        &self,
        _ctx: &mut DeclareContext<'_>,
        _path: &TypePath,
        _field: &FieldSchema,
    ) -> Result<TypePathEntry, Error> {
        Ok(TypePathEntry::leaf(self.kind, self.type_name))
    }

    fn normalize(
        &self,
        _ctx: &mut NormalizeContext<'_>,
        path: &TypePath,
        _entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error> {
        Ok(match value {
            Some(raw) if (self.accepts)(raw) => raw.clone(),
            Some(raw) => {
                tracing::debug!(type_path = %path, value = %raw, "scalar of unexpected type coerced to null");
                Value::Null
            }
            None => Value::Null,
        })
    }
}
