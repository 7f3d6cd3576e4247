//! Custom-type schema parsing.
//!
//! Custom types arrive as CMS-authored JSON: an object of tabs, each tab an
//! object of fields, each field `{ "type": ..., "config": { ... } }`. Groups
//! nest fields under `config.fields`; slice zones list choices under
//! `config.choices`, each with `non-repeat` (primary) and `repeat` (items)
//! field sets. Authoring order is preserved.

use serde_json::{Map, Value};

use super::Error;

/// A custom type as supplied by the host: id plus raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomTypeDefinition {
    /// Custom-type identifier.
    pub id: String,
    /// Raw custom-type JSON.
    pub json: Value,
}

impl CustomTypeDefinition {
    /// Pair an id with its JSON.
    pub fn new(id: impl Into<String>, json: Value) -> Self {
        Self {
            id: id.into(),
            json,
        }
    }
}

/// Parsed custom type with its fields flattened across tabs.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomTypeSchema {
    /// Custom-type identifier.
    pub id: String,
    /// Top-level fields in authoring order.
    pub fields: Vec<NamedField>,
}

/// A field name with its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedField {
    /// Field key inside the document data.
    pub name: String,
    /// Field schema.
    pub schema: FieldSchema,
}

/// Schema fragment of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// CMS type string, e.g. `StructuredText`.
    pub cms_type: String,
    /// Field configuration object.
    pub config: Map<String, Value>,
}

/// One choice of a slice zone.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceChoice {
    /// Choice name, matched against a slice's `slice_type`.
    pub name: String,
    /// CMS type of the choice; `Slice` for modern slices.
    pub cms_type: String,
    /// Non-repeatable fields.
    pub primary: Vec<NamedField>,
    /// Repeatable fields.
    pub items: Vec<NamedField>,
}

impl CustomTypeSchema {
    /// Parse a custom type definition.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the JSON is not an object of tabs,
    /// a field lacks a `type`, or two tabs declare the same field name.
    pub fn parse(definition: &CustomTypeDefinition) -> Result<Self, Error> {
        let tabs = definition.json.as_object().ok_or_else(|| {
            Error::configuration(format!(
                "custom type {} must be a JSON object of tabs",
                definition.id
            ))
        })?;

        let mut fields: Vec<NamedField> = Vec::new();
        for (tab_name, tab) in tabs {
            let tab_fields = tab.as_object().ok_or_else(|| {
                Error::configuration(format!(
                    "tab {tab_name} of custom type {} must be an object",
                    definition.id
                ))
            })?;
            for field in parse_fields(tab_fields, &definition.id)? {
                if fields.iter().any(|existing| existing.name == field.name) {
                    return Err(Error::configuration(format!(
                        "field {} is declared in more than one tab of custom type {}",
                        field.name, definition.id
                    )));
                }
                fields.push(field);
            }
        }

        Ok(Self {
            id: definition.id.clone(),
            fields,
        })
    }
}

impl FieldSchema {
    fn parse(value: &Value, context: &str) -> Result<Self, Error> {
        let cms_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::configuration(format!("field {context} has no type")))?;
        let config = value
            .get("config")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Ok(Self {
            cms_type: cms_type.to_owned(),
            config,
        })
    }

    /// Sub-fields of a group.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a sub-field is malformed.
    pub fn group_fields(&self, context: &str) -> Result<Vec<NamedField>, Error> {
        match self.config.get("fields").and_then(Value::as_object) {
            Some(fields) => parse_fields(fields, context),
            None => Ok(Vec::new()),
        }
    }

    /// Choices of a slice zone.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a choice is malformed.
    pub fn slice_choices(&self, context: &str) -> Result<Vec<SliceChoice>, Error> {
        let Some(choices) = self.config.get("choices").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };
        choices
            .iter()
            .map(|(name, choice)| {
                let choice_context = format!("{context}.{name}");
                let cms_type = choice
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("Slice")
                    .to_owned();
                Ok(SliceChoice {
                    name: name.clone(),
                    cms_type,
                    primary: section_fields(choice, "non-repeat", &choice_context)?,
                    items: section_fields(choice, "repeat", &choice_context)?,
                })
            })
            .collect()
    }

    /// Names of declared image thumbnails.
    pub fn thumbnail_names(&self) -> Vec<String> {
        self.config
            .get("thumbnails")
            .and_then(Value::as_array)
            .map(|thumbnails| {
                thumbnails
                    .iter()
                    .filter_map(|thumbnail| thumbnail.get("name").and_then(Value::as_str))
                    .filter(|name| !name.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Allowed options of a select field.
    pub fn select_options(&self) -> Vec<String> {
        self.config
            .get("options")
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn section_fields(choice: &Value, key: &str, context: &str) -> Result<Vec<NamedField>, Error> {
    match choice.get(key).and_then(Value::as_object) {
        Some(fields) => parse_fields(fields, context),
        None => Ok(Vec::new()),
    }
}

fn parse_fields(fields: &Map<String, Value>, context: &str) -> Result<Vec<NamedField>, Error> {
    fields
        .iter()
        .map(|(name, value)| {
            Ok(NamedField {
                name: name.clone(),
                schema: FieldSchema::parse(value, &format!("{context}.{name}"))?,
            })
        })
        .collect()
}
