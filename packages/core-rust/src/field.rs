//! Typed field descriptors and their derivation from JSON Schema documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Semantic type of a stream field.
///
/// Structured types (`Object`, `Array`, `Multi`) carry no inner shape; the
/// catalog generator copies their original schema fragment forward instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Boolean,
    Integer,
    Number,
    String,
    Date,
    TimeWithTimezone,
    TimeWithoutTimezone,
    TimestampWithTimezone,
    TimestampWithoutTimezone,
    Object,
    Array,
    /// Union of several types (`oneOf`/`anyOf` or a multi-valued `type`).
    Multi,
    Unknown,
}

impl FieldType {
    /// Returns `true` for types whose JSON Schema fragment can be synthesized
    /// from the type alone.
    #[must_use]
    pub fn is_primitive(self) -> bool {
        !matches!(
            self,
            Self::Object | Self::Array | Self::Multi | Self::Unknown
        )
    }
}

/// A single named, typed field of a stream.
///
/// Values are immutable: renames and retypes go through [`Field::with_name`]
/// and [`Field::with_type`], which return new descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
        }
    }

    /// Creates a field that also accepts `null`.
    #[must_use]
    pub fn nullable(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
        }
    }

    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_type(&self, field_type: FieldType) -> Self {
        Self {
            field_type,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Field generation from JSON Schema
// ---------------------------------------------------------------------------

/// Derives the top-level fields of a stream from its JSON Schema document.
///
/// Fields follow the key order of the `properties` object. A document without
/// `properties` yields no fields.
#[must_use]
pub fn fields_from_json_schema(json_schema: &Value) -> Vec<Field> {
    let Some(properties) = json_schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    properties
        .iter()
        .map(|(name, fragment)| field_from_fragment(name, fragment))
        .collect()
}

/// Derives a single field from a property's schema fragment.
#[must_use]
pub fn field_from_fragment(name: &str, fragment: &Value) -> Field {
    if fragment.get("oneOf").is_some() || fragment.get("anyOf").is_some() {
        return Field::new(name, FieldType::Multi);
    }

    let (type_name, nullable) = match fragment.get("type") {
        Some(Value::String(t)) => (Some(t.as_str()), false),
        Some(Value::Array(types)) => {
            let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            let concrete: Vec<&str> = names.into_iter().filter(|t| *t != "null").collect();
            match concrete.as_slice() {
                [single] => (Some(*single), nullable),
                [] => (None, nullable),
                _ => {
                    return Field {
                        name: name.to_string(),
                        field_type: FieldType::Multi,
                        nullable,
                    }
                }
            }
        }
        _ => (None, false),
    };

    let field_type = match type_name {
        Some("string") => string_type(fragment),
        Some("boolean") => FieldType::Boolean,
        Some("integer") => FieldType::Integer,
        Some("number") => {
            if airbyte_type(fragment) == Some("integer") {
                FieldType::Integer
            } else {
                FieldType::Number
            }
        }
        Some("object") => FieldType::Object,
        Some("array") => FieldType::Array,
        _ => FieldType::Unknown,
    };

    Field {
        name: name.to_string(),
        field_type,
        nullable,
    }
}

fn airbyte_type(fragment: &Value) -> Option<&str> {
    fragment.get("airbyte_type").and_then(Value::as_str)
}

fn string_type(fragment: &Value) -> FieldType {
    match fragment.get("format").and_then(Value::as_str) {
        Some("date") => FieldType::Date,
        Some("date-time") => {
            if airbyte_type(fragment) == Some("timestamp_without_timezone") {
                FieldType::TimestampWithoutTimezone
            } else {
                FieldType::TimestampWithTimezone
            }
        }
        Some("time") => {
            if airbyte_type(fragment) == Some("time_with_timezone") {
                FieldType::TimeWithTimezone
            } else {
                FieldType::TimeWithoutTimezone
            }
        }
        _ => FieldType::String,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
