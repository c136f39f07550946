//! Mapper configuration contracts.
//!
//! Every mapper publishes a JSON Schema (draft-07) describing the complete
//! configured mapper object: its `name`, optional `id` and
//! `documentationUrl`, and the mapper-specific `config`. Schemas are built by
//! hand with [`ObjectSchema`] and [`Property`]; [`ConfigValidatingSpec`] then
//! uses them as the gate that untrusted configuration must pass before it
//! becomes a typed config.

use std::fmt;
use std::marker::PhantomData;

use mapper_core::{ConfiguredMapper, MapperName};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::MapperError;

const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

// ---------------------------------------------------------------------------
// MapperSpec
// ---------------------------------------------------------------------------

/// Published configuration contract of one mapper.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperSpec {
    name: MapperName,
    json_schema: Value,
}

impl MapperSpec {
    #[must_use]
    pub fn new(name: MapperName, json_schema: Value) -> Self {
        Self { name, json_schema }
    }

    #[must_use]
    pub fn name(&self) -> MapperName {
        self.name
    }

    /// JSON Schema consumed by configuration UIs and by validation.
    #[must_use]
    pub fn json_schema(&self) -> &Value {
        &self.json_schema
    }
}

// ---------------------------------------------------------------------------
// Schema builders
// ---------------------------------------------------------------------------

/// Builder for a single property schema.
#[derive(Debug, Clone, Default)]
pub struct Property(Map<String, Value>);

impl Property {
    fn typed(type_name: &str) -> Self {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(type_name.into()));
        Self(map)
    }

    #[must_use]
    pub fn string() -> Self {
        Self::typed("string")
    }

    /// A non-empty string.
    #[must_use]
    pub fn field_name() -> Self {
        Self::string().min_length(1)
    }

    #[must_use]
    pub fn constant(value: &str) -> Self {
        Self::string().with("const", Value::String(value.into()))
    }

    #[must_use]
    pub fn one_of_strings(values: &[&str]) -> Self {
        let values = values.iter().map(|v| Value::String((*v).into())).collect();
        Self::string().with("enum", Value::Array(values))
    }

    #[must_use]
    pub fn array_of(items: Property) -> Self {
        Self::typed("array").with("items", items.build())
    }

    /// Reference to a schema under the root `definitions`.
    #[must_use]
    pub fn definition_ref(name: &str) -> Self {
        let mut map = Map::new();
        map.insert("$ref".into(), Value::String(format!("#/definitions/{name}")));
        Self(map)
    }

    #[must_use]
    pub fn one_of(variants: Vec<Value>) -> Self {
        let mut map = Map::new();
        map.insert("oneOf".into(), Value::Array(variants));
        Self(map)
    }

    #[must_use]
    pub fn title(self, title: &str) -> Self {
        self.with("title", Value::String(title.into()))
    }

    #[must_use]
    pub fn description(self, description: &str) -> Self {
        self.with("description", Value::String(description.into()))
    }

    #[must_use]
    pub fn default_value(self, value: Value) -> Self {
        self.with("default", value)
    }

    #[must_use]
    pub fn examples(self, examples: &[&str]) -> Self {
        let examples = examples.iter().map(|v| Value::String((*v).into())).collect();
        self.with("examples", Value::Array(examples))
    }

    #[must_use]
    pub fn min_length(self, len: usize) -> Self {
        self.with("minLength", json!(len))
    }

    #[must_use]
    pub fn min_items(self, len: usize) -> Self {
        self.with("minItems", json!(len))
    }

    /// Marks the value as secret for configuration UIs.
    #[must_use]
    pub fn secret(self) -> Self {
        self.with("airbyte_secret", Value::Bool(true))
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn build(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<ObjectSchema> for Property {
    fn from(object: ObjectSchema) -> Self {
        match object.build() {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

/// Builder for an object schema.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    title: Option<String>,
    description: Option<String>,
    properties: Map<String, Value>,
    required: Vec<String>,
    closed: bool,
    definitions: Map<String, Value>,
}

impl ObjectSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn optional(mut self, name: &str, property: impl Into<Property>) -> Self {
        self.properties.insert(name.into(), property.into().build());
        self
    }

    #[must_use]
    pub fn required(mut self, name: &str, property: impl Into<Property>) -> Self {
        self.required.push(name.into());
        self.optional(name, property)
    }

    /// Rejects properties that are not declared.
    #[must_use]
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    #[must_use]
    pub fn definition(mut self, name: &str, property: impl Into<Property>) -> Self {
        self.definitions.insert(name.into(), property.into().build());
        self
    }

    #[must_use]
    pub fn build(self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::String("object".into()));
        if let Some(title) = self.title {
            map.insert("title".into(), Value::String(title));
        }
        if let Some(description) = self.description {
            map.insert("description".into(), Value::String(description));
        }
        map.insert("properties".into(), Value::Object(self.properties));
        if !self.required.is_empty() {
            let required = self.required.into_iter().map(Value::String).collect();
            map.insert("required".into(), Value::Array(required));
        }
        if self.closed {
            map.insert("additionalProperties".into(), Value::Bool(false));
        }
        if !self.definitions.is_empty() {
            map.insert("definitions".into(), Value::Object(self.definitions));
        }
        Value::Object(map)
    }
}

/// Wraps a mapper's `config` schema into the schema of the whole configured
/// mapper object.
#[must_use]
pub fn mapper_schema(name: MapperName, title: &str, config: impl Into<Property>) -> ObjectSchema {
    ObjectSchema::new()
        .title(title)
        .required("name", Property::constant(name.as_str()).title("Mapper name"))
        .optional(
            "id",
            Property::string()
                .title("Mapper id")
                .description("Identifier of this mapper within the connection."),
        )
        .optional(
            "documentationUrl",
            Property::string().title("Documentation URL"),
        )
        .required("config", config)
}

/// Adds the draft marker to a finished schema document.
#[must_use]
pub fn finish(schema: ObjectSchema) -> Value {
    let mut value = schema.build();
    if let Value::Object(map) = &mut value {
        map.insert("$schema".into(), Value::String(DRAFT_07.into()));
    }
    value
}

// ---------------------------------------------------------------------------
// ConfigValidatingSpec
// ---------------------------------------------------------------------------

/// A [`MapperSpec`] plus the compiled validator enforcing it, producing
/// configs of type `T`.
pub struct ConfigValidatingSpec<T> {
    spec: MapperSpec,
    validator: jsonschema::Validator,
    _config: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for ConfigValidatingSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigValidatingSpec")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned> ConfigValidatingSpec<T> {
    /// Compiles the spec's schema.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::SpecCompilation`] if the schema is not a valid
    /// JSON Schema document.
    pub fn new(spec: MapperSpec) -> Result<Self, MapperError> {
        let validator =
            jsonschema::validator_for(spec.json_schema()).map_err(|e| {
                MapperError::SpecCompilation {
                    mapper: spec.name().to_string(),
                    message: e.to_string(),
                }
            })?;
        Ok(Self {
            spec,
            validator,
            _config: PhantomData,
        })
    }

    #[must_use]
    pub fn spec(&self) -> &MapperSpec {
        &self.spec
    }

    /// Validates `raw` against the schema and deserializes its `config`.
    ///
    /// Every violation is reported, not just the first one.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidConfig`] if `raw` contains unhydrated
    /// secret references, violates the schema, or cannot be deserialized.
    pub fn deserialize(&self, raw: &ConfiguredMapper) -> Result<T, MapperError> {
        let mapper = self.spec.name().as_str();
        let instance =
            serde_json::to_value(raw).map_err(|e| MapperError::invalid_config(mapper, e))?;

        let mut errors = Vec::new();
        collect_unhydrated_secrets(&raw.config, "/config", &mut errors);
        errors.extend(self.validator.iter_errors(&instance).map(|error| {
            let path = error.instance_path.to_string();
            if path.is_empty() {
                error.to_string()
            } else {
                format!("{path}: {error}")
            }
        }));
        if !errors.is_empty() {
            return Err(MapperError::InvalidConfig {
                mapper: mapper.to_string(),
                errors,
            });
        }

        serde_json::from_value(raw.config.clone()).map_err(|e| MapperError::invalid_config(mapper, e))
    }
}

/// Secret values must be resolved by the caller before validation. A
/// `{"_secret": ...}` object means that step did not happen.
fn collect_unhydrated_secrets(value: &Value, path: &str, errors: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.contains_key("_secret") {
                errors.push(format!("{path}: secret reference was not hydrated"));
                return;
            }
            for (key, child) in map {
                collect_unhydrated_secrets(child, &format!("{path}/{key}"), errors);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_unhydrated_secrets(child, &format!("{path}/{index}"), errors);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
