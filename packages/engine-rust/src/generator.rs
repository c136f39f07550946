//! Destination catalog generation.
//!
//! For every stream the generator folds the schema side of its mapper chain
//! over a [`SlimStream`], writes the resulting fields, cursor and primary key
//! back onto a copy of the stream and re-synthesizes the stream's JSON Schema
//! from the final field list. The caller's catalog is never modified.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use mapper_core::field::fields_from_json_schema;
use mapper_core::{
    ConfiguredCatalog, ConfiguredMapper, ConfiguredStream, Field, FieldType, SlimStream,
    StreamDescriptor,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::ReferencePolicy;
use crate::error::MapperError;
use crate::record_mapper::MapperChain;
use crate::registry::MapperRegistry;

// ---------------------------------------------------------------------------
// Lenient generation results
// ---------------------------------------------------------------------------

/// Why a mapper was dropped during lenient generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MapperFailureKind {
    /// The mapper name is unknown or disabled.
    MissingMapper,
    /// The configuration was rejected or its schema transform failed.
    InvalidMapperConfig,
}

/// A mapper dropped from a stream during lenient generation.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperFailure {
    pub mapper: ConfiguredMapper,
    pub kind: MapperFailureKind,
    pub message: String,
}

impl MapperFailure {
    fn new(mapper: &ConfiguredMapper, error: &MapperError) -> Self {
        let kind = match error.root() {
            MapperError::UnknownMapper { .. } => MapperFailureKind::MissingMapper,
            _ => MapperFailureKind::InvalidMapperConfig,
        };
        Self {
            mapper: mapper.clone(),
            kind,
            message: error.to_string(),
        }
    }
}

/// Output of [`DestinationCatalogGenerator::generate_destination_catalog_with_errors`].
#[derive(Debug, Clone)]
pub struct CatalogGenerationResult {
    /// Destination catalog built from the mappers that applied cleanly.
    pub catalog: ConfiguredCatalog,
    /// Dropped mappers, per stream. Streams without failures are absent.
    pub errors: BTreeMap<StreamDescriptor, Vec<MapperFailure>>,
}

impl CatalogGenerationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DestinationCatalogGenerator
// ---------------------------------------------------------------------------

/// Computes destination-facing catalogs.
#[derive(Debug, Clone)]
pub struct DestinationCatalogGenerator {
    registry: Arc<MapperRegistry>,
}

impl DestinationCatalogGenerator {
    #[must_use]
    pub fn new(registry: Arc<MapperRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the destination catalog for `catalog`.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown mapper, rejected configuration, schema
    /// transform referencing a missing or colliding field, or (with
    /// [`ReferencePolicy::Reject`]) cursor or primary key, configured or
    /// source-defined, left pointing at a removed field. Errors carry the
    /// stream they occurred in.
    pub fn generate_destination_catalog(
        &self,
        catalog: &ConfiguredCatalog,
    ) -> Result<ConfiguredCatalog, MapperError> {
        let mut destination = catalog.clone();
        for stream in &mut destination.streams {
            let descriptor = stream.descriptor();
            self.generate_stream(&descriptor, stream)
                .map_err(|e| e.with_stream(&descriptor))?;
        }
        Ok(destination)
    }

    fn generate_stream(
        &self,
        descriptor: &StreamDescriptor,
        stream: &mut ConfiguredStream,
    ) -> Result<(), MapperError> {
        let chain = self.registry.prepare_chain(&stream.mappers)?;
        let slim = self.apply_mappers_to_fields(stream, &chain)?;
        write_back(stream, slim);
        enforce_reference_policy(descriptor, stream, self.registry.config().reference_policy)
    }

    /// Like [`Self::generate_destination_catalog`], but never fails: a mapper
    /// that is unknown, invalid or whose schema transform fails is dropped
    /// from its stream and reported, and the rest of the chain still applies.
    ///
    /// [`ReferencePolicy::Reject`] behaves as [`ReferencePolicy::Clear`] here.
    #[must_use]
    pub fn generate_destination_catalog_with_errors(
        &self,
        catalog: &ConfiguredCatalog,
    ) -> CatalogGenerationResult {
        let policy = self.registry.config().reference_policy;
        let mut destination = catalog.clone();
        let mut errors = BTreeMap::new();

        for stream in &mut destination.streams {
            let descriptor = stream.descriptor();
            let mut slim = initial_projection(stream);
            let mut kept = Vec::with_capacity(stream.mappers.len());
            let mut failures = Vec::new();

            for raw in &stream.mappers {
                let applied = self
                    .registry
                    .validate(raw)
                    .and_then(|config| self.registry.schema(&config, &slim));
                match applied {
                    Ok(next) => {
                        slim = next;
                        kept.push(raw.clone());
                    }
                    Err(e) => {
                        warn!(stream = %descriptor, mapper = %raw.name, error = %e, "dropping mapper");
                        failures.push(MapperFailure::new(raw, &e));
                    }
                }
            }

            stream.mappers = kept;
            write_back(stream, slim);
            apply_lenient_policy(stream, policy);
            if !failures.is_empty() {
                errors.insert(descriptor, failures);
            }
        }

        CatalogGenerationResult {
            catalog: destination,
            errors,
        }
    }

    /// Folds the schema side of `chain` over the stream's fields, cursor and
    /// primary key.
    ///
    /// # Errors
    ///
    /// Propagates the first schema transform error.
    pub fn apply_mappers_to_fields(
        &self,
        stream: &ConfiguredStream,
        chain: &MapperChain,
    ) -> Result<SlimStream, MapperError> {
        chain
            .configs()
            .iter()
            .try_fold(initial_projection(stream), |slim, config| {
                debug!(stream = %stream.stream.name, mapper = %config.name(), "applying mapper schema");
                self.registry.schema(config, &slim)
            })
    }
}

fn initial_projection(stream: &ConfiguredStream) -> SlimStream {
    let fields = stream
        .fields
        .clone()
        .unwrap_or_else(|| fields_from_json_schema(&stream.stream.json_schema));
    SlimStream::new(fields, stream.cursor_field.clone(), stream.primary_key.clone())
}

fn resolves(fields: &[Field], path: &[String]) -> bool {
    path.first()
        .is_some_and(|head| fields.iter().any(|field| field.name == *head))
}

fn dangling_path<'a>(fields: &[Field], path: Option<&'a [String]>) -> Option<&'a [String]> {
    path.filter(|path| !resolves(fields, path))
}

fn dangling_group<'a>(fields: &[Field], groups: Option<&'a [Vec<String>]>) -> Option<&'a [String]> {
    groups
        .into_iter()
        .flatten()
        .map(Vec::as_slice)
        .find(|path| !resolves(fields, path))
}

/// First cursor or primary key path of a written-back stream whose top-level
/// field is gone, checking the configured paths before the source-defined
/// ones.
fn first_dangling(stream: &ConfiguredStream) -> Option<(&'static str, &[String])> {
    let fields = stream.fields.as_deref().unwrap_or_default();
    let source = &stream.stream;
    dangling_path(fields, stream.cursor_field.as_deref())
        .map(|path| ("cursor", path))
        .or_else(|| dangling_group(fields, stream.primary_key.as_deref()).map(|path| ("primary key", path)))
        .or_else(|| {
            dangling_path(fields, source.default_cursor_field.as_deref())
                .map(|path| ("default cursor", path))
        })
        .or_else(|| {
            dangling_group(fields, source.source_defined_primary_key.as_deref())
                .map(|path| ("source primary key", path))
        })
}

/// Drops every cursor and primary key group, configured or source-defined,
/// that no longer resolves. Emptied key lists become `None`.
fn clear_dangling_references(stream: &mut ConfiguredStream) {
    let fields = stream.fields.take().unwrap_or_default();
    let keep_path = |path: Option<Vec<String>>| path.filter(|path| resolves(&fields, path));
    let keep_groups = |groups: Option<Vec<Vec<String>>>| {
        groups
            .map(|groups| {
                groups
                    .into_iter()
                    .filter(|path| resolves(&fields, path))
                    .collect::<Vec<_>>()
            })
            .filter(|groups| !groups.is_empty())
    };

    stream.cursor_field = keep_path(stream.cursor_field.take());
    stream.primary_key = keep_groups(stream.primary_key.take());
    let source = &mut stream.stream;
    source.default_cursor_field = keep_path(source.default_cursor_field.take());
    source.source_defined_primary_key = keep_groups(source.source_defined_primary_key.take());
    stream.fields = Some(fields);
}

/// Reference handling that cannot fail: `Reject` degrades to `Clear`.
fn apply_lenient_policy(stream: &mut ConfiguredStream, policy: ReferencePolicy) {
    match policy {
        ReferencePolicy::Keep => {}
        ReferencePolicy::Clear | ReferencePolicy::Reject => clear_dangling_references(stream),
    }
}

fn enforce_reference_policy(
    descriptor: &StreamDescriptor,
    stream: &mut ConfiguredStream,
    policy: ReferencePolicy,
) -> Result<(), MapperError> {
    if policy != ReferencePolicy::Reject {
        apply_lenient_policy(stream, policy);
        return Ok(());
    }
    match first_dangling(stream) {
        Some((reference, path)) => Err(MapperError::DanglingReference {
            stream: descriptor.clone(),
            reference,
            field: path.join("."),
        }),
        None => Ok(()),
    }
}

/// Rewrites a single-segment path that points at a renamed field.
fn follow_rename(path: Vec<String>, renames: &HashMap<String, String>) -> Vec<String> {
    match path.as_slice() {
        [single] => match renames.get(single) {
            Some(current) => vec![current.clone()],
            None => path,
        },
        _ => path,
    }
}

fn write_back(stream: &mut ConfiguredStream, slim: SlimStream) {
    stream.stream.json_schema = generate_json_schema_from_fields(&slim, &stream.stream.json_schema);

    let renames: HashMap<String, String> = slim
        .fields()
        .iter()
        .filter_map(|field| {
            let origin = slim.original_name(&field.name);
            (origin != field.name).then(|| (origin.to_string(), field.name.clone()))
        })
        .collect();
    if !renames.is_empty() {
        let source = &mut stream.stream;
        source.default_cursor_field = source
            .default_cursor_field
            .take()
            .map(|path| follow_rename(path, &renames));
        source.source_defined_primary_key = source.source_defined_primary_key.take().map(|groups| {
            groups
                .into_iter()
                .map(|path| follow_rename(path, &renames))
                .collect()
        });
    }

    let (fields, cursor, primary_key) = slim.into_parts();
    stream.fields = Some(fields);
    stream.cursor_field = cursor;
    stream.primary_key = primary_key;
}

// ---------------------------------------------------------------------------
// JSON Schema synthesis
// ---------------------------------------------------------------------------

fn primitive_fragment(field: &Field) -> Value {
    let (type_name, format, airbyte_type) = match field.field_type {
        FieldType::Boolean => ("boolean", None, None),
        FieldType::Integer => ("integer", None, None),
        FieldType::Number => ("number", None, None),
        FieldType::Date => ("string", Some("date"), None),
        FieldType::TimestampWithTimezone => {
            ("string", Some("date-time"), Some("timestamp_with_timezone"))
        }
        FieldType::TimestampWithoutTimezone => {
            ("string", Some("date-time"), Some("timestamp_without_timezone"))
        }
        FieldType::TimeWithTimezone => ("string", Some("time"), Some("time_with_timezone")),
        FieldType::TimeWithoutTimezone => ("string", Some("time"), Some("time_without_timezone")),
        _ => ("string", None, None),
    };

    let mut fragment = Map::new();
    let type_value = if field.nullable {
        json!(["null", type_name])
    } else {
        json!(type_name)
    };
    fragment.insert("type".into(), type_value);
    if let Some(format) = format {
        fragment.insert("format".into(), json!(format));
    }
    if let Some(airbyte_type) = airbyte_type {
        fragment.insert("airbyte_type".into(), json!(airbyte_type));
    }
    Value::Object(fragment)
}

fn structured_fallback(field_type: FieldType) -> Value {
    match field_type {
        FieldType::Object => json!({"type": "object"}),
        FieldType::Array => json!({"type": "array"}),
        _ => json!({}),
    }
}

/// Builds the JSON Schema of a stream from its final fields.
///
/// Primitive fields get a synthesized fragment. Structured and unknown fields
/// reuse the fragment their source field had in `original`, found through the
/// projection's rename lineage. Every other key of `original` is preserved;
/// `properties` is replaced and `additionalProperties` is set to `true`.
#[must_use]
pub fn generate_json_schema_from_fields(stream: &SlimStream, original: &Value) -> Value {
    let original_properties = original.get("properties").and_then(Value::as_object);
    let properties: Map<String, Value> = stream
        .fields()
        .iter()
        .map(|field| {
            let fragment = if field.field_type.is_primitive() {
                primitive_fragment(field)
            } else {
                original_properties
                    .and_then(|p| p.get(stream.original_name(&field.name)))
                    .cloned()
                    .unwrap_or_else(|| structured_fallback(field.field_type))
            };
            (field.name.clone(), fragment)
        })
        .collect();

    let mut schema = original.as_object().cloned().unwrap_or_default();
    schema.insert("properties".into(), Value::Object(properties));
    schema.insert("additionalProperties".into(), Value::Bool(true));
    Value::Object(schema)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use mapper_core::{DestinationSyncMode, JsonRecord, Record, StreamDefinition, SyncMode};
    use proptest::prelude::*;

    use super::*;
    use crate::config::EngineConfig;
    use crate::record_mapper::RecordMapper;

    fn registry_with(config: EngineConfig) -> Arc<MapperRegistry> {
        Arc::new(MapperRegistry::new(config).unwrap())
    }

    fn generator() -> DestinationCatalogGenerator {
        DestinationCatalogGenerator::new(registry_with(EngineConfig::default()))
    }

    fn users_stream(json_schema: Value, fields: Vec<Field>, mappers: Vec<ConfiguredMapper>) -> ConfiguredStream {
        ConfiguredStream {
            stream: StreamDefinition {
                name: "users".into(),
                namespace: None,
                json_schema,
                supported_sync_modes: vec![SyncMode::FullRefresh, SyncMode::Incremental],
                source_defined_cursor: None,
                default_cursor_field: None,
                source_defined_primary_key: None,
            },
            fields: Some(fields),
            mappers,
            sync_mode: SyncMode::Incremental,
            destination_sync_mode: DestinationSyncMode::AppendDedup,
            cursor_field: None,
            primary_key: None,
        }
    }

    fn catalog(streams: Vec<ConfiguredStream>) -> ConfiguredCatalog {
        ConfiguredCatalog { streams }
    }

    fn rename(old: &str, new: &str) -> ConfiguredMapper {
        ConfiguredMapper::new(
            "field-renaming",
            json!({"originalFieldName": old, "newFieldName": new}),
        )
    }

    fn filter(field: &str) -> ConfiguredMapper {
        ConfiguredMapper::new("field-filtering", json!({"targetField": field}))
    }

    fn hash(field: &str) -> ConfiguredMapper {
        ConfiguredMapper::new("hashing", json!({"targetField": field, "method": "SHA-256"}))
    }

    #[test]
    fn catalog_without_mappers_keeps_schema() {
        let schema = json!({
            "type": "object",
            "$schema": "http://json-schema.org/schema#",
            "properties": {"field1": {"type": "string"}},
            "additionalProperties": true
        });
        let input = catalog(vec![users_stream(
            schema.clone(),
            vec![Field::new("field1", FieldType::String)],
            vec![],
        )]);
        let output = generator().generate_destination_catalog(&input).unwrap();
        assert_eq!(output, input);
        assert_eq!(output.streams[0].stream.json_schema, schema);
    }

    #[test]
    fn input_catalog_is_not_mutated() {
        let mut stream = users_stream(
            json!({"type": "object", "properties": {"email": {"type": "string"}, "id": {"type": "integer"}}}),
            vec![
                Field::new("email", FieldType::String),
                Field::new("id", FieldType::Integer),
            ],
            vec![hash("email"), rename("id", "user_id")],
        );
        stream.cursor_field = Some(vec!["id".into()]);
        let input = catalog(vec![stream]);
        let snapshot = input.clone();

        let output = generator().generate_destination_catalog(&input).unwrap();
        assert_eq!(input, snapshot);
        assert_ne!(output, input);
    }

    #[test]
    fn schema_is_resynthesized_from_mapped_fields() {
        let input = catalog(vec![users_stream(
            json!({
                "type": "object",
                "$schema": "http://json-schema.org/schema#",
                "properties": {
                    "email": {"type": "string"},
                    "born": {"type": "string", "format": "date"},
                    "address": {"type": "object", "properties": {"city": {"type": "string"}}},
                    "secret": {"type": "string"}
                }
            }),
            vec![
                Field::new("email", FieldType::String),
                Field::new("born", FieldType::Date),
                Field::new("address", FieldType::Object),
                Field::new("secret", FieldType::String),
            ],
            vec![hash("born"), rename("address", "location"), filter("secret")],
        )]);

        let output = generator().generate_destination_catalog(&input).unwrap();
        let stream = &output.streams[0];
        assert_eq!(
            stream.stream.json_schema,
            json!({
                "type": "object",
                "$schema": "http://json-schema.org/schema#",
                "properties": {
                    "email": {"type": "string"},
                    "born_hashed": {"type": "string"},
                    "location": {"type": "object", "properties": {"city": {"type": "string"}}}
                },
                "additionalProperties": true
            })
        );
        assert_eq!(
            stream.fields.as_deref().unwrap(),
            &[
                Field::new("email", FieldType::String),
                Field::new("born_hashed", FieldType::String),
                Field::new("location", FieldType::Object),
            ]
        );
        assert_eq!(stream.mappers.len(), 3);
    }

    #[test]
    fn every_field_type_has_a_fragment() {
        let fields = vec![
            Field::new("fieldString", FieldType::String),
            Field::new("fieldBoolean", FieldType::Boolean),
            Field::new("fieldInteger", FieldType::Integer),
            Field::new("fieldNumber", FieldType::Number),
            Field::new("fieldDate", FieldType::Date),
            Field::new("fieldTimestampWithoutTimezone", FieldType::TimestampWithoutTimezone),
            Field::new("fieldTimestampWithTimezone", FieldType::TimestampWithTimezone),
            Field::new("fieldTimeWithoutTimezone", FieldType::TimeWithoutTimezone),
            Field::new("fieldTimeWithTimezone", FieldType::TimeWithTimezone),
            Field::new("fieldObject", FieldType::Object),
            Field::new("fieldArray", FieldType::Array),
            Field::new("fieldMulti", FieldType::Multi),
            Field::new("fieldUnknown", FieldType::Unknown),
            Field::new("fieldNoFragment", FieldType::Array),
            Field::nullable("fieldNullable", FieldType::Integer),
        ];
        let original = json!({
            "properties": {
                "fieldObject": {"type": "object"},
                "fieldArray": {"type": "array", "items": {"type": "string"}},
                "fieldMulti": {"oneOf": [{"type": "string"}, {"type": "integer"}]},
                "fieldUnknown": {"I": "don't", "follow": "specs"}
            }
        });
        let schema =
            generate_json_schema_from_fields(&SlimStream::new(fields, None, None), &original);
        assert_eq!(
            schema,
            json!({
                "properties": {
                    "fieldString": {"type": "string"},
                    "fieldBoolean": {"type": "boolean"},
                    "fieldInteger": {"type": "integer"},
                    "fieldNumber": {"type": "number"},
                    "fieldDate": {"type": "string", "format": "date"},
                    "fieldTimestampWithoutTimezone": {"type": "string", "format": "date-time", "airbyte_type": "timestamp_without_timezone"},
                    "fieldTimestampWithTimezone": {"type": "string", "format": "date-time", "airbyte_type": "timestamp_with_timezone"},
                    "fieldTimeWithoutTimezone": {"type": "string", "format": "time", "airbyte_type": "time_without_timezone"},
                    "fieldTimeWithTimezone": {"type": "string", "format": "time", "airbyte_type": "time_with_timezone"},
                    "fieldObject": {"type": "object"},
                    "fieldArray": {"type": "array", "items": {"type": "string"}},
                    "fieldMulti": {"oneOf": [{"type": "string"}, {"type": "integer"}]},
                    "fieldUnknown": {"I": "don't", "follow": "specs"},
                    "fieldNoFragment": {"type": "array"},
                    "fieldNullable": {"type": ["null", "integer"]}
                },
                "additionalProperties": true
            })
        );
    }

    #[test]
    fn cursor_and_keys_follow_renames() {
        let mut stream = users_stream(
            json!({"type": "object", "properties": {"id": {"type": "integer"}}}),
            vec![Field::new("id", FieldType::Integer)],
            vec![rename("id", "user_id")],
        );
        stream.cursor_field = Some(vec!["id".into()]);
        stream.primary_key = Some(vec![vec!["id".into()]]);
        stream.stream.default_cursor_field = Some(vec!["id".into()]);
        stream.stream.source_defined_primary_key = Some(vec![vec!["id".into()]]);

        let output = generator()
            .generate_destination_catalog(&catalog(vec![stream]))
            .unwrap();
        let stream = &output.streams[0];
        let expected = vec!["user_id".to_string()];
        assert_eq!(stream.cursor_field.as_ref(), Some(&expected));
        assert_eq!(stream.primary_key, Some(vec![expected.clone()]));
        assert_eq!(stream.stream.default_cursor_field.as_ref(), Some(&expected));
        assert_eq!(stream.stream.source_defined_primary_key, Some(vec![expected]));
    }

    #[test]
    fn fields_are_derived_when_absent() {
        let mut stream = users_stream(
            json!({"type": "object", "properties": {"email": {"type": "string"}, "n": {"type": "number"}}}),
            vec![],
            vec![hash("email")],
        );
        stream.fields = None;
        let output = generator()
            .generate_destination_catalog(&catalog(vec![stream]))
            .unwrap();
        let names: Vec<&str> = output.streams[0]
            .fields
            .as_deref()
            .unwrap()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["email_hashed", "n"]);
    }

    #[test]
    fn unknown_mapper_is_fatal() {
        let input = catalog(vec![users_stream(
            json!({"type": "object", "properties": {}}),
            vec![],
            vec![ConfiguredMapper::new("uppercase", json!({}))],
        )]);
        let err = generator().generate_destination_catalog(&input).unwrap_err();
        assert!(matches!(err.root(), MapperError::UnknownMapper { name } if name == "uppercase"));
        assert!(err.to_string().starts_with("stream 'users'"));
    }

    #[test]
    fn schema_error_is_fatal() {
        let input = catalog(vec![users_stream(
            json!({"type": "object", "properties": {"a": {"type": "string"}, "b": {"type": "string"}}}),
            vec![
                Field::new("a", FieldType::String),
                Field::new("b", FieldType::String),
            ],
            vec![rename("a", "b")],
        )]);
        let err = generator().generate_destination_catalog(&input).unwrap_err();
        assert!(matches!(err.root(), MapperError::Schema(_)));
    }

    #[test]
    fn lenient_generation_reports_missing_mapper() {
        let missing = ConfiguredMapper::new("uppercase", json!({}));
        let input = catalog(vec![users_stream(
            json!({"type": "object", "properties": {"field1": {"type": "string"}}}),
            vec![Field::new("field1", FieldType::String)],
            vec![missing.clone()],
        )]);
        let result = generator().generate_destination_catalog_with_errors(&input);
        assert!(result.catalog.streams[0].mappers.is_empty());
        let failures = &result.errors[&StreamDescriptor::new("users", None)];
        assert_eq!(failures[0].mapper, missing);
        assert_eq!(failures[0].kind, MapperFailureKind::MissingMapper);
    }

    #[test]
    fn lenient_generation_drops_failing_schema_and_keeps_the_rest() {
        let failing = rename("absent", "x");
        let input = catalog(vec![users_stream(
            json!({"type": "object", "properties": {"field1": {"type": "string"}, "field2": {"type": "string"}}}),
            vec![
                Field::new("field1", FieldType::String),
                Field::new("field2", FieldType::String),
            ],
            vec![failing.clone(), filter("field2")],
        )]);
        let result = generator().generate_destination_catalog_with_errors(&input);
        assert!(result.has_errors());
        let stream = &result.catalog.streams[0];
        assert_eq!(stream.mappers, vec![filter("field2")]);
        assert_eq!(
            stream.fields.as_deref().unwrap(),
            &[Field::new("field1", FieldType::String)]
        );
        let failure = &result.errors[&StreamDescriptor::new("users", None)][0];
        assert_eq!(failure.mapper, failing);
        assert_eq!(failure.kind, MapperFailureKind::InvalidMapperConfig);
    }

    #[test]
    fn lenient_generation_reports_invalid_config() {
        let invalid = ConfiguredMapper::new("hashing", json!({"method": "SHA-999"}));
        let input = catalog(vec![users_stream(
            json!({"type": "object", "properties": {}}),
            vec![],
            vec![invalid],
        )]);
        let result = generator().generate_destination_catalog_with_errors(&input);
        let failure = &result.errors[&StreamDescriptor::new("users", None)][0];
        assert_eq!(failure.kind, MapperFailureKind::InvalidMapperConfig);
        assert!(failure.message.contains("invalid configuration"));
    }

    fn cursor_on_removed_field() -> ConfiguredCatalog {
        let mut stream = users_stream(
            json!({"type": "object", "properties": {"updated_at": {"type": "string"}, "id": {"type": "integer"}}}),
            vec![
                Field::new("updated_at", FieldType::String),
                Field::new("id", FieldType::Integer),
            ],
            vec![filter("updated_at")],
        );
        stream.cursor_field = Some(vec!["updated_at".into()]);
        stream.primary_key = Some(vec![vec!["id".into()]]);
        catalog(vec![stream])
    }

    #[test]
    fn removed_cursor_is_kept_by_default() {
        let output = generator()
            .generate_destination_catalog(&cursor_on_removed_field())
            .unwrap();
        assert_eq!(
            output.streams[0].cursor_field,
            Some(vec!["updated_at".to_string()])
        );
    }

    #[test]
    fn removed_cursor_is_cleared_when_configured() {
        let generator = DestinationCatalogGenerator::new(registry_with(EngineConfig {
            reference_policy: ReferencePolicy::Clear,
            ..EngineConfig::default()
        }));
        let output = generator
            .generate_destination_catalog(&cursor_on_removed_field())
            .unwrap();
        assert_eq!(output.streams[0].cursor_field, None);
        assert_eq!(output.streams[0].primary_key, Some(vec![vec!["id".to_string()]]));
    }

    #[test]
    fn removed_cursor_is_rejected_when_configured() {
        let generator = DestinationCatalogGenerator::new(registry_with(EngineConfig {
            reference_policy: ReferencePolicy::Reject,
            ..EngineConfig::default()
        }));
        let err = generator
            .generate_destination_catalog(&cursor_on_removed_field())
            .unwrap_err();
        assert!(matches!(
            err,
            MapperError::DanglingReference { reference: "cursor", ref field, .. } if field == "updated_at"
        ));

        let lenient = generator.generate_destination_catalog_with_errors(&cursor_on_removed_field());
        assert!(!lenient.has_errors());
        assert_eq!(lenient.catalog.streams[0].cursor_field, None);
    }

    fn source_references_on_removed_fields(mappers: Vec<ConfiguredMapper>) -> ConfiguredCatalog {
        let mut stream = users_stream(
            json!({"type": "object", "properties": {
                "updated_at": {"type": "string"},
                "id": {"type": "integer"},
                "name": {"type": "string"}
            }}),
            vec![
                Field::new("updated_at", FieldType::String),
                Field::new("id", FieldType::Integer),
                Field::new("name", FieldType::String),
            ],
            mappers,
        );
        stream.stream.default_cursor_field = Some(vec!["updated_at".into()]);
        stream.stream.source_defined_primary_key = Some(vec![vec!["id".into()]]);
        catalog(vec![stream])
    }

    fn with_policy(reference_policy: ReferencePolicy) -> DestinationCatalogGenerator {
        DestinationCatalogGenerator::new(registry_with(EngineConfig {
            reference_policy,
            ..EngineConfig::default()
        }))
    }

    #[test]
    fn removed_source_cursor_is_rejected_when_configured() {
        let input = source_references_on_removed_fields(vec![filter("id"), filter("updated_at")]);
        let err = with_policy(ReferencePolicy::Reject)
            .generate_destination_catalog(&input)
            .unwrap_err();
        assert!(matches!(
            err,
            MapperError::DanglingReference { reference: "default cursor", ref field, .. } if field == "updated_at"
        ));

        let only_key = source_references_on_removed_fields(vec![filter("id")]);
        let err = with_policy(ReferencePolicy::Reject)
            .generate_destination_catalog(&only_key)
            .unwrap_err();
        assert!(matches!(
            err,
            MapperError::DanglingReference { reference: "source primary key", ref field, .. } if field == "id"
        ));
    }

    #[test]
    fn removed_source_references_are_cleared_when_configured() {
        let input = source_references_on_removed_fields(vec![filter("id"), filter("updated_at")]);
        let output = with_policy(ReferencePolicy::Clear)
            .generate_destination_catalog(&input)
            .unwrap();
        let source = &output.streams[0].stream;
        assert_eq!(source.default_cursor_field, None);
        assert_eq!(source.source_defined_primary_key, None);

        let lenient = with_policy(ReferencePolicy::Reject).generate_destination_catalog_with_errors(&input);
        assert!(!lenient.has_errors());
        assert_eq!(lenient.catalog.streams[0].stream.default_cursor_field, None);
        assert_eq!(lenient.catalog.streams[0].stream.source_defined_primary_key, None);
    }

    #[test]
    fn removed_source_references_are_kept_by_default() {
        let input = source_references_on_removed_fields(vec![filter("updated_at")]);
        let output = generator().generate_destination_catalog(&input).unwrap();
        let source = &output.streams[0].stream;
        assert_eq!(source.default_cursor_field, Some(vec!["updated_at".to_string()]));
        assert_eq!(source.source_defined_primary_key, Some(vec![vec!["id".to_string()]]));
    }

    #[test]
    fn renamed_source_references_still_resolve_under_reject() {
        let input = source_references_on_removed_fields(vec![rename("updated_at", "modified_at")]);
        let output = with_policy(ReferencePolicy::Reject)
            .generate_destination_catalog(&input)
            .unwrap();
        assert_eq!(
            output.streams[0].stream.default_cursor_field,
            Some(vec!["modified_at".to_string()])
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Rename(usize, usize),
        Filter(usize),
        Hash(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..6, 0usize..6).prop_map(|(a, b)| Op::Rename(a, b)),
            (0usize..6).prop_map(Op::Filter),
            (0usize..6).prop_map(Op::Hash),
        ]
    }

    fn to_mapper(op: &Op) -> ConfiguredMapper {
        match op {
            Op::Rename(a, b) => rename(&format!("f{a}"), &format!("f{b}")),
            Op::Filter(a) => filter(&format!("f{a}")),
            Op::Hash(a) => hash(&format!("f{a}")),
        }
    }

    proptest! {
        #[test]
        fn schema_and_record_views_agree(ops in prop::collection::vec(op(), 0..8)) {
            let fields: Vec<Field> = (0..4).map(|i| Field::new(format!("f{i}"), FieldType::String)).collect();
            let properties: Map<String, Value> = fields
                .iter()
                .map(|f| (f.name.clone(), json!({"type": "string"})))
                .collect();
            let input = catalog(vec![users_stream(
                json!({"type": "object", "properties": properties}),
                fields.clone(),
                ops.iter().map(to_mapper).collect(),
            )]);

            let registry = registry_with(EngineConfig::default());
            let generator = DestinationCatalogGenerator::new(Arc::clone(&registry));
            // Chains whose schema side fails are configuration errors, not
            // candidates for the property.
            let Ok(output) = generator.generate_destination_catalog(&input) else {
                return Ok(());
            };
            let schema_names: BTreeSet<String> = output.streams[0]
                .stream
                .json_schema["properties"]
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect();

            let record_mapper = RecordMapper::for_catalog(registry, &input).unwrap();
            let data: Map<String, Value> = fields
                .iter()
                .map(|f| (f.name.clone(), json!(format!("value of {}", f.name))))
                .collect();
            let mut record = JsonRecord::new(data);
            record_mapper.apply_to_stream(&StreamDescriptor::new("users", None), &mut record);
            let record_names: BTreeSet<String> = record.data().keys().cloned().collect();

            prop_assert!(record.changes().is_empty());
            prop_assert!(record.should_include());
            prop_assert_eq!(schema_names, record_names);
        }
    }
}
