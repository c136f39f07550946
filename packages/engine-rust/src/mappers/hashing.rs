use mapper_core::config::{HashingConfig, HashingMethod, DEFAULT_HASHED_SUFFIX};
use mapper_core::{FieldType, MapperName, Record, SlimStream};
use serde_json::{json, Value};
use sha2::Digest;

use super::null_field;
use crate::error::MapperError;
use crate::mapper::Mapper;
use crate::spec::{finish, mapper_schema, ConfigValidatingSpec, MapperSpec, ObjectSchema, Property};

/// Replaces a field with the hex digest of its value.
#[derive(Debug)]
pub struct HashingMapper {
    spec: ConfigValidatingSpec<HashingConfig>,
}

impl HashingMapper {
    /// # Errors
    ///
    /// Returns [`MapperError::SpecCompilation`] if the built-in schema fails to compile.
    pub fn new() -> Result<Self, MapperError> {
        Ok(Self {
            spec: ConfigValidatingSpec::new(spec())?,
        })
    }
}

fn spec() -> MapperSpec {
    let methods: Vec<&str> = HashingMethod::ALL.into_iter().map(HashingMethod::as_str).collect();
    let config = ObjectSchema::new()
        .title("Hashing")
        .required(
            "targetField",
            Property::field_name()
                .title("Original field name")
                .description("The name of the field to be hashed."),
        )
        .required(
            "method",
            Property::one_of_strings(&methods)
                .title("Hashing method")
                .description("The hashing algorithm to use.")
                .examples(&["SHA-256"]),
        )
        .optional(
            "fieldNameSuffix",
            Property::string()
                .title("Field name suffix")
                .description("The suffix to append to the field name after hashing.")
                .default_value(json!(DEFAULT_HASHED_SUFFIX)),
        )
        .closed();
    MapperSpec::new(
        MapperName::Hashing,
        finish(
            mapper_schema(MapperName::Hashing, "Hashing mapper", config)
                .description("Hashes the value of a field."),
        ),
    )
}

/// Lowercase hex digest of `data`.
#[must_use]
pub fn digest_hex(method: HashingMethod, data: &[u8]) -> String {
    fn run<D: Digest>(data: &[u8]) -> String {
        hex::encode(D::digest(data))
    }
    match method {
        HashingMethod::Md2 => run::<md2::Md2>(data),
        HashingMethod::Md5 => run::<md5::Md5>(data),
        HashingMethod::Sha1 => run::<sha1::Sha1>(data),
        HashingMethod::Sha224 => run::<sha2::Sha224>(data),
        HashingMethod::Sha256 => run::<sha2::Sha256>(data),
        HashingMethod::Sha384 => run::<sha2::Sha384>(data),
        HashingMethod::Sha512 => run::<sha2::Sha512>(data),
    }
}

/// Hashes the string form of a JSON value. `null` stays `null`.
fn hash_value(method: HashingMethod, value: &Value) -> Result<Value, serde_json::Error> {
    let text = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other)?,
    };
    Ok(Value::String(digest_hex(method, text.as_bytes())))
}

impl Mapper for HashingMapper {
    type Config = HashingConfig;

    fn spec(&self) -> &ConfigValidatingSpec<HashingConfig> {
        &self.spec
    }

    fn schema(&self, config: &HashingConfig, stream: &SlimStream) -> Result<SlimStream, MapperError> {
        let mut projected = stream.deep_copy();
        projected.redefine_field(
            &config.target_field,
            &config.output_field(),
            Some(FieldType::String),
        )?;
        Ok(projected)
    }

    fn map_record(&self, config: &HashingConfig, record: &mut dyn Record) {
        let Some(value) = record.get(&config.target_field) else {
            return;
        };
        let output = config.output_field();
        match hash_value(config.method, value) {
            Ok(hashed) => {
                record.remove(&config.target_field);
                record.set(&output, hashed);
            }
            Err(e) => {
                record.remove(&config.target_field);
                null_field(record, MapperName::Hashing, &output, &e);
            }
        }
    }
}
