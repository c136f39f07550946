use mapper_core::config::FieldRenamingConfig;
use mapper_core::{MapperName, Record, SlimStream};

use super::null_field;
use crate::error::MapperError;
use crate::mapper::Mapper;
use crate::spec::{finish, mapper_schema, ConfigValidatingSpec, MapperSpec, ObjectSchema, Property};

/// Renames one top-level field.
#[derive(Debug)]
pub struct FieldRenamingMapper {
    spec: ConfigValidatingSpec<FieldRenamingConfig>,
}

impl FieldRenamingMapper {
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
    let config = ObjectSchema::new()
        .title("Field renaming")
        .required(
            "originalFieldName",
            Property::field_name()
                .title("Original field name")
                .description("The current name of the field to rename."),
        )
        .required(
            "newFieldName",
            Property::field_name()
                .title("New field name")
                .description("The new name for the field after renaming."),
        )
        .closed();
    MapperSpec::new(
        MapperName::FieldRenaming,
        finish(
            mapper_schema(MapperName::FieldRenaming, "Field renaming mapper", config)
                .description("Renames a field in the stream."),
        ),
    )
}

impl Mapper for FieldRenamingMapper {
    type Config = FieldRenamingConfig;

    fn spec(&self) -> &ConfigValidatingSpec<FieldRenamingConfig> {
        &self.spec
    }

    fn schema(
        &self,
        config: &FieldRenamingConfig,
        stream: &SlimStream,
    ) -> Result<SlimStream, MapperError> {
        let mut projected = stream.deep_copy();
        projected.redefine_field(&config.original_field_name, &config.new_field_name, None)?;
        Ok(projected)
    }

    fn map_record(&self, config: &FieldRenamingConfig, record: &mut dyn Record) {
        let old = config.original_field_name.as_str();
        let new = config.new_field_name.as_str();
        if !record.has(old) {
            return;
        }
        if let Err(e) = record.rename(old, new) {
            null_field(record, MapperName::FieldRenaming, new, &e);
            record.remove(old);
        }
    }
}
