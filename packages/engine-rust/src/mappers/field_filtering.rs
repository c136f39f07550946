use mapper_core::config::FieldFilteringConfig;
use mapper_core::{MapperName, Record, SlimStream};

use crate::error::MapperError;
use crate::mapper::Mapper;
use crate::spec::{finish, mapper_schema, ConfigValidatingSpec, MapperSpec, ObjectSchema, Property};

/// Drops one top-level field.
#[derive(Debug)]
pub struct FieldFilteringMapper {
    spec: ConfigValidatingSpec<FieldFilteringConfig>,
}

impl FieldFilteringMapper {
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
        .title("Field filtering")
        .required(
            "targetField",
            Property::field_name()
                .title("Field")
                .description("The name of the field to remove from the stream."),
        )
        .closed();
    MapperSpec::new(
        MapperName::FieldFiltering,
        finish(
            mapper_schema(MapperName::FieldFiltering, "Field filtering mapper", config)
                .description("Removes a field from the stream."),
        ),
    )
}

impl Mapper for FieldFilteringMapper {
    type Config = FieldFilteringConfig;

    fn spec(&self) -> &ConfigValidatingSpec<FieldFilteringConfig> {
        &self.spec
    }

    fn schema(
        &self,
        config: &FieldFilteringConfig,
        stream: &SlimStream,
    ) -> Result<SlimStream, MapperError> {
        let mut projected = stream.deep_copy();
        projected.remove_field(&config.target_field)?;
        Ok(projected)
    }

    fn map_record(&self, config: &FieldFilteringConfig, record: &mut dyn Record) {
        record.remove(&config.target_field);
    }
}
