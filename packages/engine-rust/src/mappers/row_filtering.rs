use mapper_core::config::{Condition, RowFilteringConfig};
use mapper_core::{ConfiguredMapper, MapperName, Record, SlimStream};
use serde_json::Value;

use crate::error::MapperError;
use crate::mapper::Mapper;
use crate::spec::{finish, mapper_schema, ConfigValidatingSpec, MapperSpec, ObjectSchema, Property};

/// Excludes records that do not satisfy a condition tree.
#[derive(Debug)]
pub struct RowFilteringMapper {
    spec: ConfigValidatingSpec<RowFilteringConfig>,
    max_depth: usize,
}

impl RowFilteringMapper {
    /// # Errors
    ///
    /// Returns [`MapperError::SpecCompilation`] if the built-in schema fails to compile.
    pub fn new(max_depth: usize) -> Result<Self, MapperError> {
        Ok(Self {
            spec: ConfigValidatingSpec::new(spec())?,
            max_depth,
        })
    }
}

fn spec() -> MapperSpec {
    let equal = ObjectSchema::new()
        .title("Equal")
        .required("type", Property::constant("EQUAL"))
        .required(
            "fieldName",
            Property::field_name()
                .title("Field name")
                .description("The name of the field to compare."),
        )
        .required(
            "comparisonValue",
            Property::string()
                .title("Comparison value")
                .description("The value the field must be equal to."),
        )
        .closed();
    let not = ObjectSchema::new()
        .title("Not")
        .required("type", Property::constant("NOT"))
        .required(
            "conditions",
            Property::array_of(Property::definition_ref("condition"))
                .min_items(1)
                .title("Conditions")
                .description("Holds when none of these conditions hold."),
        )
        .closed();
    let condition = Property::one_of(vec![
        Property::definition_ref("equal").build(),
        Property::definition_ref("not").build(),
    ]);

    let config = ObjectSchema::new()
        .title("Row filtering")
        .required(
            "conditions",
            Property::definition_ref("condition")
                .title("Conditions")
                .description("Records are kept when this condition holds."),
        )
        .closed();
    MapperSpec::new(
        MapperName::RowFiltering,
        finish(
            mapper_schema(MapperName::RowFiltering, "Row filtering mapper", config)
                .description("Filters records based on a condition.")
                .definition("condition", condition)
                .definition("equal", equal)
                .definition("not", not),
        ),
    )
}

/// String form used for comparisons: strings as-is, other values as JSON.
fn comparable(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Evaluates a condition tree against a record.
///
/// `Equal` never holds for a missing field or a `null` value.
#[must_use]
pub fn evaluate(condition: &Condition, record: &dyn Record) -> bool {
    match condition {
        Condition::Equal {
            field_name,
            comparison_value,
        } => record
            .get(field_name)
            .filter(|value| !value.is_null())
            .is_some_and(|value| comparable(value) == *comparison_value),
        Condition::Not { conditions } => !conditions.iter().any(|c| evaluate(c, record)),
        Condition::And { conditions } => conditions.iter().all(|c| evaluate(c, record)),
        Condition::Or { conditions } => conditions.iter().any(|c| evaluate(c, record)),
    }
}

impl Mapper for RowFilteringMapper {
    type Config = RowFilteringConfig;

    fn spec(&self) -> &ConfigValidatingSpec<RowFilteringConfig> {
        &self.spec
    }

    fn validate(&self, raw: &ConfiguredMapper) -> Result<RowFilteringConfig, MapperError> {
        let config = self.spec.deserialize(raw)?;
        let depth = config.conditions.depth();
        if depth > self.max_depth {
            return Err(MapperError::invalid_config(
                MapperName::RowFiltering.as_str(),
                format!(
                    "/config/conditions: nesting depth {depth} exceeds the maximum of {}",
                    self.max_depth
                ),
            ));
        }
        Ok(config)
    }

    fn schema(
        &self,
        _config: &RowFilteringConfig,
        stream: &SlimStream,
    ) -> Result<SlimStream, MapperError> {
        Ok(stream.deep_copy())
    }

    /// Runs even for excluded records; a record stays excluded once excluded.
    fn map(&self, config: &RowFilteringConfig, record: &mut dyn Record) {
        self.map_record(config, record);
    }

    fn map_record(&self, config: &RowFilteringConfig, record: &mut dyn Record) {
        let include = record.should_include() && evaluate(&config.conditions, record);
        record.set_include(include);
    }
}
