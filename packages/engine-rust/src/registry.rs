use mapper_core::{ConfiguredMapper, MapperConfig, MapperName, Record, SlimStream};

use crate::config::EngineConfig;
use crate::error::MapperError;
use crate::mapper::Mapper;
use crate::mappers::{
    EncryptionMapper, FieldFilteringMapper, FieldRenamingMapper, HashingMapper, RowFilteringMapper,
};
use crate::record_mapper::MapperChain;
use crate::spec::MapperSpec;

// ---------------------------------------------------------------------------
// MapperRegistry
// ---------------------------------------------------------------------------

/// The closed set of mappers known to the engine.
///
/// Built once at startup and shared behind an `Arc`. Lookups by name honour
/// [`EngineConfig::disabled_mappers`]; dispatch on a validated
/// [`MapperConfig`] is an exhaustive match, so adding a variant is a compile
/// error until every path handles it.
#[derive(Debug)]
pub struct MapperRegistry {
    field_renaming: FieldRenamingMapper,
    field_filtering: FieldFilteringMapper,
    hashing: HashingMapper,
    encryption: EncryptionMapper,
    row_filtering: RowFilteringMapper,
    config: EngineConfig,
}

impl MapperRegistry {
    /// Builds every mapper and compiles its configuration schema.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::SpecCompilation`] if a built-in schema does not compile.
    pub fn new(config: EngineConfig) -> Result<Self, MapperError> {
        Ok(Self {
            field_renaming: FieldRenamingMapper::new()?,
            field_filtering: FieldFilteringMapper::new()?,
            hashing: HashingMapper::new()?,
            encryption: EncryptionMapper::new()?,
            row_filtering: RowFilteringMapper::new(config.max_condition_depth)?,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn is_enabled(&self, name: MapperName) -> bool {
        !self.config.disabled_mappers.contains(&name)
    }

    /// Enabled mapper names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<MapperName> {
        MapperName::ALL
            .into_iter()
            .filter(|name| self.is_enabled(*name))
            .collect()
    }

    /// Resolves a configured mapper name.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownMapper`] for names that are unknown or disabled.
    pub fn resolve(&self, name: &str) -> Result<MapperName, MapperError> {
        name.parse::<MapperName>()
            .ok()
            .filter(|parsed| self.is_enabled(*parsed))
            .ok_or_else(|| MapperError::UnknownMapper {
                name: name.to_string(),
            })
    }

    /// Published configuration contract of a mapper.
    #[must_use]
    pub fn spec(&self, name: MapperName) -> &MapperSpec {
        match name {
            MapperName::FieldRenaming => self.field_renaming.spec().spec(),
            MapperName::FieldFiltering => self.field_filtering.spec().spec(),
            MapperName::Hashing => self.hashing.spec().spec(),
            MapperName::Encryption => self.encryption.spec().spec(),
            MapperName::RowFiltering => self.row_filtering.spec().spec(),
        }
    }

    /// Validates untrusted configuration into a typed config.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownMapper`] if the name does not resolve and
    /// [`MapperError::InvalidConfig`] if the configuration is rejected.
    pub fn validate(&self, raw: &ConfiguredMapper) -> Result<MapperConfig, MapperError> {
        let config = match self.resolve(&raw.name)? {
            MapperName::FieldRenaming => {
                MapperConfig::FieldRenaming(self.field_renaming.validate(raw)?)
            }
            MapperName::FieldFiltering => {
                MapperConfig::FieldFiltering(self.field_filtering.validate(raw)?)
            }
            MapperName::Hashing => MapperConfig::Hashing(self.hashing.validate(raw)?),
            MapperName::Encryption => MapperConfig::Encryption(self.encryption.validate(raw)?),
            MapperName::RowFiltering => {
                MapperConfig::RowFiltering(self.row_filtering.validate(raw)?)
            }
        };
        Ok(config)
    }

    /// Validates a whole chain, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`MapperRegistry::validate`].
    pub fn prepare_chain(&self, mappers: &[ConfiguredMapper]) -> Result<MapperChain, MapperError> {
        mappers
            .iter()
            .map(|raw| self.validate(raw))
            .collect::<Result<Vec<_>, _>>()
            .map(MapperChain::new)
    }

    /// Applies one mapper to a schema projection.
    ///
    /// # Errors
    ///
    /// Propagates the mapper's schema error.
    pub fn schema(
        &self,
        config: &MapperConfig,
        stream: &SlimStream,
    ) -> Result<SlimStream, MapperError> {
        match config {
            MapperConfig::FieldRenaming(c) => self.field_renaming.schema(c, stream),
            MapperConfig::FieldFiltering(c) => self.field_filtering.schema(c, stream),
            MapperConfig::Hashing(c) => self.hashing.schema(c, stream),
            MapperConfig::Encryption(c) => self.encryption.schema(c, stream),
            MapperConfig::RowFiltering(c) => self.row_filtering.schema(c, stream),
        }
    }

    /// Applies one mapper to a record.
    pub fn map(&self, config: &MapperConfig, record: &mut dyn Record) {
        match config {
            MapperConfig::FieldRenaming(c) => self.field_renaming.map(c, record),
            MapperConfig::FieldFiltering(c) => self.field_filtering.map(c, record),
            MapperConfig::Hashing(c) => self.hashing.map(c, record),
            MapperConfig::Encryption(c) => self.encryption.map(c, record),
            MapperConfig::RowFiltering(c) => self.row_filtering.map(c, record),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use mapper_core::{Field, FieldType, JsonRecord};
    use serde_json::json;

    use super::*;

    fn registry() -> MapperRegistry {
        MapperRegistry::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn every_mapper_publishes_a_named_schema() {
        let registry = registry();
        for name in MapperName::ALL {
            let spec = registry.spec(name);
            assert_eq!(spec.name(), name);
            assert_eq!(
                spec.json_schema()["properties"]["name"]["const"],
                json!(name.as_str())
            );
            assert!(spec.json_schema()["properties"]["config"].is_object());
        }
    }

    #[test]
    fn resolve_by_name() {
        let registry = registry();
        assert_eq!(registry.resolve("hashing").unwrap(), MapperName::Hashing);
        assert!(matches!(
            registry.resolve("uppercase"),
            Err(MapperError::UnknownMapper { name }) if name == "uppercase"
        ));
    }

    #[test]
    fn disabled_mapper_does_not_resolve() {
        let registry = MapperRegistry::new(EngineConfig {
            disabled_mappers: vec![MapperName::Encryption],
            ..EngineConfig::default()
        })
        .unwrap();
        assert!(registry.resolve("encryption").is_err());
        assert!(!registry.names().contains(&MapperName::Encryption));
        assert_eq!(registry.names().len(), 4);
    }

    #[test]
    fn validate_dispatches_to_variant() {
        let registry = registry();
        let raw = ConfiguredMapper::new("field-filtering", json!({"targetField": "a"}));
        let config = registry.validate(&raw).unwrap();
        assert_eq!(config.name(), MapperName::FieldFiltering);
    }

    #[test]
    fn prepare_chain_stops_at_first_invalid_entry() {
        let registry = registry();
        let chain = [
            ConfiguredMapper::new("field-filtering", json!({"targetField": "a"})),
            ConfiguredMapper::new("hashing", json!({"targetField": "b", "method": "SHA-999"})),
        ];
        assert!(matches!(
            registry.prepare_chain(&chain),
            Err(MapperError::InvalidConfig { mapper, .. }) if mapper == "hashing"
        ));
    }

    #[test]
    fn schema_and_map_dispatch() {
        let registry = registry();
        let config = registry
            .validate(&ConfiguredMapper::new(
                "field-renaming",
                json!({"originalFieldName": "a", "newFieldName": "b"}),
            ))
            .unwrap();

        let stream = SlimStream::new(vec![Field::new("a", FieldType::String)], None, None);
        let out = registry.schema(&config, &stream).unwrap();
        assert!(out.has_field("b"));

        let mut record = JsonRecord::from_value(json!({"a": "x"})).unwrap();
        registry.map(&config, &mut record);
        assert_eq!(record.get("b"), Some(&json!("x")));
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MapperRegistry>();
        assert_send_sync::<MapperConfig>();
    }
}
