//! The shared behavior of every mapper variant.

use mapper_core::{ConfiguredMapper, MapperName, Record, SlimStream};
use serde::de::DeserializeOwned;

use crate::error::MapperError;
use crate::spec::ConfigValidatingSpec;

/// A named transformation applied to both a stream's schema and each of its
/// records.
///
/// Implementations hold no per-record state, so a single instance serves all
/// streams and records concurrently.
pub trait Mapper: Send + Sync {
    type Config: DeserializeOwned;

    /// Configuration contract and validation gate of this mapper.
    fn spec(&self) -> &ConfigValidatingSpec<Self::Config>;

    fn name(&self) -> MapperName {
        self.spec().spec().name()
    }

    /// Turns untrusted configuration into a typed config.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidConfig`] when the configuration violates
    /// the mapper's schema or its semantic constraints.
    fn validate(&self, raw: &ConfiguredMapper) -> Result<Self::Config, MapperError> {
        self.spec().deserialize(raw)
    }

    /// Applies the mapper to a schema projection and returns the new one.
    /// `stream` is never modified.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Schema`] when the configuration references a
    /// missing field or renames onto an existing one.
    fn schema(&self, config: &Self::Config, stream: &SlimStream) -> Result<SlimStream, MapperError>;

    /// Applies the mapper to a record in place.
    ///
    /// Records excluded by an earlier mapper are left untouched. Data errors
    /// never escape; they are tracked on the record instead.
    fn map(&self, config: &Self::Config, record: &mut dyn Record) {
        if record.should_include() {
            self.map_record(config, record);
        }
    }

    /// Record transformation proper, called only for included records.
    fn map_record(&self, config: &Self::Config, record: &mut dyn Record);
}
