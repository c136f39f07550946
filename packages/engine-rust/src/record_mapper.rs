//! Record-path application of mapper chains.

use std::collections::HashMap;
use std::sync::Arc;

use mapper_core::{ConfiguredCatalog, MapperConfig, Record, StreamDescriptor};

use crate::error::MapperError;
use crate::registry::MapperRegistry;

/// A validated, ordered mapper chain for one stream.
#[derive(Debug, Clone, Default)]
pub struct MapperChain {
    configs: Vec<MapperConfig>,
}

impl MapperChain {
    #[must_use]
    pub fn new(configs: Vec<MapperConfig>) -> Self {
        Self { configs }
    }

    #[must_use]
    pub fn configs(&self) -> &[MapperConfig] {
        &self.configs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }
}

/// Folds mapper chains over records for the replication loop.
///
/// Holds only immutable configuration; one instance may serve records of all
/// streams from several threads.
#[derive(Debug, Clone)]
pub struct RecordMapper {
    registry: Arc<MapperRegistry>,
    chains: HashMap<StreamDescriptor, MapperChain>,
}

impl RecordMapper {
    /// A record mapper with no per-stream chains; use [`RecordMapper::apply`].
    #[must_use]
    pub fn new(registry: Arc<MapperRegistry>) -> Self {
        Self {
            registry,
            chains: HashMap::new(),
        }
    }

    /// Validates the chain of every stream in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, tagged with its stream.
    pub fn for_catalog(
        registry: Arc<MapperRegistry>,
        catalog: &ConfiguredCatalog,
    ) -> Result<Self, MapperError> {
        let mut chains = HashMap::with_capacity(catalog.streams.len());
        for stream in &catalog.streams {
            let descriptor = stream.descriptor();
            let chain = registry
                .prepare_chain(&stream.mappers)
                .map_err(|e| e.with_stream(&descriptor))?;
            chains.insert(descriptor, chain);
        }
        Ok(Self { registry, chains })
    }

    #[must_use]
    pub fn chain(&self, stream: &StreamDescriptor) -> Option<&MapperChain> {
        self.chains.get(stream)
    }

    /// Applies `chain` to `record` in order.
    pub fn apply(&self, chain: &MapperChain, record: &mut dyn Record) {
        for config in chain.configs() {
            self.registry.map(config, record);
        }
    }

    /// Applies the chain prepared for `stream`. Records of streams without a
    /// chain pass through untouched. Returns whether the record is still
    /// included.
    pub fn apply_to_stream(&self, stream: &StreamDescriptor, record: &mut dyn Record) -> bool {
        if let Some(chain) = self.chains.get(stream) {
            self.apply(chain, record);
        }
        record.should_include()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
