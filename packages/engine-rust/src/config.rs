use mapper_core::MapperName;
use serde::{Deserialize, Serialize};

/// What catalog generation does when a mapper chain removes a field that a
/// cursor or primary key still points at, whether configured on the stream or
/// defined by the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Leave the dangling path in place.
    #[default]
    Keep,
    /// Drop every cursor and primary key group that no longer resolves.
    Clear,
    /// Fail generation with [`MapperError::DanglingReference`](crate::MapperError::DanglingReference).
    Reject,
}

/// Engine-level configuration, fixed when the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub reference_policy: ReferencePolicy,
    /// Mappers the registry refuses to resolve, as if they were unknown.
    pub disabled_mappers: Vec<MapperName>,
    /// Maximum nesting depth of row-filtering condition trees.
    pub max_condition_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_policy: ReferencePolicy::Keep,
            disabled_mappers: Vec::new(),
            max_condition_depth: 16,
        }
    }
}
