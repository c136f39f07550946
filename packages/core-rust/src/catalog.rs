//! Configured catalog wire types.
//!
//! The catalog is produced by the connection configuration layer and handed
//! to the engine as input; the engine returns a transformed copy for the
//! destination. Wire format is snake_case JSON, except for mapper entries
//! which use the camelCase shape of the configuration API.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::Field;

/// Replication mode on the source side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    FullRefresh,
    Incremental,
}

/// Write mode on the destination side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationSyncMode {
    Append,
    Overwrite,
    AppendDedup,
    OverwriteDedup,
}

/// Identity of a stream within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub namespace: Option<String>,
}

impl StreamDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A stream as declared by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub namespace: Option<String>,
    /// JSON Schema document describing one record of the stream.
    pub json_schema: Value,
    #[serde(default)]
    pub supported_sync_modes: Vec<SyncMode>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_defined_cursor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default_cursor_field: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_defined_primary_key: Option<Vec<Vec<String>>>,
}

/// A mapper entry as stored in connection configuration. Unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredMapper {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub config: Value,
}

impl ConfiguredMapper {
    #[must_use]
    pub fn new(name: impl Into<String>, config: Value) -> Self {
        Self {
            name: name.into(),
            id: None,
            documentation_url: None,
            config,
        }
    }
}

/// A stream selected for replication, with its mapper chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredStream {
    pub stream: StreamDefinition,
    /// Effective fields. Derived from `stream.json_schema` when absent.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fields: Option<Vec<Field>>,
    /// Ordered mapper chain.
    #[serde(default)]
    pub mappers: Vec<ConfiguredMapper>,
    pub sync_mode: SyncMode,
    pub destination_sync_mode: DestinationSyncMode,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cursor_field: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub primary_key: Option<Vec<Vec<String>>>,
}

impl ConfiguredStream {
    #[must_use]
    pub fn descriptor(&self) -> StreamDescriptor {
        StreamDescriptor::new(self.stream.name.clone(), self.stream.namespace.clone())
    }
}

/// The set of streams configured for a connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredCatalog {
    pub streams: Vec<ConfiguredStream>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
