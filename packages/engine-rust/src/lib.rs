//! Stream mapping engine.
//!
//! Holds the built-in mappers, the registry that validates configured mapper
//! chains against each mapper's JSON Schema, the record-side chain executor
//! and the destination catalog generator.

pub mod config;
pub mod error;
pub mod generator;
pub mod mapper;
pub mod mappers;
pub mod record_mapper;
pub mod registry;
pub mod spec;

pub use config::{EngineConfig, ReferencePolicy};
pub use error::MapperError;
pub use generator::{
    generate_json_schema_from_fields, CatalogGenerationResult, DestinationCatalogGenerator,
    MapperFailure, MapperFailureKind,
};
pub use mapper::Mapper;
pub use record_mapper::{MapperChain, RecordMapper};
pub use registry::MapperRegistry;
pub use spec::{ConfigValidatingSpec, MapperSpec};
