//! Stream mapping core: fields, slim stream projections, catalog wire types,
//! the record capability and typed mapper configurations.

pub mod catalog;
pub mod config;
pub mod error;
pub mod field;
pub mod record;
pub mod slim_stream;

pub use catalog::{
    ConfiguredCatalog, ConfiguredMapper, ConfiguredStream, DestinationSyncMode, StreamDefinition,
    StreamDescriptor, SyncMode,
};
pub use config::{MapperConfig, MapperName};
pub use error::{ArgumentError, RecordError, SchemaError};
pub use field::{Field, FieldType};
pub use record::{FieldChange, FieldChangeReason, JsonRecord, Record, TrackedFieldChange};
pub use slim_stream::SlimStream;
