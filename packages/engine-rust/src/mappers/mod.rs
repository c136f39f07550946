//! Mapper variants.

mod encryption;
mod field_filtering;
mod field_renaming;
mod hashing;
mod row_filtering;

use mapper_core::{FieldChange, FieldChangeReason, MapperName, Record};

pub use encryption::EncryptionMapper;
pub use field_filtering::FieldFilteringMapper;
pub use field_renaming::FieldRenamingMapper;
pub use hashing::HashingMapper;
pub use row_filtering::{evaluate, RowFilteringMapper};

/// Records that `field` lost its value and writes `null` in its place.
fn null_field(record: &mut dyn Record, mapper: MapperName, field: &str, error: &dyn std::fmt::Display) {
    tracing::debug!(mapper = %mapper, field, error = %error, "nulling field after mapper failure");
    record.track_field_error(
        field,
        FieldChange::Nulled,
        FieldChangeReason::PlatformSerializationError,
    );
    record.set(field, serde_json::Value::Null);
}
