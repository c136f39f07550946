//! Record capability consumed by mappers.
//!
//! Records are owned by the replication loop. Mappers receive them as
//! `&mut dyn Record` and mutate them in place, one record at a time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RecordError;

/// What happened to a field whose transformation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldChange {
    Nulled,
    Truncated,
}

/// Why a field was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldChangeReason {
    PlatformSerializationError,
    PlatformFieldSizeLimitation,
    PlatformRecordSizeLimitation,
}

/// A field-level annotation attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFieldChange {
    pub field: String,
    pub change: FieldChange,
    pub reason: FieldChangeReason,
}

/// Field-level access to a structured record plus an inclusion flag.
pub trait Record {
    /// Returns `true` if the top-level field is present (even when `null`).
    fn has(&self, field: &str) -> bool;

    fn get(&self, field: &str) -> Option<&Value>;

    /// Inserts or overwrites a top-level field.
    fn set(&mut self, field: &str, value: Value);

    /// Removes a top-level field, returning its value. Absent fields are a no-op.
    fn remove(&mut self, field: &str) -> Option<Value>;

    /// Moves the value of `old` to `new`.
    ///
    /// # Errors
    ///
    /// Fails if `old` is absent or if `new` already holds a value.
    fn rename(&mut self, old: &str, new: &str) -> Result<(), RecordError>;

    /// Annotates the record with a field-level change.
    fn track_field_error(&mut self, field: &str, change: FieldChange, reason: FieldChangeReason);

    /// Whether the record should still be written to the destination.
    fn should_include(&self) -> bool;

    fn set_include(&mut self, include: bool);
}

// ---------------------------------------------------------------------------
// JsonRecord
// ---------------------------------------------------------------------------

/// [`Record`] over a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    data: Map<String, Value>,
    changes: Vec<TrackedFieldChange>,
    include: bool,
}

impl JsonRecord {
    /// Wraps an object. New records are included by default.
    #[must_use]
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            changes: Vec::new(),
            include: true,
        }
    }

    /// Wraps a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotAnObject`] if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(data) => Ok(Self::new(data)),
            other => Err(RecordError::NotAnObject(json_kind(&other))),
        }
    }

    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Map<String, Value> {
        self.data
    }

    /// Field-level changes tracked so far, in tracking order.
    #[must_use]
    pub fn changes(&self) -> &[TrackedFieldChange] {
        &self.changes
    }
}

impl Record for JsonRecord {
    fn has(&self, field: &str) -> bool {
        self.data.contains_key(field)
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    fn set(&mut self, field: &str, value: Value) {
        self.data.insert(field.to_string(), value);
    }

    fn remove(&mut self, field: &str) -> Option<Value> {
        self.data.remove(field)
    }

    fn rename(&mut self, old: &str, new: &str) -> Result<(), RecordError> {
        if !self.data.contains_key(old) {
            return Err(RecordError::FieldNotFound(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if self.data.contains_key(new) {
            return Err(RecordError::FieldAlreadyExists(new.to_string()));
        }
        if let Some(value) = self.data.remove(old) {
            self.data.insert(new.to_string(), value);
        }
        Ok(())
    }

    fn track_field_error(&mut self, field: &str, change: FieldChange, reason: FieldChangeReason) {
        self.changes.push(TrackedFieldChange {
            field: field.to_string(),
            change,
            reason,
        });
    }

    fn should_include(&self) -> bool {
        self.include
    }

    fn set_include(&mut self, include: bool) {
        self.include = include;
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> JsonRecord {
        JsonRecord::from_value(value).unwrap()
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert_eq!(
            JsonRecord::from_value(json!([1, 2])).unwrap_err(),
            RecordError::NotAnObject("array")
        );
    }

    #[test]
    fn new_record_is_included() {
        let mut r = record(json!({}));
        assert!(r.should_include());
        r.set_include(false);
        assert!(!r.should_include());
    }

    #[test]
    fn has_reports_null_fields() {
        let r = record(json!({"a": null}));
        assert!(r.has("a"));
        assert_eq!(r.get("a"), Some(&Value::Null));
        assert!(!r.has("b"));
    }

    #[test]
    fn rename_moves_value() {
        let mut r = record(json!({"a": 1}));
        r.rename("a", "b").unwrap();
        assert_eq!(Value::Object(r.into_data()), json!({"b": 1}));
    }

    #[test]
    fn rename_onto_existing_field_fails_without_mutation() {
        let mut r = record(json!({"a": 1, "b": 2}));
        let err = r.rename("a", "b").unwrap_err();
        assert_eq!(err, RecordError::FieldAlreadyExists("b".into()));
        assert_eq!(Value::Object(r.data().clone()), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn rename_missing_field_fails() {
        let mut r = record(json!({}));
        assert_eq!(
            r.rename("a", "b").unwrap_err(),
            RecordError::FieldNotFound("a".into())
        );
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut r = record(json!({"a": 1}));
        assert_eq!(r.remove("b"), None);
        assert_eq!(r.remove("a"), Some(json!(1)));
        assert!(r.data().is_empty());
    }

    #[test]
    fn tracked_changes_are_kept_in_order() {
        let mut r = record(json!({}));
        r.track_field_error(
            "a",
            FieldChange::Nulled,
            FieldChangeReason::PlatformSerializationError,
        );
        r.track_field_error(
            "b",
            FieldChange::Truncated,
            FieldChangeReason::PlatformFieldSizeLimitation,
        );
        let fields: Vec<&str> = r.changes().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "b"]);
        assert_eq!(
            serde_json::to_value(&r.changes()[0]).unwrap(),
            json!({"field": "a", "change": "NULLED", "reason": "PLATFORM_SERIALIZATION_ERROR"})
        );
    }
}
