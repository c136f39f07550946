//! Minimal mutable projection of a stream's effective schema.
//!
//! A `SlimStream` carries only what mapper schema transforms need: the field
//! list, the cursor path and the primary key path groups. It also remembers,
//! for every field, the name it had in the source catalog so that structured
//! schema fragments can be found again after any number of renames.

use std::collections::BTreeMap;

use crate::error::SchemaError;
use crate::field::{Field, FieldType};

/// Schema projection threaded through a mapper chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlimStream {
    fields: Vec<Field>,
    cursor: Option<Vec<String>>,
    primary_key: Option<Vec<Vec<String>>>,
    /// Current field name -> field name in the source catalog.
    origins: BTreeMap<String, String>,
}

impl SlimStream {
    /// Creates a projection whose fields all originate from the source catalog
    /// under their current names.
    #[must_use]
    pub fn new(
        fields: Vec<Field>,
        cursor: Option<Vec<String>>,
        primary_key: Option<Vec<Vec<String>>>,
    ) -> Self {
        let origins = fields
            .iter()
            .map(|f| (f.name.clone(), f.name.clone()))
            .collect();
        Self {
            fields,
            cursor,
            primary_key,
            origins,
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn cursor(&self) -> Option<&[String]> {
        self.cursor.as_deref()
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&[Vec<String>]> {
        self.primary_key.as_deref()
    }

    /// Looks up a field by its current name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the name the field currently called `name` had in the source
    /// catalog. Fields introduced by mappers map to themselves.
    #[must_use]
    pub fn original_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.origins.get(name).map_or(name, String::as_str)
    }

    /// Independent copy of this projection.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Renames `old_name` to `new_name`, optionally changing its type.
    ///
    /// Cursor and primary key groups equal to `[old_name]` are rewritten to
    /// `[new_name]`. Redefining a field under its own name only retypes it.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::FieldNotFound`] if `old_name` is absent and
    /// [`SchemaError::FieldAlreadyExists`] if `new_name` is taken by another
    /// field. The projection is left unchanged on error.
    pub fn redefine_field(
        &mut self,
        old_name: &str,
        new_name: &str,
        new_type: Option<FieldType>,
    ) -> Result<(), SchemaError> {
        let index = self
            .fields
            .iter()
            .position(|f| f.name == old_name)
            .ok_or_else(|| SchemaError::FieldNotFound(old_name.to_string()))?;
        if new_name != old_name && self.has_field(new_name) {
            return Err(SchemaError::FieldAlreadyExists(new_name.to_string()));
        }

        let current = &self.fields[index];
        let mut redefined = current.with_name(new_name);
        if let Some(field_type) = new_type {
            redefined = redefined.with_type(field_type);
        }
        self.fields[index] = redefined;

        if new_name != old_name {
            let origin = self
                .origins
                .remove(old_name)
                .unwrap_or_else(|| old_name.to_string());
            self.origins.insert(new_name.to_string(), origin);
            self.rewrite_references(old_name, new_name);
        }
        Ok(())
    }

    /// Removes a field. Cursor and primary key references are left as they
    /// are; the catalog generator decides what to do with dangling paths.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::FieldNotFound`] if the field is absent.
    pub fn remove_field(&mut self, name: &str) -> Result<Field, SchemaError> {
        let index = self
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))?;
        self.origins.remove(name);
        Ok(self.fields.remove(index))
    }

    /// Splits the projection into fields, cursor and primary key.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Field>, Option<Vec<String>>, Option<Vec<Vec<String>>>) {
        (self.fields, self.cursor, self.primary_key)
    }

    fn rewrite_references(&mut self, old_name: &str, new_name: &str) {
        let is_old = |path: &Vec<String>| path.len() == 1 && path[0] == old_name;
        if let Some(cursor) = self.cursor.as_mut() {
            if is_old(cursor) {
                *cursor = vec![new_name.to_string()];
            }
        }
        if let Some(groups) = self.primary_key.as_mut() {
            for group in groups.iter_mut().filter(|g| is_old(g)) {
                *group = vec![new_name.to_string()];
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
