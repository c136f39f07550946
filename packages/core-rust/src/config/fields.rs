use serde::{Deserialize, Serialize};

/// Renames a single top-level field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRenamingConfig {
    pub original_field_name: String,
    pub new_field_name: String,
}

/// Drops a single top-level field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilteringConfig {
    pub target_field: String,
}
