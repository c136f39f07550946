//! Typed mapper configurations.
//!
//! These types describe configuration that already passed JSON Schema
//! validation. Untrusted input arrives as
//! [`ConfiguredMapper`](crate::catalog::ConfiguredMapper) and only becomes a
//! [`MapperConfig`] through the engine's validating specs.

mod encryption;
mod fields;
mod hashing;
mod row_filtering;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;

pub use encryption::{
    AesEncryptionConfig, AesMode, AesPadding, EncryptionConfig, RsaEncryptionConfig,
    SensitiveString,
};
pub use fields::{FieldFilteringConfig, FieldRenamingConfig};
pub use hashing::{HashingConfig, HashingMethod, DEFAULT_HASHED_SUFFIX};
pub use row_filtering::{Condition, RowFilteringConfig};

/// Stable identifier of each mapper variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapperName {
    FieldRenaming,
    FieldFiltering,
    Hashing,
    Encryption,
    RowFiltering,
}

impl MapperName {
    /// Every known variant, in registration order.
    pub const ALL: [MapperName; 5] = [
        MapperName::FieldRenaming,
        MapperName::FieldFiltering,
        MapperName::Hashing,
        MapperName::Encryption,
        MapperName::RowFiltering,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FieldRenaming => "field-renaming",
            Self::FieldFiltering => "field-filtering",
            Self::Hashing => "hashing",
            Self::Encryption => "encryption",
            Self::RowFiltering => "row-filtering",
        }
    }
}

impl fmt::Display for MapperName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapperName {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ArgumentError::UnknownMapper(s.to_string()))
    }
}

/// Validated configuration of one mapper in a chain.
#[derive(Debug, Clone)]
pub enum MapperConfig {
    FieldRenaming(FieldRenamingConfig),
    FieldFiltering(FieldFilteringConfig),
    Hashing(HashingConfig),
    Encryption(EncryptionConfig),
    RowFiltering(RowFilteringConfig),
}

impl MapperConfig {
    #[must_use]
    pub fn name(&self) -> MapperName {
        match self {
            Self::FieldRenaming(_) => MapperName::FieldRenaming,
            Self::FieldFiltering(_) => MapperName::FieldFiltering,
            Self::Hashing(_) => MapperName::Hashing,
            Self::Encryption(_) => MapperName::Encryption,
            Self::RowFiltering(_) => MapperName::RowFiltering,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
