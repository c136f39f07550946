use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;

/// Suffix appended to the target field when none is configured.
pub const DEFAULT_HASHED_SUFFIX: &str = "_hashed";

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashingMethod {
    #[serde(rename = "MD2")]
    Md2,
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA-1")]
    Sha1,
    #[serde(rename = "SHA-224")]
    Sha224,
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl HashingMethod {
    pub const ALL: [HashingMethod; 7] = [
        HashingMethod::Md2,
        HashingMethod::Md5,
        HashingMethod::Sha1,
        HashingMethod::Sha224,
        HashingMethod::Sha256,
        HashingMethod::Sha384,
        HashingMethod::Sha512,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md2 => "MD2",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }
}

impl fmt::Display for HashingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashingMethod {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ArgumentError::UnsupportedHashingMethod(s.to_string()))
    }
}

/// Replaces a field with its hex-encoded digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashingConfig {
    pub target_field: String,
    pub method: HashingMethod,
    #[serde(default = "default_suffix")]
    pub field_name_suffix: String,
}

impl HashingConfig {
    /// Name of the field receiving the digest.
    #[must_use]
    pub fn output_field(&self) -> String {
        format!("{}{}", self.target_field, self.field_name_suffix)
    }
}

fn default_suffix() -> String {
    DEFAULT_HASHED_SUFFIX.to_string()
}
