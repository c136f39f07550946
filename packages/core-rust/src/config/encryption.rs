use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Secret configuration value. Never printed or serialized in clear.
#[derive(Clone)]
pub struct SensitiveString(SecretString);

impl SensitiveString {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SensitiveString(***REDACTED***)")
    }
}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Serialize for SensitiveString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***REDACTED***")
    }
}

impl<'de> Deserialize<'de> for SensitiveString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

/// Block cipher mode for AES.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AesMode {
    Cbc,
    Cfb,
    Ofb,
    Ctr,
}

/// Plaintext padding scheme for AES.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AesPadding {
    #[serde(rename = "NoPadding")]
    NoPadding,
    #[serde(rename = "PKCS5Padding")]
    Pkcs5Padding,
}

/// Symmetric encryption with a hydrated hex-encoded key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AesEncryptionConfig {
    pub target_field: String,
    #[serde(default)]
    pub field_name_suffix: String,
    /// Hex-encoded 128, 192 or 256 bit key.
    pub key: SensitiveString,
    pub mode: AesMode,
    pub padding: AesPadding,
}

/// One-way asymmetric encryption with a hex-encoded DER public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsaEncryptionConfig {
    pub target_field: String,
    #[serde(default)]
    pub field_name_suffix: String,
    pub public_key: String,
}

/// Encryption parameters, tagged by algorithm family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "algorithm")]
pub enum EncryptionConfig {
    #[serde(rename = "AES")]
    Aes(AesEncryptionConfig),
    #[serde(rename = "RSA")]
    Rsa(RsaEncryptionConfig),
}

impl EncryptionConfig {
    #[must_use]
    pub fn target_field(&self) -> &str {
        match self {
            Self::Aes(c) => &c.target_field,
            Self::Rsa(c) => &c.target_field,
        }
    }

    #[must_use]
    pub fn field_name_suffix(&self) -> &str {
        match self {
            Self::Aes(c) => &c.field_name_suffix,
            Self::Rsa(c) => &c.field_name_suffix,
        }
    }

    /// Name of the field receiving the ciphertext.
    #[must_use]
    pub fn output_field(&self) -> String {
        format!("{}{}", self.target_field(), self.field_name_suffix())
    }
}
