//! Field encryption with AES (hydrated symmetric key) or RSA (public key).
//!
//! AES output is `hex(iv || ciphertext)` with a fresh 16 byte IV drawn from
//! the OS RNG for every value. RSA output is `hex(ciphertext)` using PKCS#1
//! v1.5 padding. No cipher or RNG state outlives a single value.

use cbc::cipher::block_padding::NoPadding as RawBlocks;
use cbc::cipher::{AsyncStreamCipher, BlockEncryptMut, KeyIvInit, StreamCipher};
use mapper_core::config::{AesEncryptionConfig, AesMode, AesPadding, EncryptionConfig};
use mapper_core::{ConfiguredMapper, FieldType, MapperName, Record, SlimStream};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use serde_json::{json, Value};

use super::null_field;
use crate::error::MapperError;
use crate::mapper::Mapper;
use crate::spec::{finish, mapper_schema, ConfigValidatingSpec, MapperSpec, ObjectSchema, Property};

const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;
const AES_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

#[derive(Debug, thiserror::Error)]
enum CryptoError {
    #[error("AES key must be 16, 24 or 32 bytes, got {0}")]
    KeyLength(usize),
    #[error("plaintext of {0} bytes is not a multiple of the AES block size")]
    Unpadded(usize),
    #[error("cipher rejected key or IV length")]
    InvalidLength,
    #[error("key material is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("random number generator failure: {0}")]
    Rng(#[from] rand::Error),
    #[error("invalid RSA public key: {0}")]
    PublicKey(#[from] rsa::pkcs8::spki::Error),
    #[error("RSA encryption failed: {0}")]
    Rsa(#[from] rsa::Error),
    #[error("value cannot be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Encrypts one field per record.
#[derive(Debug)]
pub struct EncryptionMapper {
    spec: ConfigValidatingSpec<EncryptionConfig>,
}

impl EncryptionMapper {
    /// # Errors
    ///
    /// Returns [`MapperError::SpecCompilation`] if the built-in schema fails to compile.
    pub fn new() -> Result<Self, MapperError> {
        Ok(Self {
            spec: ConfigValidatingSpec::new(spec())?,
        })
    }
}

fn common_fields(schema: ObjectSchema) -> ObjectSchema {
    schema
        .required(
            "targetField",
            Property::field_name()
                .title("Original field name")
                .description("The name of the field to be encrypted."),
        )
        .optional(
            "fieldNameSuffix",
            Property::string()
                .title("Field name suffix")
                .description("The suffix to append to the field name after encryption.")
                .default_value(json!("")),
        )
}

fn spec() -> MapperSpec {
    let aes = common_fields(
        ObjectSchema::new()
            .title("AES")
            .required("algorithm", Property::constant("AES").title("Algorithm")),
    )
    .required(
        "key",
        Property::field_name()
            .title("Key")
            .description("Hex-encoded AES key of 128, 192 or 256 bits.")
            .secret(),
    )
    .required(
        "mode",
        Property::one_of_strings(&["CBC", "CFB", "OFB", "CTR"])
            .title("Mode")
            .description("Block cipher mode of operation."),
    )
    .required(
        "padding",
        Property::one_of_strings(&["NoPadding", "PKCS5Padding"])
            .title("Padding")
            .description("Padding scheme applied to the plaintext."),
    )
    .closed();

    let rsa = common_fields(
        ObjectSchema::new()
            .title("RSA")
            .required("algorithm", Property::constant("RSA").title("Algorithm")),
    )
    .required(
        "publicKey",
        Property::field_name()
            .title("Public key")
            .description("Hex-encoded DER SubjectPublicKeyInfo of the RSA public key."),
    )
    .closed();

    let config = Property::one_of(vec![aes.build(), rsa.build()])
        .title("Encryption")
        .description("Encryption algorithm and its parameters.");
    MapperSpec::new(
        MapperName::Encryption,
        finish(
            mapper_schema(MapperName::Encryption, "Encryption mapper", config)
                .description("Encrypts the value of a field."),
        ),
    )
}

// ---------------------------------------------------------------------------
// Ciphers
// ---------------------------------------------------------------------------

/// Encrypts `buf` in place with the given AES variant and mode.
macro_rules! aes_in_place {
    ($cipher:ty, $mode:expr, $key:expr, $iv:expr, $buf:expr) => {{
        let buf: &mut [u8] = $buf;
        match $mode {
            AesMode::Cbc => {
                let len = buf.len();
                cbc::Encryptor::<$cipher>::new_from_slices($key, $iv)
                    .map_err(|_| CryptoError::InvalidLength)?
                    .encrypt_padded_mut::<RawBlocks>(buf, len)
                    .map_err(|_| CryptoError::Unpadded(len))?;
            }
            AesMode::Cfb => cfb_mode::Encryptor::<$cipher>::new_from_slices($key, $iv)
                .map_err(|_| CryptoError::InvalidLength)?
                .encrypt(buf),
            AesMode::Ofb => ofb::Ofb::<$cipher>::new_from_slices($key, $iv)
                .map_err(|_| CryptoError::InvalidLength)?
                .apply_keystream(buf),
            AesMode::Ctr => ctr::Ctr128BE::<$cipher>::new_from_slices($key, $iv)
                .map_err(|_| CryptoError::InvalidLength)?
                .apply_keystream(buf),
        }
    }};
}

fn pkcs5_pad(buf: &mut Vec<u8>) {
    let pad = BLOCK_LEN - buf.len() % BLOCK_LEN;
    // pad is in 1..=16
    buf.resize(buf.len() + pad, u8::try_from(pad).unwrap_or(16));
}

fn decode_aes_key(config: &AesEncryptionConfig) -> Result<Vec<u8>, CryptoError> {
    let key = hex::decode(config.key.expose_secret())?;
    if AES_KEY_LENGTHS.contains(&key.len()) {
        Ok(key)
    } else {
        Err(CryptoError::KeyLength(key.len()))
    }
}

fn encrypt_aes(config: &AesEncryptionConfig, plaintext: &[u8]) -> Result<String, CryptoError> {
    let key = decode_aes_key(config)?;
    let mut iv = [0u8; IV_LEN];
    OsRng.try_fill_bytes(&mut iv)?;

    let mut buf = plaintext.to_vec();
    match config.padding {
        AesPadding::Pkcs5Padding => pkcs5_pad(&mut buf),
        AesPadding::NoPadding => {
            if config.mode == AesMode::Cbc && buf.len() % BLOCK_LEN != 0 {
                return Err(CryptoError::Unpadded(buf.len()));
            }
        }
    }

    match key.len() {
        16 => aes_in_place!(aes::Aes128, config.mode, &key, &iv, &mut buf),
        24 => aes_in_place!(aes::Aes192, config.mode, &key, &iv, &mut buf),
        32 => aes_in_place!(aes::Aes256, config.mode, &key, &iv, &mut buf),
        n => return Err(CryptoError::KeyLength(n)),
    }

    let mut out = Vec::with_capacity(IV_LEN + buf.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&buf);
    Ok(hex::encode(out))
}

fn decode_public_key(public_key: &str) -> Result<RsaPublicKey, CryptoError> {
    let der = hex::decode(public_key)?;
    Ok(RsaPublicKey::from_public_key_der(&der)?)
}

fn encrypt_rsa(public_key: &str, plaintext: &[u8]) -> Result<String, CryptoError> {
    let key = decode_public_key(public_key)?;
    let ciphertext = key.encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)?;
    Ok(hex::encode(ciphertext))
}

fn encrypt_value(config: &EncryptionConfig, value: &Value) -> Result<Value, CryptoError> {
    let text = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other)?,
    };
    let encrypted = match config {
        EncryptionConfig::Aes(aes) => encrypt_aes(aes, text.as_bytes())?,
        EncryptionConfig::Rsa(rsa) => encrypt_rsa(&rsa.public_key, text.as_bytes())?,
    };
    Ok(Value::String(encrypted))
}

// ---------------------------------------------------------------------------
// Mapper
// ---------------------------------------------------------------------------

impl Mapper for EncryptionMapper {
    type Config = EncryptionConfig;

    fn spec(&self) -> &ConfigValidatingSpec<EncryptionConfig> {
        &self.spec
    }

    /// Also checks that key material decodes, so that record-time failures
    /// are limited to the values themselves.
    fn validate(&self, raw: &ConfiguredMapper) -> Result<EncryptionConfig, MapperError> {
        let config = self.spec.deserialize(raw)?;
        let check = match &config {
            EncryptionConfig::Aes(aes) => decode_aes_key(aes)
                .map(|_| ())
                .map_err(|e| format!("/config/key: {e}")),
            EncryptionConfig::Rsa(rsa) => decode_public_key(&rsa.public_key)
                .map(|_| ())
                .map_err(|e| format!("/config/publicKey: {e}")),
        };
        check.map_err(|message| MapperError::invalid_config(MapperName::Encryption.as_str(), message))?;
        Ok(config)
    }

    fn schema(
        &self,
        config: &EncryptionConfig,
        stream: &SlimStream,
    ) -> Result<SlimStream, MapperError> {
        let mut projected = stream.deep_copy();
        projected.redefine_field(
            config.target_field(),
            &config.output_field(),
            Some(FieldType::String),
        )?;
        Ok(projected)
    }

    fn map_record(&self, config: &EncryptionConfig, record: &mut dyn Record) {
        let target = config.target_field();
        let Some(value) = record.get(target) else {
            return;
        };
        let output = config.output_field();
        match encrypt_value(config, value) {
            Ok(encrypted) => {
                if output != target {
                    record.remove(target);
                }
                record.set(&output, encrypted);
            }
            Err(e) => {
                record.remove(target);
                null_field(record, MapperName::Encryption, &output, &e);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
