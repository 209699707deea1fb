//! # Configuration
//!
//! Option structs for key generation and file encryption. Every struct is
//! `serde`-deserializable with per-field defaults, so callers can keep the
//! settings in whatever document their service already loads and hand the
//! parsed values in.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CryptoConfig                                                          │
//! │  ├── keys: KeyGenerationConfig   bits, formats, output paths          │
//! │  ├── stream: StreamConfig        AES class, buffer size, IV budget     │
//! │  ├── oaep_hash                   hash for OAEP + payload ceiling       │
//! │  ├── signature_hash              hash for PSS                          │
//! │  └── salt_length                 PSS salt policy                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::{
    AesKeyLength, HashAlgorithm, SaltLength, DEFAULT_BUFFER_SIZE, DEFAULT_KEY_BITS,
    DEFAULT_KEY_USAGE_LIMIT, MIN_KEY_BITS,
};
use crate::error::{Error, Result};

/// Options for RSA key generation and persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyGenerationConfig {
    /// Modulus size in bits
    pub bits: usize,
    /// Write `<name>.pem` files
    pub pem_format: bool,
    /// Write `<name>.key` binary snapshots
    pub binary_format: bool,
    /// Directory the key files are written to
    pub output_dir: PathBuf,
    /// Base name of the private key files
    pub private_filename: String,
    /// Base name of the public key files
    pub public_filename: String,
}

impl Default for KeyGenerationConfig {
    fn default() -> Self {
        Self {
            bits: DEFAULT_KEY_BITS,
            pem_format: true,
            binary_format: true,
            output_dir: PathBuf::from("."),
            private_filename: "private".to_string(),
            public_filename: "public".to_string(),
        }
    }
}

impl KeyGenerationConfig {
    /// Generate keys without writing anything to disk
    pub fn in_memory(bits: usize) -> Self {
        Self {
            bits,
            pem_format: false,
            binary_format: false,
            ..Self::default()
        }
    }

    /// Write all formats into `dir`
    pub fn persisted_to(dir: impl AsRef<Path>, bits: usize) -> Self {
        Self {
            bits,
            output_dir: dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Whether generation writes any file
    pub fn persists(&self) -> bool {
        self.pem_format || self.binary_format
    }

    /// `<output_dir>/<private_filename>.pem`
    pub fn private_pem_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.pem", self.private_filename))
    }

    /// `<output_dir>/<public_filename>.pem`
    pub fn public_pem_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.pem", self.public_filename))
    }

    /// `<output_dir>/<private_filename>.key`
    pub fn private_snapshot_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.key", self.private_filename))
    }

    /// `<output_dir>/<public_filename>.key`
    pub fn public_snapshot_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.key", self.public_filename))
    }

    /// Reject settings that can never produce a usable key
    pub fn validate(&self) -> Result<()> {
        if self.bits < MIN_KEY_BITS {
            return Err(Error::KeyGeneration(format!(
                "{} bits is below the minimum of {}",
                self.bits, MIN_KEY_BITS
            )));
        }
        if self.persists() && self.private_filename == self.public_filename {
            return Err(Error::InvalidArgument(
                "private and public key filenames must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Options for AES-CTR file encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// AES key class; selects how many bytes of the key buffer are used
    pub key_length: AesKeyLength,
    /// Read buffer size, a non-zero multiple of 16
    pub buffer_size: usize,
    /// Ceiling for IVs generated under one key by tracked encryption
    pub key_usage_limit: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            key_length: AesKeyLength::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            key_usage_limit: DEFAULT_KEY_USAGE_LIMIT,
        }
    }
}

/// Aggregate configuration for the whole crate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Key generation and persistence
    pub keys: KeyGenerationConfig,
    /// File encryption
    pub stream: StreamConfig,
    /// Hash used for OAEP
    pub oaep_hash: HashAlgorithm,
    /// Hash used for PSS
    pub signature_hash: HashAlgorithm,
    /// PSS salt policy
    pub salt_length: SaltLength,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            keys: KeyGenerationConfig::default(),
            stream: StreamConfig::default(),
            oaep_hash: HashAlgorithm::Sha256,
            signature_hash: HashAlgorithm::Sha256,
            salt_length: SaltLength::default(),
        }
    }
}

impl CryptoConfig {
    /// Parse from JSON, filling omitted fields with defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.keys.validate()?;
        crate::crypto::validate_buffer_size(self.stream.buffer_size)?;
        if self.stream.key_usage_limit == 0 {
            return Err(Error::InvalidArgument(
                "key usage limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
