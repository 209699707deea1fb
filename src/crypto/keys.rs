//! # Key Management
//!
//! This module handles RSA key generation, persistence and loading.
//!
//! ## Key Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  KeyPair (RSA private key)                                      │   │
//! │  │  ─────────────────────────                                       │   │
//! │  │                                                                  │   │
//! │  │  Purpose:                                                       │   │
//! │  │  • OAEP decryption                                              │   │
//! │  │  • PSS signing                                                  │   │
//! │  │                                                                  │   │
//! │  │  The public half is always derived from the private key, so a   │   │
//! │  │  mismatched pair cannot be built. Zeroized on drop.             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  PublicKey (RSA public key)                                     │   │
//! │  │  ──────────────────────────                                      │   │
//! │  │                                                                  │   │
//! │  │  Purpose:                                                       │   │
//! │  │  • OAEP encryption                                              │   │
//! │  │  • PSS verification                                             │   │
//! │  │                                                                  │   │
//! │  │  Shared freely.                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  KeyMaterial (loaded key file)                                  │   │
//! │  │  ─────────────────────────────                                   │   │
//! │  │                                                                  │   │
//! │  │  Optional KeyPair + PublicKey + raw file bytes                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## File Formats
//!
//! | File | Label | Payload |
//! |------|-------|---------|
//! | `private.pem` | `PRIVATE KEY` | PKCS#1 DER |
//! | `public.pem` | `PUBLIC KEY` | PKIX DER (PKCS#1 also read) |
//! | `private.key` / `public.key` | n/a | bincode snapshot, internal |

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand_core::CryptoRngCore;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::KeyGenerationConfig;
use crate::error::{Error, Result};
use crate::paths;

/// Smallest modulus accepted for generation
pub const MIN_KEY_BITS: usize = 1024;

/// Modulus size used when none is configured
pub const DEFAULT_KEY_BITS: usize = 2048;

/// PEM label written for private keys (PKCS#1 payload)
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// Standard PKCS#1 private key label, also accepted on read
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/// PEM label for public keys
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

const SNAPSHOT_VERSION: u16 = 1;

/// RSA key pair
///
/// ## Security
///
/// - The private key is zeroized when this struct is dropped
/// - The public key is derived on demand and can be shared with anyone
#[derive(Clone, ZeroizeOnDrop)]
pub struct KeyPair {
    #[zeroize(skip)] // rsa::RsaPrivateKey zeroizes itself on drop
    secret: RsaPrivateKey,
}

impl KeyPair {
    /// Generate a new random key pair using the OS random number generator
    pub fn generate(bits: usize) -> Result<Self> {
        Self::generate_with_rng(&mut OsRng, bits)
    }

    /// Generate a new random key pair from the given random source
    pub fn generate_with_rng<R: CryptoRngCore + ?Sized>(rng: &mut R, bits: usize) -> Result<Self> {
        if bits < MIN_KEY_BITS {
            return Err(Error::KeyGeneration(format!(
                "{} bits is below the minimum of {}",
                bits, MIN_KEY_BITS
            )));
        }

        let secret = RsaPrivateKey::new(rng, bits)
            .map_err(|e| Error::KeyGeneration(e.to_string()))?;

        Ok(Self { secret })
    }

    /// Wrap an existing private key after validating it
    pub fn from_private_key(secret: RsaPrivateKey) -> Result<Self> {
        secret
            .validate()
            .map_err(|e| Error::KeyDecoding(format!("Invalid RSA private key: {}", e)))?;
        Ok(Self { secret })
    }

    /// Decode a PEM-encoded PKCS#1 private key
    ///
    /// The block label must be `PRIVATE KEY` or `RSA PRIVATE KEY`. PKCS#8
    /// content under a `PRIVATE KEY` label is rejected.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self> {
        let block = pem::parse(pem_bytes)?;
        if block.tag() != PRIVATE_KEY_LABEL && block.tag() != RSA_PRIVATE_KEY_LABEL {
            return Err(Error::KeyTypeMismatch {
                expected: "PRIVATE KEY",
                found: block.tag().to_string(),
            });
        }

        Self::from_pkcs1_der(block.contents())
    }

    /// Decode PKCS#1 DER
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        let secret = RsaPrivateKey::from_pkcs1_der(der)
            .map_err(|e| Error::KeyDecoding(format!("Invalid PKCS#1 private key: {}", e)))?;
        Self::from_private_key(secret)
    }

    /// Encode the private key as PKCS#1 DER
    ///
    /// ## Security Warning
    ///
    /// Only use this for secure storage. Never log or transmit these bytes.
    pub fn to_pkcs1_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let document = self
            .secret
            .to_pkcs1_der()
            .map_err(|e| Error::Serialization(format!("PKCS#1 encoding failed: {}", e)))?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    /// Encode the private key as PEM (`PRIVATE KEY` label, PKCS#1 payload)
    pub fn to_pem(&self) -> Result<Zeroizing<String>> {
        let der = self.to_pkcs1_der()?;
        let block = pem::Pem::new(PRIVATE_KEY_LABEL, der.to_vec());
        Ok(Zeroizing::new(pem::encode(&block)))
    }

    /// Serialize into the internal binary snapshot format
    pub fn to_snapshot_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        let snapshot = KeySnapshot {
            version: SNAPSHOT_VERSION,
            kind: SnapshotKind::Private,
            der: self.to_pkcs1_der()?.to_vec(),
        };
        Ok(Zeroizing::new(bincode::serialize(&snapshot)?))
    }

    /// Restore from a snapshot written by [`KeyPair::to_snapshot_bytes`]
    pub fn from_snapshot_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot = KeySnapshot::decode(bytes, SnapshotKind::Private)?;
        Self::from_pkcs1_der(&snapshot.der)
    }

    /// Get the public key for sharing with others
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.secret.to_public_key())
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.secret.n().bits()
    }

    /// Modulus size in bytes (the RSA block size)
    pub fn size(&self) -> usize {
        self.secret.size()
    }

    /// Get reference to the private key
    pub(crate) fn rsa_private(&self) -> &RsaPrivateKey {
        &self.secret
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .field("fingerprint", &self.public_key().fingerprint())
            .finish_non_exhaustive()
    }
}

/// RSA public key
///
/// Contains only public information and can be serialized, transmitted,
/// and stored without security concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Wrap an `rsa` public key
    pub fn from_rsa(key: RsaPublicKey) -> Self {
        Self(key)
    }

    /// Decode a PEM-encoded public key
    ///
    /// The block label must be exactly `PUBLIC KEY`. The payload is read as
    /// PKIX first and as PKCS#1 second, for files from older writers.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self> {
        let block = pem::parse(pem_bytes)?;
        if block.tag() != PUBLIC_KEY_LABEL {
            return Err(Error::KeyTypeMismatch {
                expected: "PUBLIC KEY",
                found: block.tag().to_string(),
            });
        }

        Self::from_der(block.contents())
    }

    /// Decode PKIX or PKCS#1 DER
    pub fn from_der(der: &[u8]) -> Result<Self> {
        RsaPublicKey::from_public_key_der(der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(der))
            .map(Self)
            .map_err(|e| Error::KeyDecoding(format!("Invalid RSA public key: {}", e)))
    }

    /// Encode as PKIX DER
    pub fn to_pkix_der(&self) -> Result<Vec<u8>> {
        self.0
            .to_public_key_der()
            .map(|document| document.as_bytes().to_vec())
            .map_err(|e| Error::Serialization(format!("PKIX encoding failed: {}", e)))
    }

    /// Encode as PKCS#1 DER
    pub fn to_pkcs1_der(&self) -> Result<Vec<u8>> {
        self.0
            .to_pkcs1_der()
            .map(|document| document.as_bytes().to_vec())
            .map_err(|e| Error::Serialization(format!("PKCS#1 encoding failed: {}", e)))
    }

    /// Encode as PEM (`PUBLIC KEY` label, PKIX payload)
    pub fn to_pem(&self) -> Result<String> {
        let block = pem::Pem::new(PUBLIC_KEY_LABEL, self.to_pkix_der()?);
        Ok(pem::encode(&block))
    }

    /// Serialize into the internal binary snapshot format
    pub fn to_snapshot_bytes(&self) -> Result<Vec<u8>> {
        let snapshot = KeySnapshot {
            version: SNAPSHOT_VERSION,
            kind: SnapshotKind::Public,
            der: self.to_pkcs1_der()?,
        };
        Ok(bincode::serialize(&snapshot)?)
    }

    /// Restore from a snapshot written by [`PublicKey::to_snapshot_bytes`]
    pub fn from_snapshot_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot = KeySnapshot::decode(bytes, SnapshotKind::Public)?;
        RsaPublicKey::from_pkcs1_der(&snapshot.der)
            .map(Self)
            .map_err(|e| Error::KeyDecoding(format!("Invalid RSA public key: {}", e)))
    }

    /// Hex SHA-256 of the PKIX encoding, for logs and display
    pub fn fingerprint(&self) -> String {
        match self.to_pkix_der() {
            Ok(der) => hex::encode(Sha256::digest(der)),
            Err(_) => String::from("unavailable"),
        }
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.0.n().bits()
    }

    /// Modulus size in bytes (the RSA block size)
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// Get reference to the underlying key
    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }
}

// ============================================================================
// KEY MATERIAL (LOADED KEY FILES)
// ============================================================================

/// A key loaded from PEM bytes or a key file
///
/// `key_pair` is only populated when a private key was read; `public_key`
/// is always populated. `raw_bytes` holds the exact bytes that were parsed.
pub struct KeyMaterial {
    key_pair: Option<KeyPair>,
    public_key: PublicKey,
    raw: Zeroizing<Vec<u8>>,
}

impl KeyMaterial {
    /// Parse PEM bytes, choosing private or public decoding by block label
    pub fn from_pem(pem_bytes: Vec<u8>) -> Result<Self> {
        let raw = Zeroizing::new(pem_bytes);
        let block = pem::parse(raw.as_slice())?;

        match block.tag() {
            PRIVATE_KEY_LABEL | RSA_PRIVATE_KEY_LABEL => Self::private_from_raw(raw),
            PUBLIC_KEY_LABEL => Self::public_from_raw(raw),
            other => Err(Error::KeyTypeMismatch {
                expected: "PRIVATE KEY or PUBLIC KEY",
                found: other.to_string(),
            }),
        }
    }

    /// Read a key file and parse it with [`KeyMaterial::from_pem`]
    ///
    /// The path is normalized first; paths that climb above their starting
    /// directory are rejected.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_pem(read_key_file(path.as_ref())?)
    }

    /// Read a file that must contain a private key
    pub fn load_private_key_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::private_from_raw(Zeroizing::new(read_key_file(path.as_ref())?))
    }

    /// Read a file that must contain a public key
    pub fn load_public_key_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::public_from_raw(Zeroizing::new(read_key_file(path.as_ref())?))
    }

    fn private_from_raw(raw: Zeroizing<Vec<u8>>) -> Result<Self> {
        let key_pair = KeyPair::from_pem(&raw)?;
        Ok(Self {
            public_key: key_pair.public_key(),
            key_pair: Some(key_pair),
            raw,
        })
    }

    fn public_from_raw(raw: Zeroizing<Vec<u8>>) -> Result<Self> {
        Ok(Self {
            public_key: PublicKey::from_pem(&raw)?,
            key_pair: None,
            raw,
        })
    }

    /// The private key, if one was loaded
    pub fn key_pair(&self) -> Option<&KeyPair> {
        self.key_pair.as_ref()
    }

    /// The public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Whether a private key was loaded
    pub fn has_private_key(&self) -> bool {
        self.key_pair.is_some()
    }

    /// The bytes that were parsed
    ///
    /// ## Security Warning
    ///
    /// For a private key file these bytes are secret.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("has_private_key", &self.has_private_key())
            .field("public_key", &self.public_key.fingerprint())
            .field("raw_len", &self.raw.len())
            .finish()
    }
}

fn read_key_file(path: &Path) -> Result<Vec<u8>> {
    let path = paths::normalize(path)?;
    tracing::debug!("Reading key file {}", path.display());
    Ok(fs::read(&path)?)
}

// ============================================================================
// GENERATION & PERSISTENCE
// ============================================================================

/// Generate a key pair and persist it as configured
///
/// Uses the operating system's secure random number generator.
///
/// ## Persistence
///
/// ```text
/// pem_format    ──► <output_dir>/<private_filename>.pem
///                   <output_dir>/<public_filename>.pem
/// binary_format ──► <output_dir>/<private_filename>.key
///                   <output_dir>/<public_filename>.key
/// ```
///
/// If any write fails the files written so far are removed and the error
/// is returned; no key is handed back whose persisted copy is incomplete.
pub fn generate_key_pair(config: &KeyGenerationConfig) -> Result<KeyPair> {
    generate_key_pair_with_rng(config, &mut OsRng)
}

/// [`generate_key_pair`] with a caller-supplied random source
pub fn generate_key_pair_with_rng<R: CryptoRngCore + ?Sized>(
    config: &KeyGenerationConfig,
    rng: &mut R,
) -> Result<KeyPair> {
    config.validate()?;

    let key_pair = KeyPair::generate_with_rng(rng, config.bits)?;
    tracing::info!(
        "Generated {}-bit RSA key {}",
        config.bits,
        key_pair.public_key().fingerprint()
    );

    if config.persists() {
        let written = persist_key_pair(&key_pair, config)?;
        tracing::info!("Persisted key pair to {} file(s)", written.len());
    }

    Ok(key_pair)
}

/// Write `key_pair` in every format enabled by `config`
///
/// Returns the paths written, private files first.
pub fn persist_key_pair(key_pair: &KeyPair, config: &KeyGenerationConfig) -> Result<Vec<PathBuf>> {
    let mut outputs: Vec<(PathBuf, Zeroizing<Vec<u8>>, bool)> = Vec::new();

    if config.pem_format {
        let private_pem = key_pair.to_pem()?;
        outputs.push((
            config.private_pem_path(),
            Zeroizing::new(private_pem.as_bytes().to_vec()),
            true,
        ));
        outputs.push((
            config.public_pem_path(),
            Zeroizing::new(key_pair.public_key().to_pem()?.into_bytes()),
            false,
        ));
    }

    if config.binary_format {
        outputs.push((config.private_snapshot_path(), key_pair.to_snapshot_bytes()?, true));
        outputs.push((
            config.public_snapshot_path(),
            Zeroizing::new(key_pair.public_key().to_snapshot_bytes()?),
            false,
        ));
    }

    if !outputs.is_empty() {
        fs::create_dir_all(&config.output_dir)?;
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(outputs.len());
    for (path, contents, secret) in &outputs {
        if let Err(err) = write_key_file(path, contents, *secret) {
            tracing::warn!("Failed to write {}: {}", path.display(), err);
            for done in &written {
                remove_quietly(done);
            }
            remove_quietly(path);
            return Err(err);
        }
        written.push(path.clone());
    }

    Ok(written)
}

fn write_key_file(path: &Path, contents: &[u8], secret: bool) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(if secret { 0o600 } else { 0o644 });
    }
    #[cfg(not(unix))]
    let _ = secret;

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

// ============================================================================
// BINARY SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum SnapshotKind {
    Private,
    Public,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct KeySnapshot {
    version: u16,
    #[zeroize(skip)]
    kind: SnapshotKind,
    der: Vec<u8>,
}

impl KeySnapshot {
    fn decode(bytes: &[u8], expected: SnapshotKind) -> Result<Self> {
        let snapshot: KeySnapshot = bincode::deserialize(bytes)
            .map_err(|e| Error::KeyDecoding(format!("Invalid key snapshot: {}", e)))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::KeyDecoding(format!(
                "Unsupported key snapshot version {}",
                snapshot.version
            )));
        }
        if snapshot.kind != expected {
            return Err(Error::KeyDecoding(format!(
                "Expected a {:?} key snapshot, found {:?}",
                expected, snapshot.kind
            )));
        }

        Ok(snapshot)
    }
}

// ============================================================================
// TESTS
// ============================================================================
