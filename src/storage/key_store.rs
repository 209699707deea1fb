//! # Key Store
//!
//! Pluggable storage for serialized key material.
//!
//! ## Backends
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           KEY STORE                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  KeyStore Trait                                                 │   │
//! │  │  ──────────────                                                  │   │
//! │  │                                                                 │   │
//! │  │  • store(name, value)   - Write or replace an entry            │   │
//! │  │  • retrieve(name)       - Read an entry, None if absent        │   │
//! │  │  • delete(name)         - Remove an entry                      │   │
//! │  │  • exists(name)         - Check if an entry exists             │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌───────────────┐  ┌───────────────┐  ┌───────────────────────────┐   │
//! │  │ FileKeyStore  │  │MemoryKeyStore │  │    FallbackKeyStore       │   │
//! │  │               │  │               │  │                           │   │
//! │  │ one file per  │  │ RwLock'd map  │  │ ordered backends; the     │   │
//! │  │ entry, owner- │  │ for tests and │  │ first that succeeds wins, │   │
//! │  │ only perms    │  │ short-lived   │  │ the last error surfaces   │   │
//! │  │               │  │ processes     │  │ when all fail             │   │
//! │  └───────────────┘  └───────────────┘  └───────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::crypto::{KeyPair, PublicKey};
use crate::error::{Error, Result};
use crate::paths;

/// Entry names for stored keys
pub mod names {
    /// The RSA private key (PEM)
    pub const PRIVATE_KEY: &str = "sweet.rsa.private";

    /// The RSA public key (PEM)
    pub const PUBLIC_KEY: &str = "sweet.rsa.public";
}

/// Storage backend for key material
pub trait KeyStore: Send + Sync {
    /// Write `value` under `name`, replacing any existing entry
    fn store(&self, name: &str, value: &[u8]) -> Result<()>;

    /// Read the entry under `name`
    fn retrieve(&self, name: &str) -> Result<Option<Zeroizing<Vec<u8>>>>;

    /// Remove the entry under `name`; returns whether it existed
    fn delete(&self, name: &str) -> Result<bool>;

    /// Check if an entry exists
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.retrieve(name)?.is_some())
    }

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

// ============================================================================
// MEMORY
// ============================================================================

/// In-memory key store
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: RwLock<HashMap<String, Zeroizing<Vec<u8>>>>,
}

impl MemoryKeyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn store(&self, name: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(name.to_string(), Zeroizing::new(value.to_vec()));
        Ok(())
    }

    fn retrieve(&self, name: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let entries = self.entries.read();
        Ok(entries.get(name).cloned())
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let mut entries = self.entries.write();
        Ok(entries.remove(name).is_some())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        let entries = self.entries.read();
        Ok(entries.contains_key(name))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// FILE
// ============================================================================

/// Directory-backed key store, one file per entry
///
/// Entry names must be plain file names; anything containing a separator
/// or `..` is rejected with `PathTraversal`.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    root: PathBuf,
}

impl FileKeyStore {
    /// Store rooted at `root`; the directory is created on first write
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            root: paths::normalize(root.as_ref())?,
        })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, name: &str) -> Result<PathBuf> {
        paths::join_within(&self.root, name)
    }
}

impl KeyStore for FileKeyStore {
    fn store(&self, name: &str, value: &[u8]) -> Result<()> {
        let path = self.entry_path(name)?;
        fs::create_dir_all(&self.root)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&path)?;
        file.write_all(value)?;
        file.sync_all()?;

        tracing::debug!("Stored key entry {} in {}", name, self.root.display());
        Ok(())
    }

    fn retrieve(&self, name: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let path = self.entry_path(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(Zeroizing::new(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let path = self.entry_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.entry_path(name)?.is_file())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

// ============================================================================
// FALLBACK
// ============================================================================

/// Ordered list of backends tried in turn
///
/// Writes go to the first backend that accepts them. Reads return the
/// first entry found; a backend that errors or has no entry passes the
/// request on. The last error is returned only when every backend failed.
pub struct FallbackKeyStore {
    backends: Vec<Box<dyn KeyStore>>,
}

impl FallbackKeyStore {
    /// Build from backends in priority order
    pub fn new(backends: Vec<Box<dyn KeyStore>>) -> Result<Self> {
        if backends.is_empty() {
            return Err(Error::InvalidArgument(
                "fallback key store needs at least one backend".into(),
            ));
        }
        Ok(Self { backends })
    }

    /// Number of configured backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Always false; construction rejects an empty list
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Run `op` against each backend until one succeeds
    fn first_success<T>(
        &self,
        action: &str,
        mut op: impl FnMut(&dyn KeyStore) -> Result<T>,
    ) -> Result<T> {
        let mut last_error = None;
        for backend in &self.backends {
            match op(backend.as_ref()) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!("Key store {} failed to {}: {}", backend.backend_name(), action, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::InvalidArgument("no key store backends".into())))
    }
}

impl KeyStore for FallbackKeyStore {
    fn store(&self, name: &str, value: &[u8]) -> Result<()> {
        self.first_success("store", |backend| backend.store(name, value))
    }

    fn retrieve(&self, name: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let mut answered = false;
        let mut last_error = None;

        for backend in &self.backends {
            match backend.retrieve(name) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => answered = true,
                Err(e) => {
                    tracing::warn!("Key store {} failed to retrieve: {}", backend.backend_name(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let mut deleted = false;
        let mut answered = false;
        let mut last_error = None;

        for backend in &self.backends {
            match backend.delete(name) {
                Ok(found) => {
                    answered = true;
                    deleted |= found;
                }
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(deleted),
        }
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.retrieve(name)?.is_some())
    }

    fn backend_name(&self) -> &'static str {
        "fallback"
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Store a key pair as PEM under [`names::PRIVATE_KEY`] and [`names::PUBLIC_KEY`]
pub fn save_key_pair(store: &dyn KeyStore, key_pair: &KeyPair) -> Result<()> {
    let private_pem = key_pair.to_pem()?;
    store.store(names::PRIVATE_KEY, private_pem.as_bytes())?;
    store.store(names::PUBLIC_KEY, key_pair.public_key().to_pem()?.as_bytes())?;
    Ok(())
}

/// Load the key pair written by [`save_key_pair`]
pub fn load_key_pair(store: &dyn KeyStore) -> Result<KeyPair> {
    let pem = store
        .retrieve(names::PRIVATE_KEY)?
        .ok_or_else(|| Error::StorageNotFound(names::PRIVATE_KEY.to_string()))?;
    KeyPair::from_pem(&pem)
}

/// Load the public key written by [`save_key_pair`]
pub fn load_public_key(store: &dyn KeyStore) -> Result<PublicKey> {
    let pem = store
        .retrieve(names::PUBLIC_KEY)?
        .ok_or_else(|| Error::StorageNotFound(names::PUBLIC_KEY.to_string()))?;
    PublicKey::from_pem(&pem)
}

/// Remove both entries written by [`save_key_pair`]
pub fn delete_key_pair(store: &dyn KeyStore) -> Result<()> {
    store.delete(names::PRIVATE_KEY)?;
    store.delete(names::PUBLIC_KEY)?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
