//! # Storage Module
//!
//! Persistence backends for key material.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         STORAGE SYSTEM                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   save_key_pair / load_key_pair                                         │
//! │              │                                                          │
//! │              ▼                                                          │
//! │   ┌─────────────────────┐                                               │
//! │   │  dyn KeyStore       │──► FileKeyStore    (directory, 0600 files)    │
//! │   │                     │──► MemoryKeyStore  (process lifetime)         │
//! │   │                     │──► FallbackKeyStore(ordered list of above)    │
//! │   └─────────────────────┘                                               │
//! │                                                                         │
//! │   Entries are PEM text; the store never interprets them.               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod key_store;

pub use key_store::{
    delete_key_pair, load_key_pair, load_public_key, names, save_key_pair, FallbackKeyStore,
    FileKeyStore, KeyStore, MemoryKeyStore,
};
