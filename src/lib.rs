//! # Sweet Crypto
//!
//! RSA and AES primitives for services that need to encrypt small payloads
//! to a public key, sign messages, and encrypt files at rest.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SWEET CRYPTO MODULES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │    Keys     │  │ Encryption  │  │   Signing   │  │    Stream    │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Generate  │  │ - OAEP      │  │ - PSS       │  │ - AES-CTR    │   │
//! │  │ - PEM I/O   │  │ - Chunked   │  │ - Base64    │  │ - IV trailer │   │
//! │  │ - Snapshots │  │ - Base64    │  │             │  │ - Usage cap  │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌─────────────┐ │ ┌─────────────────────────────────┐│
//! │  │   Storage   │  │   Token     │ │ │        Config / Logging         ││
//! │  │             │  │             │ │ │                                 ││
//! │  │ - File      │  │ - HMAC JWT  │◄┘ │ - serde option structs          ││
//! │  │ - Memory    │  │ - RSA JWT   │   │ - tracing subscriber bootstrap  ││
//! │  │ - Fallback  │  │             │   │                                 ││
//! │  └─────────────┘  └─────────────┘   └─────────────────────────────────┘│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Keys, OAEP, PSS, AES-CTR streams, base64
//! - [`config`] - Option structs for key generation and file encryption
//! - [`storage`] - Key store backends
//! - [`token`] - JSON Web Tokens
//! - [`logging`] - Subscriber setup for binaries and tests
//!
//! ## Quick Start
//!
//! ```no_run
//! use sweet_crypto::config::KeyGenerationConfig;
//! use sweet_crypto::crypto::{self, DecryptionContext, EncryptionContext, HashAlgorithm};
//!
//! # fn main() -> sweet_crypto::Result<()> {
//! let key_pair = crypto::generate_key_pair(&KeyGenerationConfig::in_memory(2048))?;
//! let public_key = key_pair.public_key();
//!
//! let mut enc = EncryptionContext::new(&public_key, HashAlgorithm::Sha256);
//! let ciphertext = crypto::encrypt(b"hello world", &mut enc)?;
//!
//! let mut dec = DecryptionContext::new(&key_pair, HashAlgorithm::Sha256);
//! assert_eq!(crypto::decrypt(&ciphertext, &mut dec)?, b"hello world");
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Model
//!
//! | Concern | Handling |
//! |---------|----------|
//! | Secret lifetime | Private keys and key buffers are zeroized on drop |
//! | Error oracles | Decryption and verification failures are opaque |
//! | File integrity | Not provided by AES-CTR; sign the ciphertext if needed |
//! | IV reuse | Random IVs; optional per-key usage ceiling |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod storage;
pub mod token;

mod paths;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{CryptoConfig, KeyGenerationConfig, StreamConfig};
pub use crypto::{HashAlgorithm, KeyMaterial, KeyPair, PublicKey, Signature};
pub use error::{Error, ErrorKind, Result};
