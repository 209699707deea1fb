//! # Error Handling
//!
//! This module provides the error types for Sweet Crypto.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Key Errors                                                        │
//! │  │   ├── KeyDecoding           - Malformed PEM / DER / snapshot        │
//! │  │   ├── KeyTypeMismatch       - Wrong PEM block label                 │
//! │  │   ├── KeyGeneration         - RSA key generation failed             │
//! │  │   └── PathTraversal         - Key path escapes its base directory   │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── PayloadTooLarge       - Single OAEP block ceiling exceeded    │
//! │  │   ├── CryptoOperation       - OAEP / PSS / cipher failure           │
//! │  │   ├── VerificationFailed    - Signature did not verify              │
//! │  │   └── KeyUsageExhausted     - Too many IVs generated for one key    │
//! │  │                                                                      │
//! │  ├── Stream Errors                                                     │
//! │  │   ├── Io                    - File open / read / write failures     │
//! │  │   ├── MalformedStream       - Input shorter than its framing        │
//! │  │   └── InvalidArgument       - Bad buffer size or option             │
//! │  │                                                                      │
//! │  └── Encoding Errors                                                   │
//! │      ├── Encoding              - Invalid base64 input                  │
//! │      ├── Serialization         - Snapshot / config (de)serialization   │
//! │      ├── Token                 - JWT generation / validation           │
//! │      └── StorageNotFound       - Key store entry missing               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Trust Boundaries
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ERROR HANDLING FLOW                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Internal (Rust)              Trust Boundary           Untrusted peer  │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<T, Error>  ──────►  public_message()  ──────►  "cryptographic  │
//! │                             (generic text)             operation       │
//! │                                                        failed"         │
//! │                                                                         │
//! │  Padding and digest details never leave the process.                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for Sweet Crypto operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Sweet Crypto
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Key Errors (100-199)
    // ========================================================================
    /// PEM envelope, DER payload or snapshot could not be decoded
    #[error("Failed to decode key: {0}")]
    KeyDecoding(String),

    /// PEM block carried an unexpected label
    #[error("Unexpected key type: expected {expected}, found {found}")]
    KeyTypeMismatch {
        /// Label(s) the loader accepts
        expected: &'static str,
        /// Label found in the PEM block
        found: String,
    },

    /// RSA key generation failed
    #[error("Failed to generate key: {0}")]
    KeyGeneration(String),

    /// A path resolved outside of its starting directory
    #[error("Path escapes its base directory: {0}")]
    PathTraversal(String),

    // ========================================================================
    // Crypto Errors (200-299)
    // ========================================================================
    /// Plaintext exceeds what a single OAEP block can carry
    #[error("Payload of {len} bytes exceeds the OAEP limit of {max} bytes")]
    PayloadTooLarge {
        /// Length of the rejected payload
        len: usize,
        /// Largest payload one block accepts for this key and hash
        max: usize,
    },

    /// An RSA or cipher primitive failed
    #[error("Crypto operation failed: {0}")]
    CryptoOperation(String),

    /// Signature verification failed
    #[error("Signature verification failed")]
    VerificationFailed,

    /// The IV budget for a symmetric key has been spent
    #[error("Key usage limit of {limit} encryptions reached")]
    KeyUsageExhausted {
        /// Ceiling configured on the counter
        limit: u64,
    },

    // ========================================================================
    // Stream Errors (300-399)
    // ========================================================================
    /// File open/read/write/create failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is shorter than its own framing requires
    #[error("Malformed stream: {0}")]
    MalformedStream(String),

    /// Caller supplied an unusable option
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // Encoding Errors (400-499)
    // ========================================================================
    /// Invalid base64 input
    #[error("Invalid encoding: {0}")]
    Encoding(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JWT generation or validation failed
    #[error("Token error: {0}")]
    Token(String),

    /// Item not found in a key store
    #[error("Item not found: {0}")]
    StorageNotFound(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Key decoding, type mismatch, generation or path problems
    Key,
    /// Cryptographic primitive failures
    Crypto,
    /// File and stream problems
    Stream,
    /// Text and binary encoding problems
    Encoding,
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Keys
    /// - 200-299: Crypto
    /// - 300-399: Streams
    /// - 400-499: Encoding
    pub fn code(&self) -> i32 {
        match self {
            // Keys (100-199)
            Error::KeyDecoding(_) => 100,
            Error::KeyTypeMismatch { .. } => 101,
            Error::KeyGeneration(_) => 102,
            Error::PathTraversal(_) => 103,

            // Crypto (200-299)
            Error::PayloadTooLarge { .. } => 200,
            Error::CryptoOperation(_) => 201,
            Error::VerificationFailed => 202,
            Error::KeyUsageExhausted { .. } => 203,

            // Streams (300-399)
            Error::Io(_) => 300,
            Error::MalformedStream(_) => 301,
            Error::InvalidArgument(_) => 302,

            // Encoding (400-499)
            Error::Encoding(_) => 400,
            Error::Serialization(_) => 401,
            Error::Token(_) => 402,
            Error::StorageNotFound(_) => 403,
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self.code() / 100 {
            1 => ErrorKind::Key,
            2 => ErrorKind::Crypto,
            3 => ErrorKind::Stream,
            _ => ErrorKind::Encoding,
        }
    }

    /// Message that is safe to hand to an untrusted caller
    ///
    /// Crypto failures collapse to one generic sentence so that padding or
    /// digest details cannot be used as an oracle.
    pub fn public_message(&self) -> String {
        match self {
            Error::CryptoOperation(_) => "cryptographic operation failed".to_string(),
            Error::VerificationFailed => "verification failed".to_string(),
            Error::Io(_) => "i/o failure".to_string(),
            other => other.to_string(),
        }
    }

    /// Check if this error was caused by the caller's input
    ///
    /// These errors will not go away on retry with the same arguments.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::KeyDecoding(_)
                | Error::KeyTypeMismatch { .. }
                | Error::PathTraversal(_)
                | Error::PayloadTooLarge { .. }
                | Error::MalformedStream(_)
                | Error::InvalidArgument(_)
                | Error::Encoding(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Encoding(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<pem::PemError> for Error {
    fn from(err: pem::PemError) -> Self {
        Error::KeyDecoding(format!("Invalid PEM: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Token(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
