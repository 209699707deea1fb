//! # Cryptography Module
//!
//! This module provides all cryptographic primitives used by Sweet Crypto.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY MATERIAL                                 │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  generate_key_pair ──► KeyPair (RSA, ≥ 1024 bits)              │   │
//! │  │                          │                                      │   │
//! │  │            ┌─────────────┴─────────────┐                       │   │
//! │  │            ▼                           ▼                       │   │
//! │  │  ┌─────────────────┐         ┌─────────────────┐              │   │
//! │  │  │  private.pem    │         │  public.pem     │              │   │
//! │  │  │  private.key    │         │  public.key     │              │   │
//! │  │  │  (PKCS#1)       │         │  (PKIX)         │              │   │
//! │  │  └─────────────────┘         └─────────────────┘              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ASYMMETRIC                                      │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  RSA-OAEP   encrypt / encrypt_chunked / decrypt                │   │
//! │  │  RSA-PSS    sign / verify                                      │   │
//! │  │  Hash       SHA-224, SHA-256, SHA-384, SHA-512                 │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SYMMETRIC                                       │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  AES-CTR (128/192/256) file streaming                          │   │
//! │  │  • 128-bit big-endian counter                                  │   │
//! │  │  • random 16-byte IV per file, stored after the ciphertext     │   │
//! │  │  • no authentication                                           │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose |
//! |-----------|---------|
//! | RSA-OAEP | Encrypting small payloads to a public key |
//! | RSA-PSS | Signatures |
//! | AES-CTR | Bulk file encryption with a caller-held key |
//! | Base64 (standard) | Text transport of ciphertexts and signatures |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: Private keys and symmetric key buffers are zeroized when dropped
//! 2. **Secure Random**: Using `rand::rngs::OsRng` for IVs, padding and blinding
//! 3. **Opaque Failures**: Decryption and verification errors carry no detail
//! 4. **No Integrity in CTR**: Sign encrypted files if tampering matters

mod codec;
mod encryption;
mod hash;
mod keys;
mod signing;
mod stream;

pub use codec::{decode_base64, encode_base64};
pub use encryption::{
    chunk_count, decrypt, decrypt_chunked, decrypt_from_text, encrypt, encrypt_chunked,
    encrypt_to_text, max_oaep_payload, DecryptionContext, EncryptionContext,
};
pub use hash::HashAlgorithm;
pub use keys::{
    generate_key_pair, generate_key_pair_with_rng, persist_key_pair, KeyMaterial, KeyPair,
    PublicKey, DEFAULT_KEY_BITS, MIN_KEY_BITS, PRIVATE_KEY_LABEL, PUBLIC_KEY_LABEL,
    RSA_PRIVATE_KEY_LABEL,
};
pub use signing::{
    sign, sign_to_text, verify, verify_from_text, SaltLength, Signature, SignatureContext,
    VerificationContext,
};
pub use stream::{
    decrypt_file, decrypt_stream, encrypt_file, encrypt_file_tracked, encrypt_stream,
    resolve_cipher_key, validate_buffer_size, AesKeyLength, Iv, KeyUsageCounter,
    StreamCipherJob, BLOCK_SIZE, DEFAULT_BUFFER_SIZE, DEFAULT_KEY_USAGE_LIMIT, IV_SIZE,
};

#[cfg(test)]
pub(crate) use keys::tests as fixtures;
