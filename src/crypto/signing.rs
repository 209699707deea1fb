//! # Digital Signatures Module
//!
//! Provides RSA-PSS signatures for message authentication and integrity.
//!
//! ## Signature Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SIGNING FLOW                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────┐                                                       │
//! │  │   Message    │                                                       │
//! │  └──────┬───────┘                                                       │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────┐                           │
//! │  │  digest = Hash(message)                  │  SHA-224/256/384/512      │
//! │  └──────────────┬───────────────────────────┘                           │
//! │                 ▼                                                       │
//! │  ┌──────────────────────────────────────────┐                           │
//! │  │  RSA-PSS sign(digest, salt)              │  random salt per call     │
//! │  └──────────────┬───────────────────────────┘                           │
//! │                 ▼                                                       │
//! │  ┌──────────────────────────────────────────┐                           │
//! │  │  Signature (k bytes)                     │  randomized, not          │
//! │  └──────────────────────────────────────────┘  deterministic            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       VERIFICATION FLOW                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Message ──► Hash ──► digest ─┐                                         │
//! │                               ├──► RSA-PSS verify ──► Ok(()) or         │
//! │  Signature + Public Key ──────┘                       VerificationFailed│
//! │                                                                         │
//! │  Signer and verifier must agree on the hash and the salt policy.       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Description |
//! |----------|-------------|
//! | Authenticity | Verifies the message came from the private key holder |
//! | Integrity | Detects any modification to the signed message |
//! | Public Verification | Anyone with the public key can verify |

use rand::rngs::OsRng;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::codec::{decode_base64, encode_base64};
use super::hash::HashAlgorithm;
use super::keys::{KeyPair, PublicKey};
use crate::error::{Error, Result};

/// PSS salt length policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaltLength {
    /// Salt as long as the digest
    #[default]
    EqualsHash,
    /// Largest salt the key allows
    Max,
    /// Exact salt length in bytes
    Fixed(usize),
}

impl SaltLength {
    /// Resolve to a byte count for a key of `key_bits` and hash `hash`
    pub fn resolve(self, key_bits: usize, hash: HashAlgorithm) -> Result<usize> {
        match self {
            SaltLength::EqualsHash => Ok(hash.output_size()),
            SaltLength::Fixed(len) => Ok(len),
            SaltLength::Max => {
                let em_len = key_bits.saturating_sub(1).div_ceil(8);
                em_len
                    .checked_sub(hash.output_size() + 2)
                    .ok_or_else(|| {
                        Error::CryptoOperation(format!(
                            "{}-bit key is too small for PSS with {}",
                            key_bits, hash
                        ))
                    })
            }
        }
    }
}

/// An RSA-PSS signature
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// Create from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode from standard base64
    pub fn from_base64(text: &str) -> Result<Self> {
        Ok(Self(decode_base64(text)?))
    }

    /// Encode as standard base64
    pub fn to_base64(&self) -> String {
        encode_base64(&self.0)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the raw bytes
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Parameters for signing
pub struct SignatureContext<'k, R = OsRng> {
    key: &'k KeyPair,
    hash: HashAlgorithm,
    salt_length: SaltLength,
    rng: R,
}

impl<'k> SignatureContext<'k, OsRng> {
    /// Context using the OS random number generator and a hash-sized salt
    pub fn new(key: &'k KeyPair, hash: HashAlgorithm) -> Self {
        Self::with_rng(key, hash, OsRng)
    }
}

impl<'k, R: CryptoRngCore> SignatureContext<'k, R> {
    /// Context with a caller-supplied random source
    pub fn with_rng(key: &'k KeyPair, hash: HashAlgorithm, rng: R) -> Self {
        Self {
            key,
            hash,
            salt_length: SaltLength::default(),
            rng,
        }
    }

    /// Override the salt policy
    pub fn with_salt_length(mut self, salt_length: SaltLength) -> Self {
        self.salt_length = salt_length;
        self
    }
}

/// Parameters for verification
#[derive(Debug, Clone, Copy)]
pub struct VerificationContext<'k> {
    key: &'k PublicKey,
    hash: HashAlgorithm,
    salt_length: SaltLength,
}

impl<'k> VerificationContext<'k> {
    /// Context expecting a hash-sized salt
    pub fn new(key: &'k PublicKey, hash: HashAlgorithm) -> Self {
        Self {
            key,
            hash,
            salt_length: SaltLength::default(),
        }
    }

    /// Override the salt policy
    pub fn with_salt_length(mut self, salt_length: SaltLength) -> Self {
        self.salt_length = salt_length;
        self
    }
}

/// Sign a message
///
/// The message is hashed with the context's hash and the digest is signed
/// with RSA-PSS. Signatures are randomized by the salt.
pub fn sign<R: CryptoRngCore>(message: &[u8], ctx: &mut SignatureContext<'_, R>) -> Result<Signature> {
    let salt_len = ctx.salt_length.resolve(ctx.key.bits(), ctx.hash)?;
    let digest = ctx.hash.digest(message);

    let bytes = ctx
        .key
        .rsa_private()
        .sign_with_rng(&mut ctx.rng, ctx.hash.pss(salt_len), &digest)
        .map_err(|e| Error::CryptoOperation(format!("PSS signing failed: {}", e)))?;

    Ok(Signature(bytes))
}

/// [`sign`], base64 encoded
pub fn sign_to_text<R: CryptoRngCore>(message: &[u8], ctx: &mut SignatureContext<'_, R>) -> Result<String> {
    Ok(sign(message, ctx)?.to_base64())
}

/// Verify a signature over a message
///
/// ## Errors
///
/// Returns `VerificationFailed` for any mismatch: altered message, altered
/// signature, wrong key, wrong hash or wrong salt policy.
pub fn verify(message: &[u8], signature: &[u8], ctx: &VerificationContext<'_>) -> Result<()> {
    let salt_len = ctx
        .salt_length
        .resolve(ctx.key.bits(), ctx.hash)
        .map_err(|_| Error::VerificationFailed)?;
    let digest = ctx.hash.digest(message);

    ctx.key
        .as_rsa()
        .verify(ctx.hash.pss(salt_len), &digest, signature)
        .map_err(|_| Error::VerificationFailed)
}

/// Decode a base64 signature and [`verify`] it
pub fn verify_from_text(message: &[u8], text: &str, ctx: &VerificationContext<'_>) -> Result<()> {
    verify(message, &decode_base64(text)?, ctx)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::tests::{OTHER_KEY, TEST_KEY};

    #[test]
    fn test_sign_verify() {
        let public = TEST_KEY.public_key();
        let mut signer = SignatureContext::new(&TEST_KEY, HashAlgorithm::Sha256);
        let verifier = VerificationContext::new(&public, HashAlgorithm::Sha256);

        let message = b"Hello, World!";
        let signature = sign(message, &mut signer).unwrap();
        assert_eq!(signature.as_bytes().len(), 256);
        assert!(verify(message, signature.as_bytes(), &verifier).is_ok());
    }

    #[test]
    fn test_signatures_are_randomized() {
        let mut signer = SignatureContext::new(&TEST_KEY, HashAlgorithm::Sha256);
        let a = sign(b"same", &mut signer).unwrap();
        let b = sign(b"same", &mut signer).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_message_fails() {
        let public = TEST_KEY.public_key();
        let mut signer = SignatureContext::new(&TEST_KEY, HashAlgorithm::Sha256);
        let verifier = VerificationContext::new(&public, HashAlgorithm::Sha256);

        let signature = sign(b"Hello, World!", &mut signer).unwrap();
        let result = verify(b"Hello, World?", signature.as_bytes(), &verifier);
        assert!(matches!(result, Err(Error::VerificationFailed)));
    }

    #[test]
    fn test_wrong_key_fails() {
        let other = OTHER_KEY.public_key();
        let mut signer = SignatureContext::new(&TEST_KEY, HashAlgorithm::Sha256);
        let verifier = VerificationContext::new(&other, HashAlgorithm::Sha256);

        let signature = sign(b"message", &mut signer).unwrap();
        let result = verify(b"message", signature.as_bytes(), &verifier);
        assert!(matches!(result, Err(Error::VerificationFailed)));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let public = TEST_KEY.public_key();
        let mut signer = SignatureContext::new(&TEST_KEY, HashAlgorithm::Sha384);
        let verifier = VerificationContext::new(&public, HashAlgorithm::Sha384);

        let mut signature = sign(b"message", &mut signer).unwrap().into_vec();
        signature[0] ^= 0x01;
        assert!(matches!(
            verify(b"message", &signature, &verifier),
            Err(Error::VerificationFailed)
        ));
        assert!(matches!(
            verify(b"message", &signature[..100], &verifier),
            Err(Error::VerificationFailed)
        ));
    }

    #[test]
    fn test_hash_must_match() {
        let public = TEST_KEY.public_key();
        let mut signer = SignatureContext::new(&TEST_KEY, HashAlgorithm::Sha256);
        let verifier = VerificationContext::new(&public, HashAlgorithm::Sha512);

        let signature = sign(b"message", &mut signer).unwrap();
        assert!(verify(b"message", signature.as_bytes(), &verifier).is_err());
    }

    #[test]
    fn test_salt_policies() {
        let public = TEST_KEY.public_key();

        for salt in [SaltLength::EqualsHash, SaltLength::Max, SaltLength::Fixed(0), SaltLength::Fixed(20)] {
            let mut signer =
                SignatureContext::new(&TEST_KEY, HashAlgorithm::Sha256).with_salt_length(salt);
            let verifier =
                VerificationContext::new(&public, HashAlgorithm::Sha256).with_salt_length(salt);

            let signature = sign(b"salted", &mut signer).unwrap();
            assert!(verify(b"salted", signature.as_bytes(), &verifier).is_ok(), "{:?}", salt);
        }
    }

    #[test]
    fn test_salt_resolution() {
        assert_eq!(SaltLength::EqualsHash.resolve(2048, HashAlgorithm::Sha256).unwrap(), 32);
        assert_eq!(SaltLength::Max.resolve(2048, HashAlgorithm::Sha256).unwrap(), 222);
        assert_eq!(SaltLength::Fixed(5).resolve(2048, HashAlgorithm::Sha512).unwrap(), 5);
        assert!(SaltLength::Max.resolve(256, HashAlgorithm::Sha512).is_err());
    }

    #[test]
    fn test_oversized_salt_is_crypto_error() {
        let mut signer = SignatureContext::new(&TEST_KEY, HashAlgorithm::Sha512)
            .with_salt_length(SaltLength::Fixed(250));
        assert!(matches!(sign(b"x", &mut signer), Err(Error::CryptoOperation(_))));
    }

    #[test]
    fn test_text_round_trip() {
        let public = TEST_KEY.public_key();
        let mut signer = SignatureContext::new(&TEST_KEY, HashAlgorithm::Sha256);
        let verifier = VerificationContext::new(&public, HashAlgorithm::Sha256);

        let text = sign_to_text(b"{\"id\":1}", &mut signer).unwrap();
        assert!(verify_from_text(b"{\"id\":1}", &text, &verifier).is_ok());
        assert_eq!(Signature::from_base64(&text).unwrap().to_base64(), text);

        let result = verify_from_text(b"{\"id\":1}", "***", &verifier);
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn test_salt_length_serde() {
        let json = serde_json::to_string(&SaltLength::Fixed(16)).unwrap();
        assert_eq!(json, r#"{"fixed":16}"#);
        let parsed: SaltLength = serde_json::from_str(r#""equals_hash""#).unwrap();
        assert_eq!(parsed, SaltLength::EqualsHash);
    }
}
