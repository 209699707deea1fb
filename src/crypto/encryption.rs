//! # Encryption Module
//!
//! Provides RSA-OAEP encryption for small payloads, and a chunked mode that
//! splits larger payloads into independently encrypted blocks.
//!
//! ## Chunked Encryption
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CHUNKED OAEP ENCRYPTION                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  step = k - 2·hLen - 2        k = modulus bytes, hLen = hash bytes      │
//! │                                                                         │
//! │  plaintext                                                              │
//! │  ┌──────────┬──────────┬──────────┬──────┐                              │
//! │  │  step    │  step    │  step    │ rest │                              │
//! │  └────┬─────┴────┬─────┴────┬─────┴──┬───┘                              │
//! │       │          │          │        │    OAEP(pub, hash, label)        │
//! │       ▼          ▼          ▼        ▼                                  │
//! │  ┌──────────┬──────────┬──────────┬──────────┐                          │
//! │  │  k bytes │  k bytes │  k bytes │  k bytes │   ciphertext             │
//! │  └──────────┴──────────┴──────────┴──────────┘                          │
//! │                                                                         │
//! │  • Output length is ceil(len / step) · k                                │
//! │  • Blocks are independent: no chaining, no framing                      │
//! │  • Blocks can be reordered or dropped undetected                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Confidentiality | Only the private key holder can read a block |
//! | Randomized | Same plaintext encrypts differently each time |
//! | Integrity | None across blocks; combine with a signature if needed |
//! | Error oracle | All decryption failures look identical |

use rand::rngs::OsRng;
use rand_core::CryptoRngCore;

use super::codec::{decode_base64, encode_base64};
use super::hash::HashAlgorithm;
use super::keys::{KeyPair, PublicKey};
use crate::error::{Error, Result};

/// Largest plaintext one OAEP block can carry: `k - 2·hLen - 2`
///
/// Returns 0 when the key is too small for the hash.
pub fn max_oaep_payload(key_size_bytes: usize, hash: HashAlgorithm) -> usize {
    key_size_bytes.saturating_sub(2 * hash.output_size() + 2)
}

/// Number of blocks [`encrypt_chunked`] produces for `len` bytes
pub fn chunk_count(len: usize, step: usize) -> usize {
    if step == 0 {
        0
    } else {
        len.div_ceil(step)
    }
}

/// Parameters for one or more OAEP encryptions
///
/// The label must match on decryption. The random source is only used for
/// OAEP padding and must be cryptographically secure.
pub struct EncryptionContext<'k, R = OsRng> {
    key: &'k PublicKey,
    hash: HashAlgorithm,
    label: Option<String>,
    rng: R,
}

impl<'k> EncryptionContext<'k, OsRng> {
    /// Context using the OS random number generator
    pub fn new(key: &'k PublicKey, hash: HashAlgorithm) -> Self {
        Self::with_rng(key, hash, OsRng)
    }
}

impl<'k, R: CryptoRngCore> EncryptionContext<'k, R> {
    /// Context with a caller-supplied random source
    pub fn with_rng(key: &'k PublicKey, hash: HashAlgorithm, rng: R) -> Self {
        Self {
            key,
            hash,
            label: None,
            rng,
        }
    }

    /// Bind a label to every block
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Largest plaintext accepted by [`encrypt`]
    pub fn max_payload(&self) -> usize {
        max_oaep_payload(self.key.size(), self.hash)
    }

    /// Size of every ciphertext block
    pub fn block_size(&self) -> usize {
        self.key.size()
    }

    /// Hash used for OAEP
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }
}

/// Parameters for OAEP decryption
///
/// The random source blinds the private key operation.
pub struct DecryptionContext<'k, R = OsRng> {
    key: &'k KeyPair,
    hash: HashAlgorithm,
    label: Option<String>,
    rng: R,
}

impl<'k> DecryptionContext<'k, OsRng> {
    /// Context using the OS random number generator
    pub fn new(key: &'k KeyPair, hash: HashAlgorithm) -> Self {
        Self::with_rng(key, hash, OsRng)
    }
}

impl<'k, R: CryptoRngCore> DecryptionContext<'k, R> {
    /// Context with a caller-supplied random source
    pub fn with_rng(key: &'k KeyPair, hash: HashAlgorithm, rng: R) -> Self {
        Self {
            key,
            hash,
            label: None,
            rng,
        }
    }

    /// Expect this label on every block
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Size of every ciphertext block
    pub fn block_size(&self) -> usize {
        self.key.size()
    }
}

/// Encrypt a payload that fits in one OAEP block
///
/// ## Errors
///
/// - `PayloadTooLarge` if `plaintext` exceeds [`max_oaep_payload`]
/// - `CryptoOperation` if the RSA operation fails
pub fn encrypt<R: CryptoRngCore>(
    plaintext: &[u8],
    ctx: &mut EncryptionContext<'_, R>,
) -> Result<Vec<u8>> {
    let max = ctx.max_payload();
    if plaintext.len() > max {
        return Err(Error::PayloadTooLarge {
            len: plaintext.len(),
            max,
        });
    }

    let padding = ctx.hash.oaep(ctx.label.as_deref());
    ctx.key
        .as_rsa()
        .encrypt(&mut ctx.rng, padding, plaintext)
        .map_err(|e| Error::CryptoOperation(format!("OAEP encryption failed: {}", e)))
}

/// Encrypt a payload of any size as a sequence of OAEP blocks
///
/// An empty payload produces an empty ciphertext. Nothing is returned
/// unless every block succeeds.
pub fn encrypt_chunked<R: CryptoRngCore>(
    plaintext: &[u8],
    ctx: &mut EncryptionContext<'_, R>,
) -> Result<Vec<u8>> {
    let step = ctx.max_payload();
    if step == 0 {
        return Err(Error::PayloadTooLarge {
            len: plaintext.len(),
            max: 0,
        });
    }

    let mut ciphertext = Vec::with_capacity(chunk_count(plaintext.len(), step) * ctx.block_size());
    for chunk in plaintext.chunks(step) {
        ciphertext.extend_from_slice(&encrypt(chunk, ctx)?);
    }

    tracing::debug!(
        "OAEP-{} encrypted {} bytes into {} blocks",
        ctx.hash,
        plaintext.len(),
        ciphertext.len() / ctx.block_size()
    );
    Ok(ciphertext)
}

/// [`encrypt`], base64 encoded
pub fn encrypt_to_text<R: CryptoRngCore>(
    plaintext: &[u8],
    ctx: &mut EncryptionContext<'_, R>,
) -> Result<String> {
    Ok(encode_base64(&encrypt(plaintext, ctx)?))
}

/// Decrypt one OAEP block
///
/// Every failure (wrong key, wrong label, wrong hash, tampering, bad
/// length) produces the same `CryptoOperation("decryption failed")` so
/// callers cannot act as a padding oracle.
pub fn decrypt<R: CryptoRngCore>(
    ciphertext: &[u8],
    ctx: &mut DecryptionContext<'_, R>,
) -> Result<Vec<u8>> {
    let padding = ctx.hash.oaep(ctx.label.as_deref());
    ctx.key
        .rsa_private()
        .decrypt_blinded(&mut ctx.rng, padding, ciphertext)
        .map_err(|_| Error::CryptoOperation("decryption failed".into()))
}

/// Decrypt the output of [`encrypt_chunked`]
///
/// The ciphertext length must be a whole number of blocks.
pub fn decrypt_chunked<R: CryptoRngCore>(
    ciphertext: &[u8],
    ctx: &mut DecryptionContext<'_, R>,
) -> Result<Vec<u8>> {
    let block = ctx.block_size();
    if ciphertext.len() % block != 0 {
        return Err(Error::MalformedStream(format!(
            "ciphertext length {} is not a multiple of the {}-byte block",
            ciphertext.len(),
            block
        )));
    }

    let mut plaintext = Vec::with_capacity(ciphertext.len());
    for chunk in ciphertext.chunks(block) {
        plaintext.extend_from_slice(&decrypt(chunk, ctx)?);
    }
    Ok(plaintext)
}

/// Decode base64 and [`decrypt`]
pub fn decrypt_from_text<R: CryptoRngCore>(
    text: &str,
    ctx: &mut DecryptionContext<'_, R>,
) -> Result<Vec<u8>> {
    decrypt(&decode_base64(text)?, ctx)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::tests::{OTHER_KEY, TEST_KEY};

    #[test]
    fn test_max_payload() {
        assert_eq!(max_oaep_payload(256, HashAlgorithm::Sha256), 190);
        assert_eq!(max_oaep_payload(256, HashAlgorithm::Sha512), 126);
        assert_eq!(max_oaep_payload(128, HashAlgorithm::Sha512), 0);
        assert_eq!(chunk_count(1_000_000, 126), 7937);
        assert_eq!(chunk_count(0, 126), 0);
        assert_eq!(chunk_count(126, 126), 1);
    }

    #[test]
    fn test_encrypt_decrypt_basic() {
        let public = TEST_KEY.public_key();
        let mut enc = EncryptionContext::new(&public, HashAlgorithm::Sha256);
        let mut dec = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha256);

        let ciphertext = encrypt(b"Hello, World!", &mut enc).unwrap();
        assert_eq!(ciphertext.len(), 256);
        assert_eq!(decrypt(&ciphertext, &mut dec).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let public = TEST_KEY.public_key();
        let mut enc = EncryptionContext::new(&public, HashAlgorithm::Sha256);
        let mut dec = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha256);

        let ciphertext = encrypt(b"", &mut enc).unwrap();
        assert!(decrypt(&ciphertext, &mut dec).unwrap().is_empty());
    }

    #[test]
    fn test_ciphertexts_are_randomized() {
        let public = TEST_KEY.public_key();
        let mut enc = EncryptionContext::new(&public, HashAlgorithm::Sha256);

        let a = encrypt(b"same", &mut enc).unwrap();
        let b = encrypt(b"same", &mut enc).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_payload_ceiling() {
        let public = TEST_KEY.public_key();
        let mut enc = EncryptionContext::new(&public, HashAlgorithm::Sha512);

        assert!(encrypt(&[7u8; 126], &mut enc).is_ok());
        let result = encrypt(&[7u8; 127], &mut enc);
        assert!(matches!(result, Err(Error::PayloadTooLarge { len: 127, max: 126 })));

        let huge = vec![0u8; 1 << 20];
        assert!(matches!(encrypt(&huge, &mut enc), Err(Error::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_label_must_match() {
        let public = TEST_KEY.public_key();
        let mut enc = EncryptionContext::new(&public, HashAlgorithm::Sha256).with_label("orders");
        let ciphertext = encrypt(b"labelled", &mut enc).unwrap();

        let mut right = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha256).with_label("orders");
        assert_eq!(decrypt(&ciphertext, &mut right).unwrap(), b"labelled");

        let mut wrong = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha256).with_label("invoices");
        assert!(decrypt(&ciphertext, &mut wrong).is_err());

        let mut none = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha256);
        assert!(decrypt(&ciphertext, &mut none).is_err());
    }

    #[test]
    fn test_decryption_failures_are_indistinguishable() {
        let public = TEST_KEY.public_key();
        let mut enc = EncryptionContext::new(&public, HashAlgorithm::Sha256);
        let mut ciphertext = encrypt(b"secret", &mut enc).unwrap();

        let mut wrong_key = DecryptionContext::new(&OTHER_KEY, HashAlgorithm::Sha256);
        let a = decrypt(&ciphertext, &mut wrong_key).unwrap_err();

        let mut wrong_hash = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha384);
        let b = decrypt(&ciphertext, &mut wrong_hash).unwrap_err();

        ciphertext[10] ^= 0x01;
        let mut right = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha256);
        let c = decrypt(&ciphertext, &mut right).unwrap_err();

        let d = decrypt(&ciphertext[..100], &mut right).unwrap_err();

        for err in [a, b, c, d] {
            assert_eq!(err.to_string(), "Crypto operation failed: decryption failed");
        }
    }

    #[test]
    fn test_chunked_round_trip() {
        let public = TEST_KEY.public_key();
        let mut enc = EncryptionContext::new(&public, HashAlgorithm::Sha512);
        let mut dec = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha512);

        for len in [1usize, 125, 126, 127, 500] {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let ciphertext = encrypt_chunked(&plaintext, &mut enc).unwrap();
            assert_eq!(ciphertext.len(), chunk_count(len, 126) * 256, "len {}", len);
            assert_eq!(decrypt_chunked(&ciphertext, &mut dec).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_chunked_empty() {
        let public = TEST_KEY.public_key();
        let mut enc = EncryptionContext::new(&public, HashAlgorithm::Sha256);
        let mut dec = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha256);

        let ciphertext = encrypt_chunked(b"", &mut enc).unwrap();
        assert!(ciphertext.is_empty());
        assert!(decrypt_chunked(&ciphertext, &mut dec).unwrap().is_empty());
    }

    #[test]
    fn test_chunked_rejects_misaligned_input() {
        let mut dec = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha256);
        let result = decrypt_chunked(&[0u8; 300], &mut dec);
        assert!(matches!(result, Err(Error::MalformedStream(_))));
    }

    #[test]
    fn test_text_round_trip() {
        let public = TEST_KEY.public_key();
        let mut enc = EncryptionContext::new(&public, HashAlgorithm::Sha256);
        let mut dec = DecryptionContext::new(&TEST_KEY, HashAlgorithm::Sha256);

        let text = encrypt_to_text(b"over the wire", &mut enc).unwrap();
        assert_eq!(decrypt_from_text(&text, &mut dec).unwrap(), b"over the wire");

        let result = decrypt_from_text("not base64!", &mut dec);
        assert!(matches!(result, Err(Error::Encoding(_))));
    }
}
