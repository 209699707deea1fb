//! # File Encryption (AES-CTR)
//!
//! Streaming symmetric encryption for files of any size.
//!
//! ## Container Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ENCRYPTED FILE LAYOUT                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────┬──────────────────┐    │
//! │  │  ciphertext (same length as plaintext)       │  IV (16 bytes)   │    │
//! │  └──────────────────────────────────────────────┴──────────────────┘    │
//! │                                                                         │
//! │  • The IV trails the data so encryption never seeks backwards           │
//! │  • No header, no length prefix, no authentication tag                   │
//! │  • Decryption reads the tail first, then streams size - 16 bytes        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Keys
//!
//! The caller supplies a byte buffer at least as long as the selected AES
//! class; the first 16, 24 or 32 bytes are the key. A fresh random IV is
//! drawn for every file. CTR mode is a pure keystream: it provides no
//! integrity, and reusing a (key, IV) pair reveals the XOR of plaintexts.
//! [`KeyUsageCounter`] lets callers cap how many files one key encrypts.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use aes::{Aes128, Aes192, Aes256};
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::StreamConfig;
use crate::error::{Error, Result};

/// IV length, appended to every encrypted file
pub const IV_SIZE: usize = 16;

/// AES block size
pub const BLOCK_SIZE: usize = 16;

/// Read buffer size used when none is configured
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Default number of files one key may encrypt through a [`KeyUsageCounter`]
pub const DEFAULT_KEY_USAGE_LIMIT: u64 = 1 << 32;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes192Ctr = ctr::Ctr128BE<Aes192>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// AES key class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AesKeyLength {
    /// 16-byte key
    Aes128,
    /// 24-byte key
    Aes192,
    /// 32-byte key
    #[default]
    Aes256,
}

impl AesKeyLength {
    /// Key length in bytes
    pub fn key_len(self) -> usize {
        match self {
            AesKeyLength::Aes128 => 16,
            AesKeyLength::Aes192 => 24,
            AesKeyLength::Aes256 => 32,
        }
    }

    /// Map a key size in bits to its class
    pub fn from_bits(bits: usize) -> Result<Self> {
        match bits {
            128 => Ok(AesKeyLength::Aes128),
            192 => Ok(AesKeyLength::Aes192),
            256 => Ok(AesKeyLength::Aes256),
            other => Err(Error::InvalidArgument(format!(
                "AES key size must be 128, 192 or 256 bits, got {}",
                other
            ))),
        }
    }
}

/// Take the cipher key from the front of `key_bytes`
pub fn resolve_cipher_key(key_bytes: &[u8], length: AesKeyLength) -> Result<&[u8]> {
    key_bytes.get(..length.key_len()).ok_or_else(|| {
        Error::MalformedStream(format!(
            "key material is {} bytes, {:?} needs {}",
            key_bytes.len(),
            length,
            length.key_len()
        ))
    })
}

/// Reject buffer sizes that are zero or not a whole number of AES blocks
pub fn validate_buffer_size(buffer_size: usize) -> Result<()> {
    if buffer_size == 0 || buffer_size % BLOCK_SIZE != 0 {
        return Err(Error::InvalidArgument(format!(
            "buffer size must be a non-zero multiple of {}, got {}",
            BLOCK_SIZE, buffer_size
        )));
    }
    Ok(())
}

// ============================================================================
// IV
// ============================================================================

/// Initialization vector of one encrypted file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Iv(pub [u8; IV_SIZE]);

impl Iv {
    /// Draw a fresh IV from the OS random number generator
    pub fn random() -> Self {
        let mut bytes = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Copy from a slice that must be exactly 16 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; IV_SIZE] = bytes.try_into().map_err(|_| {
            Error::MalformedStream(format!("IV must be {} bytes, got {}", IV_SIZE, bytes.len()))
        })?;
        Ok(Self(array))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }
}

// ============================================================================
// KEYSTREAM
// ============================================================================

enum CtrKeystream {
    Aes128(Aes128Ctr),
    Aes192(Aes192Ctr),
    Aes256(Aes256Ctr),
}

impl CtrKeystream {
    fn new(key: &[u8], iv: &Iv) -> Result<Self> {
        let invalid = |_: ctr::cipher::InvalidLength| {
            Error::InvalidArgument(format!("invalid AES key length {}", key.len()))
        };
        let iv = &iv.as_bytes()[..];

        Ok(match key.len() {
            16 => CtrKeystream::Aes128(Aes128Ctr::new_from_slices(key, iv).map_err(invalid)?),
            24 => CtrKeystream::Aes192(Aes192Ctr::new_from_slices(key, iv).map_err(invalid)?),
            32 => CtrKeystream::Aes256(Aes256Ctr::new_from_slices(key, iv).map_err(invalid)?),
            other => {
                return Err(Error::InvalidArgument(format!(
                    "invalid AES key length {}",
                    other
                )))
            }
        })
    }

    fn apply(&mut self, buf: &mut [u8]) {
        match self {
            CtrKeystream::Aes128(c) => c.apply_keystream(buf),
            CtrKeystream::Aes192(c) => c.apply_keystream(buf),
            CtrKeystream::Aes256(c) => c.apply_keystream(buf),
        }
    }
}

/// Transform every byte of `reader` into `writer`; returns bytes moved
///
/// Short reads are fine: the CTR keystream position follows the byte count,
/// not the read boundaries.
fn pump<R: Read + ?Sized, W: Write + ?Sized>(
    keystream: &mut CtrKeystream,
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
) -> Result<u64> {
    let mut buf = Zeroizing::new(vec![0u8; buffer_size]);
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        keystream.apply(&mut buf[..n]);
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }

    Ok(total)
}

// ============================================================================
// STREAM API
// ============================================================================

/// Encrypt everything in `reader` to `writer`, then append the IV
///
/// `key` must be exactly 16, 24 or 32 bytes.
pub fn encrypt_stream<R: Read, W: Write>(
    key: &[u8],
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
) -> Result<Iv> {
    let iv = Iv::random();
    encrypt_stream_with_iv(key, &iv, reader, writer, buffer_size)?;
    Ok(iv)
}

pub(crate) fn encrypt_stream_with_iv<R: Read, W: Write>(
    key: &[u8],
    iv: &Iv,
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
) -> Result<u64> {
    validate_buffer_size(buffer_size)?;
    let mut keystream = CtrKeystream::new(key, iv)?;

    let written = pump(&mut keystream, reader, writer, buffer_size)?;
    writer.write_all(iv.as_bytes())?;
    writer.flush()?;

    Ok(written)
}

/// Decrypt a ciphertext-then-IV stream into `writer`; returns plaintext bytes
///
/// The IV is read from the last 16 bytes, so the source must be seekable.
pub fn decrypt_stream<R: Read + Seek, W: Write>(
    key: &[u8],
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
) -> Result<u64> {
    validate_buffer_size(buffer_size)?;

    let total = reader.seek(SeekFrom::End(0))?;
    if total < IV_SIZE as u64 {
        return Err(Error::MalformedStream(format!(
            "input is {} bytes, shorter than the {}-byte IV",
            total, IV_SIZE
        )));
    }
    let data_len = total - IV_SIZE as u64;

    let mut iv = [0u8; IV_SIZE];
    reader.seek(SeekFrom::Start(data_len))?;
    reader.read_exact(&mut iv)?;
    reader.seek(SeekFrom::Start(0))?;

    let mut keystream = CtrKeystream::new(key, &Iv(iv))?;
    let mut ciphertext = reader.by_ref().take(data_len);
    let written = pump(&mut keystream, &mut ciphertext, writer, buffer_size)?;
    writer.flush()?;

    if written != data_len {
        return Err(Error::MalformedStream(format!(
            "expected {} ciphertext bytes, read {}",
            data_len, written
        )));
    }

    Ok(written)
}

// ============================================================================
// FILE API
// ============================================================================

/// One file encryption or decryption run
///
/// The key buffer is held in zeroizing storage and never shown by `Debug`.
pub struct StreamCipherJob {
    /// File to read
    pub source: PathBuf,
    /// File to create or truncate
    pub output: PathBuf,
    /// AES class; selects the key prefix
    pub key_length: AesKeyLength,
    /// Read buffer size, a non-zero multiple of 16
    pub buffer_size: usize,
    key: Zeroizing<Vec<u8>>,
}

impl StreamCipherJob {
    /// Job with the default AES-256 class and buffer size
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>, key_bytes: &[u8]) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            key_length: AesKeyLength::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            key: Zeroizing::new(key_bytes.to_vec()),
        }
    }

    /// Job using the AES class and buffer size from `config`
    pub fn from_config(
        config: &StreamConfig,
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        key_bytes: &[u8],
    ) -> Self {
        Self::new(source, output, key_bytes)
            .with_key_length(config.key_length)
            .with_buffer_size(config.buffer_size)
    }

    /// Select the AES class
    pub fn with_key_length(mut self, key_length: AesKeyLength) -> Self {
        self.key_length = key_length;
        self
    }

    /// Set the read buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    fn cipher_key(&self) -> Result<&[u8]> {
        resolve_cipher_key(&self.key, self.key_length)
    }
}

impl std::fmt::Debug for StreamCipherJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCipherJob")
            .field("source", &self.source)
            .field("output", &self.output)
            .field("key_length", &self.key_length)
            .field("buffer_size", &self.buffer_size)
            .finish_non_exhaustive()
    }
}

/// Encrypt `job.source` into `job.output` and return the IV used
///
/// On failure the partially written output is removed. The output must not
/// be the source file itself, under any path or link.
pub fn encrypt_file(job: &StreamCipherJob) -> Result<Iv> {
    validate_buffer_size(job.buffer_size)?;
    let key = job.cipher_key()?;

    let mut source = File::open(&job.source)?;
    ensure_distinct_output(job)?;
    let mut output = create_output(&job.output)?;

    let iv = Iv::random();
    let result = encrypt_stream_with_iv(key, &iv, &mut source, &mut output, job.buffer_size);

    match result {
        Ok(bytes) => {
            finish_output(output, &job.output);
            tracing::debug!(
                "Encrypted {} bytes from {} with {:?}",
                bytes,
                job.source.display(),
                job.key_length
            );
            Ok(iv)
        }
        Err(err) => {
            drop(output);
            discard_output(&job.output);
            Err(err)
        }
    }
}

/// Decrypt `job.source` (ciphertext then IV) into `job.output`
///
/// A source shorter than the IV is rejected before the output is created.
pub fn decrypt_file(job: &StreamCipherJob) -> Result<()> {
    validate_buffer_size(job.buffer_size)?;
    let key = job.cipher_key()?;

    let mut source = File::open(&job.source)?;
    let size = source.metadata()?.len();
    if size < IV_SIZE as u64 {
        return Err(Error::MalformedStream(format!(
            "{} is {} bytes, shorter than the {}-byte IV",
            job.source.display(),
            size,
            IV_SIZE
        )));
    }

    ensure_distinct_output(job)?;
    let mut output = create_output(&job.output)?;
    match decrypt_stream(key, &mut source, &mut output, job.buffer_size) {
        Ok(bytes) => {
            finish_output(output, &job.output);
            tracing::debug!("Decrypted {} bytes into {}", bytes, job.output.display());
            Ok(())
        }
        Err(err) => {
            drop(output);
            discard_output(&job.output);
            Err(err)
        }
    }
}

/// [`encrypt_file`], counted against `counter`
///
/// The usage slot is reserved before any file is touched, so an exhausted
/// counter leaves the filesystem unchanged.
pub fn encrypt_file_tracked(job: &StreamCipherJob, counter: &KeyUsageCounter) -> Result<Iv> {
    counter.reserve()?;
    encrypt_file(job)
}

/// Refuse a job whose output already names the source file
///
/// Truncating the output would destroy the input before it is read.
fn ensure_distinct_output(job: &StreamCipherJob) -> Result<()> {
    match fs::metadata(&job.output) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    if same_file(&job.source, &job.output)? {
        return Err(Error::InvalidArgument(format!(
            "output {} is the same file as the source",
            job.output.display()
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let (a, b) = (fs::metadata(a)?, fs::metadata(b)?);
    Ok(a.dev() == b.dev() && a.ino() == b.ino())
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> Result<bool> {
    Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
}

fn create_output(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

fn finish_output(file: File, path: &Path) {
    // Data is already written; a failed sync is reported but not fatal
    if let Err(e) = file.sync_all() {
        tracing::warn!("Failed to sync {}: {}", path.display(), e);
    }
}

fn discard_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove partial output {}: {}", path.display(), e),
    }
}

// ============================================================================
// KEY USAGE
// ============================================================================

/// Counts files encrypted under one key and refuses to exceed a ceiling
///
/// Random 128-bit IVs make collisions negligible well below 2^32 uses; the
/// counter turns that budget into a hard limit. Safe to share across
/// threads.
#[derive(Debug)]
pub struct KeyUsageCounter {
    used: AtomicU64,
    limit: u64,
}

impl KeyUsageCounter {
    /// Counter with the given ceiling
    pub fn new(limit: u64) -> Self {
        Self {
            used: AtomicU64::new(0),
            limit,
        }
    }

    /// Counter with the ceiling from `config`
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.key_usage_limit)
    }

    /// Files encrypted so far
    pub fn used(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    /// Remaining budget
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used())
    }

    fn reserve(&self) -> Result<()> {
        let limit = self.limit;
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < limit).then(|| used + 1)
            })
            .map(|_| ())
            .map_err(|_| {
                tracing::warn!("Key usage limit of {} reached", limit);
                Error::KeyUsageExhausted { limit }
            })
    }
}

impl Default for KeyUsageCounter {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_USAGE_LIMIT)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const KEY: [u8; 32] = [0x42; 32];

    fn write_source(dir: &Path, contents: &[u8]) -> PathBuf {
        let path = dir.join("plain.bin");
        fs::write(&path, contents).unwrap();
        path
    }

    fn pseudo_random(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    /// Reader that hands out at most `chunk` bytes per call
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_nist_aes128_ctr_vector() {
        // SP 800-38A F.5.1, first block
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let iv = Iv::from_slice(&hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap()).unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let mut out = Vec::new();
        encrypt_stream_with_iv(&key, &iv, &mut plaintext.as_slice(), &mut out, 16).unwrap();

        assert_eq!(
            hex::encode(&out[..16]),
            "874d6191b620e3261bef6864990db6ce"
        );
        assert_eq!(&out[16..], iv.as_bytes());
    }

    #[test]
    fn test_file_round_trip_all_key_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let plaintext = pseudo_random(100_000);
        let source = write_source(dir.path(), &plaintext);

        for length in [AesKeyLength::Aes128, AesKeyLength::Aes192, AesKeyLength::Aes256] {
            let encrypted = dir.path().join("cipher.bin");
            let decrypted = dir.path().join("plain.out");

            let job = StreamCipherJob::new(&source, &encrypted, &KEY).with_key_length(length);
            let iv = encrypt_file(&job).unwrap();

            let ciphertext = fs::read(&encrypted).unwrap();
            assert_eq!(ciphertext.len(), plaintext.len() + IV_SIZE);
            assert_eq!(&ciphertext[plaintext.len()..], iv.as_bytes());
            assert_ne!(&ciphertext[..plaintext.len()], plaintext.as_slice());

            let job = StreamCipherJob::new(&encrypted, &decrypted, &KEY).with_key_length(length);
            decrypt_file(&job).unwrap();
            assert_eq!(fs::read(&decrypted).unwrap(), plaintext, "{:?}", length);
        }
    }

    #[test]
    fn test_empty_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), b"");
        let encrypted = dir.path().join("empty.enc");
        let decrypted = dir.path().join("empty.out");

        encrypt_file(&StreamCipherJob::new(&source, &encrypted, &KEY)).unwrap();
        assert_eq!(fs::metadata(&encrypted).unwrap().len(), IV_SIZE as u64);

        decrypt_file(&StreamCipherJob::new(&encrypted, &decrypted, &KEY)).unwrap();
        assert!(fs::read(&decrypted).unwrap().is_empty());
    }

    #[test]
    fn test_ivs_are_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), b"same plaintext twice");

        let a = encrypt_file(&StreamCipherJob::new(&source, dir.path().join("a"), &KEY)).unwrap();
        let b = encrypt_file(&StreamCipherJob::new(&source, dir.path().join("b"), &KEY)).unwrap();
        assert_ne!(a, b);
        assert_ne!(
            fs::read(dir.path().join("a")).unwrap(),
            fs::read(dir.path().join("b")).unwrap()
        );
    }

    #[test]
    fn test_buffer_size_does_not_change_output() {
        let plaintext = pseudo_random(10_000);
        let iv = Iv([7u8; IV_SIZE]);

        let mut small = Vec::new();
        encrypt_stream_with_iv(&KEY, &iv, &mut plaintext.as_slice(), &mut small, 16).unwrap();
        let mut large = Vec::new();
        encrypt_stream_with_iv(&KEY, &iv, &mut plaintext.as_slice(), &mut large, 4096).unwrap();

        assert_eq!(small, large);
    }

    #[test]
    fn test_short_reads_keep_keystream_aligned() {
        let plaintext = pseudo_random(1_000);
        let iv = Iv([9u8; IV_SIZE]);

        let mut whole = Vec::new();
        encrypt_stream_with_iv(&KEY, &iv, &mut plaintext.as_slice(), &mut whole, 64).unwrap();

        let mut trickle = Trickle { data: &plaintext, chunk: 7 };
        let mut pieces = Vec::new();
        encrypt_stream_with_iv(&KEY, &iv, &mut trickle, &mut pieces, 64).unwrap();

        assert_eq!(whole, pieces);

        let mut decrypted = Vec::new();
        decrypt_stream(&KEY, &mut Cursor::new(pieces), &mut decrypted, 64).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_yields_garbage_not_error() {
        let plaintext = b"attack at dawn".to_vec();
        let mut ciphertext = Vec::new();
        encrypt_stream(&KEY, &mut plaintext.as_slice(), &mut ciphertext, 16).unwrap();

        let mut decrypted = Vec::new();
        let other = [0x24u8; 32];
        decrypt_stream(&other, &mut Cursor::new(ciphertext), &mut decrypted, 16).unwrap();
        assert_eq!(decrypted.len(), plaintext.len());
        assert_ne!(decrypted, plaintext);
    }

    #[test]
    fn test_short_source_rejected_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), &[0u8; 10]);
        let output = dir.path().join("never.out");

        let result = decrypt_file(&StreamCipherJob::new(&source, &output, &KEY));
        assert!(matches!(result, Err(Error::MalformedStream(_))));
        assert!(!output.exists());

        let mut sink = Vec::new();
        let result = decrypt_stream(&KEY, &mut Cursor::new(vec![0u8; 15]), &mut sink, 16);
        assert!(matches!(result, Err(Error::MalformedStream(_))));
    }

    #[test]
    fn test_short_key_material_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), b"data");
        let output = dir.path().join("out.enc");

        let job = StreamCipherJob::new(&source, &output, &[1u8; 20]);
        assert!(matches!(encrypt_file(&job), Err(Error::MalformedStream(_))));
        assert!(!output.exists());

        let job = job.with_key_length(AesKeyLength::Aes128);
        assert!(encrypt_file(&job).is_ok());
    }

    #[test]
    fn test_resolve_cipher_key_uses_prefix() {
        let material: Vec<u8> = (0u8..40).collect();
        let key = resolve_cipher_key(&material, AesKeyLength::Aes192).unwrap();
        assert_eq!(key, &material[..24]);
        assert!(resolve_cipher_key(&material[..8], AesKeyLength::Aes128).is_err());
    }

    #[test]
    fn test_invalid_buffer_sizes() {
        assert!(validate_buffer_size(16).is_ok());
        assert!(validate_buffer_size(DEFAULT_BUFFER_SIZE).is_ok());
        assert!(matches!(validate_buffer_size(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(validate_buffer_size(100), Err(Error::InvalidArgument(_))));

        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), b"data");
        let job = StreamCipherJob::new(&source, dir.path().join("out"), &KEY).with_buffer_size(33);
        assert!(matches!(encrypt_file(&job), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = StreamCipherJob::new(dir.path().join("missing"), dir.path().join("out"), &KEY);
        assert!(matches!(encrypt_file(&job), Err(Error::Io(_))));
    }

    #[test]
    fn test_output_same_as_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let plaintext = b"must survive in place".to_vec();
        let source = write_source(dir.path(), &plaintext);

        let job = StreamCipherJob::new(&source, &source, &KEY);
        assert!(matches!(encrypt_file(&job), Err(Error::InvalidArgument(_))));
        assert_eq!(fs::read(&source).unwrap(), plaintext);

        // Same file reached through a different spelling
        let dotted = dir.path().join(".").join("plain.bin");
        let job = StreamCipherJob::new(&source, &dotted, &KEY);
        assert!(matches!(encrypt_file(&job), Err(Error::InvalidArgument(_))));
        assert_eq!(fs::read(&source).unwrap(), plaintext);

        let encrypted = dir.path().join("cipher.bin");
        encrypt_file(&StreamCipherJob::new(&source, &encrypted, &KEY)).unwrap();
        let ciphertext = fs::read(&encrypted).unwrap();

        let job = StreamCipherJob::new(&encrypted, &encrypted, &KEY);
        assert!(matches!(decrypt_file(&job), Err(Error::InvalidArgument(_))));
        assert_eq!(fs::read(&encrypted).unwrap(), ciphertext);
    }

    #[cfg(unix)]
    #[test]
    fn test_output_hard_linked_to_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), b"linked plaintext");
        let link = dir.path().join("link.bin");
        fs::hard_link(&source, &link).unwrap();

        let job = StreamCipherJob::new(&source, &link, &KEY);
        assert!(matches!(encrypt_file(&job), Err(Error::InvalidArgument(_))));
        assert_eq!(fs::read(&source).unwrap(), b"linked plaintext");
    }

    #[test]
    fn test_failing_reader_aborts_with_io() {
        /// Reader that yields `good` blocks of data, then fails
        struct Faulty {
            good: usize,
        }

        impl Read for Faulty {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.good == 0 {
                    return Err(io::Error::new(io::ErrorKind::Other, "disk fault"));
                }
                self.good -= 1;
                let n = buf.len().min(16);
                buf[..n].fill(0x5A);
                Ok(n)
            }
        }

        let mut sink = Vec::new();
        let result = encrypt_stream(&KEY, &mut Faulty { good: 2 }, &mut sink, 16);
        match result {
            Err(Error::Io(e)) => assert_eq!(e.to_string(), "disk fault"),
            other => panic!("expected an i/o error, got {:?}", other),
        }
        // The IV trailer is only written after a complete read
        assert_eq!(sink.len(), 32);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_failure_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("partial.enc");

        // Opening a directory succeeds on unix; reading it fails
        let job = StreamCipherJob::new(dir.path(), &output, &KEY);
        assert!(matches!(encrypt_file(&job), Err(Error::Io(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_unwritable_output_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), b"nowhere to go");
        let encrypted = dir.path().join("cipher.bin");
        encrypt_file(&StreamCipherJob::new(&source, &encrypted, &KEY)).unwrap();

        let output = dir.path().join("missing").join("plain.out");
        let result = decrypt_file(&StreamCipherJob::new(&encrypted, &output, &KEY));
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!output.exists());
        assert!(encrypted.exists());
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(AesKeyLength::from_bits(128).unwrap(), AesKeyLength::Aes128);
        assert_eq!(AesKeyLength::from_bits(256).unwrap().key_len(), 32);
        assert!(AesKeyLength::from_bits(512).is_err());
    }

    #[test]
    fn test_job_debug_hides_key() {
        let job = StreamCipherJob::new("a", "b", &[0xAB; 32]);
        let debug = format!("{:?}", job);
        assert!(!debug.contains("171"));
    }

    #[test]
    fn test_key_usage_counter_limit() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), b"counted");
        let counter = KeyUsageCounter::new(2);

        for name in ["one", "two"] {
            let job = StreamCipherJob::new(&source, dir.path().join(name), &KEY);
            encrypt_file_tracked(&job, &counter).unwrap();
        }
        assert_eq!(counter.used(), 2);
        assert_eq!(counter.remaining(), 0);

        let job = StreamCipherJob::new(&source, dir.path().join("three"), &KEY);
        let result = encrypt_file_tracked(&job, &counter);
        assert!(matches!(result, Err(Error::KeyUsageExhausted { limit: 2 })));
        assert!(!dir.path().join("three").exists());
    }

    #[test]
    fn test_from_config() {
        let config = StreamConfig {
            key_length: AesKeyLength::Aes128,
            buffer_size: 64,
            key_usage_limit: 5,
        };
        let job = StreamCipherJob::from_config(&config, "in", "out", &KEY);
        assert_eq!(job.key_length, AesKeyLength::Aes128);
        assert_eq!(job.buffer_size, 64);
        assert_eq!(KeyUsageCounter::from_config(&config).remaining(), 5);
    }
}
