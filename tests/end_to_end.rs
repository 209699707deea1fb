//! Full workflow: generate and persist a key, reload it, encrypt, sign,
//! and round-trip a file.

use std::fs;

use sweet_crypto::config::{KeyGenerationConfig, StreamConfig};
use sweet_crypto::crypto::{
    self, AesKeyLength, DecryptionContext, EncryptionContext, HashAlgorithm, KeyMaterial,
    SignatureContext, StreamCipherJob, VerificationContext,
};
use sweet_crypto::Error;

#[test]
fn test_generate_load_encrypt_sign() {
    let dir = tempfile::tempdir().unwrap();
    let config = KeyGenerationConfig::persisted_to(dir.path(), 2048);

    let key_pair = crypto::generate_key_pair(&config).unwrap();
    assert_eq!(key_pair.bits(), 2048);

    let loaded = KeyMaterial::load_from_file(config.private_pem_path()).unwrap();
    let private = loaded.key_pair().unwrap();
    let public = KeyMaterial::load_from_file(config.public_pem_path()).unwrap();
    assert_eq!(public.public_key(), &key_pair.public_key());

    // OAEP with SHA-512
    let mut enc = EncryptionContext::new(public.public_key(), HashAlgorithm::Sha512);
    let mut dec = DecryptionContext::new(private, HashAlgorithm::Sha512);
    let ciphertext = crypto::encrypt(b"hello world", &mut enc).unwrap();
    assert_eq!(crypto::decrypt(&ciphertext, &mut dec).unwrap(), b"hello world");

    // One million bytes in 126-byte steps
    let payload = vec![0x5Au8; 1_000_000];
    let chunked = crypto::encrypt_chunked(&payload, &mut enc).unwrap();
    assert_eq!(chunked.len(), 7937 * 256);

    // PSS with SHA-256 over a JSON document
    let document = br#"{"order":1234,"amount":"19.99","currency":"EUR"}"#;
    let mut signer = SignatureContext::new(private, HashAlgorithm::Sha256);
    let verifier = VerificationContext::new(public.public_key(), HashAlgorithm::Sha256);

    let signature = crypto::sign_to_text(document, &mut signer).unwrap();
    crypto::verify_from_text(document, &signature, &verifier).unwrap();

    let mut altered = document.to_vec();
    altered[10] = b'5';
    assert!(matches!(
        crypto::verify_from_text(&altered, &signature, &verifier),
        Err(Error::VerificationFailed)
    ));
}

#[test]
fn test_file_encryption_with_loaded_key_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let config = KeyGenerationConfig {
        binary_format: false,
        ..KeyGenerationConfig::persisted_to(dir.path(), 1024)
    };
    crypto::generate_key_pair(&config).unwrap();

    // Symmetric key taken from the front of a key file's bytes
    let material = KeyMaterial::load_from_file(config.public_pem_path()).unwrap();
    let stream = StreamConfig {
        key_length: AesKeyLength::Aes256,
        buffer_size: 4096,
        ..StreamConfig::default()
    };

    let source = dir.path().join("report.csv");
    let encrypted = dir.path().join("report.csv.enc");
    let restored = dir.path().join("report.restored.csv");
    let contents: Vec<u8> = (0..50_000u32).flat_map(|i| i.to_le_bytes()).collect();
    fs::write(&source, &contents).unwrap();

    let job = StreamCipherJob::from_config(&stream, &source, &encrypted, material.raw_bytes());
    let iv = crypto::encrypt_file(&job).unwrap();

    let sealed = fs::read(&encrypted).unwrap();
    assert_eq!(sealed.len(), contents.len() + crypto::IV_SIZE);
    assert_eq!(&sealed[sealed.len() - crypto::IV_SIZE..], iv.as_bytes());

    let job = StreamCipherJob::from_config(&stream, &encrypted, &restored, material.raw_bytes());
    crypto::decrypt_file(&job).unwrap();
    assert_eq!(fs::read(&restored).unwrap(), contents);
}
