//! # Encryption Demo
//!
//! Demonstrates RSA-OAEP encryption, chunked encryption for large payloads,
//! and base64 transport.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example encryption_demo
//! ```

use sweet_crypto::config::KeyGenerationConfig;
use sweet_crypto::crypto::{
    self, chunk_count, max_oaep_payload, DecryptionContext, EncryptionContext, HashAlgorithm,
};

fn main() {
    sweet_crypto::logging::init_logging();

    println!("=== Sweet Crypto: Encryption Demo ===\n");

    // Step 1: Generate a key pair
    println!("Step 1: Generating a 2048-bit RSA key pair...");

    let key_pair = crypto::generate_key_pair(&KeyGenerationConfig::in_memory(2048))
        .expect("Failed to generate key pair");
    let public_key = key_pair.public_key();

    println!("  Fingerprint: {}", public_key.fingerprint());
    println!("  Block size: {} bytes", public_key.size());
    println!();

    // Step 2: Payload limits
    println!("Step 2: Understanding the OAEP payload ceiling");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │  max payload = k - 2·hLen - 2                               │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    for hash in [
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ] {
        println!(
            "  │  {:<8} → {:>3} bytes per block                              │",
            hash.name(),
            max_oaep_payload(public_key.size(), hash)
        );
    }
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    // Step 3: Encrypt a short message
    println!("Step 3: Encrypting a short message with SHA-256...");

    let mut enc = EncryptionContext::new(&public_key, HashAlgorithm::Sha256);
    let mut dec = DecryptionContext::new(&key_pair, HashAlgorithm::Sha256);

    let message = b"Meet at the usual place at noon.";
    let text = crypto::encrypt_to_text(message, &mut enc).expect("Encryption failed");
    println!("  Plaintext: \"{}\"", String::from_utf8_lossy(message));
    println!("  Ciphertext (base64): {}...", &text[..48]);

    let decrypted = crypto::decrypt_from_text(&text, &mut dec).expect("Decryption failed");
    println!("  Decrypted: \"{}\"", String::from_utf8_lossy(&decrypted));
    println!();

    // Step 4: Chunked encryption
    println!("Step 4: Encrypting 10 KB in chunks...");

    let payload: Vec<u8> = (0..10_240u32).map(|i| (i % 251) as u8).collect();
    let step = enc.max_payload();
    let ciphertext = crypto::encrypt_chunked(&payload, &mut enc).expect("Chunked encryption failed");

    println!("  Step: {} bytes", step);
    println!("  Blocks: {}", chunk_count(payload.len(), step));
    println!("  Ciphertext: {} bytes", ciphertext.len());

    let restored = crypto::decrypt_chunked(&ciphertext, &mut dec).expect("Chunked decryption failed");
    if restored == payload {
        println!("  [OK] Payload restored");
    } else {
        println!("  [FAILED] Payload mismatch");
    }
    println!();

    // Step 5: Oversized single block
    println!("Step 5: Encrypting more than one block without chunking...");

    match crypto::encrypt(&payload, &mut enc) {
        Ok(_) => println!("  [UNEXPECTED] Oversized payload accepted"),
        Err(e) => println!("  [OK] Rejected: {}", e),
    }
    println!();

    // Step 6: Wrong label
    println!("Step 6: Decrypting with a mismatched label...");

    let mut labelled = EncryptionContext::new(&public_key, HashAlgorithm::Sha256).with_label("invoices");
    let ciphertext = crypto::encrypt(b"label bound", &mut labelled).expect("Encryption failed");

    match crypto::decrypt(&ciphertext, &mut dec) {
        Ok(_) => println!("  [UNEXPECTED] Decrypted without the label"),
        Err(e) => println!("  [OK] {}", e.public_message()),
    }

    println!("\n=== Demo Complete ===");
}
