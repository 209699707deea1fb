//! # File Encryption Demo
//!
//! Demonstrates AES-CTR file encryption with the IV stored after the
//! ciphertext.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example file_encryption_demo
//! ```

use std::fs;

use rand::RngCore;
use sweet_crypto::config::StreamConfig;
use sweet_crypto::crypto::{self, AesKeyLength, KeyUsageCounter, StreamCipherJob, IV_SIZE};

fn main() {
    sweet_crypto::logging::init_logging();

    println!("=== Sweet Crypto: File Encryption Demo ===\n");

    let dir = std::env::temp_dir().join(format!("sweet-crypto-demo-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("Failed to create working directory");

    // Step 1: Prepare a key and a file
    println!("Step 1: Preparing a 256-bit key and a sample file...");

    let mut key = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key);

    let source = dir.join("ledger.txt");
    let contents = "date,amount\n2024-01-01,10.00\n2024-01-02,12.50\n".repeat(500);
    fs::write(&source, &contents).expect("Failed to write sample file");

    println!("  Source: {} ({} bytes)", source.display(), contents.len());
    println!();

    // Step 2: Encrypt
    println!("Step 2: Encrypting with AES-256-CTR...");

    let config = StreamConfig {
        key_length: AesKeyLength::Aes256,
        buffer_size: 8 * 1024,
        key_usage_limit: 3,
    };
    let encrypted = dir.join("ledger.txt.enc");
    let counter = KeyUsageCounter::from_config(&config);

    let job = StreamCipherJob::from_config(&config, &source, &encrypted, &key);
    let iv = crypto::encrypt_file_tracked(&job, &counter).expect("Encryption failed");

    let sealed = fs::read(&encrypted).expect("Failed to read ciphertext");
    println!("  IV: {}", hex::encode(iv.as_bytes()));
    println!("  Output: {} bytes ({} + {}-byte IV)", sealed.len(), contents.len(), IV_SIZE);
    println!(
        "  Trailer matches IV: {}",
        &sealed[sealed.len() - IV_SIZE..] == iv.as_bytes()
    );
    println!("  Key uses remaining: {}", counter.remaining());
    println!();

    // Step 3: Decrypt
    println!("Step 3: Decrypting...");

    let restored = dir.join("ledger.restored.txt");
    let job = StreamCipherJob::from_config(&config, &encrypted, &restored, &key);
    crypto::decrypt_file(&job).expect("Decryption failed");

    let roundtrip = fs::read_to_string(&restored).expect("Failed to read plaintext");
    if roundtrip == contents {
        println!("  [OK] File restored");
    } else {
        println!("  [FAILED] File mismatch");
    }
    println!();

    // Step 4: CTR has no integrity
    println!("Step 4: Flipping one ciphertext bit...");

    let mut flipped = sealed.clone();
    flipped[5] ^= 0x01;
    fs::write(&encrypted, &flipped).expect("Failed to write ciphertext");
    crypto::decrypt_file(&job).expect("Decryption failed");

    let damaged = fs::read(&restored).expect("Failed to read plaintext");
    println!(
        "  Decrypted without error; byte 5 is now {:?} instead of {:?}",
        damaged[5] as char,
        contents.as_bytes()[5] as char
    );
    println!("  Sign the ciphertext if tampering must be detected.");
    println!();

    // Step 5: Truncated input
    println!("Step 5: Decrypting a file shorter than the IV...");

    fs::write(&encrypted, b"too short").expect("Failed to write ciphertext");
    match crypto::decrypt_file(&job) {
        Ok(()) => println!("  [UNEXPECTED] Truncated file accepted"),
        Err(e) => println!("  [OK] {}", e),
    }

    if let Err(e) = fs::remove_dir_all(&dir) {
        println!("  (could not remove {}: {})", dir.display(), e);
    }

    println!("\n=== Demo Complete ===");
}
