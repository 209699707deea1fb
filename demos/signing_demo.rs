//! # Digital Signature Demo
//!
//! Demonstrates RSA-PSS signatures for message authentication.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example signing_demo
//! ```

use sweet_crypto::config::KeyGenerationConfig;
use sweet_crypto::crypto::{
    self, HashAlgorithm, SaltLength, SignatureContext, VerificationContext,
};

fn main() {
    sweet_crypto::logging::init_logging();

    println!("=== Sweet Crypto: Digital Signature Demo ===\n");

    // Step 1: Create a key pair
    println!("Step 1: Creating a 2048-bit RSA key pair...");

    let key_pair = crypto::generate_key_pair(&KeyGenerationConfig::in_memory(2048))
        .expect("Failed to create key pair");
    let public_key = key_pair.public_key();

    println!("  Fingerprint: {}", public_key.fingerprint());
    println!();

    // Step 2: Explain the signing process
    println!("Step 2: Understanding RSA-PSS Signatures");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                   SIGNATURE FLOW                            │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │  SIGNING (Private Key Holder Only):                         │");
    println!("  │                                                             │");
    println!("  │    Message ─► SHA-256 ─► digest ─┐                          │");
    println!("  │                                  ▼                          │");
    println!("  │    Private Key + random salt ─► PSS ─► Signature (256 B)    │");
    println!("  │                                                             │");
    println!("  │  VERIFICATION (Anyone with Public Key):                     │");
    println!("  │                                                             │");
    println!("  │    Message ─► SHA-256 ─► digest ─┐                          │");
    println!("  │    Signature + Public Key ───────┴─► Valid / Invalid        │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    // Step 3: Sign a message
    println!("Step 3: Signing a JSON document...");

    let document = br#"{"order":1234,"amount":"19.99","currency":"EUR"}"#;
    println!("  Message: {}", String::from_utf8_lossy(document));

    let mut signer = SignatureContext::new(&key_pair, HashAlgorithm::Sha256);
    let signature = crypto::sign_to_text(document, &mut signer).expect("Signing failed");

    println!("  Signature (base64): {}...", &signature[..48]);
    println!();

    // Step 4: Verify the signature
    println!("Step 4: Verifying the signature...");

    let verifier = VerificationContext::new(&public_key, HashAlgorithm::Sha256);
    match crypto::verify_from_text(document, &signature, &verifier) {
        Ok(()) => println!("  [OK] Signature is valid!"),
        Err(_) => println!("  [FAILED] Signature verification failed!"),
    }
    println!();

    // Step 5: Demonstrate tamper detection
    println!("Step 5: Verifying a tampered document...");

    let tampered = br#"{"order":1234,"amount":"99.99","currency":"EUR"}"#;
    println!("  Tampered: {}", String::from_utf8_lossy(tampered));

    match crypto::verify_from_text(tampered, &signature, &verifier) {
        Ok(()) => println!("  [UNEXPECTED] Tampered document verified!"),
        Err(e) => println!("  [OK] {}", e),
    }
    println!();

    // Step 6: Salt policies
    println!("Step 6: Signing with the maximum salt length...");

    let mut signer = SignatureContext::new(&key_pair, HashAlgorithm::Sha512)
        .with_salt_length(SaltLength::Max);
    let verifier = VerificationContext::new(&public_key, HashAlgorithm::Sha512)
        .with_salt_length(SaltLength::Max);

    let signature = crypto::sign(document, &mut signer).expect("Signing failed");
    match crypto::verify(document, signature.as_bytes(), &verifier) {
        Ok(()) => println!("  [OK] SHA-512 / max-salt signature verified"),
        Err(e) => println!("  [FAILED] {}", e),
    }

    println!("\n=== Demo Complete ===");
}
