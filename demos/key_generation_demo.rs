//! # Key Generation Demo
//!
//! Demonstrates generating, persisting and reloading RSA keys, and keeping
//! them in a key store.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example key_generation_demo
//! ```

use std::fs;

use sweet_crypto::config::KeyGenerationConfig;
use sweet_crypto::crypto::{self, KeyMaterial};
use sweet_crypto::storage::{self, FallbackKeyStore, FileKeyStore, KeyStore, MemoryKeyStore};

fn main() {
    sweet_crypto::logging::init_logging();

    println!("=== Sweet Crypto: Key Generation Demo ===\n");

    let dir = std::env::temp_dir().join(format!("sweet-crypto-keys-{}", std::process::id()));

    // Step 1: Generate and persist
    println!("Step 1: Generating a 2048-bit key in PEM and binary formats...");

    let config = KeyGenerationConfig::persisted_to(&dir, 2048);
    let key_pair = crypto::generate_key_pair(&config).expect("Failed to generate key pair");

    for path in [
        config.private_pem_path(),
        config.public_pem_path(),
        config.private_snapshot_path(),
        config.public_snapshot_path(),
    ] {
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        println!("  {} ({} bytes)", path.display(), size);
    }
    println!();

    // Step 2: Show the public key
    println!("Step 2: Public key PEM");
    println!();
    let public_pem = fs::read_to_string(config.public_pem_path()).expect("Failed to read public key");
    for line in public_pem.lines() {
        println!("  {}", line);
    }
    println!();

    // Step 3: Reload
    println!("Step 3: Reloading from disk...");

    let private = KeyMaterial::load_from_file(config.private_pem_path()).expect("Failed to load private key");
    let public = KeyMaterial::load_from_file(config.public_pem_path()).expect("Failed to load public key");

    println!("  private.pem has private key: {}", private.has_private_key());
    println!("  public.pem has private key: {}", public.has_private_key());
    println!(
        "  Fingerprints match: {}",
        public.public_key().fingerprint() == key_pair.public_key().fingerprint()
    );
    println!();

    // Step 4: Path hygiene
    println!("Step 4: Loading a path that escapes its directory...");

    match KeyMaterial::load_from_file("../../private.pem") {
        Ok(_) => println!("  [UNEXPECTED] Path accepted"),
        Err(e) => println!("  [OK] {}", e),
    }
    println!();

    // Step 5: Key store with fallback
    println!("Step 5: Saving to a key store with a memory fallback...");

    let file_store = FileKeyStore::new(dir.join("store")).expect("Invalid store path");
    let store = FallbackKeyStore::new(vec![Box::new(file_store), Box::new(MemoryKeyStore::new())])
        .expect("Failed to build key store");

    storage::save_key_pair(&store, &key_pair).expect("Failed to store key pair");
    let restored = storage::load_key_pair(&store).expect("Failed to load key pair");

    println!("  Backend: {}", store.backend_name());
    println!(
        "  Restored key matches: {}",
        restored.public_key() == key_pair.public_key()
    );

    if let Err(e) = fs::remove_dir_all(&dir) {
        println!("  (could not remove {}: {})", dir.display(), e);
    }

    println!("\n=== Demo Complete ===");
}
