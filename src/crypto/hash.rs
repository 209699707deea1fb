//! # Hash Algorithms
//!
//! Hash identifiers shared by OAEP padding, PSS signatures and the OAEP
//! payload ceiling calculation.

use rsa::{Oaep, Pss};
use serde::{Deserialize, Serialize};
use sha2::digest::DynDigest;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

/// A SHA-2 hash function usable with OAEP and PSS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-224 (28-byte digest)
    Sha224,
    /// SHA-256 (32-byte digest)
    #[default]
    Sha256,
    /// SHA-384 (48-byte digest)
    Sha384,
    /// SHA-512 (64-byte digest)
    Sha512,
}

impl HashAlgorithm {
    /// Digest size in bytes
    pub fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Conventional name, e.g. `SHA-256`
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha224 => "SHA-224",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Hash `message` in one shot
    pub fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha224 => Sha224::digest(message).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(message).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(message).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(message).to_vec(),
        }
    }

    /// OAEP padding parameterized by this hash (used for both the label
    /// hash and MGF1)
    pub(crate) fn oaep(self, label: Option<&str>) -> Oaep {
        match self {
            HashAlgorithm::Sha224 => oaep_with::<Sha224>(label),
            HashAlgorithm::Sha256 => oaep_with::<Sha256>(label),
            HashAlgorithm::Sha384 => oaep_with::<Sha384>(label),
            HashAlgorithm::Sha512 => oaep_with::<Sha512>(label),
        }
    }

    /// PSS padding with an explicit salt length
    pub(crate) fn pss(self, salt_len: usize) -> Pss {
        match self {
            HashAlgorithm::Sha224 => Pss::new_with_salt::<Sha224>(salt_len),
            HashAlgorithm::Sha256 => Pss::new_with_salt::<Sha256>(salt_len),
            HashAlgorithm::Sha384 => Pss::new_with_salt::<Sha384>(salt_len),
            HashAlgorithm::Sha512 => Pss::new_with_salt::<Sha512>(salt_len),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn oaep_with<D>(label: Option<&str>) -> Oaep
where
    D: 'static + Digest + DynDigest + Send + Sync,
{
    match label {
        Some(label) => Oaep::new_with_label::<D, _>(label),
        None => Oaep::new::<D>(),
    }
}
