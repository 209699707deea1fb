//! # JSON Web Tokens
//!
//! Token generation and validation over `jsonwebtoken`.
//!
//! | Algorithm family | Key source | Constructor |
//! |------------------|------------|-------------|
//! | HS256 / HS384 / HS512 | shared secret bytes | [`TokenHandler::new`] |
//! | RS256 / RS384 / RS512 / PS256 / PS384 / PS512 | [`KeyPair`] | [`TokenHandler::from_key_pair`] |
//!
//! Validation checks the signature, the algorithm and `exp`. Claims types
//! are the caller's; anything `Serialize`/`Deserialize` works.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crypto::KeyPair;
use crate::error::{Error, Result};

/// Signs and validates tokens with one algorithm and key
pub struct TokenHandler {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenHandler {
    /// Handler for an HMAC algorithm with a shared secret
    pub fn new(algorithm: Algorithm, secret: &[u8]) -> Result<Self> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(Error::InvalidArgument(format!(
                "{:?} is not an HMAC algorithm",
                algorithm
            )));
        }
        if secret.is_empty() {
            return Err(Error::InvalidArgument("HMAC secret must not be empty".into()));
        }

        Ok(Self::with_keys(
            algorithm,
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
        ))
    }

    /// Handler for an RSA algorithm (PKCS#1 v1.5 or PSS) with a key pair
    pub fn from_key_pair(algorithm: Algorithm, key_pair: &KeyPair) -> Result<Self> {
        if !matches!(
            algorithm,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        ) {
            return Err(Error::InvalidArgument(format!(
                "{:?} is not an RSA algorithm",
                algorithm
            )));
        }

        let private_der = key_pair.to_pkcs1_der()?;
        let public_der = key_pair.public_key().to_pkcs1_der()?;

        Ok(Self::with_keys(
            algorithm,
            EncodingKey::from_rsa_der(&private_der),
            DecodingKey::from_rsa_der(&public_der),
        ))
    }

    fn with_keys(algorithm: Algorithm, encoding_key: EncodingKey, decoding_key: DecodingKey) -> Self {
        Self {
            algorithm,
            encoding_key,
            decoding_key,
            validation: Validation::new(algorithm),
        }
    }

    /// Algorithm used for signing and required on validation
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Adjust validation rules (leeway, audience, issuer, required claims)
    pub fn validation_mut(&mut self) -> &mut Validation {
        &mut self.validation
    }

    /// Sign `claims` into a compact token
    pub fn generate<C: Serialize>(&self, claims: &C) -> Result<String> {
        let token = encode(&Header::new(self.algorithm), claims, &self.encoding_key)?;
        tracing::debug!("Generated {:?} token", self.algorithm);
        Ok(token)
    }

    /// Check a token's signature and claims, returning its contents
    pub fn validate<C: DeserializeOwned>(&self, token: &str) -> Result<TokenData<C>> {
        Ok(decode::<C>(token, &self.decoding_key, &self.validation)?)
    }
}

impl std::fmt::Debug for TokenHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHandler")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::fixtures::{OTHER_KEY, TEST_KEY};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Claims {
        sub: String,
        role: String,
        exp: u64,
    }

    fn claims(ttl: i64) -> Claims {
        let now = jsonwebtoken::get_current_timestamp();
        Claims {
            sub: "user-42".into(),
            role: "admin".into(),
            exp: now.saturating_add_signed(ttl),
        }
    }

    fn tamper(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut signature = signature.to_string();
        let replacement = if signature.starts_with('A') { "B" } else { "A" };
        signature.replace_range(0..1, replacement);
        format!("{}.{}", head, signature)
    }

    #[test]
    fn test_hmac_round_trip() {
        let handler = TokenHandler::new(Algorithm::HS256, b"correct horse battery staple").unwrap();
        let original = claims(3600);

        let token = handler.generate(&original).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let data = handler.validate::<Claims>(&token).unwrap();
        assert_eq!(data.claims, original);
        assert_eq!(data.header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_hmac_wrong_secret_rejected() {
        let a = TokenHandler::new(Algorithm::HS512, b"secret-a").unwrap();
        let b = TokenHandler::new(Algorithm::HS512, b"secret-b").unwrap();

        let token = a.generate(&claims(3600)).unwrap();
        assert!(matches!(b.validate::<Claims>(&token), Err(Error::Token(_))));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let handler = TokenHandler::new(Algorithm::HS256, b"secret").unwrap();
        let token = handler.generate(&claims(3600)).unwrap();
        assert!(handler.validate::<Claims>(&tamper(&token)).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let handler = TokenHandler::new(Algorithm::HS256, b"secret").unwrap();
        let token = handler.generate(&claims(-3600)).unwrap();
        assert!(matches!(handler.validate::<Claims>(&token), Err(Error::Token(_))));
    }

    #[test]
    fn test_rsa_round_trip() {
        for algorithm in [Algorithm::RS256, Algorithm::PS256] {
            let handler = TokenHandler::from_key_pair(algorithm, &TEST_KEY).unwrap();
            let token = handler.generate(&claims(600)).unwrap();
            let data = handler.validate::<Claims>(&token).unwrap();
            assert_eq!(data.claims.sub, "user-42");
            assert!(handler.validate::<Claims>(&tamper(&token)).is_err());
        }
    }

    #[test]
    fn test_rsa_wrong_key_rejected() {
        let signer = TokenHandler::from_key_pair(Algorithm::RS256, &TEST_KEY).unwrap();
        let other = TokenHandler::from_key_pair(Algorithm::RS256, &OTHER_KEY).unwrap();

        let token = signer.generate(&claims(600)).unwrap();
        assert!(other.validate::<Claims>(&token).is_err());
    }

    #[test]
    fn test_algorithm_family_checked() {
        assert!(matches!(
            TokenHandler::new(Algorithm::RS256, b"secret"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            TokenHandler::from_key_pair(Algorithm::HS256, &TEST_KEY),
            Err(Error::InvalidArgument(_))
        ));
        assert!(TokenHandler::new(Algorithm::HS384, b"").is_err());
    }
}
