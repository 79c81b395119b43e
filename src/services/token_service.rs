//! Session token issuance and validation.
//!
//! Two independent, mandatory layers: an HS256 signature over the claim set
//! (integrity) and an asymmetric envelope seal (confidentiality, see
//! `crypto::envelope`). Decoding reverses them in order and reports each
//! failure mode distinctly. Token contents are never logged.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::envelope::Envelope;
use crate::models::Role;

/// Claim set embedded in every session token. The role level is a snapshot
/// taken at issuance; callers re-resolve the live user at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal (user) id.
    pub sub: i32,
    /// Role level at issuance.
    pub role: i32,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("missing token")]
    Missing,
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
    #[error("token cannot be decrypted")]
    DecryptionFailed,
    #[error("failed to issue token")]
    Issue,
}

pub struct TokenService {
    signing_secret: String,
    envelope: Envelope,
    ttl_hours: i64,
}

impl TokenService {
    #[must_use]
    pub const fn new(signing_secret: String, envelope: Envelope, ttl_hours: i64) -> Self {
        Self {
            signing_secret,
            envelope,
            ttl_hours,
        }
    }

    pub fn issue(&self, user_id: i32, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role: role.level(),
            iat: now,
            exp: now + self.ttl_hours * 3600,
        };

        let signed = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.signing_secret.as_bytes()),
        )
        .map_err(|_| TokenError::Issue)?;

        self.envelope
            .seal(signed.as_bytes())
            .map_err(|_| TokenError::Issue)
    }

    /// Unseal, then verify signature and expiry. `DecryptionFailed` points at
    /// key material (an operational problem); `Expired` and `Invalid` are
    /// ordinary client-facing outcomes.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let signed = self
            .envelope
            .open(token)
            .map_err(|_| TokenError::DecryptionFailed)?;
        let signed = std::str::from_utf8(&signed).map_err(|_| TokenError::Invalid)?;

        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(
            signed,
            &DecodingKey::from_secret(self.signing_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_gcm::aead::OsRng;
    use rsa::RsaPrivateKey;

    const SECRET: &str = "test-secret-key-minimum-32-characters-long";

    fn test_key() -> RsaPrivateKey {
        RsaPrivateKey::new(&mut OsRng, 1024).unwrap()
    }

    fn service_with(secret: &str, key: RsaPrivateKey, ttl_hours: i64) -> TokenService {
        TokenService::new(secret.to_string(), Envelope::new(key), ttl_hours)
    }

    #[test]
    fn round_trip_recovers_principal_and_role() {
        let service = service_with(SECRET, test_key(), 24);

        let token = service.issue(42, Role::DepartmentHead).unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::DepartmentHead.level());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        // negative TTL puts exp in the past, beyond the default leeway
        let service = service_with(SECRET, test_key(), -1);

        let token = service.issue(1, Role::Officer).unwrap();
        assert_eq!(service.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn different_signing_secret_is_invalid_not_decryption_failed() {
        let key = test_key();
        let issuer = service_with(SECRET, key.clone(), 24);
        let verifier = service_with("another-secret-also-32-characters!!", key, 24);

        let token = issuer.issue(1, Role::Officer).unwrap();
        assert_eq!(verifier.decode(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn different_envelope_key_is_decryption_failed() {
        let issuer = service_with(SECRET, test_key(), 24);
        let verifier = service_with(SECRET, test_key(), 24);

        let token = issuer.issue(1, Role::Officer).unwrap();
        assert_eq!(verifier.decode(&token), Err(TokenError::DecryptionFailed));
    }

    #[test]
    fn garbage_token_is_decryption_failed() {
        let service = service_with(SECRET, test_key(), 24);
        assert_eq!(service.decode("not-a-token"), Err(TokenError::DecryptionFailed));
    }

    #[test]
    fn token_is_opaque_not_a_bare_jwt() {
        let service = service_with(SECRET, test_key(), 24);
        let token = service.issue(7, Role::CommandCenter).unwrap();

        // A bare JWT would have two dots and a decodable header
        assert!(!token.starts_with("eyJ"));
    }
}
