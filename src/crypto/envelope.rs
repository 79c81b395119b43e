//! Asymmetric confidentiality layer for session tokens.
//!
//! A signed token is sealed so that only the holder of the server private key
//! can recover it: a fresh AES-256-GCM key encrypts the token body and
//! RSA-OAEP(SHA-256) under the server public key wraps that key. OAEP alone
//! cannot carry a full token, hence the hybrid construction.
//!
//! Wire format, base64url without padding:
//! `u16-be wrapped-key length || wrapped key || 12-byte nonce || ciphertext`.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::path::Path;
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("failed to seal envelope")]
    Seal,
    #[error("envelope cannot be opened with this key")]
    Open,
}

/// Server key pair used to seal and unseal tokens. The private key never
/// leaves the process; clients only ever see sealed bytes.
pub struct Envelope {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl Envelope {
    #[must_use]
    pub fn new(private_key: RsaPrivateKey) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    /// Load the server private key from a PEM file (PKCS#8, falling back to
    /// PKCS#1). Missing or unparsable key material is a startup failure.
    pub fn from_pem_file(path: &Path) -> anyhow::Result<Self> {
        let pem = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read private key: {}", path.display()))?;

        let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
            .with_context(|| format!("Failed to parse RSA private key: {}", path.display()))?;

        Ok(Self::new(private_key))
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String, EnvelopeError> {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        let cipher = Aes256Gcm::new(&key);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| EnvelopeError::Seal)?;

        let wrapped_key = self
            .public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_slice())
            .map_err(|_| EnvelopeError::Seal)?;

        let wrapped_len =
            u16::try_from(wrapped_key.len()).map_err(|_| EnvelopeError::Seal)?;

        let mut out = Vec::with_capacity(2 + wrapped_key.len() + NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&wrapped_len.to_be_bytes());
        out.extend_from_slice(&wrapped_key);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    pub fn open(&self, sealed: &str) -> Result<Vec<u8>, EnvelopeError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(sealed)
            .map_err(|_| EnvelopeError::Open)?;

        if bytes.len() < 2 {
            return Err(EnvelopeError::Open);
        }
        let wrapped_len = usize::from(u16::from_be_bytes([bytes[0], bytes[1]]));
        let rest = &bytes[2..];

        if rest.len() < wrapped_len + NONCE_LEN {
            return Err(EnvelopeError::Open);
        }
        let (wrapped_key, rest) = rest.split_at(wrapped_len);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

        let key_bytes = self
            .private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped_key)
            .map_err(|_| EnvelopeError::Open)?;

        let cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|_| EnvelopeError::Open)?;
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| EnvelopeError::Open)
    }
}

/// Generate a fresh 2048-bit key pair. Used by the `keygen` subcommand; key
/// distribution beyond writing the PEM file is out of scope.
pub fn generate_private_key() -> anyhow::Result<RsaPrivateKey> {
    RsaPrivateKey::new(&mut OsRng, 2048).context("Failed to generate RSA key pair")
}

/// Write a private key as PKCS#8 PEM, creating parent directories as needed.
pub fn write_private_key_pem(key: &RsaPrivateKey, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .context("Failed to encode private key")?;
    std::fs::write(path, pem.as_bytes())
        .with_context(|| format!("Failed to write private key: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_envelope() -> Envelope {
        // 1024-bit keys keep key generation fast in tests
        let key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        Envelope::new(key)
    }

    #[test]
    fn seal_open_round_trip() {
        let envelope = test_envelope();
        let sealed = envelope.seal(b"claims go here").unwrap();

        assert_eq!(envelope.open(&sealed).unwrap(), b"claims go here");
    }

    #[test]
    fn sealing_is_randomized() {
        let envelope = test_envelope();
        let a = envelope.seal(b"same plaintext").unwrap();
        let b = envelope.seal(b"same plaintext").unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_cannot_open() {
        let sealed = test_envelope().seal(b"secret").unwrap();
        let other = test_envelope();

        assert!(matches!(other.open(&sealed), Err(EnvelopeError::Open)));
    }

    #[test]
    fn truncated_or_garbage_input_is_rejected() {
        let envelope = test_envelope();

        assert!(envelope.open("").is_err());
        assert!(envelope.open("not base64 !!!").is_err());

        let sealed = envelope.seal(b"secret").unwrap();
        let truncated = &sealed[..sealed.len() / 2];
        assert!(envelope.open(truncated).is_err());
    }

    #[test]
    fn seals_payloads_larger_than_one_rsa_block() {
        let envelope = test_envelope();
        let big = vec![b'x'; 4096];

        let sealed = envelope.seal(&big).unwrap();
        assert_eq!(envelope.open(&sealed).unwrap(), big);
    }
}
