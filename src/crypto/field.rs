//! At-rest encryption for the incident description column.
//!
//! Stored form is base64(nonce || ciphertext) under a 32-byte key from
//! configuration. The plaintext never reaches the database.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum FieldCipherError {
    #[error("data key must be 32 bytes of hex")]
    BadKey,
    #[error("encryption failed")]
    Encrypt,
    #[error("stored ciphertext is corrupt or keyed differently")]
    Decrypt,
}

#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    pub fn from_hex_key(key_hex: &str) -> Result<Self, FieldCipherError> {
        let key_bytes = hex::decode(key_hex).map_err(|_| FieldCipherError::BadKey)?;
        let cipher =
            Aes256Gcm::new_from_slice(&key_bytes).map_err(|_| FieldCipherError::BadKey)?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, FieldCipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| FieldCipherError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt(&self, stored: &str) -> Result<String, FieldCipherError> {
        let bytes = STANDARD
            .decode(stored)
            .map_err(|_| FieldCipherError::Decrypt)?;
        if bytes.len() < NONCE_LEN {
            return Err(FieldCipherError::Decrypt);
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| FieldCipherError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| FieldCipherError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn round_trip() {
        let cipher = FieldCipher::from_hex_key(KEY).unwrap();
        let stored = cipher.encrypt("runway incursion at 14L").unwrap();

        assert_ne!(stored, "runway incursion at 14L");
        assert_eq!(cipher.decrypt(&stored).unwrap(), "runway incursion at 14L");
    }

    #[test]
    fn rejects_short_key() {
        assert!(FieldCipher::from_hex_key("deadbeef").is_err());
    }

    #[test]
    fn different_key_cannot_decrypt() {
        let a = FieldCipher::from_hex_key(KEY).unwrap();
        let b = FieldCipher::from_hex_key(
            "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        )
        .unwrap();

        let stored = a.encrypt("confidential").unwrap();
        assert!(b.decrypt(&stored).is_err());
    }
}
