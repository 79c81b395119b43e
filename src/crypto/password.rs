//! Salted credential digests.
//!
//! The digest is SHA-256 over `salt || password` with the salt first; the
//! order is fixed system-wide and must match what `register` stored.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a fresh 16-byte salt, hex-encoded. Never reused across users.
#[must_use]
pub fn generate_salt() -> String {
    use rand::Rng;

    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Hex-encoded SHA-256 of `salt || password`.
#[must_use]
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recompute the digest and compare against the stored hash in constant time.
#[must_use]
pub fn verify_password(salt: &str, password: &str, stored_hash: &str) -> bool {
    let computed = hash_password(salt, password);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_matches_known_vector() {
        // SHA-256("abc") with an empty salt
        assert_eq!(
            hash_password("", "abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn salt_order_is_salt_first() {
        assert_ne!(hash_password("aa", "bb"), hash_password("bb", "aa"));
        // salt-first means salt "ab" + password "c" equals salt "a" + password "bc"
        // only because the concatenation is identical bytes
        assert_eq!(hash_password("ab", "c"), hash_password("a", "bc"));
    }

    #[test]
    fn verify_accepts_correct_and_rejects_wrong_password() {
        let salt = generate_salt();
        let hash = hash_password(&salt, "hunter2");

        assert!(verify_password(&salt, "hunter2", &hash));
        assert!(!verify_password(&salt, "hunter3", &hash));
        assert!(!verify_password("deadbeef", "hunter2", &hash));
    }

    #[test]
    fn salts_are_unique_and_sized() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
