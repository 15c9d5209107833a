//! Password hashing.
//!
//! A credential is `salt (16 bytes) ++ PBKDF2-HMAC-SHA256(password, salt)
//! (32 bytes)`, stored as one standard-base64 string. The plaintext is never
//! kept.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{AuthError, AuthResult};

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

/// Key-derivation rounds. The blob does not record them, so every stored
/// credential is derived and checked with this count.
pub const ITERATIONS: u32 = 100_000;

/// Decoded form of a stored credential blob.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    salt: [u8; SALT_LEN],
    derived_key: [u8; KEY_LEN],
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").finish_non_exhaustive()
    }
}

impl Credential {
    /// Derive a credential for `password` with a caller-chosen salt.
    pub fn derive(password: &str, salt: [u8; SALT_LEN], iterations: u32) -> Self {
        Self {
            salt,
            derived_key: derive_key(password, &salt, iterations),
        }
    }

    /// Derive a credential with a fresh random salt.
    pub fn generate(password: &str, iterations: u32) -> AuthResult<Self> {
        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|err| AuthError::Failed(format!("random source unavailable: {err}")))?;
        Ok(Self::derive(password, salt, iterations))
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// `base64(salt ++ derived_key)`
    pub fn encode(&self) -> String {
        let mut combined = Vec::with_capacity(SALT_LEN + KEY_LEN);
        combined.extend_from_slice(&self.salt);
        combined.extend_from_slice(&self.derived_key);
        STANDARD.encode(combined)
    }

    /// Parse a stored blob; anything but exactly 48 decoded bytes is rejected.
    pub fn decode(blob: &str) -> Option<Self> {
        let bytes = STANDARD.decode(blob.trim()).ok()?;
        if bytes.len() != SALT_LEN + KEY_LEN {
            return None;
        }
        let (salt_bytes, key_bytes) = bytes.split_at(SALT_LEN);
        let salt: [u8; SALT_LEN] = salt_bytes.try_into().ok()?;
        let derived_key: [u8; KEY_LEN] = key_bytes.try_into().ok()?;
        Some(Self { salt, derived_key })
    }

    /// Recompute with this credential's salt and compare every byte.
    pub fn matches(&self, password: &str, iterations: u32) -> bool {
        let attempt = derive_key(password, &self.salt, iterations);
        constant_time_eq(&attempt, &self.derived_key)
    }
}

pub fn hash_password(password: &str) -> AuthResult<String> {
    Ok(Credential::generate(password, ITERATIONS)?.encode())
}

/// Check a password against a stored blob. Malformed blobs never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match Credential::decode(stored) {
        Some(credential) => credential.matches(password, ITERATIONS),
        None => {
            tracing::debug!("stored credential could not be decoded");
            false
        }
    }
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let stored = hash_password("correct horse").expect("hash");
        assert!(verify_password("correct horse", &stored));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let stored = hash_password("correct horse").expect("hash");
        assert!(!verify_password("battery staple", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("repeat").expect("hash");
        let second = hash_password("repeat").expect("hash");
        assert_ne!(first, second);
        assert!(verify_password("repeat", &first));
        assert!(verify_password("repeat", &second));
    }

    #[test]
    fn blob_is_salt_then_key() {
        let salt = [7u8; SALT_LEN];
        let credential = Credential::derive("pw", salt, ITERATIONS);
        let decoded = STANDARD.decode(credential.encode()).expect("base64");
        assert_eq!(decoded.len(), SALT_LEN + KEY_LEN);
        assert_eq!(&decoded[..SALT_LEN], &salt);
        assert_eq!(Credential::decode(&credential.encode()), Some(credential));
    }

    #[test]
    fn derivation_is_deterministic_for_fixed_salt() {
        let salt = [42u8; SALT_LEN];
        let a = Credential::derive("pw", salt, ITERATIONS);
        let b = Credential::derive("pw", salt, ITERATIONS);
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn malformed_blobs_return_false() {
        assert!(!verify_password("pw", "not base64 !!"));
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", &STANDARD.encode([1u8; 20])));
        assert!(!verify_password("pw", &STANDARD.encode([1u8; 64])));
    }

    #[test]
    fn debug_output_hides_material() {
        let credential = Credential::derive("pw", [9u8; SALT_LEN], ITERATIONS);
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains('9'));
        assert_eq!(credential.salt(), &[9u8; SALT_LEN]);
    }
}
