//! # Passwords
//!
//! Salted, iterated SHA-256. The stored form is `base64(salt)$base64(hash)`;
//! verification recomputes the hash and compares in constant time.

use crate::validation::ValidationErrors;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Hash rounds applied after the salted first round.
pub const ITERATIONS: u32 = 10_000;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 10;

/// Hash `password` with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    encode(&salt, &derive(&salt, password))
}

/// Check `password` against a stored hash. Malformed stored values never match.
#[must_use]
pub fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt_b64, hash_b64)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt_b64), STANDARD.decode(hash_b64)) else {
        return false;
    };
    let actual = derive(&salt, password);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

/// Password rules applied at registration. Errors are keyed by rule code.
pub fn check_policy(password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "PasswordTooShort",
            format!("Passwords must be at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.add(
            "PasswordRequiresDigit",
            "Passwords must have at least one digit ('0'-'9').",
        );
    }
    errors.into_result()
}

fn derive(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut digest: [u8; 32] = hasher.finalize().into();

    for _ in 0..ITERATIONS {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        hasher.update(salt);
        digest = hasher.finalize().into();
    }
    digest
}

fn encode(salt: &[u8], hash: &[u8]) -> String {
    format!("{}${}", STANDARD.encode(salt), STANDARD.encode(hash))
}
