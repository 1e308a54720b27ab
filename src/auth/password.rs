// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing with bcrypt.
//!
//! Digests are standard `$2b$` strings that carry their own salt and cost, so
//! verification needs nothing but the digest itself.

use crate::config::DEFAULT_BCRYPT_COST;

/// Failure to produce a digest (invalid cost or no entropy available).
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(#[from] bcrypt::BcryptError);

/// bcrypt hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    ///
    /// Any string is accepted, including the empty one. bcrypt only reads the
    /// first 72 bytes.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Check a password against a stored digest.
    ///
    /// Malformed digests verify as `false`.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        bcrypt::verify(password, digest).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let digest = hasher.hash("correct horse").unwrap();
        assert!(hasher.verify("correct horse", &digest));
        assert!(!hasher.verify("wrong horse", &digest));
    }

    #[test]
    fn salts_are_fresh() {
        let hasher = hasher();
        let a = hasher.hash("secret").unwrap();
        let b = hasher.hash("secret").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("secret", &a));
        assert!(hasher.verify("secret", &b));
    }

    #[test]
    fn empty_password_is_hashable() {
        let hasher = hasher();
        let digest = hasher.hash("").unwrap();
        assert!(hasher.verify("", &digest));
        assert!(!hasher.verify(" ", &digest));
    }

    #[test]
    fn digest_encodes_cost() {
        let digest = hasher().hash("pw").unwrap();
        assert!(digest.starts_with("$2b$04$"), "{digest}");
    }

    #[test]
    fn malformed_digest_is_false() {
        let hasher = hasher();
        assert!(!hasher.verify("pw", ""));
        assert!(!hasher.verify("pw", "not-a-bcrypt-hash"));
        assert!(!hasher.verify("pw", "$2b$04$short"));
    }

    #[test]
    fn invalid_cost_is_an_error() {
        assert!(PasswordHasher::new(2).hash("pw").is_err());
    }
}
