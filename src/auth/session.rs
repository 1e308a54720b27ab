// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token codec (HS256 JWT).
//!
//! The token is the whole session: there is no server-side session table.
//! Tokens cannot be revoked before they expire; logout only clears the
//! client's cookie.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{NewSession, SessionClaims, SessionVerdict};

/// Lifetime of a session token (7 days).
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Failure to sign a token.
#[derive(Debug, thiserror::Error)]
#[error("failed to sign session token: {0}")]
pub struct SessionError(#[from] jsonwebtoken::errors::Error);

/// Signs and verifies session tokens with a server-held secret.
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: SESSION_TTL.as_secs() as i64,
        }
    }

    /// Session lifetime in seconds (also the cookie `Max-Age`).
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a new session issued now.
    pub fn sign(&self, session: &NewSession) -> Result<String, SessionError> {
        self.sign_at(session, Utc::now().timestamp())
    }

    /// Sign a session as if issued at `issued_at` (Unix seconds).
    pub fn sign_at(&self, session: &NewSession, issued_at: i64) -> Result<String, SessionError> {
        let claims = SessionClaims {
            sub: session.user_id.clone(),
            email: session.email.clone(),
            display_name: session.display_name.clone(),
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
            flags: session.flags.clone(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify a token's signature and expiry.
    ///
    /// Never fails: every kind of bad token is `SessionVerdict::Invalid`.
    pub fn verify(&self, token: &str) -> SessionVerdict {
        if token.is_empty() {
            return SessionVerdict::Invalid;
        }
        match decode::<SessionClaims>(token, &self.decoding, &self.validation) {
            Ok(data) if data.claims.exp > data.claims.iat => SessionVerdict::Valid(data.claims),
            Ok(_) => SessionVerdict::Invalid,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                SessionVerdict::Invalid
            }
        }
    }
}
