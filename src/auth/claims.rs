// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session claims and the authenticated user representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::storage::StoredUser;

/// Flag carried by demo sessions.
pub const DEMO_FLAG: &str = "isDemo";

/// Identity facts to put in a new session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    /// Arbitrary boolean flags, e.g. `isDemo`.
    pub flags: BTreeMap<String, bool>,
}

impl NewSession {
    pub fn for_user(user: &StoredUser) -> Self {
        let mut flags = BTreeMap::new();
        if user.is_demo {
            flags.insert(DEMO_FLAG.to_string(), true);
        }
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            flags,
        }
    }
}

/// Claims encoded in the `auth_token` JWT.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub display_name: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds); always `iat` + session TTL.
    pub exp: i64,
    #[serde(flatten)]
    pub flags: BTreeMap<String, bool>,
}

impl SessionClaims {
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

/// Result of verifying a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionVerdict {
    Valid(SessionClaims),
    /// Empty, malformed, forged or expired. The cause is deliberately not
    /// distinguished.
    Invalid,
}

impl SessionVerdict {
    pub fn into_claims(self) -> Option<SessionClaims> {
        match self {
            SessionVerdict::Valid(claims) => Some(claims),
            SessionVerdict::Invalid => None,
        }
    }
}

/// Authenticated user resolved from a valid session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub is_demo: bool,
    /// Session expiry (Unix seconds)
    pub expires_at: i64,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        let is_demo = claims.flag(DEMO_FLAG);
        Self {
            user_id: claims.sub,
            email: claims.email,
            display_name: claims.display_name,
            is_demo,
            expires_at: claims.exp,
        }
    }
}
