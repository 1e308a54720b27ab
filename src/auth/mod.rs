// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Password accounts with stateless, cookie-borne sessions.
//!
//! ## Auth Flow
//!
//! 1. Client registers or logs in with email + password
//!    (or starts a demo session)
//! 2. Server verifies the password against its bcrypt digest
//! 3. Server signs an HS256 JWT with the session claims
//!    (`sub`, `email`, `displayName`, flags, `iat`, `exp`)
//! 4. Token is returned in the `auth_token` cookie
//!    (`HttpOnly`, `SameSite=Lax`, `Path=/`, 7 days, `Secure` in production)
//! 5. Every authenticated request:
//!    - reads the cookie
//!    - verifies signature and expiry
//!    - yields `AuthenticatedUser` or 401
//!
//! ## Security
//!
//! - There is no server-side session table; logout clears the cookie
//! - Tokens cannot be revoked before they expire
//! - No clock-skew leeway is granted on expiry

pub mod claims;
pub mod cookie;
pub mod error;
pub mod extractor;
pub mod password;
pub mod session;

pub use claims::{AuthenticatedUser, NewSession, SessionClaims, SessionVerdict, DEMO_FLAG};
pub use cookie::{CookieConfig, SESSION_COOKIE};
pub use error::AuthError;
pub use extractor::Auth;
pub use password::{PasswordError, PasswordHasher};
pub use session::{SessionCodec, SessionError, SESSION_TTL};
