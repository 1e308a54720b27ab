// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The `auth_token` session cookie.

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "auth_token";

/// Attributes of the session cookie.
///
/// `HttpOnly`, `SameSite=Lax` and `Path=/` are fixed; `Secure` is set in
/// production only so the cookie still works over plain HTTP locally.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub secure: bool,
    pub max_age_secs: i64,
}

impl CookieConfig {
    pub fn new(secure: bool, max_age_secs: i64) -> Self {
        Self {
            secure,
            max_age_secs,
        }
    }

    /// `Set-Cookie` value carrying a session token.
    pub fn build_set_cookie(&self, token: &str) -> String {
        let mut cookie = format!("{SESSION_COOKIE}={token}; HttpOnly");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite=Lax; Path=/; Max-Age={}", self.max_age_secs));
        cookie
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn build_delete_cookie(&self) -> String {
        let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax; Path=/; Max-Age=0");
        cookie
    }

    pub fn set_cookie_header(&self, token: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.build_set_cookie(token)).ok()
    }

    pub fn delete_cookie_header(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.build_delete_cookie()).ok()
    }
}

/// Extract a cookie value from request headers.
///
/// Looks through every `Cookie` header, since HTTP/2 clients may split them.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.trim().to_string())
        })
}
