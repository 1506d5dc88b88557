#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Admin gate for the editorial API.
//!
//! The admin password is never stored; only its SHA-256 hex digest is
//! configured. A successful login issues an opaque bearer token that
//! expires after a fixed number of hours.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default session lifetime in hours.
pub const DEFAULT_SESSION_HOURS: u32 = 8;

/// Errors from the admin gate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer` header was sent.
    #[error("Missing bearer token")]
    MissingToken,

    /// The token is unknown or expired.
    #[error("Invalid or expired session")]
    InvalidToken,
}

/// Returns the lowercase hex SHA-256 digest of `password`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Checks `password` against a hex digest (case-insensitive).
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    hash_password(password) == hash.trim().to_ascii_lowercase()
}

/// Extracts the token from an `Authorization` header value.
///
/// # Errors
///
/// Returns [`AuthError::MissingToken`] if the header is absent or not a
/// bearer credential.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// An issued admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    /// Opaque bearer token.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// In-memory registry of admin sessions.
#[derive(Debug)]
pub struct AdminSessions {
    password_hash: Option<String>,
    ttl: Duration,
    sessions: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl AdminSessions {
    /// Creates a registry. With `password_hash` unset every login is
    /// refused.
    #[must_use]
    pub fn new(password_hash: Option<String>, session_hours: u32) -> Self {
        if password_hash.is_none() {
            log::warn!("ADMIN_PASSWORD_HASH is not set; admin login is disabled");
        }

        Self {
            password_hash: password_hash.map(|h| h.trim().to_ascii_lowercase()),
            ttl: Duration::hours(i64::from(session_hours)),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Whether an admin password is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Issues a session if `password` matches the configured hash.
    #[must_use]
    pub fn login(&self, password: &str) -> Option<SessionToken> {
        self.login_at(password, Utc::now())
    }

    /// [`Self::login`] with an explicit clock.
    #[must_use]
    pub fn login_at(&self, password: &str, now: DateTime<Utc>) -> Option<SessionToken> {
        let Some(hash) = &self.password_hash else {
            log::warn!("Admin login refused: no password hash configured");
            return None;
        };

        if !verify_password(password, hash) {
            log::info!("Admin login failed: wrong password");
            return None;
        }

        let token = uuid::Uuid::new_v4().to_string();
        let expires_at = now + self.ttl;
        {
            let mut sessions = self.lock();
            sessions.retain(|_, exp| *exp > now);
            sessions.insert(token.clone(), expires_at);
        }
        log::info!("Admin session issued, expires {expires_at}");

        Some(SessionToken { token, expires_at })
    }

    /// Whether `token` is a live session. Expired tokens are removed.
    #[must_use]
    pub fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now())
    }

    /// [`Self::validate`] with an explicit clock.
    #[must_use]
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        let mut sessions = self.lock();
        match sessions.get(token) {
            Some(expires_at) if *expires_at > now => true,
            Some(_) => {
                sessions.remove(token);
                log::debug!("Admin session expired");
                false
            }
            None => false,
        }
    }

    /// Checks an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the header carries no token or the token
    /// is not a live session.
    pub fn authorize(&self, header: Option<&str>) -> Result<(), AuthError> {
        let token = bearer_token(header)?;
        if self.validate(token) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    /// Revokes `token`. Returns whether it was live.
    pub fn logout(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
