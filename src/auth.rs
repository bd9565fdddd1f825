//! Operator login and credential management with bcrypt.
//!
//! One username/password pair guards the register. The username is stored
//! in plain text and the password as a bcrypt hash, both in the SQLite
//! `local_settings` table (category "auth", keys "username" /
//! "password_hash"); the first open seeds a built-in default pair. The
//! logged-in operator is kept in memory only, so every process start
//! begins logged out.

use rusqlite::Connection;
use tracing::{info, warn};

use crate::db;
use crate::error::PosError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Username seeded on first open.
pub const DEFAULT_USERNAME: &str = "/1/1/1";
/// Password seeded on first open.
pub const DEFAULT_PASSWORD: &str = "//////";

const MIN_PASSWORD_LEN: usize = 6;

const AUTH_CATEGORY: &str = "auth";
const USERNAME_KEY: &str = "username";
const PASSWORD_HASH_KEY: &str = "password_hash";

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Who is logged in right now, if anyone. In-memory only.
#[derive(Debug, Default)]
pub struct AuthSession {
    current: Option<String>,
}

impl AuthSession {
    pub fn current_user(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stored_username(conn: &Connection) -> Option<String> {
    db::get_setting(conn, AUTH_CATEGORY, USERNAME_KEY)
}

/// Verify `password` against the stored hash. Missing or unreadable hash
/// counts as a mismatch.
fn verify_password(conn: &Connection, password: &str) -> bool {
    match db::get_setting(conn, AUTH_CATEGORY, PASSWORD_HASH_KEY) {
        Some(hash) => bcrypt::verify(password, &hash).unwrap_or(false),
        None => false,
    }
}

fn store_password(conn: &Connection, password: &str) -> Result<(), PosError> {
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PosError::Storage(format!("failed to hash password: {e}")))?;
    db::set_setting(conn, AUTH_CATEGORY, PASSWORD_HASH_KEY, &hash)
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Seed the default username/password pair if none is stored yet.
/// Never overwrites credentials the operator has changed.
pub fn ensure_default_credentials(conn: &Connection) -> Result<(), PosError> {
    if stored_username(conn).is_none() {
        db::set_setting(conn, AUTH_CATEGORY, USERNAME_KEY, DEFAULT_USERNAME)?;
        info!("Seeded default operator username");
    }
    if db::get_setting(conn, AUTH_CATEGORY, PASSWORD_HASH_KEY).is_none() {
        store_password(conn, DEFAULT_PASSWORD)?;
        info!("Seeded default operator password");
    }
    Ok(())
}

/// Verify a username/password pair and open a session.
///
/// The username is trimmed before comparison; the password is not.
pub fn login(
    conn: &Connection,
    session: &mut AuthSession,
    username: &str,
    password: &str,
) -> Result<(), PosError> {
    let username = username.trim();
    let matches = stored_username(conn).as_deref() == Some(username)
        && verify_password(conn, password);
    if !matches {
        warn!(username = %username, "Rejected login attempt");
        return Err(PosError::Auth("Invalid username or password!".into()));
    }

    session.current = Some(username.to_string());
    info!(username = %username, "Operator logged in");
    Ok(())
}

/// Close the current session, if any.
pub fn logout(session: &mut AuthSession) {
    if let Some(user) = session.current.take() {
        info!(username = %user, "Operator logged out");
    }
}

/// Replace the stored credentials after re-validating the current password.
///
/// A blank new username keeps the current one. On success the session is
/// closed so the operator logs back in with the new pair.
pub fn change_credentials(
    conn: &Connection,
    session: &mut AuthSession,
    current_password: &str,
    new_username: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<(), PosError> {
    if !verify_password(conn, current_password) {
        return Err(PosError::Auth("Current password is incorrect!".into()));
    }
    if new_password.len() < MIN_PASSWORD_LEN {
        return Err(PosError::Validation(
            "New password must be at least 6 characters!".into(),
        ));
    }
    if new_password != confirm_password {
        return Err(PosError::Validation("New passwords do not match!".into()));
    }

    let new_username = new_username.trim();
    if !new_username.is_empty() {
        db::set_setting(conn, AUTH_CATEGORY, USERNAME_KEY, new_username)?;
    }
    store_password(conn, new_password)?;

    info!("Operator credentials updated");
    logout(session);
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
