//! Diagnostics for Sama POS.
//!
//! Provides:
//! - **About info**: version and platform.
//! - **Storage info**: schema version, database size, and the byte size of
//!   each persisted blob, for the settings screen.
//! - **Log rotation helpers**: used by `lib.rs` to configure rolling log
//!   files and prune old ones.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::warn;

use crate::db::{self, DbState};
use crate::error::PosError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of log files to retain.
pub const MAX_LOG_FILES: usize = 10;

/// File-name prefix for rolling log files.
pub const LOG_FILE_PREFIX: &str = "sama-pos";

// ---------------------------------------------------------------------------
// About info
// ---------------------------------------------------------------------------

/// Returns version and platform info for the about screen.
pub fn get_about_info() -> Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "rustVersion": env!("CARGO_PKG_RUST_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Storage info
// ---------------------------------------------------------------------------

/// Collects storage status: schema version, database file size, and the
/// stored byte size of every persisted blob.
pub fn get_storage_info(db: &DbState) -> Result<Value, PosError> {
    let conn = db
        .conn
        .lock()
        .map_err(|e| PosError::Storage(e.to_string()))?;

    let schema_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let mut blobs = json!({});
    if let Ok(mut stmt) = conn.prepare(
        "SELECT setting_key, LENGTH(setting_value) FROM local_settings
         WHERE setting_category = ?1 ORDER BY setting_key",
    ) {
        let rows = stmt
            .query_map([db::DATA_CATEGORY], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .ok();
        if let Some(rows) = rows {
            for row in rows.flatten() {
                let (key, bytes) = row;
                blobs[key] = json!(bytes);
            }
        }
    }

    let db_size = fs::metadata(&db.db_path).map(|m| m.len()).unwrap_or(0);

    Ok(json!({
        "schemaVersion": schema_version,
        "dbPath": db.db_path.to_string_lossy(),
        "dbSizeBytes": db_size,
        "blobSizes": blobs,
    }))
}

// ---------------------------------------------------------------------------
// Log rotation
// ---------------------------------------------------------------------------

/// Returns the log directory under the data directory (same location used
/// by `lib.rs` when wiring the rolling file appender).
pub fn get_log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

/// Prune old log files, keeping only the most recent `MAX_LOG_FILES`.
pub fn prune_old_logs(log_dir: &Path) {
    if !log_dir.exists() {
        return;
    }

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if name.starts_with(LOG_FILE_PREFIX) {
                        let modified = entry
                            .metadata()
                            .ok()
                            .and_then(|m| m.modified().ok())
                            .unwrap_or(std::time::UNIX_EPOCH);
                        log_files.push((path, modified));
                    }
                }
            }
        }
    }

    // Sort newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    // Remove files beyond the limit
    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to prune log file {}: {e}", path.display());
        }
    }
}
