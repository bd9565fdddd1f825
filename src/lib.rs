//! Sama POS: cash register and ticket inventory for a Wi-Fi kiosk.
//!
//! A single-location point of sale: walk-in client sessions, a prepaid
//! ticket ledger with an append-only history, cash expenses, and frozen
//! end-of-day reports, all persisted to a local SQLite database. One
//! operator, one process, everything synchronous.
//!
//! The [`Pos`] controller owns all state; hosts open it with a
//! [`PosConfig`] and drive it call by call:
//!
//! ```no_run
//! use sama_pos::{Pos, PosConfig};
//!
//! let mut pos = Pos::open(PosConfig::new("/var/lib/sama-pos"))?;
//! pos.login("/1/1/1", "//////")?;
//! # Ok::<(), sama_pos::PosError>(())
//! ```

use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod app;
pub mod auth;
pub mod clients;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod expenses;
pub mod export;
pub mod print;
pub mod reports;
pub mod tickets;

pub use app::{AddClientOutcome, Features, ImportSummary, Pos, PosConfig, DEFAULT_EMPLOYEE};
pub use clients::{ClientRecord, ClientUpdate, DurationKind, NewClient, PaymentStatus};
pub use error::PosError;
pub use expenses::{ExpenseCategory, ExpenseRecord, NewExpense};
pub use export::{Backup, ExportFile};
pub use reports::{DailyReport, DaySummary, ReportFilter, ReportSummary};
pub use tickets::{
    ConsumeOutcome, EntryKind, LedgerEntry, StockLevel, TicketCounter, TicketInventory, TicketType,
};

/// Initialize structured logging: console plus a daily-rolling file under
/// `{data_dir}/logs`. Call once at process start, before opening the
/// register.
pub fn init_logging(data_dir: &Path) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sama_pos=debug"));

    // Prune old log files before setting up the appender
    let log_dir = diagnostics::get_log_dir(data_dir);
    diagnostics::prune_old_logs(&log_dir);
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, diagnostics::LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Keep the guard alive for the lifetime of the process; dropping it
    // flushes and closes the file writer.
    std::mem::forget(guard);

    info!("Sama POS v{} logging initialized", env!("CARGO_PKG_VERSION"));
}
