//! Error type for Sama POS.
//!
//! Operator-facing failures carry the exact message the register UI shows,
//! so callers can surface `Display` output directly without rewording.

use crate::tickets::TicketType;

#[derive(Debug, thiserror::Error)]
pub enum PosError {
    /// Rejected input. The message is ready for display.
    #[error("{0}")]
    Validation(String),

    /// A ticket sale was attempted with nothing left on the shelf.
    #[error("No {} tickets available!", .0.display_name())]
    OutOfStock(TicketType),

    /// Login or credential change failed.
    #[error("{0}")]
    Auth(String),

    /// The SQLite layer failed.
    #[error("storage: {0}")]
    Storage(String),
}

// ===========================================================================
// Tests
// ===========================================================================
