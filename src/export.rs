//! Outbound exports and backup import parsing.
//!
//! Two export formats leave the register: a ticket-inventory CSV for the
//! day's stock counts, and a full JSON backup bundling every persisted
//! store. Both are returned as in-memory files; the caller decides where
//! to write them. The backup format is also what import accepts, with
//! every section optional so partial files restore what they carry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clients::ClientRecord;
use crate::error::PosError;
use crate::expenses::ExpenseRecord;
use crate::reports::DailyReport;
use crate::tickets::{TicketInventory, TicketType};

/// A generated file, ready for the caller to save wherever it wants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

// ---------------------------------------------------------------------------
// Ticket CSV
// ---------------------------------------------------------------------------

/// Render the ticket counters as CSV: one quoted row per type, a blank
/// line, then a TOTAL row summing the three counters.
pub fn inventory_csv(inventory: &TicketInventory, today: NaiveDate) -> ExportFile {
    let mut csv =
        String::from("Ticket Type,Price (SSP),Available,Used Today,Total Used All Time\n");

    for ticket_type in TicketType::ALL {
        let counter = inventory.counter(ticket_type);
        csv.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\n",
            ticket_type.display_name(),
            ticket_type.price(),
            counter.available,
            counter.used_today,
            counter.total_used
        ));
    }

    csv.push_str(&format!(
        "\n\"TOTAL\",\"\",\"{}\",\"{}\",\"{}\"\n",
        inventory.total_available(),
        inventory.total_used_today(),
        inventory.total_used_all_time()
    ));

    ExportFile {
        filename: format!("ticket-report-{today}.csv"),
        contents: csv,
    }
}

// ---------------------------------------------------------------------------
// JSON backup
// ---------------------------------------------------------------------------

/// The full-backup payload. Every section is optional on the way in so a
/// partial or hand-trimmed file still imports what it carries; `capture`
/// fills every section on the way out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Backup {
    pub export_date: Option<DateTime<Utc>>,
    pub exported_by: Option<String>,
    pub clients: Option<Vec<ClientRecord>>,
    pub expenses: Option<Vec<ExpenseRecord>>,
    pub daily_reports: Option<Vec<DailyReport>>,
    pub ticket_inventory: Option<TicketInventory>,
    pub employee_name: Option<String>,
}

impl Backup {
    /// Snapshot the full register state for export. The operator name is
    /// both the `exportedBy` stamp and the restorable `employeeName` blob.
    pub fn capture(
        clients: &[ClientRecord],
        expenses: &[ExpenseRecord],
        daily_reports: &[DailyReport],
        inventory: &TicketInventory,
        employee_name: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            export_date: Some(now),
            exported_by: Some(employee_name.to_string()),
            clients: Some(clients.to_vec()),
            expenses: Some(expenses.to_vec()),
            daily_reports: Some(daily_reports.to_vec()),
            ticket_inventory: Some(inventory.clone()),
            employee_name: Some(employee_name.to_string()),
        }
    }
}

/// Serialize a captured backup into its downloadable file.
pub fn backup_json(backup: &Backup, now: DateTime<Utc>) -> Result<ExportFile, PosError> {
    let contents = serde_json::to_string_pretty(backup)
        .map_err(|e| PosError::Storage(format!("failed to serialize backup: {e}")))?;
    Ok(ExportFile {
        filename: format!("sama-wifi-backup-{}.json", now.date_naive()),
        contents,
    })
}

/// Parse a backup file. Unknown keys are ignored and missing sections come
/// back as `None`; anything that is not a backup-shaped JSON object fails.
pub fn parse_backup(json: &str) -> Result<Backup, PosError> {
    serde_json::from_str(json).map_err(|e| {
        warn!(error = %e, "Backup parse failed");
        PosError::Validation("Error importing data. Please check the file format.".into())
    })
}

// ===========================================================================
// Tests
// ===========================================================================
