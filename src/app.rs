//! Register controller for Sama POS.
//!
//! `Pos` owns the database handle and every piece of in-memory state: the
//! session list, the expense list, the saved daily reports, the ticket
//! ledger, the operator display name, and the login session. Nothing lives
//! in a global. Every public operation validates its input, mutates the
//! in-memory state, persists the touched blobs synchronously, then returns
//! a typed outcome.
//!
//! Persistence is a full-blob overwrite per save. A write failure is
//! surfaced and logged but the in-memory change is not rolled back; the
//! next successful save reconciles storage.

use std::path::PathBuf;
use std::sync::MutexGuard;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::{self, AuthSession};
use crate::clients::{self, ClientRecord, ClientUpdate, DurationKind, NewClient, PaymentStatus};
use crate::db::{self, DbState};
use crate::diagnostics;
use crate::error::PosError;
use crate::expenses::{ExpenseRecord, NewExpense};
use crate::export::{self, Backup, ExportFile};
use crate::print;
use crate::reports::{self, DailyReport, DaySummary, ReportFilter};
use crate::tickets::{ConsumeOutcome, LedgerEntry, StockLevel, TicketInventory, TicketType};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Operator display name stamped into records until one is set.
pub const DEFAULT_EMPLOYEE: &str = "Admin";

// Persisted blob keys, all under `db::DATA_CATEGORY`.
const CLIENTS_KEY: &str = "clients";
const EXPENSES_KEY: &str = "expenses";
const REPORTS_KEY: &str = "daily_reports";
const TICKETS_KEY: &str = "ticket_inventory";
const EMPLOYEE_KEY: &str = "employee_name";

// Day markers gating the used-today rollover.
const SYSTEM_CATEGORY: &str = "system";
const USAGE_RESET_KEY: &str = "last_usage_reset";
const DAILY_RESET_KEY: &str = "last_daily_reset";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Register behaviors that differ between deployments.
#[derive(Debug, Clone, Copy)]
pub struct Features {
    /// Allow sessions that never touch ticket stock.
    pub non_ticket_clients: bool,
    /// Expose manual stock adjustment and the reset operations.
    pub manual_adjustments: bool,
}

impl Default for Features {
    fn default() -> Self {
        Features {
            non_ticket_clients: true,
            manual_adjustments: true,
        }
    }
}

/// Open-time configuration for the register.
#[derive(Debug, Clone)]
pub struct PosConfig {
    /// Directory holding the database and log files.
    pub data_dir: PathBuf,
    pub features: Features,
}

impl PosConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        PosConfig {
            data_dir: data_dir.into(),
            features: Features::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of recording a session.
#[derive(Debug, Clone)]
pub struct AddClientOutcome {
    pub record: ClientRecord,
    /// Shelf state after the consumed ticket; `None` for custom-priced,
    /// non-ticket, and unbacked sessions.
    pub stock: Option<ConsumeOutcome>,
    /// The shelf was empty and the host chose to record the session anyway.
    pub unbacked: bool,
}

/// What a backup import actually restored. List sections carry the number
/// of records they replaced the store with; absent sections stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub clients: Option<usize>,
    pub expenses: Option<usize>,
    pub daily_reports: Option<usize>,
    pub ticket_inventory: bool,
    pub employee_name: bool,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// The register: all state, one owner.
pub struct Pos {
    db: DbState,
    features: Features,
    employee_name: String,
    clients: Vec<ClientRecord>,
    expenses: Vec<ExpenseRecord>,
    daily_reports: Vec<DailyReport>,
    inventory: TicketInventory,
    session: AuthSession,
}

fn lock_conn(db: &DbState) -> Result<MutexGuard<'_, Connection>, PosError> {
    db.conn
        .lock()
        .map_err(|e| PosError::Storage(format!("database lock: {e}")))
}

fn read_day_marker(conn: &Connection, key: &str) -> Option<NaiveDate> {
    db::get_setting(conn, SYSTEM_CATEGORY, key)?.parse().ok()
}

impl Pos {
    /// Open the register: initialize the database, seed default
    /// credentials, load every persisted blob, and run the day rollover.
    pub fn open(config: PosConfig) -> Result<Pos, PosError> {
        Self::open_at(config, Utc::now())
    }

    /// `open` with an explicit clock.
    pub fn open_at(config: PosConfig, now: DateTime<Utc>) -> Result<Pos, PosError> {
        let db = db::init(&config.data_dir)?;

        let (clients, expenses, daily_reports, inventory, employee_name) = {
            let conn = lock_conn(&db)?;
            auth::ensure_default_credentials(&conn)?;

            let clients: Vec<ClientRecord> = db::read_blob(&conn, CLIENTS_KEY).unwrap_or_default();
            let expenses: Vec<ExpenseRecord> =
                db::read_blob(&conn, EXPENSES_KEY).unwrap_or_default();
            let daily_reports: Vec<DailyReport> =
                db::read_blob(&conn, REPORTS_KEY).unwrap_or_default();
            let mut inventory: TicketInventory =
                db::read_blob(&conn, TICKETS_KEY).unwrap_or_default();
            inventory.normalize();
            let employee_name = db::get_setting(&conn, db::DATA_CATEGORY, EMPLOYEE_KEY)
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EMPLOYEE.to_string());

            (clients, expenses, daily_reports, inventory, employee_name)
        };

        let mut pos = Pos {
            db,
            features: config.features,
            employee_name,
            clients,
            expenses,
            daily_reports,
            inventory,
            session: AuthSession::default(),
        };
        pos.day_rollover(now)?;

        info!(
            clients = pos.clients.len(),
            expenses = pos.expenses.len(),
            reports = pos.daily_reports.len(),
            "Register opened"
        );
        Ok(pos)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn clients(&self) -> &[ClientRecord] {
        &self.clients
    }

    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn daily_reports(&self) -> &[DailyReport] {
        &self.daily_reports
    }

    pub fn inventory(&self) -> &TicketInventory {
        &self.inventory
    }

    pub fn employee_name(&self) -> &str {
        &self.employee_name
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn current_user(&self) -> Option<&str> {
        self.session.current_user()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// Database path, size, and per-blob byte counts.
    pub fn storage_info(&self) -> Result<Value, PosError> {
        diagnostics::get_storage_info(&self.db)
    }

    // -----------------------------------------------------------------------
    // Day rollover
    // -----------------------------------------------------------------------

    /// Zero `used_today` across the ledger on the first touch of a new day.
    ///
    /// Two persisted markers gate the reset: the ticket-usage marker and
    /// the general day marker. Either one being stale fires it, and each
    /// advances to today independently, so within one day every call is a
    /// no-op. Runs at open and before each ledger-touching operation; a
    /// host timer may also call it directly. Returns whether it fired.
    pub fn day_rollover(&mut self, now: DateTime<Utc>) -> Result<bool, PosError> {
        let today = now.date_naive();
        let (usage_marker, day_marker) = {
            let conn = lock_conn(&self.db)?;
            (
                read_day_marker(&conn, USAGE_RESET_KEY),
                read_day_marker(&conn, DAILY_RESET_KEY),
            )
        };

        let mut fired = false;
        if self.inventory.rollover_if_needed(usage_marker, today) {
            self.save_tickets()?;
            self.write_day_marker(USAGE_RESET_KEY, today)?;
            fired = true;
        }
        if self.inventory.rollover_if_needed(day_marker, today) {
            self.save_tickets()?;
            self.write_day_marker(DAILY_RESET_KEY, today)?;
            fired = true;
        }

        if fired {
            info!(%today, "Daily usage counters rolled over");
        }
        Ok(fired)
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Record a client session.
    ///
    /// Ticket-backed sessions consume one unit of stock before the record
    /// is appended. When the shelf is empty the call fails with the typed
    /// out-of-stock error; the host may confirm with the operator and
    /// re-submit with `allow_unbacked` to record the session without
    /// consuming stock.
    pub fn add_client(
        &mut self,
        input: NewClient,
        allow_unbacked: bool,
        now: DateTime<Utc>,
    ) -> Result<AddClientOutcome, PosError> {
        self.day_rollover(now)?;
        input.validate()?;
        if input.is_non_ticket && !self.features.non_ticket_clients {
            return Err(PosError::Validation(
                "Non-ticket clients are not enabled!".into(),
            ));
        }

        let mut stock = None;
        let mut unbacked = false;
        if let DurationKind::Ticket(ticket_type) = input.duration {
            if !input.is_non_ticket {
                match self.inventory.consume_one(
                    ticket_type,
                    input.name.trim(),
                    &self.employee_name,
                    now,
                ) {
                    Ok(outcome) => {
                        self.save_tickets()?;
                        match outcome.level {
                            StockLevel::Low(left) => {
                                warn!(ticket = ticket_type.key(), left, "Low ticket stock")
                            }
                            StockLevel::Out => {
                                warn!(ticket = ticket_type.key(), "Ticket stock exhausted")
                            }
                            StockLevel::Ok => {}
                        }
                        stock = Some(outcome);
                    }
                    Err(PosError::OutOfStock(_)) if allow_unbacked => {
                        warn!(
                            ticket = ticket_type.key(),
                            "Recording session without ticket backing"
                        );
                        unbacked = true;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let record = input.into_record(&self.employee_name, now);
        self.clients.push(record.clone());
        self.save_records()?;

        info!(client = %record.name, duration = record.duration.key(), "Session recorded");
        Ok(AddClientOutcome {
            record,
            stock,
            unbacked,
        })
    }

    /// Edit a session's name, phone, or payment status. Unknown ids are a
    /// silent no-op; returns whether a record was touched.
    pub fn update_client(&mut self, id: &str, update: ClientUpdate) -> Result<bool, PosError> {
        let Some(record) = self.clients.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        update.apply(record)?;
        self.save_records()?;
        Ok(true)
    }

    /// Delete a session, returning the removed record.
    ///
    /// A same-day ticket-backed session puts its unit back on the shelf
    /// and appends a `returned` ledger entry naming the deleted client.
    /// Older sessions, custom-priced and non-ticket ones, leave the ledger
    /// alone. Unknown ids are a silent no-op.
    pub fn delete_client(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ClientRecord>, PosError> {
        self.day_rollover(now)?;
        let Some(index) = self.clients.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let record = self.clients.remove(index);

        if let DurationKind::Ticket(ticket_type) = record.duration {
            let same_day = record.date.date_naive() == now.date_naive();
            if !record.is_non_ticket && same_day {
                self.inventory.return_one(ticket_type);
                self.inventory
                    .record_returned(ticket_type, &record.name, &self.employee_name, now);
                self.save_tickets()?;
                info!(
                    client = %record.name,
                    ticket = ticket_type.key(),
                    "Ticket returned on session delete"
                );
            }
        }

        self.save_records()?;
        Ok(Some(record))
    }

    /// Sessions dated on `day`, oldest first.
    pub fn clients_for_day(&self, day: NaiveDate) -> Vec<ClientRecord> {
        reports::clients_for_day(&self.clients, day)
    }

    /// Sessions on `day` matching a name/phone query, newest first.
    pub fn search_clients(
        &self,
        day: NaiveDate,
        query: &str,
        status: Option<PaymentStatus>,
    ) -> Vec<ClientRecord> {
        clients::search_sessions(&self.clients, day, query, status)
    }

    // -----------------------------------------------------------------------
    // Expenses
    // -----------------------------------------------------------------------

    pub fn add_expense(
        &mut self,
        input: NewExpense,
        now: DateTime<Utc>,
    ) -> Result<ExpenseRecord, PosError> {
        input.validate()?;
        let record = input.into_record(&self.employee_name, now);
        self.expenses.push(record.clone());
        self.save_records()?;

        info!(
            category = record.category.label(),
            amount = record.amount,
            "Expense recorded"
        );
        Ok(record)
    }

    /// Unknown ids are a silent no-op; returns whether a record was removed.
    pub fn delete_expense(&mut self, id: &str) -> Result<bool, PosError> {
        let Some(index) = self.expenses.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        self.expenses.remove(index);
        self.save_records()?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Ticket ledger
    // -----------------------------------------------------------------------

    /// Add stock for one ticket type. Returns the new shelf count.
    pub fn restock(
        &mut self,
        ticket_type: TicketType,
        amount: u32,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u32, PosError> {
        self.day_rollover(now)?;
        let balance = self
            .inventory
            .restock(ticket_type, amount, notes, &self.employee_name, now)?;
        self.save_tickets()?;

        info!(ticket = ticket_type.key(), amount, balance, "Restocked");
        Ok(balance)
    }

    /// Restock several types in one go. Returns the total units added.
    pub fn bulk_restock(
        &mut self,
        amounts: &[(TicketType, u32)],
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u32, PosError> {
        self.day_rollover(now)?;
        let added = self
            .inventory
            .bulk_restock(amounts, notes, &self.employee_name, now)?;
        self.save_tickets()?;

        info!(added, "Bulk restock applied");
        Ok(added)
    }

    /// Set a type's shelf count outright. Returns the signed difference.
    pub fn manual_adjustment(
        &mut self,
        ticket_type: TicketType,
        new_count: u32,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, PosError> {
        self.require_adjustments()?;
        self.day_rollover(now)?;
        let difference =
            self.inventory
                .manual_adjustment(ticket_type, new_count, reason, &self.employee_name, now)?;
        self.save_tickets()?;

        info!(
            ticket = ticket_type.key(),
            new_count, difference, "Manual stock adjustment"
        );
        Ok(difference)
    }

    /// Delete a ledger entry, reversing its effect on the counters.
    /// Unknown ids are a silent no-op; returns the removed entry.
    pub fn delete_ticket_entry(
        &mut self,
        entry_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LedgerEntry>, PosError> {
        self.day_rollover(now)?;
        let removed = self.inventory.delete_entry(entry_id, now.date_naive());
        if let Some(entry) = &removed {
            self.save_tickets()?;
            info!(
                ticket = entry.ticket_type.key(),
                kind = ?entry.kind,
                "Ledger entry deleted and reversed"
            );
        }
        Ok(removed)
    }

    /// Zero one type's counters and purge its history.
    pub fn reset_ticket_type(&mut self, ticket_type: TicketType) -> Result<(), PosError> {
        self.require_adjustments()?;
        self.inventory.reset_type(ticket_type);
        self.save_tickets()?;

        warn!(ticket = ticket_type.key(), "Ticket type reset");
        Ok(())
    }

    /// Zero every counter and wipe the whole ledger history.
    pub fn reset_all_tickets(&mut self) -> Result<(), PosError> {
        self.require_adjustments()?;
        self.inventory.reset_all();
        self.save_tickets()?;

        warn!("Ticket inventory reset");
        Ok(())
    }

    fn require_adjustments(&self) -> Result<(), PosError> {
        if !self.features.manual_adjustments {
            return Err(PosError::Validation(
                "Manual adjustments are not enabled!".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Live totals for one calendar day.
    pub fn day_summary(&self, day: NaiveDate) -> DaySummary {
        reports::summarize_day(&self.clients, &self.expenses, day)
    }

    /// Freeze `day` into a saved report. Re-saving the same date replaces
    /// the earlier snapshot; the host confirms the overwrite first.
    pub fn save_daily_report(
        &mut self,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DailyReport, PosError> {
        let report = reports::build_daily_report(
            &self.clients,
            &self.expenses,
            &self.inventory,
            &self.employee_name,
            day,
            now,
        );
        self.daily_reports.retain(|r| r.date != day);
        self.daily_reports.push(report.clone());
        self.save_records()?;

        info!(%day, clients = report.summary.total_clients, "Daily report saved");
        Ok(report)
    }

    /// Unknown dates are a silent no-op; returns whether a report was removed.
    pub fn delete_daily_report(&mut self, day: NaiveDate) -> Result<bool, PosError> {
        let before = self.daily_reports.len();
        self.daily_reports.retain(|r| r.date != day);
        if self.daily_reports.len() == before {
            return Ok(false);
        }
        self.save_records()?;

        info!(%day, "Daily report deleted");
        Ok(true)
    }

    /// Saved reports passing `filter`, newest first.
    pub fn report_history(&self, filter: ReportFilter, today: NaiveDate) -> Vec<&DailyReport> {
        reports::filter_reports(&self.daily_reports, filter, today)
    }

    // -----------------------------------------------------------------------
    // Export / import / print
    // -----------------------------------------------------------------------

    /// Ticket counters as a CSV file.
    pub fn export_inventory_csv(&self, today: NaiveDate) -> ExportFile {
        export::inventory_csv(&self.inventory, today)
    }

    /// Everything the register persists, as a JSON backup file.
    pub fn export_backup(&self, now: DateTime<Utc>) -> Result<ExportFile, PosError> {
        let backup = Backup::capture(
            &self.clients,
            &self.expenses,
            &self.daily_reports,
            &self.inventory,
            &self.employee_name,
            now,
        );
        export::backup_json(&backup, now)
    }

    /// Restore state from a backup file. Each section present in the file
    /// replaces the corresponding store wholesale; absent sections leave
    /// existing data untouched. The host confirms before calling.
    pub fn import_backup(&mut self, json: &str) -> Result<ImportSummary, PosError> {
        let backup = export::parse_backup(json)?;
        let mut summary = ImportSummary::default();

        if let Some(clients) = backup.clients {
            summary.clients = Some(clients.len());
            self.clients = clients;
        }
        if let Some(expenses) = backup.expenses {
            summary.expenses = Some(expenses.len());
            self.expenses = expenses;
        }
        if let Some(daily_reports) = backup.daily_reports {
            summary.daily_reports = Some(daily_reports.len());
            self.daily_reports = daily_reports;
        }
        if let Some(mut inventory) = backup.ticket_inventory {
            inventory.normalize();
            self.inventory = inventory;
            summary.ticket_inventory = true;
        }
        if let Some(name) = backup.employee_name {
            let name = name.trim();
            if !name.is_empty() {
                self.employee_name = name.to_string();
                summary.employee_name = true;
            }
        }

        self.save_records()?;
        self.save_tickets()?;

        info!(
            clients = ?summary.clients,
            expenses = ?summary.expenses,
            reports = ?summary.daily_reports,
            tickets = summary.ticket_inventory,
            "Backup imported"
        );
        Ok(summary)
    }

    /// Printable HTML for today's live report.
    pub fn live_report_html(&self, now: DateTime<Utc>) -> String {
        print::live_report_html(
            &self.clients,
            &self.expenses,
            &self.inventory,
            &self.employee_name,
            now,
        )
    }

    /// Printable HTML for a saved report. `None` for an unknown date.
    pub fn saved_report_html(&self, day: NaiveDate, now: DateTime<Utc>) -> Option<String> {
        self.daily_reports
            .iter()
            .find(|r| r.date == day)
            .map(|report| print::saved_report_html(report, now))
    }

    // -----------------------------------------------------------------------
    // Authentication and operator settings
    // -----------------------------------------------------------------------

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), PosError> {
        let conn = lock_conn(&self.db)?;
        auth::login(&conn, &mut self.session, username, password)
    }

    pub fn logout(&mut self) {
        auth::logout(&mut self.session);
    }

    /// Replace the stored credentials; logs the operator out on success.
    pub fn change_credentials(
        &mut self,
        current_password: &str,
        new_username: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), PosError> {
        let conn = lock_conn(&self.db)?;
        auth::change_credentials(
            &conn,
            &mut self.session,
            current_password,
            new_username,
            new_password,
            confirm_password,
        )
    }

    /// Set the operator display name stamped into records. Blank input is
    /// a silent no-op, matching the register form behavior.
    pub fn set_employee_name(&mut self, name: &str) -> Result<(), PosError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        self.employee_name = name.to_string();
        self.save_records()?;

        info!(employee = %name, "Employee name updated");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Drop today's sessions and expenses. Saved reports and the ticket
    /// ledger are untouched.
    pub fn clear_today_data(&mut self, today: NaiveDate) -> Result<(), PosError> {
        self.clients.retain(|c| c.date.date_naive() != today);
        self.expenses.retain(|e| e.date.date_naive() != today);
        self.save_records()?;

        warn!(%today, "Cleared today's sessions and expenses");
        Ok(())
    }

    /// Drop every session, expense, and saved report; optionally reset the
    /// ticket ledger too. The host confirms twice before calling.
    pub fn clear_all_data(&mut self, reset_tickets: bool) -> Result<(), PosError> {
        self.clients.clear();
        self.expenses.clear();
        self.daily_reports.clear();
        if reset_tickets {
            self.inventory.reset_all();
            self.save_tickets()?;
        }
        self.save_records()?;

        warn!(reset_tickets, "Cleared all register data");
        Ok(())
    }

    /// Persist every blob unconditionally. Every mutating operation already
    /// persists, so this is only useful from a periodic host timer.
    pub fn save_all(&self) -> Result<(), PosError> {
        self.save_records()?;
        self.save_tickets()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Persist the combined records cycle: sessions, expenses, saved
    /// reports, and the operator name.
    fn save_records(&self) -> Result<(), PosError> {
        let conn = lock_conn(&self.db)?;
        db::write_blob(&conn, CLIENTS_KEY, &self.clients)?;
        db::write_blob(&conn, EXPENSES_KEY, &self.expenses)?;
        db::write_blob(&conn, REPORTS_KEY, &self.daily_reports)?;
        db::set_setting(&conn, db::DATA_CATEGORY, EMPLOYEE_KEY, &self.employee_name)
    }

    /// Persist the ticket ledger blob.
    fn save_tickets(&self) -> Result<(), PosError> {
        let conn = lock_conn(&self.db)?;
        db::write_blob(&conn, TICKETS_KEY, &self.inventory)
    }

    fn write_day_marker(&self, key: &str, day: NaiveDate) -> Result<(), PosError> {
        let conn = lock_conn(&self.db)?;
        db::set_setting(&conn, SYSTEM_CATEGORY, key, &day.to_string())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
