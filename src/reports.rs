//! Daily aggregation and saved end-of-day reports for Sama POS.
//!
//! Read-side only: everything here derives from the session list, the
//! expense list, and the ticket counters. A `DailyReport` freezes one
//! calendar day (records, ticket snapshot, totals) so the day can be
//! reviewed or reprinted long after the live lists have moved on.
//!
//! Days are bucketed by the UTC calendar date of each record's timestamp.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clients::{ClientRecord, PaymentStatus};
use crate::expenses::ExpenseRecord;
use crate::tickets::{TicketCounter, TicketInventory, TicketType};

// ---------------------------------------------------------------------------
// Day aggregation
// ---------------------------------------------------------------------------

/// Session count and amount for one payment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusLine {
    pub count: usize,
    pub amount: f64,
}

/// Live totals for one calendar day.
///
/// Revenue counts paid sessions only; unpaid and borrowed amounts are
/// outstanding, not earned, and never feed into net profit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_clients: usize,
    pub paid: StatusLine,
    pub unpaid: StatusLine,
    pub borrowed: StatusLine,
    pub total_expenses: f64,
    pub net_profit: f64,
}

impl DaySummary {
    /// Sessions still owing money (unpaid + borrowed).
    pub fn unpaid_clients(&self) -> usize {
        self.unpaid.count + self.borrowed.count
    }

    /// Amount still owed (unpaid + borrowed).
    pub fn outstanding(&self) -> f64 {
        self.unpaid.amount + self.borrowed.amount
    }

    /// Collapse into the totals block stored on a saved report.
    pub fn to_report_summary(&self) -> ReportSummary {
        ReportSummary {
            total_clients: self.total_clients,
            total_revenue: self.paid.amount,
            total_unpaid: self.outstanding(),
            total_expenses: self.total_expenses,
            net_profit: self.net_profit,
        }
    }
}

/// Sessions dated on `day`, oldest first (list order).
pub fn clients_for_day(clients: &[ClientRecord], day: NaiveDate) -> Vec<ClientRecord> {
    clients
        .iter()
        .filter(|c| c.date.date_naive() == day)
        .cloned()
        .collect()
}

/// Expenses dated on `day`.
pub fn expenses_for_day(expenses: &[ExpenseRecord], day: NaiveDate) -> Vec<ExpenseRecord> {
    expenses
        .iter()
        .filter(|e| e.date.date_naive() == day)
        .cloned()
        .collect()
}

/// Compute the live totals for one day.
pub fn summarize_day(
    clients: &[ClientRecord],
    expenses: &[ExpenseRecord],
    day: NaiveDate,
) -> DaySummary {
    let day_clients = clients_for_day(clients, day);
    let day_expenses = expenses_for_day(expenses, day);

    let mut paid = StatusLine::default();
    let mut unpaid = StatusLine::default();
    let mut borrowed = StatusLine::default();
    for client in &day_clients {
        let line = match client.payment_status {
            PaymentStatus::Paid => &mut paid,
            PaymentStatus::Unpaid => &mut unpaid,
            PaymentStatus::Borrowed => &mut borrowed,
        };
        line.count += 1;
        line.amount += client.amount;
    }

    let total_expenses: f64 = day_expenses.iter().map(|e| e.amount).sum();

    DaySummary {
        date: day,
        total_clients: day_clients.len(),
        paid,
        unpaid,
        borrowed,
        total_expenses,
        net_profit: paid.amount - total_expenses,
    }
}

// ---------------------------------------------------------------------------
// Saved daily reports
// ---------------------------------------------------------------------------

/// Totals block frozen into a saved report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_clients: usize,
    pub total_revenue: f64,
    /// Outstanding amount across unpaid and borrowed sessions combined.
    pub total_unpaid: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
}

/// Ticket counters as they stood when the report was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSnapshot {
    pub types: BTreeMap<TicketType, TicketCounter>,
}

/// One frozen end-of-day report, keyed by its calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: NaiveDate,
    pub saved_at: DateTime<Utc>,
    pub employee: String,
    pub clients: Vec<ClientRecord>,
    pub expenses: Vec<ExpenseRecord>,
    pub ticket_data: TicketSnapshot,
    pub summary: ReportSummary,
}

/// Freeze `day` into a report: that day's records, the current ticket
/// counters, and the derived totals.
pub fn build_daily_report(
    clients: &[ClientRecord],
    expenses: &[ExpenseRecord],
    inventory: &TicketInventory,
    employee: &str,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> DailyReport {
    let summary = summarize_day(clients, expenses, day).to_report_summary();
    DailyReport {
        date: day,
        saved_at: now,
        employee: employee.to_string(),
        clients: clients_for_day(clients, day),
        expenses: expenses_for_day(expenses, day),
        ticket_data: TicketSnapshot {
            types: inventory.types.clone(),
        },
        summary,
    }
}

// ---------------------------------------------------------------------------
// Report history filtering
// ---------------------------------------------------------------------------

/// How to narrow the saved-report history: a rolling window or an explicit
/// date range (either bound may be open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFilter {
    All,
    Today,
    Last7Days,
    Last30Days,
    Range {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl ReportFilter {
    fn matches(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            ReportFilter::All => true,
            ReportFilter::Today => date == today,
            ReportFilter::Last7Days => date >= today - Duration::days(7),
            ReportFilter::Last30Days => date >= today - Duration::days(30),
            ReportFilter::Range { from, to } => {
                from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
            }
        }
    }
}

/// Reports passing `filter`, newest first.
pub fn filter_reports<'a>(
    reports: &'a [DailyReport],
    filter: ReportFilter,
    today: NaiveDate,
) -> Vec<&'a DailyReport> {
    let mut matching: Vec<&DailyReport> = reports
        .iter()
        .filter(|r| filter.matches(r.date, today))
        .collect();
    matching.sort_by(|a, b| b.date.cmp(&a.date));
    matching
}

// ===========================================================================
// Tests
// ===========================================================================
