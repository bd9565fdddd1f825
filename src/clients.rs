//! Client session records for Sama POS.
//!
//! A session is one client's visit: who they are, what duration they paid
//! for, how much, and whether the money actually arrived. Sessions backed
//! by a ticket denomination consume ledger stock; custom-priced and
//! non-ticket sessions do not.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PosError;
use crate::tickets::TicketType;

// ---------------------------------------------------------------------------
// Session vocabulary
// ---------------------------------------------------------------------------

/// Whether the client has settled the bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    Borrowed,
}

impl PaymentStatus {
    /// Storage key, also the status word shown on session rows.
    pub fn key(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Borrowed => "borrowed",
        }
    }
}

/// What the client is paying for: one of the catalog denominations, or a
/// custom-priced session that never touches ticket stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DurationKind {
    Ticket(TicketType),
    Custom,
}

impl DurationKind {
    /// Storage key ("1hour" .. "monthly", or "custom").
    pub fn key(self) -> &'static str {
        match self {
            DurationKind::Ticket(t) => t.key(),
            DurationKind::Custom => "custom",
        }
    }

    /// Short label shown on session rows. Note this differs from the
    /// inventory display names ("Weekly" here, "Weekly Pass" there).
    pub fn label(self) -> &'static str {
        match self {
            DurationKind::Ticket(TicketType::OneHour) => "1 Hour",
            DurationKind::Ticket(TicketType::TwoHours) => "2 Hours",
            DurationKind::Ticket(TicketType::Daily) => "Daily",
            DurationKind::Ticket(TicketType::Weekly) => "Weekly",
            DurationKind::Ticket(TicketType::Monthly) => "Monthly",
            DurationKind::Custom => "Custom",
        }
    }
}

impl From<DurationKind> for String {
    fn from(duration: DurationKind) -> String {
        duration.key().to_string()
    }
}

impl TryFrom<String> for DurationKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        if value == "custom" {
            return Ok(DurationKind::Custom);
        }
        TicketType::from_key(&value)
            .map(DurationKind::Ticket)
            .ok_or_else(|| format!("unknown duration: {value}"))
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One client visit as kept in the session list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub duration: DurationKind,
    pub amount: f64,
    pub payment_status: PaymentStatus,
    pub notes: String,
    pub date: DateTime<Utc>,
    pub added_by: String,
    /// Session explicitly exempted from ticket stock. Older records predate
    /// the flag and read as false.
    #[serde(default)]
    pub is_non_ticket: bool,
}

/// Input for a new session, as captured by the register form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    pub duration: DurationKind,
    /// Charge for custom-duration sessions; ignored otherwise.
    pub custom_amount: f64,
    pub payment_status: PaymentStatus,
    pub notes: String,
    pub is_non_ticket: bool,
}

impl Default for NewClient {
    fn default() -> Self {
        NewClient {
            name: String::new(),
            phone: String::new(),
            duration: DurationKind::Ticket(TicketType::OneHour),
            custom_amount: 0.0,
            payment_status: PaymentStatus::Paid,
            notes: String::new(),
            is_non_ticket: false,
        }
    }
}

impl NewClient {
    pub fn validate(&self) -> Result<(), PosError> {
        if self.name.trim().is_empty() {
            return Err(PosError::Validation("Please enter client name!".into()));
        }
        if self.duration == DurationKind::Custom && self.custom_amount <= 0.0 {
            return Err(PosError::Validation("Please enter a valid amount!".into()));
        }
        Ok(())
    }

    /// Charge for the session: catalog price for ticket durations, the
    /// operator-entered amount for custom ones.
    pub fn amount(&self) -> f64 {
        match self.duration {
            DurationKind::Ticket(t) => t.price(),
            DurationKind::Custom => self.custom_amount,
        }
    }

    pub fn into_record(self, added_by: &str, now: DateTime<Utc>) -> ClientRecord {
        let amount = self.amount();
        ClientRecord {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            duration: self.duration,
            amount,
            payment_status: self.payment_status,
            notes: self.notes.trim().to_string(),
            date: now,
            added_by: added_by.to_string(),
            is_non_ticket: self.is_non_ticket,
        }
    }
}

/// Partial edit of an existing session. `None` fields are left alone; the
/// edit form only exposes name, phone, and payment status.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub payment_status: Option<PaymentStatus>,
}

impl ClientUpdate {
    pub fn apply(&self, record: &mut ClientRecord) -> Result<(), PosError> {
        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(PosError::Validation("Please enter client name!".into()));
            }
            record.name = name.to_string();
        }
        if let Some(phone) = &self.phone {
            record.phone = phone.trim().to_string();
        }
        if let Some(status) = self.payment_status {
            record.payment_status = status;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Sessions on `day` whose name or phone contains `query`, optionally
/// narrowed to one payment status. Name matching is case-insensitive,
/// phone matching is literal. Newest first; an empty query matches all.
pub fn search_sessions(
    clients: &[ClientRecord],
    day: NaiveDate,
    query: &str,
    status: Option<PaymentStatus>,
) -> Vec<ClientRecord> {
    let term = query.to_lowercase();
    let mut matching: Vec<ClientRecord> = clients
        .iter()
        .filter(|c| c.date.date_naive() == day)
        .filter(|c| c.name.to_lowercase().contains(&term) || c.phone.contains(&term))
        .filter(|c| status.map_or(true, |s| c.payment_status == s))
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.date.cmp(&a.date));
    matching
}

// ===========================================================================
// Tests
// ===========================================================================
