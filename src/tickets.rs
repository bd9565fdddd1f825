//! Ticket inventory and ledger for Sama POS.
//!
//! The kiosk sells prepaid Wi-Fi tickets in five denominations. Every stock
//! movement (restock, sale, return, manual adjustment) appends an entry to
//! an append-only history ledger alongside the per-type counters, so the
//! books can always be traced back through the entries.
//!
//! **Rules:**
//! - Counters never go below zero; reversals clamp instead of underflowing
//! - Deleting a history entry applies the exact inverse of that entry
//! - `used_today` rolls over to zero on the first touch of a new day
//!
//! Everything here is pure state manipulation; persistence and logging live
//! in the controller.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PosError;

// ---------------------------------------------------------------------------
// Ticket catalog
// ---------------------------------------------------------------------------

/// The five prepaid ticket denominations sold at the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TicketType {
    #[serde(rename = "1hour")]
    OneHour,
    #[serde(rename = "2hours")]
    TwoHours,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "monthly")]
    Monthly,
}

impl TicketType {
    /// All types in display order.
    pub const ALL: [TicketType; 5] = [
        TicketType::OneHour,
        TicketType::TwoHours,
        TicketType::Daily,
        TicketType::Weekly,
        TicketType::Monthly,
    ];

    /// Storage key, as used in persisted JSON and session durations.
    pub fn key(self) -> &'static str {
        match self {
            TicketType::OneHour => "1hour",
            TicketType::TwoHours => "2hours",
            TicketType::Daily => "daily",
            TicketType::Weekly => "weekly",
            TicketType::Monthly => "monthly",
        }
    }

    /// Parse a storage key back into a ticket type.
    pub fn from_key(key: &str) -> Option<TicketType> {
        match key {
            "1hour" => Some(TicketType::OneHour),
            "2hours" => Some(TicketType::TwoHours),
            "daily" => Some(TicketType::Daily),
            "weekly" => Some(TicketType::Weekly),
            "monthly" => Some(TicketType::Monthly),
            _ => None,
        }
    }

    /// Full name shown on inventory screens and reports.
    pub fn display_name(self) -> &'static str {
        match self {
            TicketType::OneHour => "1 Hour",
            TicketType::TwoHours => "2 Hours",
            TicketType::Daily => "Day Pass",
            TicketType::Weekly => "Weekly Pass",
            TicketType::Monthly => "Monthly Pass",
        }
    }

    /// Fixed price in SSP.
    pub fn price(self) -> f64 {
        match self {
            TicketType::OneHour => 1000.0,
            TicketType::TwoHours => 1500.0,
            TicketType::Daily => 2000.0,
            TicketType::Weekly => 14000.0,
            TicketType::Monthly => 60000.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Counters and ledger entries
// ---------------------------------------------------------------------------

/// Running counters for one ticket type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCounter {
    /// Tickets on the shelf, ready to sell.
    pub available: u32,
    /// Tickets sold since the day rolled over.
    pub used_today: u32,
    /// Tickets sold since the type was last reset.
    pub total_used: u32,
}

/// What a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Restock,
    Used,
    Returned,
    Adjustment,
}

/// One append-only ledger entry.
///
/// `amount` is signed: positive for stock added, negative for stock
/// consumed. `balance_after` records `available` as it stood right after
/// the entry was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub ticket_type: TicketType,
    pub amount: i64,
    pub balance_after: u32,
    pub notes: String,
    pub added_by: String,
}

/// Stock warning level after a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Ok,
    /// Two or fewer tickets left.
    Low(u32),
    Out,
}

impl StockLevel {
    pub fn of(available: u32) -> StockLevel {
        match available {
            0 => StockLevel::Out,
            1..=2 => StockLevel::Low(available),
            _ => StockLevel::Ok,
        }
    }
}

/// Result of selling one ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeOutcome {
    pub remaining: u32,
    pub level: StockLevel,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// The whole ticket inventory: per-type counters plus the history ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketInventory {
    pub types: BTreeMap<TicketType, TicketCounter>,
    pub history: Vec<LedgerEntry>,
    pub last_restock_date: Option<DateTime<Utc>>,
}

impl Default for TicketInventory {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        for ticket_type in TicketType::ALL {
            types.insert(ticket_type, TicketCounter::default());
        }
        TicketInventory {
            types,
            history: Vec::new(),
            last_restock_date: None,
        }
    }
}

impl TicketInventory {
    /// Ensure every catalog type has a counter. Imported or older blobs may
    /// be missing types; they start zeroed.
    pub fn normalize(&mut self) {
        for ticket_type in TicketType::ALL {
            self.types.entry(ticket_type).or_default();
        }
    }

    /// Counter for one type.
    pub fn counter(&self, ticket_type: TicketType) -> TicketCounter {
        self.types.get(&ticket_type).copied().unwrap_or_default()
    }

    /// Restock one ticket type. Returns the new shelf count.
    ///
    /// An empty `notes` falls back to the standard restock description.
    pub fn restock(
        &mut self,
        ticket_type: TicketType,
        amount: u32,
        notes: Option<&str>,
        added_by: &str,
        now: DateTime<Utc>,
    ) -> Result<u32, PosError> {
        if amount == 0 {
            return Err(PosError::Validation(
                "Please enter a valid ticket amount!".into(),
            ));
        }

        let counter = self.types.entry(ticket_type).or_default();
        counter.available = counter.available.saturating_add(amount);
        let balance = counter.available;
        self.last_restock_date = Some(now);

        let notes = match notes {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("Manual restock of {} tickets", ticket_type.display_name()),
        };
        self.push_entry(EntryKind::Restock, ticket_type, i64::from(amount), balance, notes, added_by, now);

        Ok(balance)
    }

    /// Restock several types in one go. Zero amounts are skipped; each
    /// restocked type gets its own ledger entry. Returns the total added.
    pub fn bulk_restock(
        &mut self,
        amounts: &[(TicketType, u32)],
        notes: Option<&str>,
        added_by: &str,
        now: DateTime<Utc>,
    ) -> Result<u32, PosError> {
        if amounts.iter().all(|(_, amount)| *amount == 0) {
            return Err(PosError::Validation(
                "Please enter at least one ticket amount!".into(),
            ));
        }

        let mut total_added: u32 = 0;
        for &(ticket_type, amount) in amounts {
            if amount == 0 {
                continue;
            }
            let counter = self.types.entry(ticket_type).or_default();
            counter.available = counter.available.saturating_add(amount);
            let balance = counter.available;
            total_added = total_added.saturating_add(amount);

            let notes = match notes {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => format!("Bulk restock of {} tickets", ticket_type.display_name()),
            };
            self.push_entry(EntryKind::Restock, ticket_type, i64::from(amount), balance, notes, added_by, now);
        }
        self.last_restock_date = Some(now);

        Ok(total_added)
    }

    /// Sell one ticket to a client.
    ///
    /// Decrements `available`, bumps both usage counters, and records a
    /// `used` entry with amount `-1`. Fails when the shelf is empty.
    pub fn consume_one(
        &mut self,
        ticket_type: TicketType,
        client_name: &str,
        added_by: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, PosError> {
        let counter = self.types.entry(ticket_type).or_default();
        if counter.available == 0 {
            return Err(PosError::OutOfStock(ticket_type));
        }

        counter.available -= 1;
        counter.used_today = counter.used_today.saturating_add(1);
        counter.total_used = counter.total_used.saturating_add(1);
        let remaining = counter.available;

        let notes = format!(
            "{} ticket used for client: {}",
            ticket_type.display_name(),
            client_name
        );
        self.push_entry(EntryKind::Used, ticket_type, -1, remaining, notes, added_by, now);

        Ok(ConsumeOutcome {
            remaining,
            level: StockLevel::of(remaining),
        })
    }

    /// Put a sold ticket back on the shelf. Reverses the sale counters
    /// only; each usage counter clamps at zero independently. Writes no
    /// history entry itself, callers wanting an audit trail append one via
    /// `record_returned`. Returns the new shelf count.
    pub fn return_one(&mut self, ticket_type: TicketType) -> u32 {
        let counter = self.types.entry(ticket_type).or_default();
        counter.available = counter.available.saturating_add(1);
        counter.used_today = counter.used_today.saturating_sub(1);
        counter.total_used = counter.total_used.saturating_sub(1);
        counter.available
    }

    /// Append the audit entry for a returned ticket: amount `+1`, balance
    /// as it stands now. Pairs with `return_one` on session deletion.
    pub fn record_returned(
        &mut self,
        ticket_type: TicketType,
        client_name: &str,
        added_by: &str,
        now: DateTime<Utc>,
    ) {
        let balance = self.counter(ticket_type).available;
        let notes = format!("Ticket returned - Client \"{client_name}\" deleted");
        self.push_entry(EntryKind::Returned, ticket_type, 1, balance, notes, added_by, now);
    }

    /// Set a type's shelf count outright, recording the signed difference.
    ///
    /// The entry is appended even when the count does not change, so stock
    /// checks leave a trace. Returns the difference that was applied.
    pub fn manual_adjustment(
        &mut self,
        ticket_type: TicketType,
        new_count: u32,
        reason: &str,
        added_by: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, PosError> {
        if reason.trim().is_empty() {
            return Err(PosError::Validation(
                "Please enter a reason for the adjustment!".into(),
            ));
        }

        let counter = self.types.entry(ticket_type).or_default();
        let difference = i64::from(new_count) - i64::from(counter.available);
        counter.available = new_count;

        let notes = format!("Manual adjustment: {}", reason.trim());
        self.push_entry(EntryKind::Adjustment, ticket_type, difference, new_count, notes, added_by, now);

        Ok(difference)
    }

    /// Delete a ledger entry, applying its exact inverse to the counters.
    ///
    /// - restock / adjustment: subtract the entry amount from `available`
    /// - used: one back on the shelf, usage counters reversed
    /// - returned: one off the shelf, usage counters re-applied
    ///
    /// `used_today` reversal only applies when the entry is from `today`;
    /// older entries were already wiped by the daily rollover. All counters
    /// clamp at zero. Returns the removed entry, or `None` for an unknown id.
    pub fn delete_entry(&mut self, entry_id: &str, today: NaiveDate) -> Option<LedgerEntry> {
        let index = self.history.iter().position(|e| e.id == entry_id)?;
        let entry = self.history[index].clone();
        let same_day = entry.date.date_naive() == today;
        let counter = self.types.entry(entry.ticket_type).or_default();

        match entry.kind {
            EntryKind::Restock | EntryKind::Adjustment => {
                let reverted = i64::from(counter.available) - entry.amount;
                counter.available = reverted.clamp(0, i64::from(u32::MAX)) as u32;
            }
            EntryKind::Used => {
                counter.available = counter.available.saturating_add(1);
                if same_day {
                    counter.used_today = counter.used_today.saturating_sub(1);
                }
                counter.total_used = counter.total_used.saturating_sub(1);
            }
            EntryKind::Returned => {
                counter.available = counter.available.saturating_sub(1);
                if same_day {
                    counter.used_today = counter.used_today.saturating_add(1);
                }
                counter.total_used = counter.total_used.saturating_add(1);
            }
        }

        self.history.remove(index);
        Some(entry)
    }

    /// Zero one type's counters and drop its history entries.
    pub fn reset_type(&mut self, ticket_type: TicketType) {
        self.types.insert(ticket_type, TicketCounter::default());
        self.history.retain(|e| e.ticket_type != ticket_type);
    }

    /// Zero everything: all counters, the whole ledger, the restock date.
    pub fn reset_all(&mut self) {
        for counter in self.types.values_mut() {
            *counter = TicketCounter::default();
        }
        self.history.clear();
        self.last_restock_date = None;
    }

    /// Zero `used_today` across all types when the stored day marker is not
    /// `today`. Returns true when the rollover fired, in which case the
    /// caller persists the inventory and advances the marker to `today`.
    pub fn rollover_if_needed(&mut self, last_reset: Option<NaiveDate>, today: NaiveDate) -> bool {
        if last_reset == Some(today) {
            return false;
        }
        for counter in self.types.values_mut() {
            counter.used_today = 0;
        }
        true
    }

    /// Shelf total across all types.
    pub fn total_available(&self) -> u32 {
        self.types.values().map(|c| c.available).sum()
    }

    /// Tickets sold today across all types.
    pub fn total_used_today(&self) -> u32 {
        self.types.values().map(|c| c.used_today).sum()
    }

    /// All-time sales across all types.
    pub fn total_used_all_time(&self) -> u32 {
        self.types.values().map(|c| c.total_used).sum()
    }

    #[allow(clippy::too_many_arguments)]
    fn push_entry(
        &mut self,
        kind: EntryKind,
        ticket_type: TicketType,
        amount: i64,
        balance_after: u32,
        notes: String,
        added_by: &str,
        now: DateTime<Utc>,
    ) {
        self.history.push(LedgerEntry {
            id: Uuid::new_v4().to_string(),
            date: now,
            kind,
            ticket_type,
            amount,
            balance_after,
            notes,
            added_by: added_by.to_string(),
        });
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn seeded(ticket_type: TicketType, available: u32, used_today: u32, total_used: u32) -> TicketInventory {
        let mut inv = TicketInventory::default();
        inv.types.insert(
            ticket_type,
            TicketCounter {
                available,
                used_today,
                total_used,
            },
        );
        inv
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    #[test]
    fn test_keys_roundtrip() {
        for ticket_type in TicketType::ALL {
            assert_eq!(TicketType::from_key(ticket_type.key()), Some(ticket_type));
        }
        assert_eq!(TicketType::from_key("custom"), None);
        assert_eq!(TicketType::from_key("bogus"), None);
    }

    #[test]
    fn test_prices() {
        assert_eq!(TicketType::OneHour.price(), 1000.0);
        assert_eq!(TicketType::TwoHours.price(), 1500.0);
        assert_eq!(TicketType::Daily.price(), 2000.0);
        assert_eq!(TicketType::Weekly.price(), 14000.0);
        assert_eq!(TicketType::Monthly.price(), 60000.0);
    }

    #[test]
    fn test_stock_level_thresholds() {
        assert_eq!(StockLevel::of(0), StockLevel::Out);
        assert_eq!(StockLevel::of(1), StockLevel::Low(1));
        assert_eq!(StockLevel::of(2), StockLevel::Low(2));
        assert_eq!(StockLevel::of(3), StockLevel::Ok);
    }

    // ------------------------------------------------------------------
    // Restock
    // ------------------------------------------------------------------

    #[test]
    fn test_restock_adds_stock_and_appends_entry() {
        let mut inv = TicketInventory::default();
        let now = at(2024, 6, 1);

        let balance = inv
            .restock(TicketType::Daily, 10, None, "Sarah", now)
            .unwrap();

        assert_eq!(balance, 10);
        assert_eq!(inv.counter(TicketType::Daily).available, 10);
        assert_eq!(inv.last_restock_date, Some(now));
        assert_eq!(inv.history.len(), 1);

        let entry = &inv.history[0];
        assert_eq!(entry.kind, EntryKind::Restock);
        assert_eq!(entry.ticket_type, TicketType::Daily);
        assert_eq!(entry.amount, 10);
        assert_eq!(entry.balance_after, 10);
        assert_eq!(entry.notes, "Manual restock of Day Pass tickets");
        assert_eq!(entry.added_by, "Sarah");
    }

    #[test]
    fn test_restock_zero_rejected() {
        let mut inv = TicketInventory::default();
        let err = inv
            .restock(TicketType::Daily, 0, None, "Sarah", at(2024, 6, 1))
            .unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid ticket amount!");
        assert!(inv.history.is_empty());
        assert_eq!(inv.last_restock_date, None);
    }

    #[test]
    fn test_restock_keeps_custom_notes() {
        let mut inv = TicketInventory::default();
        inv.restock(
            TicketType::Weekly,
            3,
            Some("Box from supplier"),
            "Sarah",
            at(2024, 6, 1),
        )
        .unwrap();
        assert_eq!(inv.history[0].notes, "Box from supplier");
    }

    #[test]
    fn test_restock_empty_notes_fall_back_to_default() {
        let mut inv = TicketInventory::default();
        inv.restock(TicketType::OneHour, 5, Some(""), "Sarah", at(2024, 6, 1))
            .unwrap();
        assert_eq!(inv.history[0].notes, "Manual restock of 1 Hour tickets");
    }

    #[test]
    fn test_bulk_restock_skips_zero_amounts() {
        let mut inv = TicketInventory::default();
        let now = at(2024, 6, 1);

        let total = inv
            .bulk_restock(
                &[
                    (TicketType::OneHour, 5),
                    (TicketType::Daily, 0),
                    (TicketType::Weekly, 2),
                ],
                None,
                "Sarah",
                now,
            )
            .unwrap();

        assert_eq!(total, 7);
        assert_eq!(inv.counter(TicketType::OneHour).available, 5);
        assert_eq!(inv.counter(TicketType::Daily).available, 0);
        assert_eq!(inv.counter(TicketType::Weekly).available, 2);
        assert_eq!(inv.last_restock_date, Some(now));

        // One entry per restocked type, none for the zero amount
        assert_eq!(inv.history.len(), 2);
        assert_eq!(inv.history[0].notes, "Bulk restock of 1 Hour tickets");
        assert_eq!(inv.history[1].notes, "Bulk restock of Weekly Pass tickets");
    }

    #[test]
    fn test_bulk_restock_all_zero_rejected() {
        let mut inv = TicketInventory::default();
        let err = inv
            .bulk_restock(
                &[(TicketType::OneHour, 0), (TicketType::Daily, 0)],
                None,
                "Sarah",
                at(2024, 6, 1),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Please enter at least one ticket amount!");
        assert_eq!(inv.last_restock_date, None);
    }

    #[test]
    fn test_bulk_restock_shared_notes() {
        let mut inv = TicketInventory::default();
        inv.bulk_restock(
            &[(TicketType::OneHour, 1), (TicketType::Monthly, 1)],
            Some("Opening delivery"),
            "Sarah",
            at(2024, 6, 1),
        )
        .unwrap();
        assert!(inv.history.iter().all(|e| e.notes == "Opening delivery"));
    }

    // ------------------------------------------------------------------
    // Sales and returns
    // ------------------------------------------------------------------

    #[test]
    fn test_consume_updates_counters_and_ledger() {
        let mut inv = seeded(TicketType::Daily, 5, 0, 20);
        let now = at(2024, 6, 1);

        inv.consume_one(TicketType::Daily, "Amina", "Sarah", now)
            .unwrap();
        inv.consume_one(TicketType::Daily, "Deng", "Sarah", now)
            .unwrap();
        let outcome = inv
            .consume_one(TicketType::Daily, "Nyakim", "Sarah", now)
            .unwrap();

        let counter = inv.counter(TicketType::Daily);
        assert_eq!(counter.available, 2);
        assert_eq!(counter.used_today, 3);
        assert_eq!(counter.total_used, 23);

        // Third sale dips under three on the shelf
        assert_eq!(outcome.remaining, 2);
        assert_eq!(outcome.level, StockLevel::Low(2));

        assert_eq!(inv.history.len(), 3);
        let entry = &inv.history[0];
        assert_eq!(entry.kind, EntryKind::Used);
        assert_eq!(entry.amount, -1);
        assert_eq!(entry.balance_after, 4);
        assert_eq!(entry.notes, "Day Pass ticket used for client: Amina");
    }

    #[test]
    fn test_consume_out_of_stock() {
        let mut inv = TicketInventory::default();
        let err = inv
            .consume_one(TicketType::Daily, "Amina", "Sarah", at(2024, 6, 1))
            .unwrap_err();
        assert_eq!(err.to_string(), "No Day Pass tickets available!");
        assert!(inv.history.is_empty());
        assert_eq!(inv.counter(TicketType::Daily).total_used, 0);
    }

    #[test]
    fn test_consume_last_ticket_reports_out() {
        let mut inv = seeded(TicketType::Monthly, 1, 0, 0);
        let outcome = inv
            .consume_one(TicketType::Monthly, "Amina", "Sarah", at(2024, 6, 1))
            .unwrap();
        assert_eq!(outcome.remaining, 0);
        assert_eq!(outcome.level, StockLevel::Out);
    }

    #[test]
    fn test_return_one_reverses_sale_counters_only() {
        let mut inv = seeded(TicketType::OneHour, 1, 2, 5);

        let balance = inv.return_one(TicketType::OneHour);

        assert_eq!(balance, 2);
        let counter = inv.counter(TicketType::OneHour);
        assert_eq!(counter.available, 2);
        assert_eq!(counter.used_today, 1);
        assert_eq!(counter.total_used, 4);
        assert!(inv.history.is_empty(), "return_one writes no entry");
    }

    #[test]
    fn test_record_returned_appends_audit_entry() {
        let mut inv = seeded(TicketType::OneHour, 1, 2, 5);
        let now = at(2024, 6, 1);

        inv.return_one(TicketType::OneHour);
        inv.record_returned(TicketType::OneHour, "Deng", "Sarah", now);

        let entry = &inv.history[0];
        assert_eq!(entry.kind, EntryKind::Returned);
        assert_eq!(entry.amount, 1);
        assert_eq!(entry.balance_after, 2);
        assert_eq!(entry.notes, "Ticket returned - Client \"Deng\" deleted");
    }

    #[test]
    fn test_return_one_clamps_usage_at_zero() {
        let mut inv = TicketInventory::default();
        inv.return_one(TicketType::OneHour);

        let counter = inv.counter(TicketType::OneHour);
        assert_eq!(counter.available, 1);
        assert_eq!(counter.used_today, 0);
        assert_eq!(counter.total_used, 0);
    }

    // ------------------------------------------------------------------
    // Manual adjustment
    // ------------------------------------------------------------------

    #[test]
    fn test_manual_adjustment_records_signed_difference() {
        let mut inv = seeded(TicketType::Weekly, 7, 0, 0);
        let difference = inv
            .manual_adjustment(TicketType::Weekly, 0, "Water damage", "Sarah", at(2024, 6, 1))
            .unwrap();

        assert_eq!(difference, -7);
        assert_eq!(inv.counter(TicketType::Weekly).available, 0);

        let entry = &inv.history[0];
        assert_eq!(entry.kind, EntryKind::Adjustment);
        assert_eq!(entry.amount, -7);
        assert_eq!(entry.balance_after, 0);
        assert_eq!(entry.notes, "Manual adjustment: Water damage");
    }

    #[test]
    fn test_manual_adjustment_no_change_still_logged() {
        let mut inv = seeded(TicketType::Daily, 4, 0, 0);
        let difference = inv
            .manual_adjustment(TicketType::Daily, 4, "Stock check", "Sarah", at(2024, 6, 1))
            .unwrap();
        assert_eq!(difference, 0);
        assert_eq!(inv.history.len(), 1);
        assert_eq!(inv.history[0].amount, 0);
    }

    #[test]
    fn test_manual_adjustment_requires_reason() {
        let mut inv = seeded(TicketType::Daily, 4, 0, 0);
        let err = inv
            .manual_adjustment(TicketType::Daily, 9, "  ", "Sarah", at(2024, 6, 1))
            .unwrap_err();
        assert_eq!(err.to_string(), "Please enter a reason for the adjustment!");
        assert_eq!(inv.counter(TicketType::Daily).available, 4);
        assert!(inv.history.is_empty());
    }

    // ------------------------------------------------------------------
    // Entry deletion inverses
    // ------------------------------------------------------------------

    #[test]
    fn test_delete_restock_entry_clamps_at_zero() {
        let mut inv = TicketInventory::default();
        inv.restock(TicketType::Daily, 10, None, "Sarah", at(2024, 6, 1))
            .unwrap();
        let id = inv.history[0].id.clone();

        // Stock drained to 4 in the meantime
        inv.types.get_mut(&TicketType::Daily).unwrap().available = 4;

        let removed = inv.delete_entry(&id, at(2024, 6, 1).date_naive()).unwrap();
        assert_eq!(removed.amount, 10);
        assert_eq!(
            inv.counter(TicketType::Daily).available,
            0,
            "reversal clamps instead of going to -6"
        );
        assert!(inv.history.is_empty());
    }

    #[test]
    fn test_delete_used_entry_same_day() {
        let mut inv = seeded(TicketType::Daily, 5, 0, 20);
        let now = at(2024, 6, 1);
        inv.consume_one(TicketType::Daily, "Amina", "Sarah", now)
            .unwrap();
        let id = inv.history[0].id.clone();

        inv.delete_entry(&id, now.date_naive()).unwrap();

        let counter = inv.counter(TicketType::Daily);
        assert_eq!(counter.available, 5);
        assert_eq!(counter.used_today, 0);
        assert_eq!(counter.total_used, 20);
        assert!(inv.history.is_empty());
    }

    #[test]
    fn test_delete_used_entry_prior_day_skips_used_today() {
        let mut inv = seeded(TicketType::Daily, 5, 0, 20);
        let yesterday = at(2024, 5, 31);
        inv.consume_one(TicketType::Daily, "Amina", "Sarah", yesterday)
            .unwrap();
        let id = inv.history[0].id.clone();

        // Day rolled over since the sale
        inv.rollover_if_needed(Some(yesterday.date_naive()), at(2024, 6, 1).date_naive());

        inv.delete_entry(&id, at(2024, 6, 1).date_naive()).unwrap();

        let counter = inv.counter(TicketType::Daily);
        assert_eq!(counter.available, 5);
        assert_eq!(counter.used_today, 0, "yesterday's sale is not today's");
        assert_eq!(counter.total_used, 20);
    }

    #[test]
    fn test_delete_returned_entry_reapplies_sale() {
        let mut inv = seeded(TicketType::OneHour, 3, 1, 5);
        let now = at(2024, 6, 1);
        inv.return_one(TicketType::OneHour);
        inv.record_returned(TicketType::OneHour, "Deng", "Sarah", now);
        let id = inv.history[0].id.clone();

        inv.delete_entry(&id, now.date_naive()).unwrap();

        let counter = inv.counter(TicketType::OneHour);
        assert_eq!(counter.available, 3);
        assert_eq!(counter.used_today, 1);
        assert_eq!(counter.total_used, 5);
    }

    #[test]
    fn test_delete_negative_adjustment_restores_stock() {
        let mut inv = seeded(TicketType::Weekly, 7, 0, 0);
        let now = at(2024, 6, 1);
        inv.manual_adjustment(TicketType::Weekly, 0, "Water damage", "Sarah", now)
            .unwrap();
        let id = inv.history[0].id.clone();

        inv.delete_entry(&id, now.date_naive()).unwrap();

        // Reversing a -7 adjustment puts the 7 back
        assert_eq!(inv.counter(TicketType::Weekly).available, 7);
    }

    #[test]
    fn test_delete_unknown_id_returns_none() {
        let mut inv = TicketInventory::default();
        assert!(inv.delete_entry("nope", at(2024, 6, 1).date_naive()).is_none());
    }

    // ------------------------------------------------------------------
    // Resets and rollover
    // ------------------------------------------------------------------

    #[test]
    fn test_reset_type_only_touches_that_type() {
        let mut inv = TicketInventory::default();
        let now = at(2024, 6, 1);
        inv.restock(TicketType::Daily, 10, None, "Sarah", now).unwrap();
        inv.restock(TicketType::Weekly, 4, None, "Sarah", now).unwrap();

        inv.reset_type(TicketType::Daily);

        assert_eq!(inv.counter(TicketType::Daily), TicketCounter::default());
        assert_eq!(inv.counter(TicketType::Weekly).available, 4);
        assert_eq!(inv.history.len(), 1);
        assert_eq!(inv.history[0].ticket_type, TicketType::Weekly);
        assert!(inv.last_restock_date.is_some(), "restock date survives a type reset");
    }

    #[test]
    fn test_reset_all_clears_everything() {
        let mut inv = TicketInventory::default();
        inv.restock(TicketType::Daily, 10, None, "Sarah", at(2024, 6, 1))
            .unwrap();
        inv.consume_one(TicketType::Daily, "Amina", "Sarah", at(2024, 6, 1))
            .unwrap();

        inv.reset_all();

        assert!(inv.types.values().all(|c| *c == TicketCounter::default()));
        assert!(inv.history.is_empty());
        assert_eq!(inv.last_restock_date, None);
    }

    #[test]
    fn test_rollover_zeroes_used_today_once() {
        let mut inv = seeded(TicketType::Daily, 5, 3, 20);
        inv.types.insert(
            TicketType::OneHour,
            TicketCounter {
                available: 2,
                used_today: 1,
                total_used: 7,
            },
        );
        let today = at(2024, 6, 2).date_naive();

        assert!(inv.rollover_if_needed(Some(at(2024, 6, 1).date_naive()), today));
        assert_eq!(inv.counter(TicketType::Daily).used_today, 0);
        assert_eq!(inv.counter(TicketType::OneHour).used_today, 0);
        // Shelf and all-time counters are untouched
        assert_eq!(inv.counter(TicketType::Daily).available, 5);
        assert_eq!(inv.counter(TicketType::Daily).total_used, 20);

        // Marker advanced to today: a second check is a no-op
        assert!(!inv.rollover_if_needed(Some(today), today));
    }

    #[test]
    fn test_rollover_fires_with_no_marker() {
        let mut inv = seeded(TicketType::Daily, 5, 3, 20);
        assert!(inv.rollover_if_needed(None, at(2024, 6, 1).date_naive()));
        assert_eq!(inv.counter(TicketType::Daily).used_today, 0);
    }

    // ------------------------------------------------------------------
    // Persisted shape
    // ------------------------------------------------------------------

    #[test]
    fn test_inventory_serde_shape() {
        let mut inv = TicketInventory::default();
        inv.restock(TicketType::OneHour, 5, None, "Sarah", at(2024, 6, 1))
            .unwrap();
        inv.consume_one(TicketType::OneHour, "Amina", "Sarah", at(2024, 6, 1))
            .unwrap();

        let value = serde_json::to_value(&inv).unwrap();
        assert!(value["types"]["1hour"]["usedToday"].is_u64());
        assert!(value["types"]["monthly"]["available"].is_u64());
        assert_eq!(value["history"][0]["type"], "restock");
        assert_eq!(value["history"][1]["type"], "used");
        assert_eq!(value["history"][1]["ticketType"], "1hour");
        assert_eq!(value["history"][1]["amount"], -1);
        assert!(value["history"][1]["balanceAfter"].is_u64());
        assert!(value["lastRestockDate"].is_string());

        let back: TicketInventory = serde_json::from_value(value).unwrap();
        assert_eq!(back.counter(TicketType::OneHour).available, 4);
        assert_eq!(back.history.len(), 2);
    }

    #[test]
    fn test_normalize_fills_missing_types() {
        let raw = r#"{
            "types": { "daily": { "available": 3, "usedToday": 1, "totalUsed": 9 } },
            "history": [],
            "lastRestockDate": null
        }"#;
        let mut inv: TicketInventory = serde_json::from_str(raw).unwrap();
        inv.normalize();

        assert_eq!(inv.types.len(), 5);
        assert_eq!(inv.counter(TicketType::Daily).available, 3);
        assert_eq!(inv.counter(TicketType::Monthly), TicketCounter::default());
    }
}
