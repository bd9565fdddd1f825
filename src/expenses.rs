//! Expense records for Sama POS.
//!
//! Money going out of the register: meals, transport, repairs, or cash
//! handed to someone. Expenses only ever subtract from the day's net.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PosError;

/// Where the money went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Lunch,
    Tea,
    Dinner,
    Maintenance,
    Transport,
    /// Cash given to a named person; requires `person_name`.
    Given,
    Other,
}

impl ExpenseCategory {
    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Lunch => "Lunch",
            ExpenseCategory::Tea => "Tea",
            ExpenseCategory::Dinner => "Dinner",
            ExpenseCategory::Maintenance => "Maintenance",
            ExpenseCategory::Transport => "Transport",
            ExpenseCategory::Given => "Given",
            ExpenseCategory::Other => "Other",
        }
    }
}

/// One recorded expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub category: ExpenseCategory,
    pub amount: f64,
    pub reason: String,
    /// Recipient for `Given` expenses; empty otherwise.
    #[serde(default)]
    pub person_name: String,
    pub date: DateTime<Utc>,
    pub added_by: String,
}

impl ExpenseRecord {
    /// Category text for lists and reports, e.g. "Transport" or
    /// "Given to Peter".
    pub fn category_label(&self) -> String {
        if self.category == ExpenseCategory::Given && !self.person_name.is_empty() {
            format!("Given to {}", self.person_name)
        } else {
            self.category.label().to_string()
        }
    }
}

/// Input for a new expense, as captured by the register form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewExpense {
    pub category: ExpenseCategory,
    pub amount: f64,
    pub reason: String,
    pub person_name: String,
}

impl Default for NewExpense {
    fn default() -> Self {
        NewExpense {
            category: ExpenseCategory::Other,
            amount: 0.0,
            reason: String::new(),
            person_name: String::new(),
        }
    }
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), PosError> {
        if self.amount <= 0.0 || self.reason.trim().is_empty() {
            return Err(PosError::Validation(
                "Please fill all required fields!".into(),
            ));
        }
        if self.category == ExpenseCategory::Given && self.person_name.trim().is_empty() {
            return Err(PosError::Validation("Please enter the person name!".into()));
        }
        Ok(())
    }

    pub fn into_record(self, added_by: &str, now: DateTime<Utc>) -> ExpenseRecord {
        // Recipient only means something for Given
        let person_name = if self.category == ExpenseCategory::Given {
            self.person_name.trim().to_string()
        } else {
            String::new()
        };
        ExpenseRecord {
            id: Uuid::new_v4().to_string(),
            category: self.category,
            amount: self.amount,
            reason: self.reason.trim().to_string(),
            person_name,
            date: now,
            added_by: added_by.to_string(),
        }
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
        Utc.with_ymd_and_hms(y, m, d, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_validate_requires_amount_and_reason() {
        let no_amount = NewExpense {
            category: ExpenseCategory::Lunch,
            amount: 0.0,
            reason: "Team lunch".into(),
            ..NewExpense::default()
        };
        assert_eq!(
            no_amount.validate().unwrap_err().to_string(),
            "Please fill all required fields!"
        );

        let no_reason = NewExpense {
            category: ExpenseCategory::Lunch,
            amount: 1200.0,
            reason: "  ".into(),
            ..NewExpense::default()
        };
        assert!(no_reason.validate().is_err());

        let negative = NewExpense {
            category: ExpenseCategory::Lunch,
            amount: -5.0,
            reason: "Team lunch".into(),
            ..NewExpense::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_given_requires_person_name() {
        let input = NewExpense {
            category: ExpenseCategory::Given,
            amount: 2000.0,
            reason: "Advance".into(),
            person_name: " ".into(),
        };
        assert_eq!(
            input.validate().unwrap_err().to_string(),
            "Please enter the person name!"
        );
    }

    #[test]
    fn test_into_record_drops_person_for_other_categories() {
        let record = NewExpense {
            category: ExpenseCategory::Transport,
            amount: 300.0,
            reason: "Boda to town".into(),
            person_name: "Peter".into(),
        }
        .into_record("Sarah", at(2024, 6, 1));

        assert_eq!(record.person_name, "");
        assert_eq!(record.category_label(), "Transport");
        assert_eq!(record.added_by, "Sarah");
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_category_label_names_recipient() {
        let record = NewExpense {
            category: ExpenseCategory::Given,
            amount: 2000.0,
            reason: "Advance".into(),
            person_name: "Peter".into(),
        }
        .into_record("Sarah", at(2024, 6, 1));

        assert_eq!(record.category_label(), "Given to Peter");
    }

    #[test]
    fn test_record_serde_shape() {
        let record = NewExpense {
            category: ExpenseCategory::Given,
            amount: 2000.0,
            reason: "Advance".into(),
            person_name: "Peter".into(),
        }
        .into_record("Sarah", at(2024, 6, 1));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["category"], "given");
        assert_eq!(value["personName"], "Peter");
        assert_eq!(value["addedBy"], "Sarah");
        assert_eq!(value["amount"], 2000.0);

        let back: ExpenseRecord = serde_json::from_str(&value.to_string()).unwrap();
        assert_eq!(back, record);
    }
}
