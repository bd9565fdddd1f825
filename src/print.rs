//! Printable HTML reports.
//!
//! Two renditions of the same day: a live report built from the current
//! lists for end-of-shift printing, and a reprint of a saved `DailyReport`
//! from history. Each returns a complete standalone HTML document; the
//! caller hands it to whatever does the actual printing.

use chrono::{DateTime, NaiveDate, Utc};

use crate::clients::ClientRecord;
use crate::expenses::ExpenseRecord;
use crate::reports::{self, DailyReport};
use crate::tickets::{TicketInventory, TicketType};

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Amounts the way the register shows money: thousands separators, with
/// fractional digits only when the amount has them.
fn money(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = if negative {
        format!("-{grouped}")
    } else {
        grouped
    };
    if frac != 0 {
        if frac % 10 == 0 {
            out.push_str(&format!(".{}", frac / 10));
        } else {
            out.push_str(&format!(".{frac:02}"));
        }
    }
    out
}

/// "Saturday, June 1, 2024"
fn long_date(day: NaiveDate) -> String {
    day.format("%A, %B %-d, %Y").to_string()
}

/// "09:30 AM"
fn clock_time(ts: DateTime<Utc>) -> String {
    ts.format("%I:%M %p").to_string()
}

/// "6/1/2024, 9:30:00 AM"
fn timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

fn dash_if_empty(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        esc(value)
    }
}

fn client_type(client: &ClientRecord) -> &'static str {
    if client.is_non_ticket {
        "No-Ticket"
    } else {
        "Regular"
    }
}

// ---------------------------------------------------------------------------
// Live end-of-shift report
// ---------------------------------------------------------------------------

const LIVE_STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; color: #333; }
        h1 { font-size: 24px; text-align: center; color: #333; margin-bottom: 10px; }
        h2 { font-size: 18px; color: #333; margin-top: 20px; margin-bottom: 10px; border-bottom: 2px solid #333; padding-bottom: 5px; }
        table { width: 100%; border-collapse: collapse; margin: 15px 0; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background: #f3f4f6; font-weight: bold; }
        .header { text-align: center; border-bottom: 2px solid #333; padding-bottom: 20px; margin-bottom: 30px; }
        .summary { background: #f9fafb; padding: 15px; margin: 20px 0; border: 1px solid #ddd; border-radius: 5px; }
        .summary table { border: none; }
        .summary td { border: none; padding: 5px 10px; }
        .summary tr:last-child td { font-size: 18px; font-weight: bold; padding-top: 10px; border-top: 2px solid #333; }
        .footer { text-align: center; margin-top: 50px; font-size: 12px; color: #666; border-top: 1px solid #ddd; padding-top: 20px; }
        .status-paid { color: #059669; }
        .status-unpaid { color: #f59e0b; }
        .status-borrowed { color: #ef4444; }
        @media print { body { margin: 0; } }
"#;

/// Render today's report from the live lists.
pub fn live_report_html(
    clients: &[ClientRecord],
    expenses: &[ExpenseRecord],
    inventory: &TicketInventory,
    employee: &str,
    now: DateTime<Utc>,
) -> String {
    let today = now.date_naive();
    let day_clients = reports::clients_for_day(clients, today);
    let day_expenses = reports::expenses_for_day(expenses, today);
    let summary = reports::summarize_day(clients, expenses, today).to_report_summary();

    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Today's Report - {date}</title>\n<style>{LIVE_STYLE}</style>\n</head>\n<body>\n\
         <div class=\"header\">\n\
         <h1>\u{1F4F6} Sama Wi-Fi - Daily Report</h1>\n\
         <p><strong>{date}</strong></p>\n\
         <p>Generated by: <strong>{employee}</strong> | Time: {time}</p>\n\
         </div>\n",
        date = long_date(today),
        employee = esc(employee),
        time = now.format("%-I:%M:%S %p"),
    );

    html.push_str(&format!(
        "<h2>\u{1F4CA} Clients Summary ({} Total)</h2>\n",
        day_clients.len()
    ));
    if day_clients.is_empty() {
        html.push_str("<p>No clients recorded today.</p>\n");
    } else {
        html.push_str(
            "<table>\n<thead>\n<tr><th>#</th><th>Time</th><th>Name</th><th>Phone</th>\
             <th>Duration</th><th>Amount</th><th>Status</th><th>Type</th><th>Notes</th></tr>\n\
             </thead>\n<tbody>\n",
        );
        for (index, client) in day_clients.iter().enumerate() {
            let status = client.payment_status.key();
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
                 <td>{} SSP</td><td class=\"status-{status}\">{status}</td><td>{}</td><td>{}</td></tr>\n",
                index + 1,
                clock_time(client.date),
                esc(&client.name),
                dash_if_empty(&client.phone),
                client.duration.label(),
                money(client.amount),
                client_type(client),
                dash_if_empty(&client.notes),
            ));
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str(&format!(
        "<h2>\u{1F4B8} Expenses Summary ({} Total)</h2>\n",
        day_expenses.len()
    ));
    if day_expenses.is_empty() {
        html.push_str("<p>No expenses recorded today.</p>\n");
    } else {
        html.push_str(
            "<table>\n<thead>\n<tr><th>#</th><th>Time</th><th>Category</th>\
             <th>Description</th><th>Amount</th></tr>\n</thead>\n<tbody>\n",
        );
        for (index, expense) in day_expenses.iter().enumerate() {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} SSP</td></tr>\n",
                index + 1,
                clock_time(expense.date),
                esc(&expense.category_label()),
                esc(&expense.reason),
                money(expense.amount),
            ));
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str(
        "<h2>\u{1F3AB} Ticket Summary</h2>\n<table>\n<thead>\n\
         <tr><th>Ticket Type</th><th>Price</th><th>Available</th>\
         <th>Used Today</th><th>Total Used</th></tr>\n</thead>\n<tbody>\n",
    );
    for ticket_type in TicketType::ALL {
        let counter = inventory.counter(ticket_type);
        html.push_str(&format!(
            "<tr><td>{}</td><td>{} SSP</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            ticket_type.display_name(),
            money(ticket_type.price()),
            counter.available,
            counter.used_today,
            counter.total_used,
        ));
    }
    html.push_str(&format!(
        "<tr style=\"font-weight: bold; background: #f3f4f6;\">\
         <td>TOTAL</td><td>-</td><td>{}</td><td>{}</td><td>{}</td></tr>\n</tbody>\n</table>\n",
        inventory.total_available(),
        inventory.total_used_today(),
        inventory.total_used_all_time(),
    ));

    html.push_str(&format!(
        "<div class=\"summary\">\n<h2>\u{1F4B0} Financial Summary</h2>\n<table>\n\
         <tr><td><strong>Total Clients:</strong></td><td>{}</td></tr>\n\
         <tr><td><strong>Total Revenue (Paid):</strong></td><td>{} SSP</td></tr>\n\
         <tr><td><strong>Total Unpaid/Borrowed:</strong></td><td>{} SSP</td></tr>\n\
         <tr><td><strong>Total Expenses:</strong></td><td>{} SSP</td></tr>\n\
         <tr><td><strong>NET PROFIT:</strong></td><td>{} SSP</td></tr>\n\
         </table>\n</div>\n",
        summary.total_clients,
        money(summary.total_revenue),
        money(summary.total_unpaid),
        money(summary.total_expenses),
        money(summary.net_profit),
    ));

    html.push_str(&format!(
        "<div class=\"footer\">\n\
         <p>\u{A9} 2024 Sama Wi-Fi Management System</p>\n\
         <p>This report was generated on: {}</p>\n\
         <p>Employee: {}</p>\n\
         </div>\n</body>\n</html>\n",
        timestamp(now),
        esc(employee),
    ));

    html
}

// ---------------------------------------------------------------------------
// Saved report reprint
// ---------------------------------------------------------------------------

const SAVED_STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; }
        h1, h2 { color: #333; }
        table { width: 100%; border-collapse: collapse; margin: 20px 0; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background: #f3f4f6; }
        .header { text-align: center; border-bottom: 2px solid #333; padding-bottom: 20px; margin-bottom: 30px; }
        .summary { background: #f9fafb; padding: 15px; margin: 20px 0; }
        .footer { text-align: center; margin-top: 50px; font-size: 12px; color: #666; }
        @media print { body { margin: 0; } }
"#;

/// Render a saved report for reprinting. The ticket table shows the
/// counters as frozen that day, without prices or a total row.
pub fn saved_report_html(report: &DailyReport, now: DateTime<Utc>) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Daily Report - {date}</title>\n<style>{SAVED_STYLE}</style>\n</head>\n<body>\n\
         <div class=\"header\">\n\
         <h1>Sama Wi-Fi Daily Report</h1>\n\
         <p>{date}</p>\n\
         <p>Generated by: {employee} | Saved on: {saved}</p>\n\
         </div>\n",
        date = long_date(report.date),
        employee = esc(&report.employee),
        saved = timestamp(report.saved_at),
    );

    html.push_str(&format!(
        "<h2>Clients Summary ({})</h2>\n<table>\n<thead>\n\
         <tr><th>#</th><th>Time</th><th>Name</th><th>Phone</th><th>Duration</th>\
         <th>Amount</th><th>Status</th><th>Type</th></tr>\n</thead>\n<tbody>\n",
        report.clients.len()
    ));
    for (index, client) in report.clients.iter().enumerate() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{} SSP</td><td>{}</td><td>{}</td></tr>\n",
            index + 1,
            clock_time(client.date),
            esc(&client.name),
            dash_if_empty(&client.phone),
            client.duration.label(),
            money(client.amount),
            client.payment_status.key(),
            client_type(client),
        ));
    }
    html.push_str("</tbody>\n</table>\n");

    html.push_str(&format!(
        "<h2>Expenses Summary ({})</h2>\n<table>\n<thead>\n\
         <tr><th>#</th><th>Time</th><th>Category</th><th>Description</th>\
         <th>Amount</th></tr>\n</thead>\n<tbody>\n",
        report.expenses.len()
    ));
    for (index, expense) in report.expenses.iter().enumerate() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} SSP</td></tr>\n",
            index + 1,
            clock_time(expense.date),
            esc(&expense.category_label()),
            esc(&expense.reason),
            money(expense.amount),
        ));
    }
    html.push_str("</tbody>\n</table>\n");

    if !report.ticket_data.types.is_empty() {
        html.push_str(
            "<h2>Ticket Summary</h2>\n<table>\n<thead>\n\
             <tr><th>Ticket Type</th><th>Available</th><th>Used That Day</th>\
             <th>Total Used</th></tr>\n</thead>\n<tbody>\n",
        );
        for (ticket_type, counter) in &report.ticket_data.types {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                ticket_type.display_name(),
                counter.available,
                counter.used_today,
                counter.total_used,
            ));
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str(&format!(
        "<div class=\"summary\">\n<h2>Financial Summary</h2>\n<table>\n\
         <tr><td><strong>Total Clients</strong></td><td>{}</td></tr>\n\
         <tr><td><strong>Total Revenue (Paid)</strong></td><td>{} SSP</td></tr>\n\
         <tr><td><strong>Total Unpaid/Borrowed</strong></td><td>{} SSP</td></tr>\n\
         <tr><td><strong>Total Expenses</strong></td><td>{} SSP</td></tr>\n\
         <tr style=\"font-size: 18px; font-weight: bold;\"><td><strong>NET PROFIT</strong></td><td>{} SSP</td></tr>\n\
         </table>\n</div>\n",
        report.summary.total_clients,
        money(report.summary.total_revenue),
        money(report.summary.total_unpaid),
        money(report.summary.total_expenses),
        money(report.summary.net_profit),
    ));

    html.push_str(&format!(
        "<div class=\"footer\">\n\
         <p>\u{A9} 2024 Sama Wi-Fi Management System</p>\n\
         <p>Printed on: {}</p>\n\
         </div>\n</body>\n</html>\n",
        timestamp(now),
    ));

    html
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{NewClient, PaymentStatus};
    use crate::expenses::{ExpenseCategory, NewExpense};
    use crate::reports::build_daily_report;
    use chrono::TimeZone;

    fn at_clock(h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, min, 0).unwrap()
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(0.0), "0");
        assert_eq!(money(500.0), "500");
        assert_eq!(money(14000.0), "14,000");
        assert_eq!(money(1234567.0), "1,234,567");
        assert_eq!(money(1500.5), "1,500.5");
        assert_eq!(money(1500.25), "1,500.25");
        assert_eq!(money(-2500.0), "-2,500");
    }

    #[test]
    fn test_esc_neutralizes_markup() {
        assert_eq!(esc("<b>&x</b>"), "&lt;b&gt;&amp;x&lt;/b&gt;");
    }

    #[test]
    fn test_live_report_includes_sessions_and_totals() {
        let now = at_clock(14, 30);
        let clients = vec![
            NewClient {
                name: "Amina".into(),
                phone: "0912345678".into(),
                payment_status: PaymentStatus::Paid,
                ..NewClient::default()
            }
            .into_record("Sarah", at_clock(9, 15)),
            NewClient {
                name: "Deng".into(),
                payment_status: PaymentStatus::Unpaid,
                ..NewClient::default()
            }
            .into_record("Sarah", at_clock(10, 0)),
        ];
        let expenses = vec![NewExpense {
            category: ExpenseCategory::Given,
            amount: 500.0,
            reason: "Float".into(),
            person_name: "Peter".into(),
        }
        .into_record("Sarah", at_clock(11, 0))];
        let mut inventory = TicketInventory::default();
        inventory.restock(TicketType::OneHour, 10, None, "Sarah", now).unwrap();

        let html = live_report_html(&clients, &expenses, &inventory, "Sarah", now);

        assert!(html.contains("Sama Wi-Fi - Daily Report"));
        assert!(html.contains("Saturday, June 1, 2024"));
        assert!(html.contains("Clients Summary (2 Total)"));
        assert!(html.contains("Amina"));
        assert!(html.contains("09:15 AM"));
        assert!(html.contains("class=\"status-unpaid\">unpaid"));
        assert!(html.contains("Given to Peter"));
        // Only Amina's paid 1 Hour session (1,000 SSP) counts as revenue
        assert!(html.contains("Total Revenue (Paid):</strong></td><td>1,000 SSP"));
        assert!(html.contains("NET PROFIT:</strong></td><td>500 SSP"));
        assert!(html.contains("\u{a9} 2024 Sama Wi-Fi Management System"));
    }

    #[test]
    fn test_live_report_empty_day_placeholders() {
        let now = at_clock(9, 0);
        let html = live_report_html(&[], &[], &TicketInventory::default(), "Sarah", now);

        assert!(html.contains("No clients recorded today."));
        assert!(html.contains("No expenses recorded today."));
        // Ticket table still renders, zeroed
        assert!(html.contains("Monthly Pass"));
        assert!(html.contains("<td>TOTAL</td><td>-</td><td>0</td><td>0</td><td>0</td>"));
    }

    #[test]
    fn test_live_report_escapes_client_fields() {
        let now = at_clock(9, 0);
        let clients = vec![NewClient {
            name: "<script>alert(1)</script>".into(),
            ..NewClient::default()
        }
        .into_record("Sarah", now)];

        let html = live_report_html(&clients, &[], &TicketInventory::default(), "Sarah", now);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_saved_report_shows_frozen_counters() {
        let now = at_clock(9, 0);
        let mut inventory = TicketInventory::default();
        inventory.restock(TicketType::Daily, 7, None, "Sarah", now).unwrap();
        let report = build_daily_report(&[], &[], &inventory, "Sarah", now.date_naive(), now);

        let html = saved_report_html(&report, at_clock(18, 0));

        assert!(html.contains("Sama Wi-Fi Daily Report"));
        assert!(html.contains("Used That Day"));
        assert!(html.contains("<td>Day Pass</td><td>7</td><td>0</td><td>0</td>"));
        // Reprints carry no price column and no total row
        assert!(!html.contains("Price"));
        assert!(!html.contains("<td>TOTAL</td>"));
        assert!(html.contains("Printed on:"));
    }

    #[test]
    fn test_saved_report_has_no_notes_column() {
        let now = at_clock(9, 0);
        let clients = vec![NewClient {
            name: "Amina".into(),
            notes: "VIP corner seat".into(),
            ..NewClient::default()
        }
        .into_record("Sarah", now)];
        let report = build_daily_report(
            &clients,
            &[],
            &TicketInventory::default(),
            "Sarah",
            now.date_naive(),
            now,
        );

        let html = saved_report_html(&report, now);
        assert!(!html.contains("<th>Notes</th>"));
        assert!(!html.contains("VIP corner seat"));
    }
}
