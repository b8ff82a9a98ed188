//! Plain-text rendering of a loan, its amortization schedule and its totals.

use chrono::{Months, NaiveDate};

use crate::error::{LoanError, Result};
use crate::loan::{round, Loan, LoanSummary, Schedule, ScheduleRow};

const HEADINGS: [&str; 5] = ["Payment", "Amount", "Interest", "Principal", "Balance"];

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ReportOptions {
    pub head: usize,                       // payments shown before the gap
    pub tail: usize,                       // rows shown after the gap
    pub full: bool,                        // show every row
    pub first_payment: Option<NaiveDate>,  // adds a date column when set
    pub dec_places: u32,
}

impl ReportOptions {
    pub fn new(head: usize, tail: usize) -> Self {
        Self {
            head,
            tail,
            full: false,
            first_payment: None,
            dec_places: 2,
        }
    }
}

pub fn render(
    loan: &Loan,
    schedule: &Schedule,
    summary: &LoanSummary,
    options: &ReportOptions,
) -> Result<String> {
    let terms = loan.terms();
    let dec = options.dec_places;
    let mut lines = vec![
        format!(
            "You have borrowed {} at an APR of {}",
            money(terms.principal, dec),
            terms.annual_rate
        ),
        format!("You have {} months to pay back the loan", terms.term_months),
        format!(
            "Your default monthly payment is {}",
            money(loan.get_pmt_amount(), dec)
        ),
        format!(
            "You have chosen to pay {} extra per month",
            money(terms.extra_payment, dec)
        ),
        header(options),
    ];

    for section in select_rows(schedule, options) {
        match section {
            Some(row) => lines.push(format_row(row, options)?),
            None => lines.push("    ...".to_string()),
        }
    }

    lines.push(format!(
        "You will pay a total of {}",
        money(summary.total_paid, dec)
    ));
    lines.push(format!(
        "The original repayment amount was {}",
        money(summary.baseline_total_paid, dec)
    ));
    lines.push(format!(
        "By paying extra, you saved a total of {} in interest",
        money(summary.interest_saved, dec)
    ));
    if summary.months_saved > 0 {
        lines.push(format!(
            "The loan is paid off after {} payments, {} months early",
            summary.pmt_count, summary.months_saved
        ));
    }
    if schedule.payoff_period().is_none() {
        lines.push(format!(
            "A balance of {} remains at the end of the term",
            money(schedule.final_balance(), dec)
        ));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

/// Rows to print in order; `None` marks the elided middle of the schedule.
fn select_rows<'a>(
    schedule: &'a Schedule,
    options: &ReportOptions,
) -> Vec<Option<&'a ScheduleRow>> {
    let head = schedule.head(options.head);
    let tail = schedule.tail(options.tail);

    if options.full || head.len() + tail.len() >= schedule.len() {
        return schedule.rows().iter().map(Some).collect();
    }

    head.iter()
        .map(Some)
        .chain(std::iter::once(None))
        .chain(tail.iter().map(Some))
        .collect()
}

fn header(options: &ReportOptions) -> String {
    let [payment, amount, interest, principal, balance] = HEADINGS;
    match options.first_payment {
        Some(_) => format!(
            "{:>7} {:>12} {:>15} {:>15} {:>15} {:>15}",
            payment, "Date", amount, interest, principal, balance
        ),
        None => format!(
            "{:>7} {:>15} {:>15} {:>15} {:>15}",
            payment, amount, interest, principal, balance
        ),
    }
}

fn format_row(row: &ScheduleRow, options: &ReportOptions) -> Result<String> {
    let dec = options.dec_places;
    let amounts = format!(
        "{:>15} {:>15} {:>15} {:>15}",
        money(row.pmt_amount, dec),
        money(row.interest_portion, dec),
        money(row.principal_portion, dec),
        money(row.end_balance, dec)
    );

    match options.first_payment {
        Some(first) => {
            let date = pmt_date(&first, row.period)?
                .map(|date| date.to_string())
                .unwrap_or_default();
            Ok(format!("{:>7} {:>12} {}", row.period, date, amounts))
        }
        None => Ok(format!("{:>7} {}", row.period, amounts)),
    }
}

// payments fall on the same day each month, clamped to the month's last day
fn pmt_date(&first_payment: &NaiveDate, period: u32) -> Result<Option<NaiveDate>> {
    if period == 0 {
        return Ok(None);
    }
    first_payment
        .checked_add_months(Months::new(period - 1))
        .map(Some)
        .ok_or_else(|| LoanError::InvalidDate {
            message: format!("{} does not return a date for payment {}", first_payment, period),
        })
}

fn money(amt: f64, dec: u32) -> String {
    format!("${:.*}", dec as usize, round(amt, dec))
}
