use log::{debug, trace, warn};
use std::fmt;

use crate::error::{LoanError, Result};

/// Balances within half a cent of the scheduled payment are settled by the
/// final payment instead of leaving floating-point dust behind.
const HALF_CENT: f64 = 0.005;

/// The four inputs that describe a fixed-rate loan scenario.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoanTerms {
    pub principal: f64,     // amount originally borrowed
    pub annual_rate: f64,   // APR as a percentage (i.e., 4.25, 7.0)
    pub term_months: u32,   // nominal term; payoff may come earlier
    pub extra_payment: f64, // applied to principal every month until payoff
}

impl LoanTerms {
    pub fn new(principal: f64, annual_rate: f64, term_months: u32, extra_payment: f64) -> Self {
        Self {
            principal,
            annual_rate,
            term_months,
            extra_payment,
        }
    }

    /// The same loan paid strictly on schedule.
    pub fn without_extra(&self) -> Self {
        Self {
            extra_payment: 0.,
            ..*self
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleRow {
    pub period: u32,
    pub pmt_amount: f64,
    pub interest_portion: f64,
    pub principal_portion: f64,
    pub end_balance: f64,
}

impl ScheduleRow {
    pub fn new(
        period: u32,
        pmt_amount: f64,
        interest_portion: f64,
        principal_portion: f64,
        end_balance: f64,
    ) -> Self {
        Self {
            period,
            pmt_amount,
            interest_portion,
            principal_portion,
            end_balance,
        }
    }

    /// Row 0: the state of the loan before any payment is made.
    pub fn opening(principal: f64) -> Self {
        Self::new(0, 0., 0., 0., principal)
    }
}

impl fmt::Display for ScheduleRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pmt number {}, payment ${:.2}, interest paid ${:.2}, principal paid ${:.2}, ending balance ${:.2}",
            self.period,
            self.pmt_amount,
            self.interest_portion,
            self.principal_portion,
            self.end_balance
        )
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Loan {
    terms: LoanTerms,
    monthly_rate: f64,
    pmt_amount: f64,
}

impl Loan {
    pub fn new(terms: LoanTerms) -> Result<Self> {
        check_terms(&terms)?;

        let monthly_rate = terms.annual_rate / 100. / 12.;
        let pmt_amount = get_pmt_amount(&terms.principal, &monthly_rate, &terms.term_months);
        debug!(
            "loan of {} at {}% over {} months, monthly rate {}, payment {}, extra {}",
            terms.principal,
            terms.annual_rate,
            terms.term_months,
            monthly_rate,
            pmt_amount,
            terms.extra_payment
        );

        Ok(Self {
            terms,
            monthly_rate,
            pmt_amount,
        })
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn monthly_rate(&self) -> f64 {
        self.monthly_rate
    }

    /// Scheduled monthly payment at full precision, excluding the extra payment.
    pub fn get_pmt_amount(&self) -> f64 {
        self.pmt_amount
    }

    pub fn interest_due(&self, balance: f64) -> f64 {
        self.monthly_rate * balance
    }

    /// Reduction of the balance by a full (non-final) payment, extra included.
    pub fn principal_due(&self, balance: f64) -> f64 {
        self.pmt_amount - self.interest_due(balance) + self.terms.extra_payment
    }

    /// Makes the payment for `period` against `balance`. The returned row's
    /// `end_balance` is the balance carried into the next period.
    pub fn apply_payment(&self, period: u32, balance: f64) -> ScheduleRow {
        let interest = self.interest_due(balance);

        let row = if balance > self.pmt_amount + self.terms.extra_payment + HALF_CENT {
            let principal = self.principal_due(balance);
            ScheduleRow::new(
                period,
                self.pmt_amount + self.terms.extra_payment,
                interest,
                principal,
                balance - principal,
            )
        } else {
            // final payment clears whatever is left, never more
            ScheduleRow::new(period, interest + balance, interest, balance, 0.)
        };

        trace!(
            "pmt # {}, interest {}, principal {}, end bal {}",
            row.period,
            row.interest_portion,
            row.principal_portion,
            row.end_balance
        );
        row
    }

    /// Lazily walks the payments from period 1 until payoff or the end of the term.
    pub fn payments(&self) -> Payments<'_> {
        Payments {
            loan: self,
            period: 0,
            balance: self.terms.principal,
        }
    }

    pub fn amortize(&self) -> Schedule {
        let mut rows = vec![ScheduleRow::opening(self.terms.principal)];
        let mut payments = self.payments();
        rows.extend(payments.by_ref());

        if payments.remaining_balance() > 0. {
            warn!(
                "term of {} months ended with balance {} outstanding",
                self.terms.term_months,
                payments.remaining_balance()
            );
        }
        Schedule { rows }
    }

    pub fn summary(&self) -> LoanSummary {
        LoanSummary::new(self, &self.amortize())
    }

    // the scheduled payment does not depend on the extra payment
    fn baseline(&self) -> Loan {
        Loan {
            terms: self.terms.without_extra(),
            ..*self
        }
    }
}

pub struct Payments<'a> {
    loan: &'a Loan,
    period: u32,
    balance: f64,
}

impl Payments<'_> {
    pub fn remaining_balance(&self) -> f64 {
        self.balance
    }
}

impl Iterator for Payments<'_> {
    type Item = ScheduleRow;

    fn next(&mut self) -> Option<ScheduleRow> {
        if self.balance <= 0. || self.period >= self.loan.terms.term_months {
            return None;
        }
        self.period += 1;
        let row = self.loan.apply_payment(self.period, self.balance);
        self.balance = row.end_balance;
        Some(row)
    }
}

/// Amortization schedule: row 0 followed by one row per month actually paid.
#[derive(Clone, PartialEq, Debug)]
pub struct Schedule {
    rows: Vec<ScheduleRow>,
}

impl Schedule {
    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, period: usize) -> Option<&ScheduleRow> {
        self.rows.get(period)
    }

    /// Rows 1..end, excluding the opening row.
    pub fn payments(&self) -> &[ScheduleRow] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn get_pmt_count(&self) -> usize {
        self.payments().len()
    }

    /// The opening row and the first `n` payments.
    pub fn head(&self, n: usize) -> &[ScheduleRow] {
        &self.rows[..(n + 1).min(self.rows.len())]
    }

    /// The last `n` rows.
    pub fn tail(&self, n: usize) -> &[ScheduleRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    pub fn total_paid(&self) -> f64 {
        self.payments().iter().map(|row| row.pmt_amount).sum()
    }

    pub fn total_interest(&self) -> f64 {
        self.payments().iter().map(|row| row.interest_portion).sum()
    }

    pub fn final_balance(&self) -> f64 {
        self.rows.last().map_or(0., |row| row.end_balance)
    }

    /// Period of the payment that cleared the loan, if it was cleared.
    pub fn payoff_period(&self) -> Option<u32> {
        self.payments()
            .last()
            .filter(|row| row.end_balance == 0.)
            .map(|row| row.period)
    }
}

/// Totals for a loan, compared with the same loan without extra payments.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoanSummary {
    pub monthly_payment: f64,
    pub pmt_count: usize,
    pub total_paid: f64,
    pub total_interest: f64,
    pub baseline_pmt_count: usize,
    pub baseline_total_paid: f64,
    pub interest_saved: f64,
    pub months_saved: usize,
}

impl LoanSummary {
    pub fn new(loan: &Loan, schedule: &Schedule) -> Self {
        let baseline = loan.baseline().amortize();
        let total_paid = schedule.total_paid();
        let baseline_total_paid = baseline.total_paid();

        Self {
            monthly_payment: loan.get_pmt_amount(),
            pmt_count: schedule.get_pmt_count(),
            total_paid,
            total_interest: schedule.total_interest(),
            baseline_pmt_count: baseline.get_pmt_count(),
            baseline_total_paid,
            interest_saved: baseline_total_paid - total_paid,
            months_saved: baseline
                .get_pmt_count()
                .saturating_sub(schedule.get_pmt_count()),
        }
    }
}

/// Rounds to `dec` decimal places, normalizing negative zero.
pub fn round(amt: f64, dec: u32) -> f64 {
    let factor = 10_f64.powi(dec as i32);
    let rounded = (amt * factor).round() / factor;
    if rounded == 0. {
        0.
    } else {
        rounded
    }
}

fn check_terms(terms: &LoanTerms) -> Result<()> {
    if !(terms.principal.is_finite() && terms.principal > 0.) {
        return Err(LoanError::InvalidParameter {
            name: "principal",
            value: terms.principal,
        });
    }
    if !(terms.annual_rate.is_finite() && terms.annual_rate >= 0.) {
        return Err(LoanError::InvalidParameter {
            name: "annual rate",
            value: terms.annual_rate,
        });
    }
    // the payment formula raises to the term as an i32 power
    if terms.term_months == 0 || i32::try_from(terms.term_months).is_err() {
        return Err(LoanError::InvalidParameter {
            name: "term months",
            value: f64::from(terms.term_months),
        });
    }
    if !(terms.extra_payment.is_finite() && terms.extra_payment >= 0.) {
        return Err(LoanError::InvalidParameter {
            name: "extra payment",
            value: terms.extra_payment,
        });
    }
    Ok(())
}

fn get_pmt_amount(
    &principal: &f64,    // loan principal
    &monthly_rate: &f64, // periodic rate as a fraction (i.e., 0.0035)
    &term_months: &u32,  // number of monthly payments
) -> f64 {
    if monthly_rate == 0. {
        return principal / f64::from(term_months);
    }

    let factor = match i32::try_from(term_months) {
        Ok(exp) => (1. + monthly_rate).powi(exp),
        Err(_) => (1. + monthly_rate).powf(f64::from(term_months)),
    };
    (principal * monthly_rate * factor) / (factor - 1.)
}
