use chrono::NaiveDate;
use clap::{ArgAction, CommandFactory, Parser};
use log::LevelFilter;

use crate::error::{LoanError, Result};
use crate::loan::LoanTerms;
use crate::report::ReportOptions;

pub const MIN_AMOUNT: f64 = 50.;
pub const MAX_AMOUNT: f64 = 50_000_000.;
pub const MAX_APR: f64 = 20.;
pub const MAX_MONTHS: u32 = 600;

/// Loan statistics and an amortization table for a fixed-rate loan
#[derive(Parser, Debug)]
#[command(name = "amortize", version, allow_negative_numbers = true)]
pub struct Cli {
    /// Amount borrowed
    #[arg(value_name = "LOAN_AMOUNT")]
    pub amount: f64,

    /// Annual percentage rate, e.g. 4.25 for 4.25%
    #[arg(value_name = "INTEREST_RATE")]
    pub apr: f64,

    /// Loan term in months
    #[arg(value_name = "NUMBER_OF_MONTHS")]
    pub months: u32,

    /// Extra amount paid toward principal every month
    #[arg(value_name = "EXTRA_PAYMENT")]
    pub extra: f64,

    /// Number of payments shown at the start of the table
    #[arg(long, default_value_t = 5)]
    pub head: usize,

    /// Number of payments shown at the end of the table
    #[arg(long, default_value_t = 5)]
    pub tail: usize,

    /// Show every payment
    #[arg(long)]
    pub full: bool,

    /// Due date of the first payment; adds a date column
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub first_payment: Option<NaiveDate>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Range-checks the parsed arguments and turns them into loan terms.
    pub fn terms(&self) -> Result<LoanTerms> {
        check_range("Loan Amount", self.amount, MIN_AMOUNT, MAX_AMOUNT)?;
        check_range("Interest Rate", self.apr, 0., MAX_APR)?;
        check_range(
            "Number of Months",
            f64::from(self.months),
            1.,
            f64::from(MAX_MONTHS),
        )?;
        check_range("Extra Payment per Month", self.extra, 0., self.amount)?;

        Ok(LoanTerms::new(self.amount, self.apr, self.months, self.extra))
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            full: self.full,
            first_payment: self.first_payment,
            ..ReportOptions::new(self.head, self.tail)
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn usage() -> String {
        Cli::command().render_usage().to_string()
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(LoanError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use crate::error::LoanError;
    use crate::loan::LoanTerms;
    use chrono::NaiveDate;
    use clap::{error::ErrorKind, Parser};
    use log::LevelFilter;
    use test_log::test;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("amortize").chain(args.iter().copied())).unwrap()
    }

    fn out_of_range(args: &[&str]) -> &'static str {
        match parse(args).terms() {
            Err(LoanError::OutOfRange { field, .. }) => field,
            other => panic!("expected a range error, got {:?}", other),
        }
    }

    #[test]
    fn test_positional_arguments() {
        let cli = parse(&["150000", "6.5", "180", "250"]);
        assert_eq!(cli.terms(), Ok(LoanTerms::new(150000., 6.5, 180, 250.)));
    }

    #[test]
    fn test_option_defaults() {
        let cli = parse(&["200000", "4.25", "360", "0"]);
        let options = cli.report_options();

        assert_eq!((options.head, options.tail, options.full), (5, 5, false));
        assert_eq!(options.first_payment, None);
        assert_eq!(options.dec_places, 2);
        assert_eq!(cli.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_options() {
        let cli = parse(&[
            "1000",
            "0",
            "10",
            "0",
            "--full",
            "--head",
            "3",
            "--first-payment",
            "2024-04-01",
            "-vv",
        ]);
        let options = cli.report_options();

        assert!(options.full);
        assert_eq!(options.head, 3);
        assert_eq!(options.first_payment, NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(cli.log_level(), LevelFilter::Debug);
    }

    #[test]
    fn test_argument_count() {
        let too_few: [&[&str]; 4] = [
            &["amortize"],
            &["amortize", "1000"],
            &["amortize", "1000", "5"],
            &["amortize", "1000", "5", "12"],
        ];
        for args in too_few {
            let err = Cli::try_parse_from(args.iter().copied()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument, "{:?}", args);
        }

        let too_many = Cli::try_parse_from(["amortize", "1", "2", "3", "4", "5"]).unwrap_err();
        assert_eq!(too_many.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_rejected_values() {
        let bad_amount = Cli::try_parse_from(["amortize", "lots", "5", "12", "0"]).unwrap_err();
        assert_eq!(bad_amount.kind(), ErrorKind::ValueValidation);

        let bad_months = Cli::try_parse_from(["amortize", "1000", "5", "12.5", "0"]).unwrap_err();
        assert_eq!(bad_months.kind(), ErrorKind::ValueValidation);

        let bad_date = Cli::try_parse_from([
            "amortize",
            "1000",
            "5",
            "12",
            "0",
            "--first-payment",
            "2024-13-01",
        ])
        .unwrap_err();
        assert_eq!(bad_date.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_range_errors() {
        assert_eq!(out_of_range(&["49.99", "5", "12", "0"]), "Loan Amount");
        assert_eq!(out_of_range(&["50000000.01", "5", "12", "0"]), "Loan Amount");
        assert_eq!(out_of_range(&["NaN", "5", "12", "0"]), "Loan Amount");
        assert_eq!(out_of_range(&["1000", "-0.5", "12", "0"]), "Interest Rate");
        assert_eq!(out_of_range(&["1000", "20.5", "12", "0"]), "Interest Rate");
        assert_eq!(out_of_range(&["1000", "5", "0", "0"]), "Number of Months");
        assert_eq!(out_of_range(&["1000", "5", "601", "0"]), "Number of Months");
        assert_eq!(out_of_range(&["1000", "5", "12", "-1"]), "Extra Payment per Month");
        assert_eq!(out_of_range(&["1000", "5", "12", "1000.01"]), "Extra Payment per Month");

        assert!(parse(&["50", "0", "1", "50"]).terms().is_ok());
        assert!(parse(&["50000000", "20", "600", "0"]).terms().is_ok());
    }

    #[test]
    fn test_range_message() {
        let err = parse(&["1000", "25", "12", "0"]).terms().unwrap_err();
        assert_eq!(err.to_string(), "Interest Rate is outside of Range (0 to 20, got 25)");
    }

    #[test]
    fn test_usage() {
        let usage = Cli::usage();
        assert!(usage.contains("amortize"));
        assert!(usage.contains("<LOAN_AMOUNT> <INTEREST_RATE> <NUMBER_OF_MONTHS> <EXTRA_PAYMENT>"));
    }
}
