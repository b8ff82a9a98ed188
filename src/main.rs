use amortize::cli::Cli;
use amortize::loan::{Loan, LoanSummary};
use amortize::report;
use clap::Parser;
use log::info;
use simple_logger::SimpleLogger;
use std::{error::Error, process};

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(text) => print!("{}", text),
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("{}", Cli::usage());
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<String, Box<dyn Error>> {
    SimpleLogger::new().with_level(cli.log_level()).init()?;

    let loan = Loan::new(cli.terms()?)?;
    let schedule = loan.amortize();
    let summary = LoanSummary::new(&loan, &schedule);
    info!(
        "{} payments of {:.2}, total paid {:.2}, interest saved {:.2}",
        summary.pmt_count, summary.monthly_payment, summary.total_paid, summary.interest_saved
    );

    Ok(report::render(
        &loan,
        &schedule,
        &summary,
        &cli.report_options(),
    )?)
}
