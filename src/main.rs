use chrono::NaiveDate;
use clap::{ArgAction, Parser, ValueEnum};
use log::{info, LevelFilter};
use mortgage::calendar::PaymentCalendar;
use mortgage::input::{parse_excess_payments, parse_rate_changes};
use mortgage::*;
use simple_logger::SimpleLogger;
use std::process;

/// Amortization schedule for a loan, with optional excess payments and rate changes
#[derive(Parser, Debug)]
#[command(name = "mortgage", version)]
struct Cli {
    /// Amount borrowed
    #[arg(long)]
    principal: f64,

    /// Nominal annual rate as a decimal, e.g. 0.04
    #[arg(long)]
    rate: f64,

    /// Number of repayment periods
    #[arg(long, default_value_t = 360)]
    periods: u32,

    #[arg(long, default_value_t = LoanTerms::DEFAULT_PERIODS_PER_YEAR)]
    periods_per_year: u32,

    /// One-time fee added to the total cost
    #[arg(long, default_value_t = 0.)]
    commission: f64,

    #[arg(long, value_enum, default_value_t = CliPolicy::Both)]
    policy: CliPolicy,

    /// Excess payments as "(period,amount)(period,amount)..."
    #[arg(long)]
    excess: Option<String>,

    /// Rate changes as "(period,rate)...", effective after the given period
    #[arg(long)]
    rate_changes: Option<String>,

    /// Date of the first payment (YYYY-MM-DD)
    #[arg(long)]
    first_payment: Option<NaiveDate>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPolicy {
    Annuity,
    Decreasing,
    Both,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Logger error: {e}");
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> LoanResult<()> {
    let terms = LoanTerms::new(cli.principal, cli.rate, cli.periods, cli.commission)?
        .with_periods_per_year(cli.periods_per_year)?;
    let calendar = cli
        .first_payment
        .map(|date| PaymentCalendar::new(date, cli.periods_per_year))
        .transpose()?;

    let excess_payments = match &cli.excess {
        Some(text) => parse_excess_payments(text)?,
        None => Vec::new(),
    };
    let rate_changes = match &cli.rate_changes {
        Some(text) => parse_rate_changes(text)?,
        None => Vec::new(),
    };
    info!(
        "{} excess payments, {} rate changes",
        excess_payments.len(),
        rate_changes.len()
    );
    let adjustments =
        Adjustments::new(&excess_payments).with_rate_update(RateSchedule::new(&rate_changes));

    match cli.policy {
        CliPolicy::Annuity => {
            let result = compute_schedule(&terms, &adjustments, AmortizationPolicy::Annuity)?;
            show_schedule(&result, calendar.as_ref());
            show_summary(AmortizationPolicy::Annuity, &result, &terms);
        }
        CliPolicy::Decreasing => {
            let result = compute_schedule(&terms, &adjustments, AmortizationPolicy::Decreasing)?;
            show_schedule(&result, calendar.as_ref());
            show_summary(AmortizationPolicy::Decreasing, &result, &terms);
        }
        CliPolicy::Both => {
            let annuity = compute_schedule(&terms, &adjustments, AmortizationPolicy::Annuity)?;
            let decreasing = compute_schedule(&terms, &adjustments, AmortizationPolicy::Decreasing)?;
            show_comparison(&annuity, &decreasing, calendar.as_ref());
            show_summary(AmortizationPolicy::Annuity, &annuity, &terms);
            show_summary(AmortizationPolicy::Decreasing, &decreasing, &terms);
            println!(
                "Difference: cash={:.2}, periods={};{}, years={:.2};{:.2}",
                annuity.total_cost - decreasing.total_cost,
                annuity.len(),
                decreasing.len(),
                annuity.years(terms.periods_per_year()),
                decreasing.years(terms.periods_per_year())
            );
        }
    }
    Ok(())
}

fn row_label(period: usize, calendar: Option<&PaymentCalendar>) -> String {
    match calendar.and_then(|c| c.date_of(period)) {
        Some(date) => format!("{}. {}", period + 1, date),
        None => format!("{}.", period + 1),
    }
}

fn show_schedule(result: &ScheduleResult, calendar: Option<&PaymentCalendar>) {
    for (period, entry) in result.entries().iter().enumerate() {
        println!("{} {}", row_label(period, calendar), entry);
    }
}

// rows past the end of the shorter schedule are shown as zeros
fn show_comparison(
    annuity: &ScheduleResult,
    decreasing: &ScheduleResult,
    calendar: Option<&PaymentCalendar>,
) {
    let paid_off = ScheduleEntry {
        installment: 0.,
        interest: 0.,
        principal: 0.,
        excess: 0.,
    };
    for period in 0..annuity.len().max(decreasing.len()) {
        let left = annuity.entries().get(period).unwrap_or(&paid_off);
        let right = decreasing.entries().get(period).unwrap_or(&paid_off);
        println!("{} {} || {}", row_label(period, calendar), left, right);
    }
}

fn show_summary(policy: AmortizationPolicy, result: &ScheduleResult, terms: &LoanTerms) {
    println!(
        "Mortgage value {}: {:.2}, costs: {:.2}",
        policy,
        result.total_cost,
        result.total_cost - terms.principal()
    );
}

// verifies that types can implement the gated traits below
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<ScheduleEntry>();
    is_normal::<ScheduleResult>();
    is_normal::<LoanTerms>();
    is_normal::<PaymentCalendar>();
}
