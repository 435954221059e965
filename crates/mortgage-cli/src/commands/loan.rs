use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use mortgage_core::amortization::{
    compute_amortization, LoanInput, RateType, ScheduleRow, YearAggregate,
};

use crate::input;

// Form-layer limits, stricter than the engine's own contract.
const MIN_PRINCIPAL: Decimal = dec!(1_000);
const MAX_PRINCIPAL: Decimal = dec!(5_000_000);
const MAX_RATE_PCT: Decimal = dec!(20);
const MAX_CAP_PCT: Decimal = dec!(30);
const MAX_TERM_MONTHS: u32 = 600;

/// Unit for the --term flag.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TermUnit {
    Months,
    Years,
}

/// Rate regime flag, mapped onto the engine's `RateType`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RateKind {
    Fixed,
    Variable,
}

impl From<RateKind> for RateType {
    fn from(kind: RateKind) -> Self {
        match kind {
            RateKind::Fixed => RateType::Fixed,
            RateKind::Variable => RateType::Variable,
        }
    }
}

/// Arguments shared by every loan subcommand
#[derive(Args)]
pub struct LoanArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term length, interpreted per --term-unit
    #[arg(long)]
    pub term: Option<u32>,

    /// Unit for --term
    #[arg(long, value_enum, default_value = "years")]
    pub term_unit: TermUnit,

    /// Date of the first payment (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Rate regime
    #[arg(long, value_enum, default_value = "fixed")]
    pub rate_type: RateKind,

    /// Annual cap rate in percent (variable only)
    #[arg(long)]
    pub cap: Option<Decimal>,

    /// Annual floor rate in percent (variable only)
    #[arg(long)]
    pub floor: Option<Decimal>,
}

pub fn run_amortize(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_loan_input(&args)?;
    let output = compute_amortization(&loan)?;
    Ok(serde_json::to_value(&output)?)
}

pub fn run_schedule(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_loan_input(&args)?;
    let output = compute_amortization(&loan)?;
    let rows: Vec<Value> = output.result.schedule.iter().map(schedule_export_row).collect();
    Ok(Value::Array(rows))
}

pub fn run_yearly(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_loan_input(&args)?;
    let output = compute_amortization(&loan)?;
    let rows: Vec<Value> = output
        .result
        .yearly_aggregates
        .iter()
        .map(yearly_export_row)
        .collect();
    Ok(Value::Array(rows))
}

pub fn run_payment(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_loan_input(&args)?;
    let output = compute_amortization(&loan)?;

    // Summary figures only: drop the bulky row collections from the envelope.
    let mut value = serde_json::to_value(&output)?;
    if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
        result.remove("schedule");
        result.remove("yearly_aggregates");
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Input resolution and form validation
// ---------------------------------------------------------------------------

/// File input, then piped stdin, then individual flags.
fn resolve_loan_input(args: &LoanArgs) -> Result<LoanInput, Box<dyn std::error::Error>> {
    let loan: LoanInput = if let Some(ref path) = args.input {
        input::read_input_file(path)?
    } else if let Some(piped) = input::read_stdin()? {
        piped
    } else {
        let term = args.term.ok_or("--term is required (or provide --input)")?;
        let periods = match args.term_unit {
            TermUnit::Months => term,
            TermUnit::Years => term
                .checked_mul(12)
                .ok_or("--term in years is out of range")?,
        };
        LoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            periods,
            start_date: args
                .start_date
                .unwrap_or_else(|| Local::now().date_naive()),
            rate_type: args.rate_type.into(),
            cap_annual_pct: args.cap,
            floor_annual_pct: args.floor,
        }
    };

    validate_form(&loan)?;
    Ok(loan)
}

/// Caller-side range checks. The engine only guards its mathematical
/// contract; realistic mortgage limits live here.
fn validate_form(loan: &LoanInput) -> Result<(), Box<dyn std::error::Error>> {
    if loan.principal < MIN_PRINCIPAL || loan.principal > MAX_PRINCIPAL {
        return Err(format!(
            "principal must be between {MIN_PRINCIPAL} and {MAX_PRINCIPAL}, got {}",
            loan.principal
        )
        .into());
    }
    if loan.annual_rate_pct < Decimal::ZERO || loan.annual_rate_pct > MAX_RATE_PCT {
        return Err(format!(
            "rate must be between 0% and {MAX_RATE_PCT}%, got {}%",
            loan.annual_rate_pct
        )
        .into());
    }
    if loan.periods == 0 || loan.periods > MAX_TERM_MONTHS {
        return Err(format!(
            "term must be between 1 and {MAX_TERM_MONTHS} months, got {}",
            loan.periods
        )
        .into());
    }
    if loan.rate_type == RateType::Variable {
        if let Some(cap) = loan.cap_annual_pct {
            if cap > MAX_CAP_PCT {
                return Err(format!("cap must not exceed {MAX_CAP_PCT}%, got {cap}%").into());
            }
            if cap < loan.annual_rate_pct {
                return Err(format!(
                    "cap ({cap}%) must be at least the base rate ({}%)",
                    loan.annual_rate_pct
                )
                .into());
            }
        }
        if let Some(floor) = loan.floor_annual_pct {
            if floor < Decimal::ZERO {
                return Err(format!("floor must not be negative, got {floor}%").into());
            }
            if floor > loan.annual_rate_pct {
                return Err(format!(
                    "floor ({floor}%) must not exceed the base rate ({}%)",
                    loan.annual_rate_pct
                )
                .into());
            }
        }
        if let (Some(floor), Some(cap)) = (loan.floor_annual_pct, loan.cap_annual_pct) {
            if cap < floor {
                return Err(format!("cap ({cap}%) below floor ({floor}%)").into());
            }
        }
    }
    if loan.start_date > Local::now().date_naive() {
        return Err(format!("start date {} is in the future", loan.start_date).into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Export row shaping
// ---------------------------------------------------------------------------

/// Monthly export row: rate to 5 decimal places, monetary fields to 2.
/// Key order is the export column order.
fn schedule_export_row(row: &ScheduleRow) -> Value {
    json!({
        "index": row.index,
        "date": row.date.to_string(),
        "rate_pct": fixed5(row.period_rate_pct),
        "principal": fixed2(row.principal_portion),
        "interest": fixed2(row.interest_portion),
        "payment": fixed2(row.payment_total),
        "balance": fixed2(row.remaining_balance),
    })
}

/// Yearly export row: year plus monetary sums to 2 decimal places.
fn yearly_export_row(year: &YearAggregate) -> Value {
    json!({
        "year": year.year,
        "principal": fixed2(year.principal_sum),
        "interest": fixed2(year.interest_sum),
        "payment": fixed2(year.payment_sum),
        "ending_balance": fixed2(year.ending_balance),
    })
}

fn fixed2(value: Decimal) -> String {
    format!("{value:.2}")
}

fn fixed5(value: Decimal) -> String {
    format!("{value:.5}")
}
