//! Loan amortization engine.
//!
//! Computes the level payment, the full period-by-period schedule with a
//! terminal residue correction, yearly aggregates, and the cap/floor payment
//! projections for variable-rate loans. All math uses `rust_decimal::Decimal`;
//! monetary outputs are rounded to cents at every step.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::add_months;
use crate::error::MortgageError;
use crate::time_value::{level_payment, monthly_rate_from_annual, round_cents};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::MortgageResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const PERCENT_DIVISOR: Decimal = dec!(100);
/// Annual rates are quoted as percentages in [0, 100].
const MAX_RATE_PCT: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Interest rate regime for the loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Fixed,
    Variable,
}

/// Input describing a loan to amortize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    /// Amount borrowed.
    pub principal: Money,
    /// Nominal annual rate as a percentage (3 = 3%/year).
    pub annual_rate_pct: Percent,
    /// Term in months.
    pub periods: u32,
    /// Date of the first payment. Subsequent rows fall one calendar month apart.
    pub start_date: NaiveDate,
    pub rate_type: RateType,
    /// Upper bound on a variable rate, as an annual percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_annual_pct: Option<Percent>,
    /// Lower bound on a variable rate, as an annual percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_annual_pct: Option<Percent>,
}

/// A single period in the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// 1-based period number.
    pub index: u32,
    pub date: NaiveDate,
    /// Effective monthly rate applied this period, as a percentage.
    pub period_rate_pct: Percent,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub payment_total: Money,
    /// Balance after this period's payment. Exactly zero on the final row.
    pub remaining_balance: Money,
}

/// Totals for one calendar year of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearAggregate {
    pub year: i32,
    pub principal_sum: Money,
    pub interest_sum: Money,
    pub payment_sum: Money,
    /// Remaining balance after the year's last payment.
    pub ending_balance: Money,
    /// Date of the year's last payment.
    pub end_date: NaiveDate,
}

/// Full output of the amortization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub schedule: Vec<ScheduleRow>,
    pub yearly_aggregates: Vec<YearAggregate>,
    /// Payment at the floor rate. Equals `monthly_payment` for fixed loans.
    pub min_monthly_payment: Money,
    /// Payment at the cap rate. Equals `monthly_payment` for fixed loans.
    pub max_monthly_payment: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the amortization schedule and summary figures for a loan.
///
/// The schedule always applies the constant base rate to every period, even
/// for variable-rate loans; cap and floor feed only the best/worst-case
/// payment scalars. The engine is a pure function of its input: identical
/// inputs yield identical results.
pub fn compute_amortization(
    input: &LoanInput,
) -> MortgageResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_loan_input(input)?;

    match input.rate_type {
        RateType::Fixed => {
            if input.cap_annual_pct.is_some() || input.floor_annual_pct.is_some() {
                warnings.push("Cap/floor rates are ignored for fixed-rate loans".into());
            }
        }
        RateType::Variable => {
            if let Some(cap) = input.cap_annual_pct {
                if cap < input.annual_rate_pct {
                    warnings.push(format!(
                        "Cap rate {cap}% is below the base rate {}%",
                        input.annual_rate_pct
                    ));
                }
            }
            if let Some(floor) = input.floor_annual_pct {
                if floor > input.annual_rate_pct {
                    warnings.push(format!(
                        "Floor rate {floor}% is above the base rate {}%",
                        input.annual_rate_pct
                    ));
                }
            }
        }
    }

    let periodic_rate = monthly_rate_from_annual(input.annual_rate_pct)?;
    let monthly_payment = level_payment(input.principal, periodic_rate, input.periods)?;

    let schedule = build_schedule(input, periodic_rate, monthly_payment)?;
    let yearly_aggregates = aggregate_yearly(&schedule);

    let total_interest = round_cents(schedule.iter().map(|r| r.interest_portion).sum());
    let total_paid = round_cents(schedule.iter().map(|r| r.payment_total).sum());

    let (min_monthly_payment, max_monthly_payment) = match input.rate_type {
        RateType::Fixed => (monthly_payment, monthly_payment),
        RateType::Variable => {
            let cap_pct = input.cap_annual_pct.unwrap_or(input.annual_rate_pct);
            let floor_pct = input.floor_annual_pct.unwrap_or(input.annual_rate_pct);
            let max_monthly = level_payment(
                input.principal,
                monthly_rate_from_annual(cap_pct)?,
                input.periods,
            )?;
            let min_monthly = level_payment(
                input.principal,
                monthly_rate_from_annual(floor_pct)?,
                input.periods,
            )?;
            (min_monthly, max_monthly)
        }
    };

    let result = AmortizationResult {
        monthly_payment,
        total_interest,
        total_paid,
        schedule,
        yearly_aggregates,
        min_monthly_payment,
        max_monthly_payment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization — compound monthly rate, terminal residue correction",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "periods": input.periods,
            "rate_type": input.rate_type,
            "start_date": input.start_date,
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_loan_input(input: &LoanInput) -> MortgageResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if input.periods == 0 {
        return Err(MortgageError::InvalidInput {
            field: "periods".into(),
            reason: "Term must be at least 1 month".into(),
        });
    }
    if input.annual_rate_pct < Decimal::ZERO || input.annual_rate_pct > MAX_RATE_PCT {
        return Err(MortgageError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Annual rate must be between 0% and 100%".into(),
        });
    }

    if input.rate_type == RateType::Variable {
        for (field, value) in [
            ("cap_annual_pct", input.cap_annual_pct),
            ("floor_annual_pct", input.floor_annual_pct),
        ] {
            if let Some(pct) = value {
                if pct < Decimal::ZERO || pct > MAX_RATE_PCT {
                    return Err(MortgageError::InvalidInput {
                        field: field.into(),
                        reason: "Rate bound must be between 0% and 100%".into(),
                    });
                }
            }
        }
        if let (Some(floor), Some(cap)) = (input.floor_annual_pct, input.cap_annual_pct) {
            if floor > cap {
                return Err(MortgageError::InvalidInput {
                    field: "floor_annual_pct".into(),
                    reason: "Floor rate cannot exceed cap rate".into(),
                });
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Single sequential pass over `1..=periods`; each period's opening balance
/// is the prior period's closing balance.
fn build_schedule(
    input: &LoanInput,
    periodic_rate: Decimal,
    monthly_payment: Money,
) -> MortgageResult<Vec<ScheduleRow>> {
    let period_rate_pct = periodic_rate * PERCENT_DIVISOR;
    let mut schedule: Vec<ScheduleRow> = Vec::with_capacity(input.periods as usize);
    let mut balance = input.principal;

    for index in 1..=input.periods {
        let date = add_months(input.start_date, index - 1)?;
        let interest_portion = round_cents(balance * periodic_rate);

        let row = if index == input.periods {
            // Terminal period absorbs the rounding residue accumulated over
            // the life of the loan: the whole remaining balance is repaid and
            // the payment may differ slightly from the nominal level payment.
            let principal_portion = round_cents(balance);
            let payment_total = round_cents(principal_portion + interest_portion);
            balance = Decimal::ZERO;
            ScheduleRow {
                index,
                date,
                period_rate_pct,
                principal_portion,
                interest_portion,
                payment_total,
                remaining_balance: balance,
            }
        } else {
            let principal_portion = round_cents(monthly_payment - interest_portion);
            balance = round_cents(balance - principal_portion);
            ScheduleRow {
                index,
                date,
                period_rate_pct,
                principal_portion,
                interest_portion,
                payment_total: monthly_payment,
                remaining_balance: balance,
            }
        };

        schedule.push(row);
    }

    Ok(schedule)
}

/// Group schedule rows by calendar year. Rows arrive date-ascending, so each
/// year's aggregate is the current tail of the output vector.
fn aggregate_yearly(schedule: &[ScheduleRow]) -> Vec<YearAggregate> {
    let mut aggregates: Vec<YearAggregate> = Vec::new();

    for row in schedule {
        let year = row.date.year();
        match aggregates.last_mut() {
            Some(current) if current.year == year => {
                // Rounded running sums, matching the per-row cent precision.
                current.principal_sum = round_cents(current.principal_sum + row.principal_portion);
                current.interest_sum = round_cents(current.interest_sum + row.interest_portion);
                current.payment_sum = round_cents(current.payment_sum + row.payment_total);
                current.ending_balance = row.remaining_balance;
                current.end_date = row.date;
            }
            _ => aggregates.push(YearAggregate {
                year,
                principal_sum: row.principal_portion,
                interest_sum: row.interest_portion,
                payment_sum: row.payment_total,
                ending_balance: row.remaining_balance,
                end_date: row.date,
            }),
        }
    }

    aggregates
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
