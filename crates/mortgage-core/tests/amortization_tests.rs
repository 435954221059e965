use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use mortgage_core::amortization::{compute_amortization, LoanInput, RateType};
use mortgage_core::time_value::round_cents;

fn loan(principal: Decimal, rate_pct: Decimal, periods: u32) -> LoanInput {
    LoanInput {
        principal,
        annual_rate_pct: rate_pct,
        periods,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        rate_type: RateType::Fixed,
        cap_annual_pct: None,
        floor_annual_pct: None,
    }
}

// ===========================================================================
// Structural properties across a range of loan shapes
// ===========================================================================

#[test]
fn test_schedule_shape_across_terms() {
    for periods in [1u32, 2, 12, 59, 120, 300] {
        let result = compute_amortization(&loan(dec!(180_000), dec!(3.5), periods)).unwrap();
        let out = &result.result;

        assert_eq!(out.schedule.len(), periods as usize);
        assert_eq!(out.schedule.first().unwrap().index, 1);
        assert_eq!(out.schedule.last().unwrap().index, periods);
        assert_eq!(
            out.schedule.last().unwrap().remaining_balance,
            Decimal::ZERO,
            "term {periods}: final balance must be exactly zero"
        );
    }
}

#[test]
fn test_row_split_and_totals_across_rates() {
    for rate in [dec!(0), dec!(0.5), dec!(1), dec!(3), dec!(7.25), dec!(20)] {
        let input = loan(dec!(250_000), rate, 240);
        let result = compute_amortization(&input).unwrap();
        let out = &result.result;

        for row in &out.schedule {
            assert_eq!(
                round_cents(row.principal_portion + row.interest_portion),
                row.payment_total,
                "rate {rate}: row {} split broken",
                row.index
            );
        }

        let principal_sum: Decimal = out.schedule.iter().map(|r| r.principal_portion).sum();
        assert!(
            (principal_sum - input.principal).abs() <= dec!(0.01),
            "rate {rate}: principal portions sum to {principal_sum}"
        );
        assert!(
            (out.total_paid - (out.total_interest + input.principal)).abs() <= dec!(0.01),
            "rate {rate}: totals identity broken"
        );
    }
}

#[test]
fn test_payment_strictly_increasing_in_rate() {
    let mut previous = Decimal::ZERO;
    for rate in [dec!(0.5), dec!(1), dec!(2), dec!(3), dec!(5), dec!(8), dec!(12)] {
        let result = compute_amortization(&loan(dec!(250_000), rate, 300)).unwrap();
        let payment = result.result.monthly_payment;
        assert!(
            payment > previous,
            "payment {payment} at {rate}% not above {previous}"
        );
        previous = payment;
    }
}

// ===========================================================================
// Yearly aggregation as a faithful partition
// ===========================================================================

#[test]
fn test_yearly_partition_matches_totals() {
    let mut input = loan(dec!(320_000), dec!(4.1), 360);
    input.start_date = NaiveDate::from_ymd_opt(2020, 9, 15).unwrap();

    let result = compute_amortization(&input).unwrap();
    let out = &result.result;

    let row_count: usize = out
        .yearly_aggregates
        .iter()
        .map(|year| {
            out.schedule
                .iter()
                .filter(|r| r.date.format("%Y").to_string() == year.year.to_string())
                .count()
        })
        .sum();
    assert_eq!(row_count, out.schedule.len(), "every row belongs to exactly one year");

    let payment_sum: Decimal = out.yearly_aggregates.iter().map(|y| y.payment_sum).sum();
    assert!((payment_sum - out.total_paid).abs() <= dec!(0.01));

    let interest_sum: Decimal = out.yearly_aggregates.iter().map(|y| y.interest_sum).sum();
    assert!((interest_sum - out.total_interest).abs() <= dec!(0.01));
}

// ===========================================================================
// Variable-rate collar projections
// ===========================================================================

#[test]
fn test_collar_projection_ordering() {
    let input = LoanInput {
        rate_type: RateType::Variable,
        cap_annual_pct: Some(dec!(5)),
        floor_annual_pct: Some(dec!(1)),
        ..loan(dec!(250_000), dec!(3), 300)
    };
    let result = compute_amortization(&input).unwrap();
    let out = &result.result;

    assert!(out.min_monthly_payment < out.monthly_payment);
    assert!(out.monthly_payment < out.max_monthly_payment);

    // The projections match standalone fixed loans at the bound rates.
    let at_cap = compute_amortization(&loan(dec!(250_000), dec!(5), 300)).unwrap();
    let at_floor = compute_amortization(&loan(dec!(250_000), dec!(1), 300)).unwrap();
    assert_eq!(out.max_monthly_payment, at_cap.result.monthly_payment);
    assert_eq!(out.min_monthly_payment, at_floor.result.monthly_payment);
}

// ===========================================================================
// Determinism and serialization round-trip
// ===========================================================================

#[test]
fn test_deterministic_output() {
    let input = LoanInput {
        rate_type: RateType::Variable,
        cap_annual_pct: Some(dec!(6)),
        floor_annual_pct: Some(dec!(2)),
        ..loan(dec!(199_999.99), dec!(4.44), 179)
    };

    let first = compute_amortization(&input).unwrap();
    let second = compute_amortization(&input).unwrap();
    assert_eq!(first.result, second.result);
}

#[test]
fn test_input_serde_round_trip() {
    let input = LoanInput {
        rate_type: RateType::Variable,
        cap_annual_pct: Some(dec!(5)),
        floor_annual_pct: None,
        ..loan(dec!(150_000), dec!(2.9), 120)
    };

    let json = serde_json::to_string(&input).unwrap();
    let back: LoanInput = serde_json::from_str(&json).unwrap();
    assert_eq!(back, input);

    // rate_type serializes lowercase, matching the wire contract.
    assert!(json.contains("\"variable\""));
}
