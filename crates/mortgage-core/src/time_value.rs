use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal::RoundingStrategy;
use rust_decimal_macros::dec;

use crate::error::MortgageError;
use crate::types::{Money, Percent, Rate};
use crate::MortgageResult;

const PERCENT_DIVISOR: Decimal = dec!(100);
const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Round to the currency's minor unit (cent), half away from zero.
///
/// This is the engine's sole rounding rule: every monetary output passes
/// through it, so repeated computations on already-rounded values are
/// idempotent.
pub fn round_cents(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Effective monthly rate from a nominal annual percentage.
///
/// Compound conversion: `(1 + pct/100)^(1/12) - 1`, so compounding twelve
/// times reproduces the annual rate exactly. Simple division by 12 would
/// overstate the monthly rate.
pub fn monthly_rate_from_annual(annual_pct: Percent) -> MortgageResult<Rate> {
    if annual_pct < Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Annual rate cannot be negative".into(),
        });
    }
    if annual_pct.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let annual_factor = Decimal::ONE + annual_pct / PERCENT_DIVISOR;
    Ok(annual_factor.powd(Decimal::ONE / MONTHS_PER_YEAR) - Decimal::ONE)
}

/// Level (annuity) payment: the constant amount per period that brings the
/// balance to zero after `periods` periods at `periodic_rate`.
///
/// Zero-rate loans degrade to straight-line repayment. The result is rounded
/// to cents.
pub fn level_payment(principal: Money, periodic_rate: Rate, periods: u32) -> MortgageResult<Money> {
    if periods == 0 {
        return Err(MortgageError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be at least 1".into(),
        });
    }

    if periodic_rate.is_zero() {
        return Ok(round_cents(principal / Decimal::from(periods)));
    }

    let factor = (Decimal::ONE + periodic_rate).powd(Decimal::from(periods));
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(MortgageError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }

    Ok(round_cents(principal * periodic_rate * factor / denominator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_cents_half_up() {
        assert_eq!(round_cents(dec!(1.005)), dec!(1.01));
        assert_eq!(round_cents(dec!(1.004)), dec!(1.00));
        assert_eq!(round_cents(dec!(8333.3333)), dec!(8333.33));
    }

    #[test]
    fn test_round_cents_idempotent() {
        let once = round_cents(dec!(616.567463));
        assert_eq!(round_cents(once), once);
    }

    #[test]
    fn test_monthly_rate_zero() {
        assert_eq!(monthly_rate_from_annual(dec!(0)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_monthly_rate_three_percent() {
        // (1.03)^(1/12) - 1 ≈ 0.0024663
        let rate = monthly_rate_from_annual(dec!(3)).unwrap();
        assert!((rate - dec!(0.0024663)).abs() < dec!(0.0000001), "got {rate}");
    }

    #[test]
    fn test_monthly_rate_compounds_back_to_annual() {
        let rate = monthly_rate_from_annual(dec!(5)).unwrap();
        let annual = (Decimal::ONE + rate).powd(dec!(12)) - Decimal::ONE;
        assert!((annual - dec!(0.05)).abs() < dec!(0.0000001), "got {annual}");
    }

    #[test]
    fn test_monthly_rate_negative_rejected() {
        let err = monthly_rate_from_annual(dec!(-1)).unwrap_err();
        match err {
            MortgageError::InvalidInput { field, .. } => assert_eq!(field, "annual_rate_pct"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_level_payment_zero_rate_straight_line() {
        let payment = level_payment(dec!(100_000), Decimal::ZERO, 12).unwrap();
        assert_eq!(payment, dec!(8333.33));
    }

    #[test]
    fn test_level_payment_standard_mortgage() {
        // 250k over 300 months at the effective monthly rate for 3%/year
        let rate = monthly_rate_from_annual(dec!(3)).unwrap();
        let payment = level_payment(dec!(250_000), rate, 300).unwrap();
        assert!(
            (payment - dec!(1180.27)).abs() <= dec!(0.01),
            "expected ~1180.27, got {payment}"
        );
    }

    #[test]
    fn test_level_payment_monotone_in_rate() {
        let low = level_payment(dec!(250_000), monthly_rate_from_annual(dec!(1)).unwrap(), 300).unwrap();
        let mid = level_payment(dec!(250_000), monthly_rate_from_annual(dec!(3)).unwrap(), 300).unwrap();
        let high = level_payment(dec!(250_000), monthly_rate_from_annual(dec!(5)).unwrap(), 300).unwrap();
        assert!(low < mid && mid < high, "{low} {mid} {high}");
    }

    #[test]
    fn test_level_payment_zero_periods_rejected() {
        let err = level_payment(dec!(1000), dec!(0.01), 0).unwrap_err();
        match err {
            MortgageError::InvalidInput { field, .. } => assert_eq!(field, "periods"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_level_payment_single_period() {
        // One period repays principal plus one period of interest
        let payment = level_payment(dec!(1000), dec!(0.01), 1).unwrap();
        assert_eq!(payment, dec!(1010.00));
    }
}
