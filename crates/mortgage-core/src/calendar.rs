use chrono::{Months, NaiveDate};

use crate::error::MortgageError;
use crate::MortgageResult;

/// Add `months` calendar months to `date`.
///
/// Uses chrono's normalization rule: the day of month is clamped to the last
/// valid day of the target month (Jan 31 + 1 month = Feb 28, or Feb 29 in a
/// leap year). Year boundaries roll over naturally.
pub fn add_months(date: NaiveDate, months: u32) -> MortgageResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| MortgageError::DateError(format!("{date} + {months} months overflows the calendar")))
}
