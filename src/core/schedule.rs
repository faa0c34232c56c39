//! Calendar arithmetic for recurring templates.
//!
//! Pure functions only: given a template's current next-execution date and its
//! frequency, compute the following one. Month-length differences are handled by
//! clamping to the last day of the target month, so advancing never fails for a
//! valid input date and the result is always strictly later than the input.

use crate::{
    entities::{Frequency, recurring_transaction},
    errors::{Error, Result},
};
use chrono::{Datelike, Days, Months, NaiveDate};

/// Returns the number of days in the given month.
///
/// # Errors
/// Returns [`Error::DateOutOfRange`] for a month outside chrono's supported range.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| out_of_range(year, month))?;
    let next_first = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| out_of_range(year, month))?;
    let last = next_first.pred_opt().ok_or_else(|| out_of_range(year, month))?;
    Ok(last.day())
}

fn out_of_range(year: i32, month: u32) -> Error {
    Error::DateOutOfRange {
        message: format!("{year}-{month:02} is not a representable month"),
    }
}

/// Snaps `anchor` into the month containing `date`, clamped to that month's length.
fn snap_to_anchor(date: NaiveDate, anchor: u32) -> Result<NaiveDate> {
    let last_day = days_in_month(date.year(), date.month())?;
    let day = anchor.clamp(1, last_day);
    date.with_day(day)
        .ok_or_else(|| out_of_range(date.year(), date.month()))
}

/// Computes the next execution date for a template.
///
/// * daily: +1 calendar day
/// * weekly: +7 calendar days
/// * monthly: +1 calendar month; with `day_of_month` set the result is snapped to
///   that day (or the last day of a shorter month), otherwise the current day of
///   month is kept, clamped to the target month's length
/// * yearly: +1 calendar year, same month and day (29 February becomes 28 February)
///
/// `day_of_month` is ignored for every frequency except monthly.
///
/// # Errors
/// Returns [`Error::DateOutOfRange`] if the result would overflow chrono's date range
/// and [`Error::Validation`] for an anchor outside `1..=31`.
pub fn next_execution_date(
    current: NaiveDate,
    frequency: Frequency,
    day_of_month: Option<i32>,
) -> Result<NaiveDate> {
    let overflow = || Error::DateOutOfRange {
        message: format!("cannot advance {current} by one {frequency:?} period"),
    };

    match frequency {
        Frequency::Daily => current.checked_add_days(Days::new(1)).ok_or_else(overflow),
        Frequency::Weekly => current.checked_add_days(Days::new(7)).ok_or_else(overflow),
        Frequency::Monthly => {
            let anchor = day_of_month.map(validate_anchor).transpose()?;
            match anchor {
                Some(anchor) => {
                    // Step from the first of the month so the source day cannot clamp the result.
                    let target_month = current
                        .with_day(1)
                        .and_then(|first| first.checked_add_months(Months::new(1)))
                        .ok_or_else(overflow)?;
                    snap_to_anchor(target_month, anchor)
                }
                None => current.checked_add_months(Months::new(1)).ok_or_else(overflow),
            }
        }
        Frequency::Yearly => current.checked_add_months(Months::new(12)).ok_or_else(overflow),
    }
}

/// Validates a day-of-month anchor.
///
/// # Errors
/// Returns [`Error::Validation`] unless `anchor` is within `1..=31`.
pub fn validate_anchor(anchor: i32) -> Result<u32> {
    u32::try_from(anchor)
        .ok()
        .filter(|day| (1..=31).contains(day))
        .ok_or_else(|| Error::validation(format!("day_of_month must be 1..=31, got {anchor}")))
}

/// Whether a template should execute on `today`.
///
/// A template is due when it is active, its next execution date is on or before
/// `today`, and that date has not passed its end date.
#[must_use]
pub fn is_due(template: &recurring_transaction::Model, today: NaiveDate) -> bool {
    template.is_active
        && template.next_execution_date <= today
        && template
            .end_date
            .is_none_or(|end| template.next_execution_date <= end)
}
