//! Calendar arithmetic for business days, calendar days and approximate months.
//!
//! Business days are Monday through Friday. There is no holiday calendar.
//! Every function returns `None` when the result falls outside the range
//! `NaiveDate` can represent.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::models::DurationUnit;

/// Days added per whole unit of a fractional month in [`add_months`].
pub const DAYS_PER_FRACTIONAL_MONTH: f64 = 30.0;

#[inline]
fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Whole weeks that can be skipped before stepping day by day.
///
/// Any 7 consecutive days hold exactly 5 weekdays. The last 1 to 5 weekdays
/// are always stepped so the result lands on a weekday even when `date`
/// falls on a weekend.
#[inline]
fn whole_week_days(n: u32) -> u64 {
    u64::from((n - 1) / 5) * 7
}

/// Advance `date` until `n` weekdays have been counted.
///
/// The input date itself is never counted, so `n = 0` returns it unchanged
/// even when it falls on a weekend.
pub fn add_business_days(date: NaiveDate, n: u32) -> Option<NaiveDate> {
    if n == 0 {
        return Some(date);
    }
    let mut current = date.checked_add_days(Days::new(whole_week_days(n)))?;
    let mut remaining = n - (n - 1) / 5 * 5;
    while remaining > 0 {
        current = current.checked_add_days(Days::new(1))?;
        if !is_weekend(current) {
            remaining -= 1;
        }
    }
    Some(current)
}

/// Retreat `date` until `n` weekdays have been counted.
pub fn subtract_business_days(date: NaiveDate, n: u32) -> Option<NaiveDate> {
    if n == 0 {
        return Some(date);
    }
    let mut current = date.checked_sub_days(Days::new(whole_week_days(n)))?;
    let mut remaining = n - (n - 1) / 5 * 5;
    while remaining > 0 {
        current = current.checked_sub_days(Days::new(1))?;
        if !is_weekend(current) {
            remaining -= 1;
        }
    }
    Some(current)
}

pub fn add_calendar_days(date: NaiveDate, n: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(n)))
}

pub fn subtract_calendar_days(date: NaiveDate, n: u32) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(n)))
}

/// Move `date` forward by `n` units.
pub fn advance(date: NaiveDate, n: u32, unit: DurationUnit) -> Option<NaiveDate> {
    match unit {
        DurationUnit::BusinessDays => add_business_days(date, n),
        DurationUnit::CalendarDays => add_calendar_days(date, n),
    }
}

/// Move `date` backward by `n` units.
pub fn retreat(date: NaiveDate, n: u32, unit: DurationUnit) -> Option<NaiveDate> {
    match unit {
        DurationUnit::BusinessDays => subtract_business_days(date, n),
        DurationUnit::CalendarDays => subtract_calendar_days(date, n),
    }
}

/// Add an approximate, possibly fractional, number of months.
///
/// The whole part rolls the month over without clamping the day: a day past
/// the end of the target month spills into the following month, so
/// 2026-01-31 plus one month is 2026-03-03. The fractional part is then added
/// as `round(fraction * 30)` calendar days.
pub fn add_months(date: NaiveDate, months: f64) -> Option<NaiveDate> {
    let whole = months.trunc();
    let fraction = months - whole;

    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + whole as i64;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;

    // Day 1 always exists, the source day-of-month is then added on top
    let rolled = NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(date.day0())))?;

    let extra_days = (fraction * DAYS_PER_FRACTIONAL_MONTH).round() as i64;
    if extra_days >= 0 {
        rolled.checked_add_days(Days::new(extra_days as u64))
    } else {
        rolled.checked_sub_days(Days::new(extra_days.unsigned_abs()))
    }
}
