//! Calendar arithmetic for occurrence generation.
//!
//! Month and year stepping clamps the day-of-month to the target month's
//! length (Jan 31 + 1 month = Feb 29 in a leap year, Feb 28 otherwise).
//! Stepping is always computed from the anchor, never iterated from the
//! previous occurrence, so the phase stays locked to the anchor's day.

use chrono::{Datelike, Days, NaiveDate};

use crate::rule::Weekday;

/// Returns the number of days in a month.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month + 1, 1)
        .or_else(|| NaiveDate::from_ymd_opt(year + 1, 1, 1))
        .map_or(31, |d| d.pred_opt().map_or(31, |p| p.day()))
}

/// Advances a (year, month) pair by a number of months.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn add_months(year: i32, month: u32, months: i64) -> (i32, u32) {
    let total = i64::from(year) * 12 + i64::from(month) - 1 + months;
    let new_year = total.div_euclid(12) as i32;
    let new_month = total.rem_euclid(12) as u32 + 1;
    (new_year, new_month)
}

/// Builds a date with the day clamped to the month's length.
pub(crate) fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or(NaiveDate::MIN)
}

/// Returns the Monday starting the week that contains `date`.
pub(crate) fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Resolves a negative or positive month-day to a concrete day of the month.
/// Returns `None` when the day does not exist in the month.
pub(crate) fn resolve_monthday(year: i32, month: u32, monthday: i8) -> Option<u32> {
    let len = days_in_month(year, month);
    if monthday > 0 {
        let day = u32::from(monthday.unsigned_abs());
        (day <= len).then_some(day)
    } else {
        let back = u32::from(monthday.unsigned_abs());
        (back <= len).then(|| len - back + 1)
    }
}

/// Days of `month` falling on `weekday`, honoring an optional ordinal
/// (`1` = first such weekday, `-1` = last).
pub(crate) fn weekday_days_in_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    ordinal: Option<i8>,
) -> Vec<u32> {
    let len = days_in_month(year, month);
    let matching: Vec<u32> = (1..=len)
        .filter(|&day| {
            NaiveDate::from_ymd_opt(year, month, day)
                .is_some_and(|d| Weekday::from_chrono(d.weekday()) == weekday)
        })
        .collect();

    match ordinal {
        None => matching,
        Some(n) if n > 0 => matching
            .get(usize::from(n.unsigned_abs()) - 1)
            .copied()
            .into_iter()
            .collect(),
        Some(n) => {
            let back = usize::from(n.unsigned_abs());
            (back <= matching.len())
                .then(|| matching[matching.len() - back])
                .into_iter()
                .collect()
        }
    }
}
