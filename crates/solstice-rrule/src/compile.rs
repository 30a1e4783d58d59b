//! Compiles the UI's legacy recurrence form into a canonical rule.
//!
//! The form is the creation dialog's raw recurrence payload: a frequency
//! token, an interval, an either/or termination choice, and optional
//! advanced by-* refinements. Compilation is one-way; the form is never
//! reconstructed from a rule.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{MalformedRuleError, RuleResult};
use crate::expand::AnchoredRule;
use crate::rule::{Frequency, RecurrenceRule, Termination, Weekday, WeekdayNum};

/// Frequency vocabulary of the legacy form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormFrequency {
    Day,
    Week,
    Month,
    Year,
}

impl FormFrequency {
    #[must_use]
    pub const fn to_frequency(self) -> Frequency {
        match self {
            Self::Day => Frequency::Daily,
            Self::Week => Frequency::Weekly,
            Self::Month => Frequency::Monthly,
            Self::Year => Frequency::Yearly,
        }
    }
}

/// Raw recurrence payload submitted by the creation form.
///
/// `use_end_date` is the dialog's either/or toggle: end date and occurrence
/// count are mutually exclusive by construction, the flag picks which value
/// is read. Weekday numbering is 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceForm {
    pub frequency: FormFrequency,
    pub interval: u32,
    #[serde(rename = "useEndDate", default)]
    pub use_end_date: bool,
    #[serde(rename = "endDate", default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub occurrences: Option<u32>,
    #[serde(rename = "byweekday", default)]
    pub by_weekday: Vec<u8>,
    #[serde(rename = "bymonth", default)]
    pub by_month: Vec<u8>,
    #[serde(rename = "bymonthday", default)]
    pub by_monthday: Vec<i8>,
    #[serde(rename = "bysetpos", default)]
    pub by_setpos: Vec<i16>,
}

impl RecurrenceForm {
    /// Creates a minimal form at the given frequency, interval 1, no
    /// termination, no refinements.
    #[must_use]
    pub const fn new(frequency: FormFrequency) -> Self {
        Self {
            frequency,
            interval: 1,
            use_end_date: false,
            end_date: None,
            occurrences: None,
            by_weekday: Vec::new(),
            by_month: Vec::new(),
            by_monthday: Vec::new(),
            by_setpos: Vec::new(),
        }
    }
}

/// ## Summary
/// Compiles a recurrence form into a canonical rule bound to its anchor.
///
/// Termination resolution is deliberately permissive: a form that signals
/// "use end date" without an end date, or "use count" without a count,
/// compiles to an open-ended rule instead of failing. A zero occurrence
/// count is treated as absent, mirroring the form layer it replaces.
///
/// ## Errors
/// Returns [`MalformedRuleError`] when the interval is zero or a by-*
/// value is out of its domain (weekday not 0-6, month not 1-12, month-day
/// zero or beyond ±31, set position zero).
pub fn compile(form: &RecurrenceForm, anchor: NaiveDateTime) -> RuleResult<AnchoredRule> {
    if form.interval == 0 {
        return Err(MalformedRuleError::InvalidInterval(form.interval.to_string()));
    }

    let termination = if form.use_end_date {
        match form.end_date {
            Some(date) => Termination::Until(date.and_time(NaiveTime::MIN)),
            None => Termination::Open,
        }
    } else {
        match form.occurrences {
            Some(count) if count > 0 => Termination::Count(count),
            _ => Termination::Open,
        }
    };

    let by_day = form
        .by_weekday
        .iter()
        .map(|&index| {
            Weekday::from_index(index)
                .map(WeekdayNum::every)
                .ok_or_else(|| MalformedRuleError::InvalidWeekday(index.to_string()))
        })
        .collect::<RuleResult<Vec<_>>>()?;

    for &month in &form.by_month {
        if !(1..=12).contains(&month) {
            return Err(MalformedRuleError::InvalidMonth(month.to_string()));
        }
    }

    for &day in &form.by_monthday {
        if day == 0 || !(-31..=31).contains(&day) {
            return Err(MalformedRuleError::InvalidMonthDay(day.to_string()));
        }
    }

    if form.by_setpos.contains(&0) {
        return Err(MalformedRuleError::InvalidSetPos);
    }

    let rule = RecurrenceRule {
        frequency: form.frequency.to_frequency(),
        interval: form.interval,
        termination,
        by_day,
        by_month: form.by_month.clone(),
        by_monthday: form.by_monthday.clone(),
        by_setpos: form.by_setpos.clone(),
    };

    Ok(AnchoredRule::new(anchor, rule))
}
