//! Occurrence generation: expands an anchored rule into the ordered,
//! de-duplicated sequence of occurrence start times inside a window.
//!
//! Generation is period-based and phase-locked to the anchor: period `k`
//! is the anchor's day/week/month/year advanced by `k * interval` units,
//! always computed from the anchor itself. Candidates inside a period are
//! filtered by the by-* constraints, narrowed by BYSETPOS, and emitted in
//! ascending order. The sequence is lazy, finite, and restartable — a pure
//! function of (rule, anchor, window).

use std::collections::VecDeque;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

use solstice_core::constants::DEFAULT_MAX_OCCURRENCES;

use crate::calendar::{
    add_months, clamped_date, resolve_monthday, week_start, weekday_days_in_month,
};
use crate::rule::{Frequency, RecurrenceRule, Termination, Weekday};

/// Bounding window for generation. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    #[must_use]
    pub const fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }
}

/// Options for occurrence generation.
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// Hard cap on generated occurrences, regardless of termination mode.
    pub max_occurrences: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
        }
    }
}

impl ExpandOptions {
    /// Sets the occurrence cap.
    #[must_use]
    pub fn with_max_occurrences(mut self, max: usize) -> Self {
        self.max_occurrences = max;
        self
    }
}

/// A recurrence rule bound to its anchor — the first occurrence's start
/// time and the phase reference for all interval stepping.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredRule {
    pub anchor: NaiveDateTime,
    pub rule: RecurrenceRule,
}

impl AnchoredRule {
    #[must_use]
    pub const fn new(anchor: NaiveDateTime, rule: RecurrenceRule) -> Self {
        Self { anchor, rule }
    }

    /// Returns the occurrence sequence inside `window`.
    ///
    /// Re-invoking with the same window yields the same sequence.
    #[must_use]
    pub fn occurrences(&self, window: Window) -> Occurrences {
        self.occurrences_with(window, ExpandOptions::default())
    }

    /// Returns the occurrence sequence inside `window` with explicit options.
    #[must_use]
    pub fn occurrences_with(&self, window: Window, options: ExpandOptions) -> Occurrences {
        let scan_end = match self.rule.termination {
            Termination::Until(until) => until.min(window.end),
            _ => window.end,
        };
        let remaining = match self.rule.termination {
            Termination::Count(count) => Some(count),
            _ => None,
        };
        Occurrences {
            rule: self.rule.clone(),
            anchor: self.anchor,
            window,
            scan_end,
            remaining,
            max: options.max_occurrences,
            period: 0,
            pending: VecDeque::new(),
            generated: 0,
            done: false,
        }
    }
}

/// Lazy iterator over the occurrence starts of an [`AnchoredRule`].
///
/// Owns its state; borrows nothing, so a fresh call to
/// [`AnchoredRule::occurrences`] restarts the sequence from the anchor.
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    anchor: NaiveDateTime,
    window: Window,
    /// Last instant worth scanning: `min(window.end, until)`.
    scan_end: NaiveDateTime,
    /// Remaining COUNT budget; occurrences before the window consume it too.
    remaining: Option<u32>,
    max: usize,
    /// Next period index to fill from.
    period: u64,
    pending: VecDeque<NaiveDateTime>,
    generated: usize,
    done: bool,
}

impl Iterator for Occurrences {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        loop {
            if self.done {
                return None;
            }
            if self.remaining == Some(0) {
                self.done = true;
                return None;
            }
            if self.generated >= self.max {
                tracing::warn!(
                    max = self.max,
                    anchor = %self.anchor,
                    "Occurrence cap reached during expansion"
                );
                self.done = true;
                return None;
            }

            let Some(occurrence) = self.pending.pop_front() else {
                self.fill_next_period();
                continue;
            };

            if occurrence > self.scan_end {
                self.done = true;
                return None;
            }

            if let Some(remaining) = self.remaining.as_mut() {
                *remaining -= 1;
            }
            self.generated += 1;

            // Pre-window occurrences consume COUNT but are not emitted;
            // the sequence is never re-anchored to the window start.
            if occurrence < self.window.start {
                continue;
            }
            return Some(occurrence);
        }
    }
}

impl Occurrences {
    /// Computes the candidates of the next period and queues them.
    fn fill_next_period(&mut self) {
        let k = self.period;
        self.period += 1;

        let Some(mut days) = self.period_days(k) else {
            self.done = true;
            return;
        };

        days.sort_unstable();
        days.dedup();

        let time = self.anchor.time();
        let mut starts: Vec<NaiveDateTime> = days.into_iter().map(|d| d.and_time(time)).collect();

        // BYSETPOS narrows each period, but only when another by-* filter
        // produced a set to narrow.
        if !self.rule.by_setpos.is_empty() && self.rule.has_by_constraint() {
            starts = apply_setpos(&starts, &self.rule.by_setpos);
        }

        starts.retain(|&s| s >= self.anchor);
        self.pending.extend(starts);
    }

    /// Candidate days of period `k`, or `None` once the period lies past
    /// the scan bound (the iterator is exhausted).
    fn period_days(&self, k: u64) -> Option<Vec<NaiveDate>> {
        let step = k.checked_mul(u64::from(self.rule.interval))?;
        let bound = self.scan_end.date();

        match self.rule.frequency {
            Frequency::Daily => {
                let date = self.anchor.date().checked_add_days(Days::new(step))?;
                if date > bound {
                    return None;
                }
                Some(if self.daily_filter(date) {
                    vec![date]
                } else {
                    Vec::new()
                })
            }
            Frequency::Weekly => {
                let start = week_start(self.anchor.date())
                    .checked_add_days(Days::new(step.checked_mul(7)?))?;
                if start > bound {
                    return None;
                }
                let days: Vec<NaiveDate> = if self.rule.by_day.is_empty() {
                    let offset = u64::from(self.anchor.weekday().num_days_from_monday());
                    start.checked_add_days(Days::new(offset)).into_iter().collect()
                } else {
                    (0..7u64)
                        .filter_map(|i| start.checked_add_days(Days::new(i)))
                        .filter(|d| self.weekday_selected(*d))
                        .collect()
                };
                Some(days.into_iter().filter(|d| self.month_ok(d.month())).collect())
            }
            Frequency::Monthly => {
                let (year, month) =
                    add_months(self.anchor.year(), self.anchor.month(), i64::try_from(step).ok()?);
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                if first > bound {
                    return None;
                }
                if !self.month_ok(month) {
                    return Some(Vec::new());
                }
                Some(self.month_days(year, month))
            }
            Frequency::Yearly => {
                let year = i32::try_from(i64::from(self.anchor.year()) + i64::try_from(step).ok()?)
                    .ok()?;
                let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
                if first > bound {
                    return None;
                }
                let months: Vec<u32> = if self.rule.by_month.is_empty() {
                    vec![self.anchor.month()]
                } else {
                    let mut months: Vec<u32> =
                        self.rule.by_month.iter().map(|&m| u32::from(m)).collect();
                    months.sort_unstable();
                    months.dedup();
                    months
                };
                Some(
                    months
                        .into_iter()
                        .flat_map(|m| self.month_days(year, m))
                        .collect(),
                )
            }
        }
    }

    /// Candidate days inside one month, per the monthly by-* semantics:
    /// BYMONTHDAY wins, intersected with BYDAY weekday membership; BYDAY
    /// alone expands (honoring ordinals); otherwise the anchor's
    /// day-of-month clamped to the month's length.
    fn month_days(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        if self.rule.by_monthday.is_empty() {
            if self.rule.by_day.is_empty() {
                return vec![clamped_date(year, month, self.anchor.day())];
            }
            let mut days: Vec<u32> = self
                .rule
                .by_day
                .iter()
                .flat_map(|wd| weekday_days_in_month(year, month, wd.weekday, wd.ordinal))
                .collect();
            days.sort_unstable();
            days.dedup();
            days.into_iter()
                .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
                .collect()
        } else {
            let mut days: Vec<u32> = self
                .rule
                .by_monthday
                .iter()
                .filter_map(|&md| resolve_monthday(year, month, md))
                .collect();
            days.sort_unstable();
            days.dedup();
            days.into_iter()
                .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
                .filter(|d| self.rule.by_day.is_empty() || self.weekday_selected(*d))
                .collect()
        }
    }

    /// DAILY filter: a day either passes every present by-* constraint or
    /// the period is empty.
    fn daily_filter(&self, date: NaiveDate) -> bool {
        self.month_ok(date.month())
            && (self.rule.by_monthday.is_empty()
                || self
                    .rule
                    .by_monthday
                    .iter()
                    .any(|&md| resolve_monthday(date.year(), date.month(), md) == Some(date.day())))
            && (self.rule.by_day.is_empty() || self.weekday_selected(date))
    }

    /// Weekday membership in BYDAY, ignoring ordinals (ordinals are only
    /// meaningful for monthly/yearly expansion).
    fn weekday_selected(&self, date: NaiveDate) -> bool {
        let weekday = Weekday::from_chrono(date.weekday());
        self.rule.by_day.iter().any(|wd| wd.weekday == weekday)
    }

    fn month_ok(&self, month: u32) -> bool {
        self.rule.by_month.is_empty()
            || self.rule.by_month.iter().any(|&m| u32::from(m) == month)
    }
}

/// Selects the BYSETPOS positions from a period's sorted candidate set.
/// Positive positions count from the start (1-based), negative from the
/// end; selections come back in ascending order.
fn apply_setpos(candidates: &[NaiveDateTime], positions: &[i16]) -> Vec<NaiveDateTime> {
    if candidates.is_empty() {
        return Vec::new();
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let len = candidates.len() as i16;
    let mut selected = Vec::new();

    for &pos in positions {
        let idx = if pos > 0 { pos - 1 } else { len + pos };
        if (0..len).contains(&idx) {
            #[allow(clippy::cast_sign_loss)]
            selected.push(candidates[idx as usize]);
        }
    }

    selected.sort_unstable();
    selected.dedup();
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::WeekdayNum;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn collect(anchored: &AnchoredRule, window: Window) -> Vec<NaiveDateTime> {
        anchored.occurrences(window).collect()
    }

    #[test]
    fn daily_simple() {
        let anchored = AnchoredRule::new(at(2024, 1, 1, 10, 0), RecurrenceRule::daily().with_count(5));
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(starts.len(), 5);
        assert_eq!(starts[0], at(2024, 1, 1, 10, 0));
        assert_eq!(starts[4], at(2024, 1, 5, 10, 0));
    }

    #[test]
    fn weekly_phase_locked_to_anchor() {
        // Anchored on a Monday, every second week; the window starts
        // mid-cycle and must not re-anchor the phase.
        let anchored = AnchoredRule::new(
            at(2024, 1, 1, 9, 0),
            RecurrenceRule::weekly().with_interval(2),
        );
        let window = Window::new(at(2024, 1, 10, 0, 0), at(2024, 3, 1, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(
            starts,
            vec![
                at(2024, 1, 15, 9, 0),
                at(2024, 1, 29, 9, 0),
                at(2024, 2, 12, 9, 0),
                at(2024, 2, 26, 9, 0),
            ]
        );
        for pair in starts.windows(2) {
            assert_eq!(pair[1] - pair[0], chrono::TimeDelta::days(14));
        }
    }

    #[test]
    fn weekly_byday_expands_within_week() {
        let anchored = AnchoredRule::new(
            at(2024, 1, 1, 9, 0), // Monday
            RecurrenceRule::weekly().with_count(6).with_by_day(vec![
                WeekdayNum::every(Weekday::Monday),
                WeekdayNum::every(Weekday::Wednesday),
                WeekdayNum::every(Weekday::Friday),
            ]),
        );
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(
            starts,
            vec![
                at(2024, 1, 1, 9, 0),
                at(2024, 1, 3, 9, 0),
                at(2024, 1, 5, 9, 0),
                at(2024, 1, 8, 9, 0),
                at(2024, 1, 10, 9, 0),
                at(2024, 1, 12, 9, 0),
            ]
        );
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        // Jan 31 + 1 month lands on Feb 29 (2024 is a leap year), and the
        // step after that returns to Mar 31: stepping is computed from the
        // anchor, never from the clamped previous occurrence.
        let anchored = AnchoredRule::new(
            at(2024, 1, 31, 10, 0),
            RecurrenceRule::monthly().with_count(3),
        );
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(
            starts,
            vec![
                at(2024, 1, 31, 10, 0),
                at(2024, 2, 29, 10, 0),
                at(2024, 3, 31, 10, 0),
            ]
        );
    }

    #[test]
    fn monthly_first_monday() {
        let anchored = AnchoredRule::new(
            at(2024, 1, 1, 8, 0), // first Monday of January 2024
            RecurrenceRule::monthly()
                .with_count(3)
                .with_by_day(vec![WeekdayNum::nth(1, Weekday::Monday)]),
        );
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(
            starts,
            vec![
                at(2024, 1, 1, 8, 0),
                at(2024, 2, 5, 8, 0),
                at(2024, 3, 4, 8, 0),
            ]
        );
    }

    #[test]
    fn monthly_last_day_via_negative_monthday() {
        let anchored = AnchoredRule::new(
            at(2024, 1, 31, 12, 0),
            RecurrenceRule::monthly().with_count(3).with_by_monthday(vec![-1]),
        );
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(
            starts,
            vec![
                at(2024, 1, 31, 12, 0),
                at(2024, 2, 29, 12, 0),
                at(2024, 3, 31, 12, 0),
            ]
        );
    }

    #[test]
    fn monthly_setpos_narrows_period() {
        // Weekdays of each month, narrowed to the last one.
        let anchored = AnchoredRule::new(
            at(2024, 1, 31, 17, 0), // Wednesday, last weekday of January
            RecurrenceRule::monthly()
                .with_count(2)
                .with_by_day(vec![
                    WeekdayNum::every(Weekday::Monday),
                    WeekdayNum::every(Weekday::Tuesday),
                    WeekdayNum::every(Weekday::Wednesday),
                    WeekdayNum::every(Weekday::Thursday),
                    WeekdayNum::every(Weekday::Friday),
                ])
                .with_by_setpos(vec![-1]),
        );
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(starts, vec![at(2024, 1, 31, 17, 0), at(2024, 2, 29, 17, 0)]);
    }

    #[test]
    fn setpos_without_other_constraints_is_ignored() {
        let anchored = AnchoredRule::new(
            at(2024, 1, 1, 9, 0),
            RecurrenceRule::daily().with_count(3).with_by_setpos(vec![2]),
        );
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        assert_eq!(collect(&anchored, window).len(), 3);
    }

    #[test]
    fn until_boundary_is_inclusive() {
        let until = at(2024, 1, 3, 10, 0);
        let anchored =
            AnchoredRule::new(at(2024, 1, 1, 10, 0), RecurrenceRule::daily().with_until(until));
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(starts.len(), 3);
        assert_eq!(*starts.last().unwrap(), until);
    }

    #[test]
    fn until_one_microsecond_short_excludes_next() {
        let almost = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_micro_opt(9, 59, 59, 999_999)
            .unwrap();
        let anchored =
            AnchoredRule::new(at(2024, 1, 1, 10, 0), RecurrenceRule::daily().with_until(almost));
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        assert_eq!(collect(&anchored, window).len(), 2);
    }

    #[test]
    fn count_consumed_by_pre_window_occurrences() {
        // COUNT=5 from the anchor; a window starting at day 4 sees only
        // the last two occurrences, not five shifted ones.
        let anchored = AnchoredRule::new(at(2024, 1, 1, 10, 0), RecurrenceRule::daily().with_count(5));
        let window = Window::new(at(2024, 1, 4, 0, 0), at(2024, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(starts, vec![at(2024, 1, 4, 10, 0), at(2024, 1, 5, 10, 0)]);
    }

    #[test]
    fn open_rule_is_bounded_by_window_end() {
        let anchored = AnchoredRule::new(at(2024, 1, 1, 10, 0), RecurrenceRule::daily());
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 1, 10, 23, 59));
        assert_eq!(collect(&anchored, window).len(), 10);
    }

    #[test]
    fn window_end_is_inclusive() {
        let anchored = AnchoredRule::new(at(2024, 1, 1, 10, 0), RecurrenceRule::daily());
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 1, 10, 10, 0));
        let starts = collect(&anchored, window);
        assert_eq!(starts.len(), 10);
        assert_eq!(*starts.last().unwrap(), at(2024, 1, 10, 10, 0));
    }

    #[test]
    fn empty_window_yields_empty_sequence() {
        let anchored = AnchoredRule::new(at(2024, 6, 1, 10, 0), RecurrenceRule::daily().with_count(5));
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 2, 1, 0, 0));
        assert!(collect(&anchored, window).is_empty());
    }

    #[test]
    fn sequence_is_restartable() {
        let anchored = AnchoredRule::new(
            at(2024, 1, 1, 9, 0),
            RecurrenceRule::weekly().with_interval(3).with_count(7),
        );
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 12, 31, 0, 0));
        assert_eq!(collect(&anchored, window), collect(&anchored, window));
    }

    #[test]
    fn yearly_by_month() {
        let anchored = AnchoredRule::new(
            at(2024, 3, 15, 9, 0),
            RecurrenceRule::yearly().with_count(4).with_by_month(vec![3, 9]),
        );
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2026, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(
            starts,
            vec![
                at(2024, 3, 15, 9, 0),
                at(2024, 9, 15, 9, 0),
                at(2025, 3, 15, 9, 0),
                at(2025, 9, 15, 9, 0),
            ]
        );
    }

    #[test]
    fn yearly_leap_anchor_clamps_in_common_years() {
        let anchored = AnchoredRule::new(
            at(2024, 2, 29, 9, 0),
            RecurrenceRule::yearly().with_count(3),
        );
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2027, 12, 31, 0, 0));
        let starts = collect(&anchored, window);
        assert_eq!(
            starts,
            vec![
                at(2024, 2, 29, 9, 0),
                at(2025, 2, 28, 9, 0),
                at(2026, 2, 28, 9, 0),
            ]
        );
    }

    #[test_log::test]
    fn cap_stops_runaway_rules() {
        let anchored = AnchoredRule::new(at(2024, 1, 1, 0, 0), RecurrenceRule::daily());
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2300, 1, 1, 0, 0));
        let options = ExpandOptions::default().with_max_occurrences(50);
        let starts: Vec<_> = anchored.occurrences_with(window, options).collect();
        assert_eq!(starts.len(), 50);
    }
}
