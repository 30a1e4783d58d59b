//! Parser for the canonical recurrence-rule text form.
//!
//! Grammar: `FREQ=<token>;INTERVAL=<n>[;UNTIL=<stamp>|;COUNT=<n>]`
//! `[;BYDAY=<list>][;BYMONTH=<list>][;BYMONTHDAY=<list>][;BYSETPOS=<list>]`.
//! Keys are case-insensitive and may appear in any order; unknown keys are
//! ignored. INTERVAL defaults to 1 when absent. UNTIL stamps are naive
//! local time in basic format (`YYYYMMDDTHHMMSS`).
#![expect(
    clippy::map_err_ignore,
    reason = "Value parsers intentionally discard error sources; the offending token is carried instead"
)]

use chrono::NaiveDateTime;

use crate::error::{MalformedRuleError, RuleResult};
use crate::rule::{
    Frequency, RecurrenceRule, Termination, UNTIL_FORMAT, Weekday, WeekdayNum,
};

/// Accumulates rule parts before termination-mode resolution.
#[derive(Default)]
struct RuleParts {
    frequency: Option<Frequency>,
    interval: Option<u32>,
    until: Option<NaiveDateTime>,
    count: Option<u32>,
    by_day: Vec<WeekdayNum>,
    by_month: Vec<u8>,
    by_monthday: Vec<i8>,
    by_setpos: Vec<i16>,
}

/// Parses the canonical text form into a [`RecurrenceRule`].
///
/// ## Errors
/// Returns [`MalformedRuleError`] when the frequency token is unrecognized
/// or missing, the interval is not a positive integer, both termination
/// modes are present, or a by-* value is out of its domain.
pub fn parse_rule(s: &str) -> RuleResult<RecurrenceRule> {
    let mut parts = RuleParts::default();

    for part in s.split(';') {
        if part.is_empty() {
            continue;
        }
        let Some(eq_pos) = part.find('=') else {
            return Err(MalformedRuleError::MalformedPart(part.to_string()));
        };

        let key = &part[..eq_pos];
        let value = &part[eq_pos + 1..];

        parse_rule_part(&mut parts, key, value)?;
    }

    let frequency = parts.frequency.ok_or(MalformedRuleError::MissingFrequency)?;

    let termination = match (parts.until, parts.count) {
        (Some(_), Some(_)) => return Err(MalformedRuleError::ConflictingTermination),
        (Some(until), None) => Termination::Until(until),
        (None, Some(count)) => Termination::Count(count),
        (None, None) => Termination::Open,
    };

    Ok(RecurrenceRule {
        frequency,
        interval: parts.interval.unwrap_or(1),
        termination,
        by_day: parts.by_day,
        by_month: parts.by_month,
        by_monthday: parts.by_monthday,
        by_setpos: parts.by_setpos,
    })
}

/// Parses a single rule key-value pair.
fn parse_rule_part(parts: &mut RuleParts, key: &str, value: &str) -> RuleResult<()> {
    match key.to_ascii_uppercase().as_str() {
        "FREQ" => {
            parts.frequency = Some(
                Frequency::parse(value)
                    .ok_or_else(|| MalformedRuleError::UnknownFrequency(value.to_string()))?,
            );
        }
        "INTERVAL" => {
            let interval: u32 = value
                .parse()
                .map_err(|_| MalformedRuleError::InvalidInterval(value.to_string()))?;
            if interval == 0 {
                return Err(MalformedRuleError::InvalidInterval(value.to_string()));
            }
            parts.interval = Some(interval);
        }
        "COUNT" => {
            if parts.until.is_some() {
                return Err(MalformedRuleError::ConflictingTermination);
            }
            let count: u32 = value
                .parse()
                .map_err(|_| MalformedRuleError::InvalidCount(value.to_string()))?;
            if count == 0 {
                return Err(MalformedRuleError::InvalidCount(value.to_string()));
            }
            parts.count = Some(count);
        }
        "UNTIL" => {
            if parts.count.is_some() {
                return Err(MalformedRuleError::ConflictingTermination);
            }
            parts.until = Some(
                NaiveDateTime::parse_from_str(value, UNTIL_FORMAT)
                    .map_err(|_| MalformedRuleError::InvalidUntil(value.to_string()))?,
            );
        }
        "BYDAY" => parts.by_day = parse_byday(value)?,
        "BYMONTH" => parts.by_month = parse_month_list(value)?,
        "BYMONTHDAY" => parts.by_monthday = parse_monthday_list(value)?,
        "BYSETPOS" => parts.by_setpos = parse_setpos_list(value)?,
        _ => {} // Unknown rule part - ignore
    }
    Ok(())
}

/// Parses a BYDAY value (weekdays with optional ordinals).
fn parse_byday(s: &str) -> RuleResult<Vec<WeekdayNum>> {
    s.split(',').map(|v| parse_weekday_num(v.trim())).collect()
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "1MO", "-1FR").
fn parse_weekday_num(s: &str) -> RuleResult<WeekdayNum> {
    if s.len() < 2 {
        return Err(MalformedRuleError::InvalidWeekday(s.to_string()));
    }

    let (ordinal_str, day_str) = s.split_at(s.len() - 2);
    let weekday =
        Weekday::parse(day_str).ok_or_else(|| MalformedRuleError::InvalidWeekday(s.to_string()))?;

    let ordinal = if ordinal_str.is_empty() {
        None
    } else {
        let n: i8 = ordinal_str
            .parse()
            .map_err(|_| MalformedRuleError::InvalidWeekday(s.to_string()))?;
        if n == 0 || !(-53..=53).contains(&n) {
            return Err(MalformedRuleError::InvalidWeekday(s.to_string()));
        }
        Some(n)
    };

    Ok(WeekdayNum { ordinal, weekday })
}

/// Parses a comma-separated BYMONTH list (1-12).
fn parse_month_list(s: &str) -> RuleResult<Vec<u8>> {
    s.split(',')
        .map(|v| {
            let v = v.trim();
            let month: u8 = v
                .parse()
                .map_err(|_| MalformedRuleError::InvalidMonth(v.to_string()))?;
            if (1..=12).contains(&month) {
                Ok(month)
            } else {
                Err(MalformedRuleError::InvalidMonth(v.to_string()))
            }
        })
        .collect()
}

/// Parses a comma-separated BYMONTHDAY list (±1..=31).
fn parse_monthday_list(s: &str) -> RuleResult<Vec<i8>> {
    s.split(',')
        .map(|v| {
            let v = v.trim();
            let day: i8 = v
                .parse()
                .map_err(|_| MalformedRuleError::InvalidMonthDay(v.to_string()))?;
            if day == 0 || !(-31..=31).contains(&day) {
                Err(MalformedRuleError::InvalidMonthDay(v.to_string()))
            } else {
                Ok(day)
            }
        })
        .collect()
}

/// Parses a comma-separated BYSETPOS list (non-zero).
fn parse_setpos_list(s: &str) -> RuleResult<Vec<i16>> {
    s.split(',')
        .map(|v| {
            let v = v.trim();
            let pos: i16 = v
                .parse()
                .map_err(|_| MalformedRuleError::MalformedPart(v.to_string()))?;
            if pos == 0 {
                Err(MalformedRuleError::InvalidSetPos)
            } else {
                Ok(pos)
            }
        })
        .collect()
}

impl RecurrenceRule {
    /// Parses the canonical text form.
    ///
    /// ## Errors
    /// See [`parse_rule`].
    pub fn parse(s: &str) -> RuleResult<Self> {
        parse_rule(s)
    }
}

impl std::str::FromStr for RecurrenceRule {
    type Err = MalformedRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_rule(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parse_basic() {
        let rule = parse_rule("FREQ=DAILY;INTERVAL=1;COUNT=10").unwrap();
        assert_eq!(rule.frequency, Frequency::Daily);
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.termination, Termination::Count(10));
    }

    #[test]
    fn parse_interval_defaults_to_one() {
        let rule = parse_rule("FREQ=WEEKLY").unwrap();
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.termination, Termination::Open);
    }

    #[test]
    fn parse_until() {
        let rule = parse_rule("FREQ=DAILY;UNTIL=20240103T235959").unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(rule.termination, Termination::Until(expected));
    }

    #[test]
    fn parse_byday_with_ordinals() {
        let rule = parse_rule("FREQ=MONTHLY;BYDAY=1MO,-1FR").unwrap();
        assert_eq!(
            rule.by_day,
            vec![
                WeekdayNum::nth(1, Weekday::Monday),
                WeekdayNum::nth(-1, Weekday::Friday),
            ]
        );
    }

    #[test]
    fn parse_rejects_unknown_frequency() {
        assert_eq!(
            parse_rule("FREQ=FORTNIGHTLY"),
            Err(MalformedRuleError::UnknownFrequency("FORTNIGHTLY".into()))
        );
    }

    #[test]
    fn parse_rejects_missing_frequency() {
        assert_eq!(
            parse_rule("INTERVAL=2"),
            Err(MalformedRuleError::MissingFrequency)
        );
    }

    #[test]
    fn parse_rejects_bad_interval() {
        assert!(matches!(
            parse_rule("FREQ=DAILY;INTERVAL=0"),
            Err(MalformedRuleError::InvalidInterval(_))
        ));
        assert!(matches!(
            parse_rule("FREQ=DAILY;INTERVAL=1.5"),
            Err(MalformedRuleError::InvalidInterval(_))
        ));
        assert!(matches!(
            parse_rule("FREQ=DAILY;INTERVAL=-2"),
            Err(MalformedRuleError::InvalidInterval(_))
        ));
    }

    #[test]
    fn parse_rejects_conflicting_termination() {
        assert_eq!(
            parse_rule("FREQ=DAILY;UNTIL=20240103T000000;COUNT=3"),
            Err(MalformedRuleError::ConflictingTermination)
        );
        assert_eq!(
            parse_rule("FREQ=DAILY;COUNT=3;UNTIL=20240103T000000"),
            Err(MalformedRuleError::ConflictingTermination)
        );
    }

    #[test]
    fn parse_rejects_out_of_domain_by_values() {
        assert!(matches!(
            parse_rule("FREQ=MONTHLY;BYMONTH=13"),
            Err(MalformedRuleError::InvalidMonth(_))
        ));
        assert!(matches!(
            parse_rule("FREQ=MONTHLY;BYMONTHDAY=0"),
            Err(MalformedRuleError::InvalidMonthDay(_))
        ));
        assert!(matches!(
            parse_rule("FREQ=MONTHLY;BYMONTHDAY=32"),
            Err(MalformedRuleError::InvalidMonthDay(_))
        ));
        assert!(matches!(
            parse_rule("FREQ=WEEKLY;BYDAY=XX"),
            Err(MalformedRuleError::InvalidWeekday(_))
        ));
        assert_eq!(
            parse_rule("FREQ=MONTHLY;BYDAY=MO;BYSETPOS=0"),
            Err(MalformedRuleError::InvalidSetPos)
        );
    }

    #[test]
    fn parse_ignores_unknown_keys() {
        let rule = parse_rule("FREQ=DAILY;WKST=MO;X-CUSTOM=1").unwrap();
        assert_eq!(rule.frequency, Frequency::Daily);
    }

    #[test]
    fn round_trip_preserves_value() {
        let rules = [
            "FREQ=DAILY;INTERVAL=1;COUNT=5",
            "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE,FR",
            "FREQ=MONTHLY;INTERVAL=1;UNTIL=20241231T235959;BYMONTHDAY=-1",
            "FREQ=MONTHLY;INTERVAL=3;BYDAY=1MO,-1FR;BYSETPOS=1,-1",
            "FREQ=YEARLY;INTERVAL=1;BYMONTH=3,6,9,12",
        ];
        for text in rules {
            let rule = parse_rule(text).unwrap();
            let reparsed = parse_rule(&rule.to_string()).unwrap();
            assert_eq!(rule, reparsed, "round trip failed for {text}");
        }
    }
}
