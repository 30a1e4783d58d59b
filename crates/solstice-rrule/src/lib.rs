//! Recurrence rules for the solstice calendar engine.
//!
//! This crate defines the canonical recurrence-rule model together with its
//! three operations:
//! - parse/serialize the canonical text form (round-trip safe),
//! - compile the UI's legacy recurrence form into a canonical rule,
//! - expand an anchored rule into its bounded occurrence sequence.
//!
//! All timestamps are naive local time; timezone-aware recurrence is out of
//! scope for the engine.

pub mod compile;
pub mod error;
pub mod expand;
pub mod parse;
pub mod rule;

mod calendar;

pub use compile::{FormFrequency, RecurrenceForm, compile};
pub use error::{MalformedRuleError, RuleResult};
pub use expand::{AnchoredRule, ExpandOptions, Occurrences, Window};
pub use rule::{Frequency, RecurrenceRule, Termination, Weekday, WeekdayNum};
