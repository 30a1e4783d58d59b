use thiserror::Error;

/// Result type for rule parsing and compilation.
pub type RuleResult<T> = std::result::Result<T, MalformedRuleError>;

/// Structural invalidity in a recurrence rule's text form or in the legacy
/// recurrence form.
///
/// Returned synchronously by parsing and compilation so the form layer can
/// reject bad input before it reaches storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRuleError {
    #[error("Missing FREQ part")]
    MissingFrequency,

    #[error("Unrecognized frequency token: {0}")]
    UnknownFrequency(String),

    #[error("INTERVAL must be a positive integer, got: {0}")]
    InvalidInterval(String),

    #[error("COUNT must be a positive integer, got: {0}")]
    InvalidCount(String),

    #[error("Invalid UNTIL timestamp: {0}")]
    InvalidUntil(String),

    #[error("UNTIL and COUNT are mutually exclusive")]
    ConflictingTermination,

    #[error("Invalid BYDAY entry: {0}")]
    InvalidWeekday(String),

    #[error("BYMONTH value out of range 1-12: {0}")]
    InvalidMonth(String),

    #[error("BYMONTHDAY value out of range: {0}")]
    InvalidMonthDay(String),

    #[error("BYSETPOS value must be non-zero")]
    InvalidSetPos,

    #[error("Malformed rule part: {0}")]
    MalformedPart(String),
}
