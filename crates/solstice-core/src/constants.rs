/// Expansion bounds shared across crates.
///
/// Open-ended rules are never expanded past the caller's window; when the
/// caller has no explicit window the horizon below bounds generation.
pub const DEFAULT_HORIZON_DAYS: i64 = 365;

/// Hard cap on occurrences generated for a single rule, regardless of
/// termination mode. Guards against runaway rules.
pub const DEFAULT_MAX_OCCURRENCES: usize = 10_000;

/// strftime format for the deterministic instance-identity suffix.
/// Minute precision: two instances of one series can never share a start.
pub const INSTANCE_SUFFIX_FORMAT: &str = "%Y-%m-%d-%H-%M";
