use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Stable identity of an event.
///
/// Template identities are opaque strings (UUID v4 for fresh templates).
/// Materialized instances derive their identity from the template identity
/// plus a deterministic occurrence suffix; see [`crate::util::instance_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a fresh template identity.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event category without UI dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Appointment,
    Webinar,
}

impl EventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Appointment => "appointment",
            Self::Webinar => "webinar",
        }
    }

    /// Parses an event type from its wire form (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "appointment" => Self::Appointment,
            "webinar" => Self::Webinar,
            _ => return None,
        })
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s).ok_or_else(|| CoreError::InvalidInput(format!("unknown event type: {s}")))
    }
}

/// Type filter applied to collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    /// No filtering; every event matches.
    #[default]
    All,
    /// Only events of the given type match.
    Only(EventType),
}

impl EventFilter {
    #[must_use]
    pub fn matches(self, event_type: EventType) -> bool {
        match self {
            Self::All => true,
            Self::Only(t) => t == event_type,
        }
    }
}

impl std::str::FromStr for EventFilter {
    type Err = CoreError;

    /// Parses the UI's filter vocabulary: `all` or an event type.
    fn from_str(s: &str) -> CoreResult<Self> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}
