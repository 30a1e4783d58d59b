//! Event model: user-authored templates and derived concrete instances.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use solstice_core::types::{EventId, EventType};
use solstice_core::util::instance_id;
use solstice_rrule::RecurrenceForm;

/// Recurrence data carried by a template.
///
/// The serialized rule text is authoritative; the legacy form is kept as a
/// compilation fallback for templates authored before rule text existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    #[serde(rename = "rrule", default)]
    pub rule_text: Option<String>,
    #[serde(rename = "pattern", default)]
    pub form: Option<RecurrenceForm>,
}

impl Recurrence {
    /// Recurrence from canonical rule text.
    #[must_use]
    pub fn from_text(rule_text: impl Into<String>) -> Self {
        Self {
            rule_text: Some(rule_text.into()),
            form: None,
        }
    }

    /// Recurrence from a legacy form only.
    #[must_use]
    pub const fn from_form(form: RecurrenceForm) -> Self {
        Self {
            rule_text: None,
            form: Some(form),
        }
    }
}

/// The canonical, user-authored event definition.
///
/// Duration is derived from the form's start/end pair at construction and
/// stored as a span, not an end time, so it survives occurrence shifting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTemplate {
    pub id: EventId,
    pub title: String,
    pub start: NaiveDateTime,
    #[serde(with = "duration_secs")]
    pub duration: TimeDelta,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "clientName", default)]
    pub client_name: Option<String>,
    #[serde(rename = "clientAvatar", default)]
    pub client_avatar: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

impl EventTemplate {
    /// Creates a non-recurring template from the form's start/end pair.
    #[must_use]
    pub fn new(
        id: EventId,
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        event_type: EventType,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            start,
            duration: end - start,
            event_type,
            location: None,
            description: None,
            client_name: None,
            client_avatar: None,
            color: None,
            recurrence: None,
        }
    }

    /// Attaches recurrence data.
    #[must_use]
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// End of the template's own occurrence.
    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration
    }
}

/// A concrete event instance: template fields bound to one occurrence.
///
/// Generated instances back-reference their template through `template_id`;
/// a standalone non-recurring event has no back-reference and carries its
/// template's identity unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteEvent {
    pub id: EventId,
    #[serde(rename = "templateId", default)]
    pub template_id: Option<EventId>,
    #[serde(rename = "isRecurringInstance", default)]
    pub is_recurring_instance: bool,
    pub title: String,
    #[serde(rename = "startTime")]
    pub occurrence_start: NaiveDateTime,
    #[serde(rename = "endTime")]
    pub occurrence_end: NaiveDateTime,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "clientName", default)]
    pub client_name: Option<String>,
    #[serde(rename = "clientAvatar", default)]
    pub client_avatar: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ConcreteEvent {
    /// The single concrete event of a non-recurring template. Identity is
    /// the template's own.
    #[must_use]
    pub fn standalone(template: &EventTemplate) -> Self {
        Self {
            id: template.id.clone(),
            template_id: None,
            is_recurring_instance: false,
            title: template.title.clone(),
            occurrence_start: template.start,
            occurrence_end: template.end(),
            event_type: template.event_type,
            location: template.location.clone(),
            description: template.description.clone(),
            client_name: template.client_name.clone(),
            client_avatar: template.client_avatar.clone(),
            color: template.color.clone(),
        }
    }

    /// One generated instance of a recurring template at the given
    /// occurrence start. Identity derivation is deterministic, so
    /// regenerating a series yields byte-identical identities.
    #[must_use]
    pub fn instance(template: &EventTemplate, occurrence_start: NaiveDateTime) -> Self {
        Self {
            id: instance_id(&template.id, occurrence_start),
            template_id: Some(template.id.clone()),
            is_recurring_instance: true,
            title: template.title.clone(),
            occurrence_start,
            occurrence_end: occurrence_start + template.duration,
            event_type: template.event_type,
            location: template.location.clone(),
            description: template.description.clone(),
            client_name: template.client_name.clone(),
            client_avatar: template.client_avatar.clone(),
            color: template.color.clone(),
        }
    }

    /// Calendar date of the occurrence start.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.occurrence_start.date()
    }

    /// True when this event belongs to the series of `template_id`.
    #[must_use]
    pub fn in_series(&self, template_id: &EventId) -> bool {
        self.template_id.as_ref() == Some(template_id)
    }
}

/// Serializes a duration as whole seconds.
mod duration_secs {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        i64::deserialize(deserializer).map(TimeDelta::seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn duration_derived_from_end() {
        let template = EventTemplate::new(
            EventId::from("evt-1"),
            "Standup",
            at(2024, 1, 1, 9, 0),
            at(2024, 1, 1, 9, 30),
            EventType::Appointment,
        );
        assert_eq!(template.duration, TimeDelta::minutes(30));
        assert_eq!(template.end(), at(2024, 1, 1, 9, 30));
    }

    #[test]
    fn standalone_keeps_template_identity() {
        let template = EventTemplate::new(
            EventId::from("evt-1"),
            "Standup",
            at(2024, 1, 1, 9, 0),
            at(2024, 1, 1, 9, 30),
            EventType::Appointment,
        );
        let event = ConcreteEvent::standalone(&template);
        assert_eq!(event.id, template.id);
        assert!(event.template_id.is_none());
        assert!(!event.is_recurring_instance);
    }

    #[test]
    fn instance_identity_is_derived_and_stable() {
        let template = EventTemplate::new(
            EventId::from("evt-1"),
            "Standup",
            at(2024, 1, 1, 9, 0),
            at(2024, 1, 1, 9, 30),
            EventType::Appointment,
        );
        let occurrence = at(2024, 1, 8, 9, 0);
        let a = ConcreteEvent::instance(&template, occurrence);
        let b = ConcreteEvent::instance(&template, occurrence);
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.as_str(), "evt-1-2024-01-08-09-00");
        assert_eq!(a.occurrence_end, at(2024, 1, 8, 9, 30));
        assert!(a.in_series(&template.id));
    }

    #[test]
    fn template_round_trips_through_json() {
        let template = EventTemplate::new(
            EventId::from("evt-1"),
            "Webinar",
            at(2024, 5, 1, 15, 0),
            at(2024, 5, 1, 16, 0),
            EventType::Webinar,
        )
        .with_location("Online")
        .with_recurrence(Recurrence::from_text("FREQ=WEEKLY;INTERVAL=1"));

        let json = serde_json::to_string(&template).unwrap();
        let back: EventTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(template, back);
    }
}
