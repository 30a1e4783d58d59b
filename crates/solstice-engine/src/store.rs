//! Flat event collection queried by the UI.
//!
//! The store is an immutable snapshot: every mutation takes `&self` and
//! returns the next snapshot, leaving the caller to own the lifecycle and
//! apply replacements atomically. The engine never holds shared mutable
//! state.

use chrono::{NaiveDate, NaiveDateTime};

use solstice_core::types::{EventFilter, EventId};

use crate::event::{ConcreteEvent, EventTemplate};
use crate::materialize::materialize;

/// Snapshot of the materialized event collection, de-duplicated by
/// identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStore {
    events: Vec<ConcreteEvent>,
}

impl EventStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Builds a snapshot from existing events. Later duplicates of an
    /// identity replace earlier ones.
    #[must_use]
    pub fn from_events(events: impl IntoIterator<Item = ConcreteEvent>) -> Self {
        let mut store = Self::new();
        for event in events {
            store.upsert(event);
        }
        store
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConcreteEvent> {
        self.events.iter()
    }

    #[must_use]
    pub fn get(&self, id: &EventId) -> Option<&ConcreteEvent> {
        self.events.iter().find(|e| e.id == *id)
    }

    /// ## Summary
    /// Materializes `template` and appends the result. Events sharing an
    /// identity with a materialized one are replaced, so re-inserting a
    /// template is safe.
    #[must_use]
    pub fn apply_insert(&self, template: &EventTemplate, window_end: NaiveDateTime) -> Self {
        let mut next = self.clone();
        for event in materialize(template, window_end) {
            next.upsert(event);
        }
        tracing::debug!(template_id = %template.id, total = next.len(), "Inserted event");
        next
    }

    /// ## Summary
    /// Replaces a template's materialized output with a regeneration from
    /// the updated template.
    ///
    /// Recurring: every event in the template's series (back-reference or
    /// bare template identity) is superseded and the full series is
    /// regenerated — no stale instances survive. Non-recurring: the single
    /// event with matching identity is replaced in place; an unknown
    /// identity leaves the snapshot unchanged.
    #[must_use]
    pub fn apply_update(&self, template: &EventTemplate, window_end: NaiveDateTime) -> Self {
        if template.is_recurring() {
            let mut next = Self {
                events: self
                    .events
                    .iter()
                    .filter(|e| !e.in_series(&template.id) && e.id != template.id)
                    .cloned()
                    .collect(),
            };
            for event in materialize(template, window_end) {
                next.upsert(event);
            }
            tracing::debug!(template_id = %template.id, total = next.len(), "Replaced series");
            next
        } else {
            let mut next = self.clone();
            if let Some(slot) = next.events.iter_mut().find(|e| e.id == template.id) {
                if let Some(event) = materialize(template, window_end).into_iter().next() {
                    *slot = event;
                }
            }
            next
        }
    }

    /// ## Summary
    /// Deletes by identity, series-aware.
    ///
    /// When any event back-references `id`, the identity names a template
    /// and the whole series is removed. Otherwise exactly the one event
    /// with that identity is removed — deleting a derived instance identity
    /// leaves the template and the rest of its series intact.
    #[must_use]
    pub fn apply_delete(&self, id: &EventId) -> Self {
        let is_series = self.events.iter().any(|e| e.in_series(id));
        let events: Vec<ConcreteEvent> = if is_series {
            self.events
                .iter()
                .filter(|e| !e.in_series(id) && e.id != *id)
                .cloned()
                .collect()
        } else {
            self.events.iter().filter(|e| e.id != *id).cloned().collect()
        };
        tracing::debug!(
            id = %id,
            removed = self.events.len() - events.len(),
            series = is_series,
            "Deleted event"
        );
        Self { events }
    }

    /// Events whose occurrence starts on `date`, filtered by type and
    /// sorted by occurrence start.
    #[must_use]
    pub fn events_for_date(&self, date: NaiveDate, filter: EventFilter) -> Vec<&ConcreteEvent> {
        let mut events: Vec<&ConcreteEvent> = self
            .events
            .iter()
            .filter(|e| e.date() == date && filter.matches(e.event_type))
            .collect();
        events.sort_by(|a, b| {
            a.occurrence_start
                .cmp(&b.occurrence_start)
                .then_with(|| a.id.cmp(&b.id))
        });
        events
    }

    /// Events whose occurrence starts inside `[start, end]`, filtered by
    /// type and sorted by occurrence start.
    #[must_use]
    pub fn events_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        filter: EventFilter,
    ) -> Vec<&ConcreteEvent> {
        let mut events: Vec<&ConcreteEvent> = self
            .events
            .iter()
            .filter(|e| {
                e.occurrence_start >= start
                    && e.occurrence_start <= end
                    && filter.matches(e.event_type)
            })
            .collect();
        events.sort_by(|a, b| {
            a.occurrence_start
                .cmp(&b.occurrence_start)
                .then_with(|| a.id.cmp(&b.id))
        });
        events
    }

    /// Inserts or replaces by identity.
    fn upsert(&mut self, event: ConcreteEvent) {
        if let Some(slot) = self.events.iter_mut().find(|e| e.id == event.id) {
            *slot = event;
        } else {
            self.events.push(event);
        }
    }
}

impl<'a> IntoIterator for &'a EventStore {
    type Item = &'a ConcreteEvent;
    type IntoIter = std::slice::Iter<'a, ConcreteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
