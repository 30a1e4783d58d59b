//! Event materialization and the flat event collection.
//!
//! This crate binds recurrence rules to event templates: it derives the
//! concrete event instances the UI renders, and maintains the immutable
//! collection snapshots the UI queries by date and type. Templates are the
//! only persisted form; instances are recomputed on demand.

pub mod event;
pub mod materialize;
pub mod store;

pub use event::{ConcreteEvent, EventTemplate, Recurrence};
pub use materialize::{materialize, validate_recurrence};
pub use store::EventStore;

// The UI-facing surface in one import.
pub use solstice_core::types::{EventFilter, EventId, EventType};
