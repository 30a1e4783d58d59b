//! Deterministic instance identities for materialized occurrences.
//!
//! ## Summary
//! Derives the identity of a recurring-event instance from its template
//! identity and occurrence start. The derivation is a pure function of its
//! inputs, so regenerating a series yields byte-identical identities and
//! re-renders and instance-level deletes stay stable.

use chrono::NaiveDateTime;

use crate::constants::INSTANCE_SUFFIX_FORMAT;
use crate::types::EventId;

/// Formats the occurrence-start suffix of an instance identity.
///
/// Examples:
/// - 2024-01-01T09:00 -> "2024-01-01-09-00"
/// - 2024-02-29T23:30 -> "2024-02-29-23-30"
#[must_use]
pub fn instance_suffix(occurrence_start: NaiveDateTime) -> String {
    occurrence_start.format(INSTANCE_SUFFIX_FORMAT).to_string()
}

/// Derives the full instance identity: `<template-id>-<suffix>`.
#[must_use]
pub fn instance_id(template_id: &EventId, occurrence_start: NaiveDateTime) -> EventId {
    EventId::from(format!(
        "{template_id}-{}",
        instance_suffix(occurrence_start)
    ))
}
