//! Binds recurrence rules to templates, producing concrete instances.

use chrono::NaiveDateTime;

use solstice_rrule::{AnchoredRule, MalformedRuleError, RecurrenceRule, Window, compile};

use crate::event::{ConcreteEvent, EventTemplate, Recurrence};

/// ## Summary
/// Materializes a template into its concrete events up to `window_end`.
///
/// A non-recurring template yields exactly one event mirroring the
/// template. A recurring template yields one event per occurrence between
/// its start and `window_end`, each with a deterministic derived identity.
///
/// A recurring template whose rule cannot be resolved (unparseable text
/// with no usable legacy form) degrades to a single non-recurring event:
/// forward progress is preferred over dropping the event, and the
/// condition is reported on the diagnostic channel at warning level.
#[must_use]
pub fn materialize(template: &EventTemplate, window_end: NaiveDateTime) -> Vec<ConcreteEvent> {
    let Some(recurrence) = &template.recurrence else {
        return vec![ConcreteEvent::standalone(template)];
    };

    match resolve_rule(template, recurrence) {
        Ok(anchored) => anchored
            .occurrences(Window::new(template.start, window_end))
            .map(|start| ConcreteEvent::instance(template, start))
            .collect(),
        Err(error) => {
            tracing::warn!(
                template_id = %template.id,
                error = %error,
                "Recurrence unusable; degrading template to a single instance"
            );
            vec![ConcreteEvent::standalone(template)]
        }
    }
}

/// ## Summary
/// Validates a template's recurrence data without materializing.
///
/// The creation form calls this to reject malformed recurrence input
/// before it reaches storage; materialization itself never fails.
///
/// ## Errors
/// Returns the underlying [`MalformedRuleError`] for a recurring template
/// whose rule text and legacy form are both unusable. A non-recurring
/// template always validates.
pub fn validate_recurrence(template: &EventTemplate) -> Result<(), MalformedRuleError> {
    match &template.recurrence {
        Some(recurrence) => resolve_rule(template, recurrence).map(|_| ()),
        None => Ok(()),
    }
}

/// Resolves a template's recurrence to an anchored rule: canonical text
/// first, legacy form as fallback. The template's start is the anchor.
fn resolve_rule(
    template: &EventTemplate,
    recurrence: &Recurrence,
) -> Result<AnchoredRule, MalformedRuleError> {
    match (&recurrence.rule_text, &recurrence.form) {
        (Some(text), form) => match RecurrenceRule::parse(text) {
            Ok(rule) => Ok(AnchoredRule::new(template.start, rule)),
            Err(error) => match form {
                Some(form) => {
                    tracing::debug!(
                        template_id = %template.id,
                        error = %error,
                        "Rule text unparseable; compiling legacy form"
                    );
                    compile(form, template.start)
                }
                None => Err(error),
            },
        },
        (None, Some(form)) => compile(form, template.start),
        (None, None) => Err(MalformedRuleError::MissingFrequency),
    }
}
