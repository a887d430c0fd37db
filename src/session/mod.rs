//! Submission state machine.
//!
//! [`FormState`] is the single owner of everything a contact session mutates:
//! fields, honeypot, errors, status, cooldown and the session clock. Every
//! transition is a method on it, so the rules can be exercised without any
//! timers. [`runner`] wraps it in an event loop that feeds it edits, submits,
//! clock ticks, timer expiries and delivery outcomes one at a time.
//!
//! ```text
//! Idle ──submit(gate open, valid)──▶ Submitting ──ok──▶ Succeeded ──dismiss──▶ Idle
//!                                         │
//!                                         └──err──▶ Idle + errors.submit
//! ```

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::form::validator::{field_error, validate};
use crate::form::{clear_field_error, ErrorKind, Field, FieldErrors, FormFields};
use crate::gate::{self, CooldownWindow, GateDecision, GateRejection};
use crate::i18n::Translator;

pub mod runner;

pub use runner::{spawn_session, SessionClosed, SessionDeps, SessionHandle};

/// Translation key of the success notice.
pub const SUCCESS_NOTICE_KEY: &str = "contact.success_message";

/// Fallback text of the success notice.
pub const SUCCESS_NOTICE_FALLBACK: &str = "Thanks — your message has been sent.";

/// Loading and success flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionStatus {
    /// A delivery is in flight.
    pub loading: bool,
    /// The last delivery succeeded and the notice is still showing.
    pub success: bool,
}

/// The logical state encoded by [`SubmissionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for input.
    Idle,
    /// Delivery in flight.
    Submitting,
    /// Delivery succeeded; notice visible.
    Succeeded,
}

impl SubmissionStatus {
    /// Collapse the flags into a phase.
    pub fn phase(self) -> Phase {
        if self.loading {
            Phase::Submitting
        } else if self.success {
            Phase::Succeeded
        } else {
            Phase::Idle
        }
    }
}

/// What a submit attempt turned into, before any delivery happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStep {
    /// Dropped by the gate. Nothing changed.
    Ignored(GateRejection),
    /// Validation failed; the errors are now current.
    Invalid(FieldErrors),
    /// Validation passed; deliver these fields. Status is now loading.
    Dispatch(FormFields),
}

/// Final result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Dropped by the gate without feedback.
    Ignored(GateRejection),
    /// Validation failed. The surface should move focus to its error summary.
    Invalid(FieldErrors),
    /// Delivered; fields cleared and cooldown armed.
    Delivered,
    /// Delivery failed; fields kept and `errors.submit` set.
    Failed,
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    /// Current field values.
    pub fields: FormFields,
    /// Current errors.
    pub errors: FieldErrors,
    /// Loading and success flags.
    pub status: SubmissionStatus,
    /// Whether the submit control should be enabled.
    pub submit_enabled: bool,
    /// Time until the cooldown ends, zero when inactive.
    pub cooldown_remaining: Duration,
}

impl FormSnapshot {
    /// Logical phase.
    pub fn phase(&self) -> Phase {
        self.status.phase()
    }

    /// Text of the success notice while it is visible.
    pub fn success_notice(&self, translator: &dyn Translator) -> Option<String> {
        self.status
            .success
            .then(|| translator.translate(SUCCESS_NOTICE_KEY, SUCCESS_NOTICE_FALLBACK))
    }
}

/// Everything one contact session owns.
#[derive(Debug, Clone)]
pub struct FormState {
    fields: FormFields,
    honeypot: String,
    errors: FieldErrors,
    status: SubmissionStatus,
    cooldown: CooldownWindow,
    now: Instant,
}

impl FormState {
    /// Fresh session: empty fields, no errors, idle, no cooldown.
    pub fn new(now: Instant) -> Self {
        Self {
            fields: FormFields::default(),
            honeypot: String::new(),
            errors: FieldErrors::new(),
            status: SubmissionStatus::default(),
            cooldown: CooldownWindow::new(),
            now,
        }
    }

    /// Current field values.
    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    /// Current errors.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Loading and success flags.
    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    /// Cooldown window.
    pub fn cooldown(&self) -> &CooldownWindow {
        &self.cooldown
    }

    /// Last clock reading.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Set a field value. An error on that field is cleared.
    ///
    /// [`Field::Submit`] is not editable and is ignored.
    pub fn edit(&mut self, field: Field, value: impl Into<String>) {
        let Some(slot) = self.fields.get_mut(field) else {
            return;
        };
        *slot = value.into();
        if self.errors.contains(field) {
            self.errors = clear_field_error(std::mem::take(&mut self.errors), field);
        }
    }

    /// Set the decoy field.
    pub fn set_honeypot(&mut self, value: impl Into<String>) {
        self.honeypot = value.into();
    }

    /// Advance the session clock. Readings never move backwards.
    pub fn tick(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        !(self.status.loading || self.cooldown.is_active(self.now))
    }

    /// Start a submit attempt at `now`.
    ///
    /// The gate runs first and a rejection leaves the state untouched. Past the
    /// gate a stale success flag is cleared and the validator replaces the
    /// error set; clean fields move the state to loading.
    pub fn begin_submit(&mut self, now: Instant, translator: &dyn Translator) -> SubmitStep {
        self.tick(now);
        if let GateDecision::Rejected(reason) =
            gate::check(&self.honeypot, &self.cooldown, self.status.loading, self.now)
        {
            return SubmitStep::Ignored(reason);
        }

        self.status = SubmissionStatus::default();
        self.errors = validate(&self.fields, translator);
        if !self.errors.is_empty() {
            return SubmitStep::Invalid(self.errors.clone());
        }

        self.status.loading = true;
        SubmitStep::Dispatch(self.fields.clone())
    }

    /// The in-flight delivery succeeded at `now`.
    pub fn delivery_succeeded(&mut self, now: Instant, cooldown: Duration) {
        self.tick(now);
        self.status = SubmissionStatus {
            loading: false,
            success: true,
        };
        self.errors = FieldErrors::new();
        self.fields.clear();
        self.cooldown.arm(self.now, cooldown);
    }

    /// The in-flight delivery failed. Fields are kept for a retry.
    pub fn delivery_failed(&mut self, translator: &dyn Translator) {
        self.status = SubmissionStatus::default();
        let mut errors = FieldErrors::new();
        errors.insert(Field::Submit, field_error(ErrorKind::SubmitFailed, translator));
        self.errors = errors;
    }

    /// Hide the success notice. Fields stay as they are.
    pub fn dismiss_success(&mut self) {
        self.status.success = false;
    }

    /// Render-ready view.
    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            fields: self.fields.clone(),
            errors: self.errors.clone(),
            status: self.status,
            submit_enabled: self.can_submit(),
            cooldown_remaining: self.cooldown.remaining(self.now),
        }
    }
}
