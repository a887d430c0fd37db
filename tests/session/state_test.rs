//! `FormState` transitions without timers.

use std::time::Duration;

use tokio::time::Instant;

use contact_desk::form::{ErrorKind, Field, FormFields};
use contact_desk::gate::GateRejection;
use contact_desk::i18n::{CatalogTranslator, FallbackTranslator};
use contact_desk::session::{FormState, Phase, SubmitStep};

const COOLDOWN: Duration = Duration::from_millis(5000);

fn sample_fields() -> FormFields {
    FormFields {
        name: "Jo".to_owned(),
        email: "jo@x.com".to_owned(),
        subject: "Hello there".to_owned(),
        message: "This is a message body.".to_owned(),
    }
}

fn filled_state(now: Instant) -> FormState {
    let mut state = FormState::new(now);
    let fields = sample_fields();
    for field in Field::INPUTS {
        state.edit(field, fields.get(field).unwrap_or_default());
    }
    state
}

#[test]
fn new_state_is_idle_and_open() {
    let state = FormState::new(Instant::now());
    let snapshot = state.snapshot();
    assert_eq!(snapshot.phase(), Phase::Idle);
    assert!(snapshot.errors.is_empty());
    assert!(snapshot.submit_enabled);
    assert_eq!(snapshot.cooldown_remaining, Duration::ZERO);
    assert!(state.cooldown().until().is_none());
}

#[test]
fn valid_submit_dispatches_and_sets_loading() {
    let now = Instant::now();
    let mut state = filled_state(now);
    let step = state.begin_submit(now, &FallbackTranslator);
    assert_eq!(step, SubmitStep::Dispatch(sample_fields()));
    assert_eq!(state.status().phase(), Phase::Submitting);
    assert!(!state.can_submit());
}

#[test]
fn success_resets_fields_and_arms_cooldown() {
    let now = Instant::now();
    let mut state = filled_state(now);
    let _ = state.begin_submit(now, &FallbackTranslator);
    state.delivery_succeeded(now, COOLDOWN);

    assert!(state.fields().is_empty());
    assert!(state.errors().is_empty());
    assert!(!state.status().loading);
    assert!(state.status().success);
    assert_eq!(state.cooldown().until(), Some(now + COOLDOWN));
    assert!(!state.can_submit());

    state.dismiss_success();
    assert_eq!(state.status().phase(), Phase::Idle);
    assert!(state.fields().is_empty());
}

#[test]
fn failure_keeps_fields_and_sets_generic_submit_error() {
    let now = Instant::now();
    let mut state = filled_state(now);
    let _ = state.begin_submit(now, &FallbackTranslator);
    state.delivery_failed(&FallbackTranslator);

    assert_eq!(state.fields(), &sample_fields());
    assert_eq!(state.errors().len(), 1);
    assert_eq!(state.errors().kind(Field::Submit), Some(ErrorKind::SubmitFailed));
    assert_eq!(state.status().phase(), Phase::Idle);
    assert!(state.cooldown().until().is_none());
    assert!(state.can_submit());
}

#[test]
fn failure_message_is_translated() {
    let now = Instant::now();
    let catalog = CatalogTranslator::from_entries([("contact.error_submit", "Fehler")]);
    let mut state = filled_state(now);
    let _ = state.begin_submit(now, &catalog);
    state.delivery_failed(&catalog);
    let message = state.errors().get(Field::Submit).map(|e| e.message.clone());
    assert_eq!(message.as_deref(), Some("Fehler"));
}

#[test]
fn honeypot_submit_changes_nothing() {
    let now = Instant::now();
    let mut state = filled_state(now);
    state.set_honeypot("http://spam.example");
    let before = state.snapshot();

    for _ in 0..3 {
        let step = state.begin_submit(now, &FallbackTranslator);
        assert_eq!(step, SubmitStep::Ignored(GateRejection::Honeypot));
        assert_eq!(state.snapshot(), before);
    }
}

#[test]
fn honeypot_does_not_clear_success_notice() {
    let now = Instant::now();
    let mut state = filled_state(now);
    let _ = state.begin_submit(now, &FallbackTranslator);
    state.delivery_succeeded(now, Duration::ZERO);
    state.set_honeypot("bot");

    let _ = state.begin_submit(now, &FallbackTranslator);
    assert!(state.status().success);
}

#[test]
fn cooldown_blocks_before_validation_until_expiry() {
    let start = Instant::now();
    let mut state = filled_state(start);
    let _ = state.begin_submit(start, &FallbackTranslator);
    state.delivery_succeeded(start, COOLDOWN);

    // Empty fields would fail validation, yet the gate answers first.
    let during = start + Duration::from_millis(4999);
    assert_eq!(
        state.begin_submit(during, &FallbackTranslator),
        SubmitStep::Ignored(GateRejection::CoolingDown)
    );
    assert!(state.errors().is_empty());

    let after = start + COOLDOWN;
    let sample = sample_fields();
    for field in Field::INPUTS {
        state.edit(field, sample.get(field).unwrap_or_default());
    }
    assert!(matches!(
        state.begin_submit(after, &FallbackTranslator),
        SubmitStep::Dispatch(_)
    ));
}

#[test]
fn clock_tick_reenables_submit_after_cooldown() {
    let start = Instant::now();
    let mut state = filled_state(start);
    let _ = state.begin_submit(start, &FallbackTranslator);
    state.delivery_succeeded(start, COOLDOWN);
    state.dismiss_success();

    state.tick(start + Duration::from_secs(4));
    assert!(!state.snapshot().submit_enabled);
    assert_eq!(state.snapshot().cooldown_remaining, Duration::from_secs(1));

    state.tick(start + Duration::from_secs(5));
    assert!(state.snapshot().submit_enabled);
}

#[test]
fn editing_a_field_clears_only_its_error() {
    let now = Instant::now();
    let mut state = FormState::new(now);
    let step = state.begin_submit(now, &FallbackTranslator);
    assert!(matches!(step, SubmitStep::Invalid(ref errors) if errors.len() == 4));

    state.edit(Field::Name, "J");
    assert!(!state.errors().contains(Field::Name));
    assert!(state.errors().contains(Field::Email));
    assert!(state.errors().contains(Field::Subject));
    assert!(state.errors().contains(Field::Message));

    // Clearing happens on edit, not on validity: a still-short subject loses
    // its error until the next submit.
    state.edit(Field::Subject, "x");
    assert!(!state.errors().contains(Field::Subject));
}

#[test]
fn resubmit_replaces_submit_error_with_validation_result() {
    let now = Instant::now();
    let mut state = filled_state(now);
    let _ = state.begin_submit(now, &FallbackTranslator);
    state.delivery_failed(&FallbackTranslator);

    state.edit(Field::Message, "short");
    let step = state.begin_submit(now, &FallbackTranslator);
    match step {
        SubmitStep::Invalid(errors) => {
            assert!(!errors.contains(Field::Submit));
            assert_eq!(errors.kind(Field::Message), Some(ErrorKind::MessageShort));
        }
        other => panic!("expected invalid, got {other:?}"),
    }
}
