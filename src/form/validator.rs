//! Per-field validation rules.

use std::sync::OnceLock;

use regex::Regex;

use crate::i18n::Translator;

use super::{ErrorKind, Field, FieldError, FieldErrors, FormFields};

/// Minimum subject length in characters, after trimming.
pub const SUBJECT_MIN_CHARS: usize = 3;

/// Maximum subject length in characters, after trimming.
pub const SUBJECT_MAX_CHARS: usize = 120;

/// Minimum message length in characters, after trimming.
pub const MESSAGE_MIN_CHARS: usize = 10;

/// Coarse `local@domain.tld` shape: no whitespace, one `@`, a `.` after it.
const EMAIL_SHAPE: &str = r"^\S+@\S+\.\S+$";

fn email_shape() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_SHAPE).ok()).as_ref()
}

/// Whether `value` has the coarse shape of an email address.
///
/// This is a syntactic sanity check, not RFC 5322 validation.
pub fn looks_like_email(value: &str) -> bool {
    email_shape().is_some_and(|re| re.is_match(value))
}

/// Check one input field. Returns the first rule it breaks, if any.
pub fn check_field(fields: &FormFields, field: Field) -> Option<ErrorKind> {
    match field {
        Field::Name => check_name(&fields.name),
        Field::Email => check_email(&fields.email),
        Field::Subject => check_subject(&fields.subject),
        Field::Message => check_message(&fields.message),
        Field::Submit => None,
    }
}

fn check_name(name: &str) -> Option<ErrorKind> {
    name.trim().is_empty().then_some(ErrorKind::NameRequired)
}

fn check_email(email: &str) -> Option<ErrorKind> {
    if email.trim().is_empty() {
        return Some(ErrorKind::EmailRequired);
    }
    (!looks_like_email(email)).then_some(ErrorKind::EmailInvalid)
}

fn check_subject(subject: &str) -> Option<ErrorKind> {
    let trimmed = subject.trim();
    if trimmed.is_empty() {
        return Some(ErrorKind::SubjectRequired);
    }
    let len = trimmed.chars().count();
    if len < SUBJECT_MIN_CHARS {
        Some(ErrorKind::SubjectShort)
    } else if len > SUBJECT_MAX_CHARS {
        Some(ErrorKind::SubjectLong)
    } else {
        None
    }
}

fn check_message(message: &str) -> Option<ErrorKind> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Some(ErrorKind::MessageRequired);
    }
    (trimmed.chars().count() < MESSAGE_MIN_CHARS).then_some(ErrorKind::MessageShort)
}

/// Build the display error for `kind` through the translator.
pub fn field_error(kind: ErrorKind, translator: &dyn Translator) -> FieldError {
    FieldError {
        kind,
        message: translator.translate(kind.translation_key(), kind.fallback_text()),
    }
}

/// Validate every input field.
///
/// All rules run on every call; one failing field never hides another.
pub fn validate(fields: &FormFields, translator: &dyn Translator) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in Field::INPUTS {
        if let Some(kind) = check_field(fields, field) {
            errors.insert(field, field_error(kind, translator));
        }
    }
    errors
}
