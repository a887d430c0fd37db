//! Form data model: the four visitor fields and their per-field errors.
//!
//! [`FieldErrors`] is recomputed wholesale by [`validator::validate`] on each
//! submit attempt and trimmed one entry at a time by [`clear_field_error`]
//! as the visitor edits the offending field.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod validator;

pub use validator::validate;

/// The visitor-editable fields of the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    /// Sender's display name.
    pub name: String,
    /// Sender's email address, used as the reply-to.
    pub email: String,
    /// Message subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
}

impl FormFields {
    /// Read the value of an input field. Returns `None` for [`Field::Submit`].
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => Some(&self.name),
            Field::Email => Some(&self.email),
            Field::Subject => Some(&self.subject),
            Field::Message => Some(&self.message),
            Field::Submit => None,
        }
    }

    /// Mutable access to an input field. Returns `None` for [`Field::Submit`].
    pub fn get_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Name => Some(&mut self.name),
            Field::Email => Some(&mut self.email),
            Field::Subject => Some(&mut self.subject),
            Field::Message => Some(&mut self.message),
            Field::Submit => None,
        }
    }

    /// Whether every field is empty.
    pub fn is_empty(&self) -> bool {
        Field::INPUTS
            .iter()
            .all(|f| self.get(*f).is_none_or(str::is_empty))
    }

    /// Reset every field to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Key of an entry in [`FieldErrors`].
///
/// The four input fields plus `submit`, which carries delivery failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Sender name.
    Name,
    /// Sender email.
    Email,
    /// Subject line.
    Subject,
    /// Message body.
    Message,
    /// Form-level delivery outcome.
    Submit,
}

impl Field {
    /// The fields a visitor can type into, in display order.
    pub const INPUTS: [Field; 4] = [Field::Name, Field::Email, Field::Subject, Field::Message];

    /// Stable lowercase key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Subject => "subject",
            Self::Message => "message",
            Self::Submit => "submit",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Name is blank.
    NameRequired,
    /// Email is blank.
    EmailRequired,
    /// Email does not look like `local@domain.tld`.
    EmailInvalid,
    /// Subject is blank.
    SubjectRequired,
    /// Subject is shorter than the minimum.
    SubjectShort,
    /// Subject is longer than the maximum.
    SubjectLong,
    /// Message is blank.
    MessageRequired,
    /// Message is shorter than the minimum.
    MessageShort,
    /// Delivery to the relay failed.
    SubmitFailed,
}

impl ErrorKind {
    /// Translation key for the display message.
    pub fn translation_key(self) -> &'static str {
        match self {
            Self::NameRequired => "contact.error_name_required",
            Self::EmailRequired => "contact.error_email_required",
            Self::EmailInvalid => "contact.error_email_invalid",
            Self::SubjectRequired => "contact.error_subject_required",
            Self::SubjectShort => "contact.error_subject_short",
            Self::SubjectLong => "contact.error_subject_long",
            Self::MessageRequired => "contact.error_message_required",
            Self::MessageShort => "contact.error_message_short",
            Self::SubmitFailed => "contact.error_submit",
        }
    }

    /// English text used when no translation exists.
    pub fn fallback_text(self) -> &'static str {
        match self {
            Self::NameRequired => "Please enter your name",
            Self::EmailRequired => "Please enter your email",
            Self::EmailInvalid => "Please enter a valid email address",
            Self::SubjectRequired => "Please enter a subject",
            Self::SubjectShort => "Subject is too short",
            Self::SubjectLong => "Subject is too long",
            Self::MessageRequired => "Please enter a message",
            Self::MessageShort => "Message is too short",
            Self::SubmitFailed => "Something went wrong. Please try again later.",
        }
    }
}

/// A single failed field: the machine-readable kind and the display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Translated message shown to the visitor.
    pub message: String,
}

/// Current errors keyed by field. A missing key means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<Field, FieldError>);

impl FieldErrors {
    /// No errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, replacing any previous one for the same field.
    pub fn insert(&mut self, field: Field, error: FieldError) {
        self.0.insert(field, error);
    }

    /// Error for `field`, if any.
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    /// Kind of the error for `field`, if any.
    pub fn kind(&self, field: Field) -> Option<ErrorKind> {
        self.0.get(&field).map(|e| e.kind)
    }

    /// Whether `field` currently has an error.
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Whether there are no errors at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Failing fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    /// All errors in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> + '_ {
        self.0.iter().map(|(f, e)| (*f, e))
    }
}

/// Drop the error for `field`, leaving every other entry untouched.
pub fn clear_field_error(mut errors: FieldErrors, field: Field) -> FieldErrors {
    errors.0.remove(&field);
    errors
}
