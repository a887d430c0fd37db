//! Message delivery to the external relay.
//!
//! Defines the [`DeliveryClient`] trait and the payload/error types shared by
//! its implementations:
//! - [`relay::RelayClient`]: live HTTP relay
//! - [`fallback::FallbackClient`]: dry run used when credentials are missing
//!
//! [`configured::ConfiguredClient`] picks between the two on every call based
//! on whether the relay credentials are present in the environment.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::form::FormFields;

pub mod configured;
pub mod fallback;
pub mod relay;

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Template parameters handed to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayPayload {
    /// Sender name.
    pub from_name: String,
    /// Sender email, used as the reply-to address.
    pub reply_to: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
    /// Fixed destination inbox. Never taken from visitor input.
    pub to_email: String,
}

impl RelayPayload {
    /// Build the payload for `fields`, addressed to `to_email`.
    pub fn from_fields(fields: &FormFields, to_email: &str) -> Self {
        Self {
            from_name: fields.name.clone(),
            reply_to: fields.email.clone(),
            subject: fields.subject.clone(),
            message: fields.message.clone(),
            to_email: to_email.to_owned(),
        }
    }
}

/// The three values a live relay call needs.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayCredentials {
    /// Relay service identifier.
    pub service_id: String,
    /// Relay template identifier.
    pub template_id: String,
    /// Public access key.
    pub public_key: String,
}

impl std::fmt::Debug for RelayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayCredentials")
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("public_key", &"[REDACTED]")
            .finish()
    }
}

impl RelayCredentials {
    /// Assemble credentials, or `None` if any value is absent or blank.
    pub fn from_parts(
        service_id: Option<String>,
        template_id: Option<String>,
        public_key: Option<String>,
    ) -> Option<Self> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Some(Self {
            service_id: present(service_id)?,
            template_id: present(template_id)?,
            public_key: present(public_key)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by delivery clients.
///
/// The detail is for operators; visitors only ever see a generic message.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// HTTP transport failure.
    #[error("relay request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The relay answered with a non-success status.
    #[error("relay returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// The relay cannot be reached with the current configuration.
    #[error("relay unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

const MAX_ERROR_BODY_CHARS: usize = 256;

/// Check HTTP response status and return body text or a structured error.
///
/// `secrets` are scrubbed from the error body before it is stored.
///
/// # Errors
///
/// Returns `DeliveryError::Request` on transport failure, `DeliveryError::HttpStatus` on non-2xx.
pub async fn check_http_response(
    response: reqwest::Response,
    secrets: &[&str],
) -> Result<String, DeliveryError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(DeliveryError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_error_body(&body, secrets),
        });
    }
    Ok(body)
}

/// Collapse whitespace, redact `secrets`, and truncate a relay error body.
pub fn sanitize_error_body(raw: &str, secrets: &[&str]) -> String {
    let mut sanitized = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    for secret in secrets.iter().filter(|s| !s.is_empty()) {
        let pattern = regex::escape(secret);
        if let Ok(re) = Regex::new(&pattern) {
            sanitized = re.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Delivers one message. Single attempt, no retry.
///
/// Implementations must be `Send + Sync` so a session task can hold them
/// behind an `Arc` and call them from a spawned future.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Send the message described by `fields`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the relay rejects the message or
    /// cannot be reached.
    async fn send(&self, fields: &FormFields) -> Result<(), DeliveryError>;

    /// Short label for logs (`"relay"`, `"fallback"`, ...).
    fn mode(&self) -> &'static str;
}
