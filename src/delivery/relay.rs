//! Live relay delivery over HTTP (`POST /api/v1.0/email/send`).

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::form::FormFields;

use super::{check_http_response, DeliveryClient, DeliveryError, RelayCredentials, RelayPayload};

/// Default relay API base URL.
pub const DEFAULT_RELAY_ENDPOINT: &str = "https://api.emailjs.com";

/// Default destination inbox for every message.
pub const DEFAULT_TO_EMAIL: &str = "iplmumbai12395@gmail.com";

/// Path of the send endpoint, relative to the base URL.
pub const SEND_PATH: &str = "/api/v1.0/email/send";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Relay send request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct RelayRequest<'a> {
    /// Relay service identifier.
    pub service_id: &'a str,
    /// Relay template identifier.
    pub template_id: &'a str,
    /// Public access key.
    pub user_id: &'a str,
    /// Template parameters.
    pub template_params: &'a RelayPayload,
}

/// Build the wire request for a payload.
#[doc(hidden)]
pub fn build_request<'a>(
    credentials: &'a RelayCredentials,
    payload: &'a RelayPayload,
) -> RelayRequest<'a> {
    RelayRequest {
        service_id: &credentials.service_id,
        template_id: &credentials.template_id,
        user_id: &credentials.public_key,
        template_params: payload,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Live relay client.
#[derive(Debug, Clone)]
pub struct RelayClient {
    /// Base URL of the relay API.
    #[doc(hidden)]
    pub endpoint: String,
    /// Fixed destination inbox.
    #[doc(hidden)]
    pub to_email: String,
    credentials: RelayCredentials,
    client: reqwest::Client,
}

impl RelayClient {
    /// Create a relay client.
    ///
    /// `client` carries transport settings such as the request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        to_email: impl Into<String>,
        credentials: RelayCredentials,
        client: reqwest::Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            to_email: to_email.into(),
            credentials,
            client,
        }
    }

    /// Full URL of the send endpoint.
    pub fn send_url(&self) -> String {
        format!("{}{SEND_PATH}", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl DeliveryClient for RelayClient {
    async fn send(&self, fields: &FormFields) -> Result<(), DeliveryError> {
        let payload = RelayPayload::from_fields(fields, &self.to_email);
        let request = build_request(&self.credentials, &payload);
        let url = self.send_url();

        debug!(url = %url, service_id = %self.credentials.service_id, "dispatching to relay");
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        check_http_response(response, &[self.credentials.public_key.as_str()]).await?;
        Ok(())
    }

    fn mode(&self) -> &'static str {
        "relay"
    }
}
