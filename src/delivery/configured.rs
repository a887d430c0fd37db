//! Delivery client that chooses live or fallback mode on every call.
//!
//! Relay credentials are resolved from the environment at send time, so
//! exporting them into a running process switches it to live delivery on the
//! next submit.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{RelayConfig, TimingConfig};
use crate::form::FormFields;

use super::fallback::FallbackClient;
use super::relay::RelayClient;
use super::{DeliveryClient, DeliveryError, RelayCredentials};

/// Environment lookup used to resolve credentials.
pub type EnvResolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Which delivery path a send would take right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Credentials present; messages go to the relay.
    Live(RelayCredentials),
    /// At least one credential missing; sends are simulated.
    Fallback,
}

impl DeliveryMode {
    /// Short label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Live(_) => "live",
            Self::Fallback => "fallback",
        }
    }
}

/// Routes each send to [`RelayClient`] or [`FallbackClient`].
pub struct ConfiguredClient {
    relay: RelayConfig,
    fallback: FallbackClient,
    env: EnvResolver,
    http: reqwest::Client,
}

impl std::fmt::Debug for ConfiguredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredClient")
            .field("relay", &self.relay)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl ConfiguredClient {
    /// Create a client reading credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env(relay: RelayConfig, timing: &TimingConfig) -> anyhow::Result<Self> {
        Self::with_resolver(relay, timing, Arc::new(|key: &str| std::env::var(key).ok()))
    }

    /// Create a client with a custom environment resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_resolver(
        relay: RelayConfig,
        timing: &TimingConfig,
        env: EnvResolver,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(relay.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build relay HTTP client: {e}"))?;
        Ok(Self {
            relay,
            fallback: FallbackClient::new(timing.fallback_delay()),
            env,
            http,
        })
    }

    /// Resolve the delivery mode from the current environment.
    pub fn resolve_mode(&self) -> DeliveryMode {
        let lookup = |name: &str| (self.env)(name);
        match RelayCredentials::from_parts(
            lookup(&self.relay.service_id_env),
            lookup(&self.relay.template_id_env),
            lookup(&self.relay.public_key_env),
        ) {
            Some(credentials) => DeliveryMode::Live(credentials),
            None => DeliveryMode::Fallback,
        }
    }
}

#[async_trait]
impl DeliveryClient for ConfiguredClient {
    async fn send(&self, fields: &FormFields) -> Result<(), DeliveryError> {
        match self.resolve_mode() {
            DeliveryMode::Live(credentials) => {
                info!(mode = "live", "delivering message");
                let client = RelayClient::new(
                    self.relay.endpoint.clone(),
                    self.relay.to_email.clone(),
                    credentials,
                    self.http.clone(),
                );
                client.send(fields).await
            }
            DeliveryMode::Fallback => {
                info!(mode = "fallback", "delivering message");
                self.fallback.send(fields).await
            }
        }
    }

    fn mode(&self) -> &'static str {
        self.resolve_mode().label()
    }
}
