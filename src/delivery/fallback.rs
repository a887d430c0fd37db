//! Dry-run delivery used when relay credentials are not configured.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::form::FormFields;

use super::{DeliveryClient, DeliveryError};

/// Simulated relay latency.
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(500);

/// Waits a fixed delay and reports success without contacting anything.
#[derive(Debug, Clone, Copy)]
pub struct FallbackClient {
    delay: Duration,
}

impl FallbackClient {
    /// Create a fallback client with a custom simulated latency.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Simulated latency.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FallbackClient {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_DELAY)
    }
}

#[async_trait]
impl DeliveryClient for FallbackClient {
    async fn send(&self, _fields: &FormFields) -> Result<(), DeliveryError> {
        warn!("relay credentials missing; skipping real send");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    fn mode(&self) -> &'static str {
        "fallback"
    }
}
