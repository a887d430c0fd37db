//! Configuration loading and validation.
//!
//! Loads `config.toml` from `--config`, `$CONTACT_DESK_CONFIG`, or
//! `~/.contact-desk/config.toml`. Environment variables override file values;
//! file values override defaults.
//!
//! Relay credentials are never stored in the file. The `[relay]` section only
//! names the environment variables that hold them, and those are read at send
//! time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::delivery::relay::{DEFAULT_RELAY_ENDPOINT, DEFAULT_TO_EMAIL};
use crate::form::validator::looks_like_email;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CONTACT_DESK_CONFIG";

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relay delivery settings.
    pub relay: RelayConfig,
    /// Timer lengths.
    pub timing: TimingConfig,
    /// Translation catalog.
    pub i18n: I18nConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Relay delivery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Base URL of the relay API.
    pub endpoint: String,
    /// Fixed destination inbox.
    pub to_email: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Environment variable holding the relay service id.
    pub service_id_env: String,
    /// Environment variable holding the relay template id.
    pub template_id_env: String,
    /// Environment variable holding the relay public key.
    pub public_key_env: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RELAY_ENDPOINT.to_owned(),
            to_email: DEFAULT_TO_EMAIL.to_owned(),
            timeout_secs: default_timeout_secs(),
            service_id_env: "CONTACT_DESK_SERVICE_ID".to_owned(),
            template_id_env: "CONTACT_DESK_TEMPLATE_ID".to_owned(),
            public_key_env: "CONTACT_DESK_PUBLIC_KEY".to_owned(),
        }
    }
}

impl RelayConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Timer lengths, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Submissions are refused for this long after a successful delivery.
    pub cooldown_ms: u64,
    /// The success notice clears itself after this long.
    pub success_dismiss_ms: u64,
    /// Simulated latency of the fallback client.
    pub fallback_delay_ms: u64,
    /// Interval of the session clock.
    pub clock_tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            success_dismiss_ms: default_success_dismiss_ms(),
            fallback_delay_ms: default_fallback_delay_ms(),
            clock_tick_ms: default_clock_tick_ms(),
        }
    }
}

impl TimingConfig {
    /// Cooldown length.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Success notice lifetime.
    pub fn success_dismiss(&self) -> Duration {
        Duration::from_millis(self.success_dismiss_ms)
    }

    /// Fallback latency.
    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }

    /// Clock tick interval, never shorter than 1 ms.
    pub fn clock_tick(&self) -> Duration {
        Duration::from_millis(self.clock_tick_ms.max(1))
    }
}

/// Translation catalog settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Path to a TOML catalog. Fallback text is used when unset.
    pub catalog: Option<PathBuf>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for JSON log files. Console only when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            dir: None,
        }
    }
}

// Default value functions for serde

fn default_timeout_secs() -> u64 {
    10
}
fn default_cooldown_ms() -> u64 {
    5000
}
fn default_success_dismiss_ms() -> u64 {
    5000
}
fn default_fallback_delay_ms() -> u64 {
    500
}
fn default_clock_tick_ms() -> u64 {
    1000
}

// ── Loading ─────────────────────────────────────────────────────

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// An `explicit` path must exist. The implicit locations fall back to
    /// defaults when no file is there.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed, or if
    /// the resulting configuration is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let path = Self::config_path_with(explicit, env)?;
        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml_str(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to read config at {}: {e}",
                    path.display()
                ))
            }
        };
        config.apply_overrides(env);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse config TOML")
    }

    /// Resolve the config file path using a custom env resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn config_path_with(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<PathBuf> {
        if let Some(p) = explicit {
            return Ok(p.to_path_buf());
        }
        if let Some(p) = env(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(p));
        }
        Ok(config_dir()?.join("config.toml"))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function so tests never touch the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("CONTACT_DESK_RELAY_ENDPOINT") {
            self.relay.endpoint = v;
        }
        if let Some(v) = env("CONTACT_DESK_TO_EMAIL") {
            self.relay.to_email = v;
        }
        if let Some(v) = env("CONTACT_DESK_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env("CONTACT_DESK_COOLDOWN_MS") {
            match v.parse() {
                Ok(n) => self.timing.cooldown_ms = n,
                Err(_) => tracing::warn!(
                    var = "CONTACT_DESK_COOLDOWN_MS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.relay.endpoint)
            .with_context(|| format!("relay.endpoint is not a URL: {}", self.relay.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("relay.endpoint must use http or https, got {}", endpoint.scheme());
        }
        if self.relay.to_email.trim().is_empty() {
            anyhow::bail!("relay.to_email must not be empty");
        }
        if !looks_like_email(&self.relay.to_email) {
            anyhow::bail!("relay.to_email is not an email address: {}", self.relay.to_email);
        }
        if self.relay.timeout_secs == 0 {
            anyhow::bail!("relay.timeout_secs must be positive");
        }
        if self.timing.clock_tick_ms == 0 {
            anyhow::bail!("timing.clock_tick_ms must be positive");
        }
        Ok(())
    }
}

/// Resolve the default config directory (`~/.contact-desk/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".contact-desk"))
}
