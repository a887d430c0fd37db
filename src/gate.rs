//! Pre-validation submit gate: honeypot and post-success cooldown.
//!
//! Both checks run before the validator and both are silent. A rejected
//! submit produces no field error and no status change.

use std::time::Duration;

use tokio::time::Instant;

/// Default cooldown after a successful delivery.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(5000);

/// Longest window [`CooldownWindow::arm`] will set (about a century).
pub const MAX_COOLDOWN: Duration = Duration::from_secs(3_153_600_000);

/// "No submission accepted before this instant."
///
/// Empty until the first successful delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownWindow {
    until: Option<Instant>,
}

impl CooldownWindow {
    /// A window that has never been armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block submissions until `now + length`.
    pub fn arm(&mut self, now: Instant, length: Duration) {
        // Lengths are clamped so the addition stays inside the clock's range.
        let length = length.min(MAX_COOLDOWN);
        self.until = Some(now.checked_add(length).unwrap_or(now));
    }

    /// The instant the window ends, if it was ever armed.
    pub fn until(&self) -> Option<Instant> {
        self.until
    }

    /// Whether `now` still falls inside the window.
    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    /// Time left before submissions are accepted again.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or_default()
    }
}

/// Why the gate turned a submit away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// The decoy field was filled in.
    Honeypot,
    /// A previous delivery succeeded too recently.
    CoolingDown,
    /// A delivery is still in flight.
    InFlight,
}

impl GateRejection {
    /// Stable label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Honeypot => "honeypot",
            Self::CoolingDown => "cooling_down",
            Self::InFlight => "in_flight",
        }
    }
}

/// Gate verdict for a single submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The submit may proceed to validation.
    Open,
    /// The submit must be dropped without a trace in the UI.
    Rejected(GateRejection),
}

/// Whether the honeypot value marks the submit as automated.
pub fn honeypot_tripped(honeypot: &str) -> bool {
    !honeypot.is_empty()
}

/// Evaluate the gate.
///
/// Order: in-flight delivery, cooldown, then honeypot. None of them touch
/// form state; the caller decides what a rejection does.
pub fn check(
    honeypot: &str,
    cooldown: &CooldownWindow,
    loading: bool,
    now: Instant,
) -> GateDecision {
    if loading {
        return GateDecision::Rejected(GateRejection::InFlight);
    }
    if cooldown.is_active(now) {
        return GateDecision::Rejected(GateRejection::CoolingDown);
    }
    if honeypot_tripped(honeypot) {
        return GateDecision::Rejected(GateRejection::Honeypot);
    }
    GateDecision::Open
}
