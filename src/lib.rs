//! contact-desk: a contact form submission pipeline.
//!
//! Turns visitor input into a validated, rate-limited message delivered to an
//! external relay. A silent honeypot gate and a post-success cooldown sit in
//! front of the validator; delivery falls back to a dry run when the relay
//! credentials are not configured.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;

pub mod i18n;

pub mod form;
pub mod gate;

pub mod delivery;
pub mod session;
