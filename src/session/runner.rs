//! Session event loop.
//!
//! One Tokio task owns the [`FormState`] and processes, one at a time:
//! commands from the [`SessionHandle`], ticks of the session clock, expiry of
//! the success-dismiss timer, and completion of the in-flight delivery. A
//! fresh [`FormSnapshot`] is published on a watch channel after every event.
//!
//! Both timers live inside the loop and are dropped with it. Dropping every
//! handle (or calling [`SessionHandle::shutdown`]) tears the session down; a
//! delivery already in flight is awaited first, never cancelled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::TimingConfig;
use crate::delivery::{DeliveryClient, DeliveryError};
use crate::form::Field;
use crate::gate::GateRejection;
use crate::i18n::Translator;

use super::{FormSnapshot, FormState, SubmitOutcome, SubmitStep};

const COMMAND_BUFFER: usize = 32;

/// The session task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("contact session is closed")]
pub struct SessionClosed;

/// Collaborators of a session.
#[derive(Clone)]
pub struct SessionDeps {
    /// Delivers validated messages.
    pub client: Arc<dyn DeliveryClient>,
    /// Resolves display text.
    pub translator: Arc<dyn Translator>,
    /// Timer lengths.
    pub timing: TimingConfig,
}

#[derive(Debug)]
enum Command {
    Edit { field: Field, value: String },
    Honeypot(String),
    Submit(oneshot::Sender<SubmitOutcome>),
}

/// Handle to a running session.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<FormSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Set a field value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session has stopped.
    pub async fn edit(&self, field: Field, value: impl Into<String>) -> Result<(), SessionClosed> {
        self.commands
            .send(Command::Edit {
                field,
                value: value.into(),
            })
            .await
            .map_err(|_| SessionClosed)
    }

    /// Set the decoy field.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session has stopped.
    pub async fn set_honeypot(&self, value: impl Into<String>) -> Result<(), SessionClosed> {
        self.commands
            .send(Command::Honeypot(value.into()))
            .await
            .map_err(|_| SessionClosed)
    }

    /// Submit the form and wait for the outcome.
    ///
    /// Gate rejections and validation failures resolve immediately; a
    /// dispatched message resolves once the delivery call returns.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session has stopped.
    pub async fn submit(&self) -> Result<SubmitOutcome, SessionClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Submit(reply_tx))
            .await
            .map_err(|_| SessionClosed)?;
        reply_rx.await.map_err(|_| SessionClosed)
    }

    /// Latest published view.
    pub fn snapshot(&self) -> FormSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published view.
    pub fn subscribe(&self) -> watch::Receiver<FormSnapshot> {
        self.snapshots.clone()
    }

    /// Tear the session down and wait for the task to finish.
    pub async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            warn!(error = %e, "contact session task ended abnormally");
        }
    }
}

/// Start a session on the current Tokio runtime.
pub fn spawn_session(deps: SessionDeps) -> SessionHandle {
    let state = FormState::new(Instant::now());
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
    let task = tokio::spawn(run_session(state, deps, commands_rx, snapshot_tx));
    SessionHandle {
        commands: commands_tx,
        snapshots: snapshot_rx,
        task,
    }
}

type Reply = (oneshot::Sender<SubmitOutcome>, SubmitOutcome);

type DeliveryFuture = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send>>;

struct InFlight {
    submission_id: Uuid,
    started: Instant,
    delivery: DeliveryFuture,
    reply: oneshot::Sender<SubmitOutcome>,
}

async fn wait_dismiss(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn wait_delivery(in_flight: &mut Option<InFlight>) -> Result<(), DeliveryError> {
    match in_flight {
        Some(pending) => pending.delivery.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn run_session(
    mut state: FormState,
    deps: SessionDeps,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<FormSnapshot>,
) {
    let mut clock = tokio::time::interval(deps.timing.clock_tick());
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut dismiss: Option<Pin<Box<Sleep>>> = None;
    let mut in_flight: Option<InFlight> = None;
    let mut closing = false;

    debug!(mode = deps.client.mode(), "contact session started");

    loop {
        let mut reply: Option<Reply> = None;
        tokio::select! {
            command = commands.recv(), if !closing => match command {
                Some(command) => {
                    reply = handle_command(command, &mut state, &deps, &mut in_flight);
                }
                None => {
                    closing = true;
                    if in_flight.is_none() {
                        break;
                    }
                    debug!("session closing after in-flight delivery");
                }
            },
            now = clock.tick() => {
                state.tick(now);
            }
            () = wait_dismiss(&mut dismiss), if dismiss.is_some() => {
                dismiss = None;
                state.dismiss_success();
            }
            result = wait_delivery(&mut in_flight), if in_flight.is_some() => {
                if let Some(done) = in_flight.take() {
                    reply = Some(finish_delivery(done, result, &mut state, &deps, &mut dismiss));
                }
            }
        }

        // The dismiss timer is bound to the success flag.
        if !state.status().success {
            dismiss = None;
        }
        snapshots.send_replace(state.snapshot());

        // Callers see the published state by the time their submit resolves.
        if let Some((tx, outcome)) = reply {
            let _ = tx.send(outcome);
        }
        if closing && in_flight.is_none() {
            break;
        }
    }

    snapshots.send_replace(state.snapshot());
    debug!("contact session stopped");
}

fn handle_command(
    command: Command,
    state: &mut FormState,
    deps: &SessionDeps,
    in_flight: &mut Option<InFlight>,
) -> Option<Reply> {
    match command {
        Command::Edit { field, value } => {
            state.edit(field, value);
            None
        }
        Command::Honeypot(value) => {
            state.set_honeypot(value);
            None
        }
        Command::Submit(reply) => {
            let submission_id = Uuid::new_v4();
            let now = Instant::now();
            match state.begin_submit(now, deps.translator.as_ref()) {
                SubmitStep::Ignored(reason) => {
                    log_rejection(submission_id, reason);
                    Some((reply, SubmitOutcome::Ignored(reason)))
                }
                SubmitStep::Invalid(errors) => {
                    debug!(%submission_id, failing = errors.len(), "submission failed validation");
                    Some((reply, SubmitOutcome::Invalid(errors)))
                }
                SubmitStep::Dispatch(fields) => {
                    info!(%submission_id, mode = deps.client.mode(), "submission dispatched");
                    let client = Arc::clone(&deps.client);
                    *in_flight = Some(InFlight {
                        submission_id,
                        started: now,
                        delivery: Box::pin(async move { client.send(&fields).await }),
                        reply,
                    });
                    None
                }
            }
        }
    }
}

fn finish_delivery(
    done: InFlight,
    result: Result<(), DeliveryError>,
    state: &mut FormState,
    deps: &SessionDeps,
    dismiss: &mut Option<Pin<Box<Sleep>>>,
) -> Reply {
    let now = Instant::now();
    let elapsed_ms =
        u64::try_from(now.saturating_duration_since(done.started).as_millis()).unwrap_or(u64::MAX);
    let outcome = match result {
        Ok(()) => {
            state.delivery_succeeded(now, deps.timing.cooldown());
            // Re-entering Succeeded restarts the notice timer.
            *dismiss = Some(Box::pin(tokio::time::sleep(deps.timing.success_dismiss())));
            info!(submission_id = %done.submission_id, elapsed_ms, "submission delivered");
            SubmitOutcome::Delivered
        }
        Err(e) => {
            state.delivery_failed(deps.translator.as_ref());
            error!(submission_id = %done.submission_id, elapsed_ms, error = %e, "submission delivery failed");
            SubmitOutcome::Failed
        }
    };
    (done.reply, outcome)
}

fn log_rejection(submission_id: Uuid, reason: GateRejection) {
    match reason {
        GateRejection::Honeypot => {
            warn!(%submission_id, "honeypot triggered; dropping submission");
        }
        GateRejection::CoolingDown | GateRejection::InFlight => {
            debug!(%submission_id, reason = reason.as_str(), "submission throttled");
        }
    }
}
