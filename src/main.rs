//! contact-desk CLI entry point.
//!
//! Provides `submit`, `check`, and `mode` subcommands for sending one message
//! through the full pipeline, validating input without sending, or reporting
//! which delivery path the current environment selects.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};

use contact_desk::config::Config;
use contact_desk::delivery::configured::{ConfiguredClient, DeliveryMode};
use contact_desk::form::{validate, Field, FieldErrors, FormFields};
use contact_desk::i18n::{CatalogTranslator, FallbackTranslator, Translator};
use contact_desk::logging;
use contact_desk::session::{spawn_session, SessionDeps, SubmitOutcome};

/// Exit code for input that failed validation.
const EXIT_INVALID: u8 = 2;

/// Exit code for a failed delivery.
const EXIT_FAILED: u8 = 1;

/// contact-desk: validate and deliver contact form messages.
#[derive(Parser)]
#[command(name = "contact-desk", version, about)]
struct Cli {
    /// Path to config.toml (defaults to `$CONTACT_DESK_CONFIG` or `~/.contact-desk/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Validate and deliver one message.
    Submit {
        /// Message fields.
        #[command(flatten)]
        fields: FieldArgs,
        /// Decoy field value; any non-empty value drops the message silently.
        #[arg(long, default_value = "")]
        honeypot: String,
    },
    /// Validate fields without sending anything.
    Check {
        /// Message fields.
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Show whether delivery would be live or simulated.
    Mode,
}

/// The four form fields.
#[derive(Args)]
struct FieldArgs {
    /// Sender name.
    #[arg(long, default_value = "")]
    name: String,
    /// Sender email.
    #[arg(long, default_value = "")]
    email: String,
    /// Subject line.
    #[arg(long, default_value = "")]
    subject: String,
    /// Message body.
    #[arg(long, default_value = "")]
    message: String,
}

impl From<FieldArgs> for FormFields {
    fn from(args: FieldArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            subject: args.subject,
            message: args.message,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let _logging_guard = match &config.logging.dir {
        Some(dir) => Some(logging::init_production(dir, &config.logging.level)?),
        None => {
            logging::init_cli(&config.logging.level);
            None
        }
    };

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to load .env"),
    }

    let translator = load_translator(config.i18n.catalog.as_deref())?;

    match cli.command {
        Command::Submit { fields, honeypot } => {
            handle_submit(&config, translator, fields.into(), honeypot).await
        }
        Command::Check { fields } => Ok(handle_check(translator.as_ref(), &fields.into())),
        Command::Mode => handle_mode(&config),
    }
}

fn load_translator(catalog: Option<&Path>) -> anyhow::Result<Arc<dyn Translator>> {
    match catalog {
        Some(path) => Ok(Arc::new(CatalogTranslator::load(path)?)),
        None => Ok(Arc::new(FallbackTranslator)),
    }
}

/// Run one message through a full session.
async fn handle_submit(
    config: &Config,
    translator: Arc<dyn Translator>,
    fields: FormFields,
    honeypot: String,
) -> anyhow::Result<ExitCode> {
    let client = ConfiguredClient::from_env(config.relay.clone(), &config.timing)?;
    let session = spawn_session(SessionDeps {
        client: Arc::new(client),
        translator: Arc::clone(&translator),
        timing: config.timing.clone(),
    });

    for field in Field::INPUTS {
        let value = fields.get(field).unwrap_or_default();
        session.edit(field, value).await?;
    }
    session.set_honeypot(honeypot).await?;

    let outcome = session.submit().await?;
    let snapshot = session.snapshot();
    session.shutdown().await;

    let code = match outcome {
        SubmitOutcome::Delivered => {
            if let Some(notice) = snapshot.success_notice(translator.as_ref()) {
                println!("{notice}");
            }
            ExitCode::SUCCESS
        }
        SubmitOutcome::Invalid(errors) => {
            print_errors(&errors);
            ExitCode::from(EXIT_INVALID)
        }
        SubmitOutcome::Failed => {
            print_errors(&snapshot.errors);
            ExitCode::from(EXIT_FAILED)
        }
        SubmitOutcome::Ignored(_) => ExitCode::SUCCESS,
    };
    Ok(code)
}

/// Validate without sending.
fn handle_check(translator: &dyn Translator, fields: &FormFields) -> ExitCode {
    let errors = validate(fields, translator);
    if errors.is_empty() {
        println!("ok");
        return ExitCode::SUCCESS;
    }
    print_errors(&errors);
    ExitCode::from(EXIT_INVALID)
}

/// Report the delivery path selected by the current environment.
fn handle_mode(config: &Config) -> anyhow::Result<ExitCode> {
    let client = ConfiguredClient::from_env(config.relay.clone(), &config.timing)?;
    match client.resolve_mode() {
        DeliveryMode::Live(credentials) => {
            println!(
                "live (service {}, template {}, endpoint {})",
                credentials.service_id, credentials.template_id, config.relay.endpoint
            );
        }
        DeliveryMode::Fallback => {
            println!(
                "fallback (set {}, {} and {} for live delivery)",
                config.relay.service_id_env,
                config.relay.template_id_env,
                config.relay.public_key_env
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_errors(errors: &FieldErrors) {
    for (field, error) in errors.iter() {
        println!("{field}: {}", error.message);
    }
}
