use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use form_core::{
    ActiveMessage, CloseChoice, CloseOutcome, HttpSubmitter, LifecycleController, NoEvent,
    SubmitOutcome, SubmitResult, CLOSE_CONFIRMATION_PROMPT,
};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod validation;

use config::{load_settings, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(about = "Drive the form submission lifecycle from the command line")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run client-side validation only.
    Check {
        #[arg(long)]
        data: PathBuf,
    },
    /// Validate and post the form.
    Submit {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        url: Option<String>,
    },
    /// Close a form that was opened with `original` and now holds `current`.
    Close {
        #[arg(long)]
        original: PathBuf,
        #[arg(long)]
        current: PathBuf,
        #[arg(long, value_enum, default_value_t = ConfirmArg::Keep)]
        confirm: ConfirmArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ConfirmArg {
    Discard,
    Keep,
}

impl From<ConfirmArg> for CloseChoice {
    fn from(value: ConfirmArg) -> Self {
        match value {
            ConfirmArg::Discard => CloseChoice::Discard,
            ConfirmArg::Keep => CloseChoice::KeepEditing,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let settings = load_settings(&args.config);

    match args.command {
        Command::Check { data } => {
            let form = read_form(&data)?;
            let mut controller = LifecycleController::builder(move || form.clone())
                .validator(validation::required_fields(settings.required_fields.clone()))
                .build();

            let passed = controller.run_validation();
            print_messages(&controller);
            println!("{}", if passed { "valid" } else { "invalid" });
            Ok(exit_code(passed))
        }
        Command::Submit { data, url } => {
            let form = read_form(&data)?;
            let url = url
                .or_else(|| settings.submit_url.clone())
                .context("no submit url: pass --url or set submit_url in the settings file")?;
            let submitter = HttpSubmitter::with_timeout(&url, settings.request_timeout())
                .with_context(|| format!("failed to set up submitter for '{url}'"))?;

            let mut controller = LifecycleController::builder(move || form.clone())
                .options(settings.controller_options())
                .validator(validation::required_fields(settings.required_fields.clone()))
                .submitter(submitter)
                .on_save(|response| println!("saved: {}", response.body))
                .on_close(|| println!("form closed"))
                .build();

            info!(%url, "submitting form");
            let result = controller.submit(&mut NoEvent).await;
            print_messages(&controller);
            if let Some(kind) = result.failure_kind() {
                println!("failure: {kind:?}");
            }
            Ok(exit_code(matches!(
                result,
                SubmitResult::Completed(SubmitOutcome::Saved(_))
                    | SubmitResult::ClosedWithoutSubmitter
            )))
        }
        Command::Close {
            original,
            current,
            confirm,
        } => {
            let form = Arc::new(Mutex::new(read_form(&original)?));
            let reader = Arc::clone(&form);
            let mut controller = LifecycleController::builder(move || {
                reader
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .clone()
            })
            .confirm_close_if_not_saved(settings.confirm_close_if_not_saved)
            .on_close(|| println!("form closed"))
            .build();

            let edited = read_form(&current)?;
            *form.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = edited;

            let mut outcome = controller.request_close(true);
            if outcome == CloseOutcome::AwaitingConfirmation {
                println!("{CLOSE_CONFIRMATION_PROMPT} [{confirm:?}]");
                outcome = controller
                    .resolve_close_confirmation(confirm.into())
                    .unwrap_or(outcome);
            }
            println!("close: {outcome:?}");
            Ok(exit_code(outcome == CloseOutcome::Closed))
        }
    }
}

fn read_form(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read form data '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("form data '{}' is not valid JSON", path.display()))
}

fn print_messages(controller: &LifecycleController) {
    match controller.active_message() {
        ActiveMessage::None => {}
        ActiveMessage::FieldErrors(errors) => {
            for (field, message) in errors {
                println!("error: {field}: {message}");
            }
        }
        ActiveMessage::Summary(message) => println!("error: {message}"),
    }
    for warning in controller.warnings() {
        println!("warning: {warning}");
    }
    for note in controller.info() {
        println!("info: {note}");
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
