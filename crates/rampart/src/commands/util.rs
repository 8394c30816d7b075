//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};
use std::time::Duration;

use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use rampart_core::{Command, CommandResult, Controller, validate::CONFIRM_WORD};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Ask the user to type the confirmation word, auto-approving with `--yes`.
///
/// Returns what was typed; the controller decides whether it matches.
pub fn confirmation(action: &str, yes_flag: bool) -> Result<String, CliError> {
    if yes_flag {
        return Ok(CONFIRM_WORD.to_owned());
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NotConfirmed {
            action: action.to_owned(),
        });
    }
    Input::<String>::new()
        .with_prompt(format!("Type '{CONFIRM_WORD}' to {action}"))
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)
}

/// Run `cmd`, prompting first when it is destructive.
pub async fn execute(
    controller: &Controller,
    cmd: Command,
    global: &GlobalOpts,
) -> Result<CommandResult, CliError> {
    let result = match cmd.confirmation_action() {
        Some(action) => {
            let typed = confirmation(&action, global.yes)?;
            controller.execute_confirmed(cmd, &typed).await?
        }
        None => controller.execute(cmd).await?,
    };
    Ok(result)
}

/// Spinner on stderr while `fut` runs; hidden when not interactive.
pub async fn with_spinner<F, T>(message: &str, quiet: bool, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    if quiet || !io::stderr().is_terminal() {
        return fut.await;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    bar.finish_and_clear();
    out
}

/// Render an optional value, `-` when absent.
pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}
