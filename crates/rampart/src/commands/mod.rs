//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod logs;
pub mod mode;
pub mod rules;
pub mod util;
pub mod watch;
pub mod whitelist;

use std::sync::Arc;

use rampart_core::{ClientConfig, Controller};

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output::StderrNotifier;

/// A controller plus the notifier it reports through.
pub struct Connected {
    pub controller: Controller,
    pub notifier: Arc<StderrNotifier>,
}

/// Build a controller for `client` that prints notices to stderr.
pub fn build_controller(global: &GlobalOpts, client: ClientConfig) -> Result<Connected, CliError> {
    let notifier = Arc::new(StderrNotifier::new(&global.color, global.quiet));
    let api = client.build_api_client()?.with_notifier(notifier.clone());
    Ok(Connected {
        controller: Controller::with_api_client(client, api),
        notifier,
    })
}

/// Resolve config and log in with the profile's stored credentials.
pub async fn connect(global: &GlobalOpts) -> Result<Connected, CliError> {
    let (profile, client) = config::resolve_client_config(global)?;
    if client.credentials.is_none() {
        return Err(CliError::NoCredentials { profile });
    }

    let connected = build_controller(global, client)?;
    connected.notifier.set_muted(true);
    let result = connected.controller.authenticate().await;
    connected.notifier.set_muted(false);
    result?;
    Ok(connected)
}

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Rules(args) => rules::handle(controller, args, global).await,
        Command::Whitelist(args) => whitelist::handle(controller, args, global).await,
        Command::Mode(args) => mode::handle(controller, args, global).await,
        Command::Logs(args) => logs::handle(controller, args, global).await,
        Command::Watch(args) => watch::handle(controller, args, global).await,
        // Handled before a connection is made
        Command::Login
        | Command::Logout
        | Command::Whoami
        | Command::Config(_)
        | Command::Completions(_) => Err(CliError::Internal(
            "command does not need an API session".into(),
        )),
    }
}
