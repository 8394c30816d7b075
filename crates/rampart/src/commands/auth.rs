//! Session command handlers: login, logout, whoami.

use std::io::{self, IsTerminal};

use dialoguer::Input;
use secrecy::SecretString;

use rampart_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

use super::{Connected, build_controller, util};

/// Controller that only touches the local session file.
fn offline(global: &GlobalOpts) -> Result<Connected, CliError> {
    let cfg = config::load_config_or_default();
    let (name, profile) = config::effective_profile(global, &cfg)?;

    let mut client = ClientConfig::new(rampart_config::parse_api_url(&profile.api_url)?);
    client.session_file = Some(
        profile
            .session_file
            .unwrap_or_else(|| rampart_config::default_session_path(&name)),
    );
    build_controller(global, client)
}

pub async fn login(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let (name, mut profile) = config::effective_profile(global, &cfg)?;
    let interactive = io::stdin().is_terminal();

    if profile.username.is_none() {
        if !interactive {
            return Err(CliError::NoCredentials { profile: name });
        }
        let user: String = Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(util::prompt_err)?;
        profile.username = Some(user);
    }

    if rampart_config::resolve_password(&profile, &name).is_err() {
        if !interactive {
            return Err(CliError::NoCredentials { profile: name });
        }
        let pass = rpassword::prompt_password("Password: ").map_err(util::prompt_err)?;
        profile.password = Some(pass);
    }

    let client = rampart_config::profile_to_client_config(&profile, &name)?;
    let connected = build_controller(global, client)?;
    util::with_spinner("Logging in", global.quiet, connected.controller.authenticate()).await?;
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let connected = offline(global)?;
    connected.controller.auth().logout();
    if !global.quiet {
        eprintln!("Logged out");
    }
    Ok(())
}

pub fn whoami(global: &GlobalOpts) -> Result<(), CliError> {
    let connected = offline(global)?;
    let session = connected
        .controller
        .auth()
        .current_user()
        .ok_or(CliError::NotLoggedIn)?;
    let out = output::render_single(
        &global.output,
        &session,
        |s| s.username.clone(),
        |s| s.username.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Password from the user's terminal, for commands that store one.
pub fn prompt_password(label: &str) -> Result<SecretString, CliError> {
    let pass = rpassword::prompt_password(label).map_err(util::prompt_err)?;
    if pass.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(pass))
}
