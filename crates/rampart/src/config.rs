//! CLI configuration: thin wrapper around `rampart_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--api-url, --username, etc.).

use rampart_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use rampart_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// List profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Pick the profile to use, with global flag overrides applied.
///
/// An explicitly requested profile must exist; otherwise a missing
/// default profile falls back to built-in defaults.
pub fn effective_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    let mut profile = match config.profiles.get(&name) {
        Some(p) => p.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(config),
            });
        }
        None => Profile::default(),
    };

    // Flag > env > profile > [defaults]
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if let Some(ref user) = global.username {
        profile.username = Some(user.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    } else if profile.insecure.is_none() {
        profile.insecure = Some(config.defaults.insecure);
    }
    profile.timeout = global
        .timeout
        .or(profile.timeout)
        .or(Some(config.defaults.timeout));

    Ok((name, profile))
}

/// Build the `ClientConfig` for this invocation.
pub fn resolve_client_config(global: &GlobalOpts) -> Result<(String, ClientConfig), CliError> {
    let cfg = load_config_or_default();
    let (name, profile) = effective_profile(global, &cfg)?;
    let client = rampart_config::profile_to_client_config(&profile, &name)?;
    Ok((name, client))
}
