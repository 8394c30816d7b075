//! Shared configuration for the rampart CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `rampart_core::ClientConfig`. The CLI layers its
//! `GlobalOpts` overrides on top of what this crate produces.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rampart_core::{ClientConfig, Credentials, DEFAULT_API_URL, RefreshIntervals, TlsVerification};

const KEYRING_SERVICE: &str = "rampart";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named firewall profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named firewall profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// API root (e.g., "http://fw.local:5000/api").
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Login username.
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Where the logged-in identity is kept between invocations.
    pub session_file: Option<PathBuf>,

    /// Per-view refresh periods for `watch`.
    #[serde(default)]
    pub refresh: RefreshSettings,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            username: None,
            password: None,
            password_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            session_file: None,
            refresh: RefreshSettings::default(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

/// Refresh periods in seconds; unset entries keep the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RefreshSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_logs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_logs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_logs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modes: Option<u64>,
}

impl RefreshSettings {
    /// Overlay the configured periods on the built-in defaults.
    pub fn to_intervals(&self) -> RefreshIntervals {
        let base = RefreshIntervals::default();
        let pick = |secs: Option<u64>, fallback: Duration| {
            secs.filter(|s| *s > 0).map_or(fallback, Duration::from_secs)
        };
        RefreshIntervals {
            stats: pick(self.stats, base.stats),
            realtime_logs: pick(self.realtime_logs, base.realtime_logs),
            blocked_logs: pick(self.blocked_logs, base.blocked_logs),
            all_logs: pick(self.all_logs, base.all_logs),
            rules: pick(self.rules, base.rules),
            whitelist: pick(self.whitelist, base.whitelist),
            modes: pick(self.modes, base.modes),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "rampart", "rampart")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rampart");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default session file for a profile, under the platform data dir.
pub fn default_session_path(profile_name: &str) -> PathBuf {
    let base = project_dirs().map_or_else(
        || dirs_fallback().join("sessions"),
        |dirs| dirs.data_local_dir().join("sessions"),
    );
    base.join(format!("{profile_name}.json"))
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. `RAMPART_`-prefixed variables override it,
/// with `__` separating nested keys (`RAMPART_DEFAULTS__TIMEOUT=5`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RAMPART_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the login password for a profile.
///
/// Order: `password_env` variable, `RAMPART_PASSWORD`, system keyring,
/// plaintext in config.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var("RAMPART_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Username + password for a profile. `None` when no username is known.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<Credentials>, ConfigError> {
    let Some(username) = profile
        .username
        .clone()
        .or_else(|| std::env::var("RAMPART_USERNAME").ok())
    else {
        return Ok(None);
    };

    let password = resolve_password(profile, profile_name)?;
    Ok(Some(Credentials { username, password }))
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password)?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse and sanity-check an API root.
pub fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `ClientConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ClientConfig, ConfigError> {
    let api_url = parse_api_url(&profile.api_url)?;
    let credentials = resolve_credentials(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ClientConfig::new(api_url);
    config.credentials = credentials;
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout));
    config.session_file = Some(
        profile
            .session_file
            .clone()
            .unwrap_or_else(|| default_session_path(profile_name)),
    );
    config.refresh = profile.refresh.to_intervals();
    Ok(config)
}
