//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use rampart_config::ConfigError;
use rampart_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the firewall API at {url}")]
    #[diagnostic(
        code(rampart::connection_failed),
        help(
            "Check that the API server is running and reachable.\n\
             Reason: {reason}\n\
             Set the URL with --api-url or `rampart config set api_url <url>`."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(rampart::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(rampart::auth_failed),
        help(
            "Verify your username and password.\n\
             Store a new password with: rampart config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Session expired")]
    #[diagnostic(code(rampart::session_expired), help("Run: rampart login"))]
    SessionExpired,

    #[error("Not logged in")]
    #[diagnostic(code(rampart::not_logged_in), help("Run: rampart login"))]
    NotLoggedIn,

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(rampart::no_credentials),
        help(
            "Configure credentials with: rampart config init\n\
             Or set RAMPART_USERNAME and RAMPART_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(rampart::not_found))]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(code(rampart::conflict))]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(rampart::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected response from server: {message}")]
    #[diagnostic(
        code(rampart::malformed_response),
        help("Check that --api-url points at the firewall API root (usually ending in /api).")
    )]
    MalformedResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rampart::validation))]
    Validation { field: String, reason: String },

    #[error("Unknown rule template '{name}'")]
    #[diagnostic(
        code(rampart::unknown_template),
        help("Run: rampart rules templates")
    )]
    UnknownTemplate { name: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(rampart::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: rampart config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(rampart::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' was not confirmed")]
    #[diagnostic(
        code(rampart::confirmation_required),
        help("Type 'yes' at the prompt, or pass --yes (-y) in non-interactive contexts.")
    )]
    NotConfirmed { action: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(rampart::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. }
            | Self::SessionExpired
            | Self::NotLoggedIn
            | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::UnknownTemplate { .. } | Self::NotConfirmed { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout => CliError::Timeout,
            CoreError::SessionExpired => CliError::SessionExpired,
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::NotFound { message } => CliError::NotFound { message },
            CoreError::Rejected {
                status: 409,
                message,
            } => CliError::Conflict { message },
            CoreError::Rejected { status, message } => CliError::ApiError { status, message },
            CoreError::MalformedResponse { message } => CliError::MalformedResponse { message },
            CoreError::Validation { field, message } => CliError::Validation {
                field,
                reason: message,
            },
            CoreError::ConfirmationMismatch { action } => CliError::NotConfirmed { action },
            CoreError::UnknownTemplate { name } => CliError::UnknownTemplate { name },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
