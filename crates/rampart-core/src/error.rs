// ── Core error types ──
//
// User-facing errors from rampart-core. Transport details stay in
// `rampart_api::Error`; the `From` impl below folds them into the variants
// the CLI knows how to present. Client-side validation and confirmation
// failures never reach the network.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Failed to connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to the firewall API timed out")]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Server responses ─────────────────────────────────────────────
    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from server: {message}")]
    MalformedResponse { message: String },

    // ── Client-side checks ───────────────────────────────────────────
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Confirmation required to {action}: type 'yes' to confirm")]
    ConfirmationMismatch { action: String },

    #[error("Unknown rule template: {name}")]
    UnknownTemplate { name: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTP status behind this error, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the next scheduled refresh may succeed without user action:
    /// timeouts, unreachable server, and 5xx answers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed { .. } => true,
            Self::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rampart_api::Error> for CoreError {
    fn from(err: rampart_api::Error) -> Self {
        match err {
            rampart_api::Error::Unauthenticated => CoreError::SessionExpired,
            rampart_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            rampart_api::Error::Request { status: 404, message } => CoreError::NotFound { message },
            rampart_api::Error::Request { status, message } => CoreError::Rejected { status, message },
            rampart_api::Error::MalformedResponse { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
            rampart_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            rampart_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            rampart_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
        }
    }
}
