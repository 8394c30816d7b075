use thiserror::Error;

/// Fallback shown when a transport failure carries no usable text.
const CONNECT_FAILED: &str = "Failed to connect to server";

/// Top-level error type for the `rampart-api` crate.
///
/// Every failure the HTTP client core can produce lands in one of these
/// variants. `rampart-core` maps them into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The server answered 401. The session has already been cleared and
    /// the login redirect issued by the time the caller sees this.
    #[error("Session expired. Please log in again.")]
    Unauthenticated,

    /// Login completed at the HTTP level but the server returned no identity.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Server responses ────────────────────────────────────────────
    /// Non-2xx response other than 401, with a never-empty message.
    #[error("{message} (HTTP {status})")]
    Request { status: u16, message: String },

    /// 2xx response whose body does not match the declared shape.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, ...)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// HTTP status associated with this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthenticated => Some(401),
            Self::Request { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The human-readable message carried in notices. Never empty.
    pub fn message(&self) -> String {
        match self {
            Self::Request { message, .. } | Self::Authentication { message } => message.clone(),
            Self::Transport(e) => {
                let text = e.to_string();
                if text.trim().is_empty() {
                    CONNECT_FAILED.to_owned()
                } else {
                    format!("{CONNECT_FAILED}: {text}")
                }
            }
            other => other.to_string(),
        }
    }

    /// Returns `true` if the session was rejected by the server.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_exposes_status_and_message() {
        let err = Error::Request {
            status: 409,
            message: "IP already whitelisted".into(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.message(), "IP already whitelisted");
    }

    #[test]
    fn unauthenticated_reports_401() {
        let err = Error::Unauthenticated;
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthenticated());
        assert!(!err.message().is_empty());
    }
}
