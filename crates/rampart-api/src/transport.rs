// Transport configuration for building the reqwest::Client behind `ApiClient`.
//
// The firewall API authenticates with a session cookie, so every client
// built here carries a cookie jar. Callers that want to inspect or share
// the jar pass one in; otherwise each client gets its own.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;
use reqwest::cookie::Jar;

use crate::error::Error;

const USER_AGENT: &str = concat!("rampart/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Trust an extra CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed appliances).
    DangerAcceptInvalid,
}

impl TlsMode {
    fn apply(&self, builder: ClientBuilder) -> Result<ClientBuilder, Error> {
        Ok(match self {
            Self::System => builder,
            Self::CustomCa(path) => builder.add_root_certificate(load_ca(path)?),
            Self::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        })
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("failed to read CA cert {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("invalid CA cert {}: {e}", path.display())))
}

/// Transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Jar for the API's session cookie. `None` gives each built client a
    /// fresh one.
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    pub fn new(tls: TlsMode, timeout: Duration) -> Self {
        Self {
            tls,
            timeout,
            cookie_jar: None,
        }
    }

    /// Store session cookies in `jar` instead of a private one.
    #[must_use]
    pub fn with_cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Build a cookie-carrying `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let jar = self.cookie_jar.clone().unwrap_or_default();
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .cookie_provider(jar);

        self.tls
            .apply(builder)?
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_and_insecure_tls() {
        assert!(TransportConfig::default().build_client().is_ok());
        let insecure = TransportConfig::new(TlsMode::DangerAcceptInvalid, Duration::from_secs(5));
        assert!(insecure.build_client().is_ok());
    }

    #[test]
    fn missing_ca_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fw-ca.pem");
        let config = TransportConfig::new(TlsMode::CustomCa(path.clone()), Duration::from_secs(5));

        let err = config.build_client().unwrap_err();
        assert!(matches!(err, Error::Tls(_)));
        assert!(err.to_string().contains(&path.display().to_string()), "{err}");
    }

    #[test]
    fn garbage_ca_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fw-ca.pem");
        std::fs::write(&path, "not a certificate").unwrap();
        let config = TransportConfig::new(TlsMode::CustomCa(path), Duration::from_secs(5));

        assert!(matches!(config.build_client(), Err(Error::Tls(_))));
    }
}
