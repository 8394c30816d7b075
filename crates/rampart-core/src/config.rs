// ── Runtime client configuration ──
//
// Describes *how* to reach the firewall API: root URL, credentials, TLS,
// timeouts, where the session lives, and how often each view refreshes.
// Built by the CLI from a profile; core never reads config files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rampart_api::{ApiClient, FileSessionStore, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::query::QueryKey;

/// API root used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Username/password pair for `POST /auth/login`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed appliances).
    DangerAcceptInvalid,
}

/// Default refresh period for each kind of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshIntervals {
    pub stats: Duration,
    pub realtime_logs: Duration,
    pub blocked_logs: Duration,
    pub all_logs: Duration,
    pub rules: Duration,
    pub whitelist: Duration,
    pub modes: Duration,
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            stats: Duration::from_secs(10),
            realtime_logs: Duration::from_secs(3),
            blocked_logs: Duration::from_secs(5),
            all_logs: Duration::from_secs(30),
            rules: Duration::from_secs(30),
            whitelist: Duration::from_secs(30),
            modes: Duration::from_secs(30),
        }
    }
}

impl RefreshIntervals {
    /// The period a view showing `key` refreshes at.
    pub fn for_key(&self, key: &QueryKey) -> Duration {
        match key {
            QueryKey::Rules => self.rules,
            QueryKey::Whitelist => self.whitelist,
            QueryKey::Mode(_) => self.modes,
            QueryKey::RealtimeLogs { .. } => self.realtime_logs,
            QueryKey::BlockedLogs { .. } => self.blocked_logs,
            QueryKey::AllLogs(_) => self.all_logs,
            QueryKey::LogStats => self.stats,
        }
    }
}

/// Configuration for talking to one firewall API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://fw.local:5000/api`.
    pub api_url: Url,
    /// Used by [`Controller::authenticate`](crate::Controller::authenticate).
    pub credentials: Option<Credentials>,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// Persist the session here instead of in memory.
    pub session_file: Option<PathBuf>,
    pub refresh: RefreshIntervals,
}

impl ClientConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            session_file: None,
            refresh: RefreshIntervals::default(),
        }
    }

    /// HTTP client for this configuration, with the file session store when
    /// `session_file` is set. Callers may swap the notifier or redirect.
    pub fn build_api_client(&self) -> Result<ApiClient, CoreError> {
        let mut api = ApiClient::new(self.api_url.clone(), &self.transport())?;
        if let Some(ref path) = self.session_file {
            api = api.with_session_store(Arc::new(FileSessionStore::new(path)));
        }
        Ok(api)
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig::new(tls, self.timeout)
    }
}
