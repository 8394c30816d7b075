// ── Auth service ──
//
// Login/logout flows on top of the client core and the session store.
// State is published through a `watch` channel so a front end can react to
// transitions without polling.

use rampart_api::{ApiClient, Error as ApiError, Notice, Session};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::CoreError;

/// Where the login flow stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated { username: String },
}

impl AuthState {
    fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(s) => Self::Authenticated { username: s.username },
            None => Self::Anonymous,
        }
    }
}

/// Login, logout, and current-user lookup.
pub struct AuthService {
    client: ApiClient,
    state: watch::Sender<AuthState>,
}

impl AuthService {
    /// Starts `Authenticated` when the session store already holds an
    /// identity.
    pub fn new(client: ApiClient) -> Self {
        let initial = AuthState::from_session(client.session().get());
        let (state, _) = watch::channel(initial);
        Self { client, state }
    }

    /// Subscribe to state transitions.
    pub fn state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Log in. Returns whether the server accepted the credentials; every
    /// failure has already been reported through the notifier.
    pub async fn login(&self, username: &str, password: &SecretString) -> bool {
        self.try_login(username, password).await.is_ok()
    }

    /// [`login`](Self::login), keeping the failure for callers that map it
    /// to their own error reporting.
    pub async fn try_login(&self, username: &str, password: &SecretString) -> Result<Session, CoreError> {
        self.state.send_replace(AuthState::Authenticating);

        match self.client.login(username, password).await {
            Ok(session) => {
                info!(username = %session.username, "logged in");
                self.client.session().set(session.clone());
                self.client.notify(&Notice::success("Login successful"));
                self.state.send_replace(AuthState::Authenticated {
                    username: session.username.clone(),
                });
                Ok(session)
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                // The client core already reported everything except a 2xx
                // without an identity.
                if matches!(err, ApiError::Authentication { .. }) {
                    self.client.notify(&Notice::error(err.message()));
                }
                self.state.send_replace(AuthState::Anonymous);
                Err(login_error(err))
            }
        }
    }

    /// Forget the session. Does not contact the server or redirect.
    pub fn logout(&self) {
        self.client.session().clear();
        self.state.send_replace(AuthState::Anonymous);
        info!("logged out");
    }

    /// The stored identity, if any.
    pub fn current_user(&self) -> Option<Session> {
        self.client.session().get()
    }
}

/// Client errors on the login call mean the credentials were refused.
fn login_error(err: ApiError) -> CoreError {
    match err {
        ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
        ApiError::Unauthenticated => CoreError::AuthenticationFailed {
            message: "Login failed. Please check your credentials.".into(),
        },
        ApiError::Request { status, message } if (400..500).contains(&status) => {
            CoreError::AuthenticationFailed { message }
        }
        other => CoreError::from(other),
    }
}
