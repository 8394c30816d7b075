// Login binding
//
// The server sets a session cookie in the client's jar on success and echoes
// the identity it accepted. Storing that identity is the auth service's job.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{LoginRequest, LoginResponse};
use crate::session::Session;

impl ApiClient {
    /// Authenticate with username/password.
    ///
    /// `POST /auth/login` with `{"username", "password"}`
    ///
    /// A 2xx answer without an identity fails with
    /// [`Error::Authentication`]. That error is not reported through the
    /// notifier since the client core considered the call a success.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Session, Error> {
        debug!(username, "logging in");
        let body = LoginRequest {
            username,
            password: password.expose_secret(),
        };
        let resp: LoginResponse = self.post("/auth/login", &body).await?;

        let identity = resp
            .identity()
            .filter(|_| !resp.status.eq_ignore_ascii_case("error"))
            .map(str::to_owned);

        match identity {
            Some(name) => {
                debug!("login successful");
                Ok(Session::new(name))
            }
            None => Err(Error::Authentication {
                message: resp
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Login failed. Please check your credentials.".to_owned()),
            }),
        }
    }
}
