// Config mode endpoints
//
// Reads use a dedicated `GET /config/{mode}`; writes go through the same
// `POST /manage` endpoint as rule mutations with a `config` body. The server
// multiplexes on the top-level key.

use std::collections::BTreeMap;

use tracing::debug;

use crate::client::{ApiClient, RequestOptions};
use crate::error::Error;
use crate::models::{ApiMessage, ConfigMode, ManageConfigBody, ModeResponse, ModeStatus};

impl ApiClient {
    /// `GET /config/{mode}`
    pub async fn get_mode(&self, mode: ConfigMode) -> Result<ModeStatus, Error> {
        let resp: ModeResponse = self
            .get(&format!("/config/{}", mode.as_str()), RequestOptions::new())
            .await?;
        Ok(resp.data.status)
    }

    /// `POST /manage` with `{"config": {"<mode>": "on" | "off"}}`
    pub async fn set_mode(&self, mode: ConfigMode, status: ModeStatus) -> Result<ApiMessage, Error> {
        debug!(mode = mode.as_str(), status = status.as_str(), "setting mode");
        let body = ManageConfigBody {
            config: BTreeMap::from([(mode.as_str(), status)]),
        };
        self.post("/manage", &body).await
    }
}
