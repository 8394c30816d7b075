// Whitelist endpoints
//
// Add and remove share `POST /whitelist/manage`, distinguished by
// `operation`. The address is sent exactly as given; entries are keyed by
// that string on the server.

use tracing::debug;

use crate::client::{ApiClient, RequestOptions};
use crate::error::Error;
use crate::models::{
    ApiMessage, ManageWhitelistBody, WhitelistEntry, WhitelistOperation, WhitelistResponse,
};

impl ApiClient {
    /// `GET /whitelist`
    ///
    /// A response without a `whitelist` array is an empty list.
    pub async fn list_whitelist(&self) -> Result<Vec<WhitelistEntry>, Error> {
        debug!("listing whitelist");
        let resp: WhitelistResponse = self.get("/whitelist", RequestOptions::new()).await?;
        Ok(resp.whitelist.unwrap_or_default())
    }

    /// `POST /whitelist/manage` with `{"operation": "add", "ip_address"}`
    pub async fn add_whitelist(&self, ip: &str) -> Result<ApiMessage, Error> {
        self.manage_whitelist(WhitelistOperation::Add, ip).await
    }

    /// `POST /whitelist/manage` with `{"operation": "remove", "ip_address"}`
    pub async fn remove_whitelist(&self, ip: &str) -> Result<ApiMessage, Error> {
        self.manage_whitelist(WhitelistOperation::Remove, ip).await
    }

    async fn manage_whitelist(
        &self,
        operation: WhitelistOperation,
        ip: &str,
    ) -> Result<ApiMessage, Error> {
        debug!(?operation, ip, "managing whitelist");
        let body = ManageWhitelistBody {
            operation,
            ip_address: ip.to_owned(),
        };
        self.post("/whitelist/manage", &body).await
    }
}
