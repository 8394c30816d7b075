use std::future::Future;

use rampart_api::ApiClient;

use super::key::QueryKey;
use super::state::QueryData;
use crate::error::CoreError;

/// Resolves a [`QueryKey`] into data. Implemented for [`ApiClient`]; tests
/// substitute their own.
pub trait QueryFetcher: Send + Sync + 'static {
    fn fetch(&self, key: &QueryKey) -> impl Future<Output = Result<QueryData, CoreError>> + Send;
}

impl QueryFetcher for ApiClient {
    async fn fetch(&self, key: &QueryKey) -> Result<QueryData, CoreError> {
        let data = match key {
            QueryKey::Rules => QueryData::Rules(self.list_rules().await?),
            QueryKey::Whitelist => QueryData::Whitelist(self.list_whitelist().await?),
            QueryKey::Mode(mode) => QueryData::Mode(self.get_mode(*mode).await?),
            QueryKey::RealtimeLogs {
                limit,
                include_server,
            } => QueryData::RealtimeLogs(self.realtime_logs(*limit, *include_server).await?),
            QueryKey::BlockedLogs { limit } => QueryData::BlockedLogs(self.blocked_logs(*limit).await?),
            QueryKey::AllLogs(filter) => QueryData::AllLogs(self.all_logs(filter).await?),
            QueryKey::LogStats => QueryData::LogStats(self.log_stats().await?),
        };
        Ok(data)
    }
}
