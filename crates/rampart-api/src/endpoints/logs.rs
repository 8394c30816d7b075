// Log and statistics endpoints

use crate::client::{ApiClient, RequestOptions};
use crate::error::Error;
use crate::models::{BlockedLogs, ClearLogsResponse, ClearSelection, LogFilter, LogPage, LogStats, RealtimeLogs};

impl ApiClient {
    /// Most recent packets.
    ///
    /// `GET /logs/realtime?limit={limit}&srv={include_server}`
    pub async fn realtime_logs(&self, limit: u32, include_server: bool) -> Result<RealtimeLogs, Error> {
        let options = RequestOptions::new()
            .query("limit", limit)
            .query("srv", include_server);
        self.get("/logs/realtime", options).await
    }

    /// `GET /logs/blocked?limit={limit}`
    pub async fn blocked_logs(&self, limit: u32) -> Result<BlockedLogs, Error> {
        self.get("/logs/blocked", RequestOptions::new().query("limit", limit))
            .await
    }

    /// Filtered, paginated history.
    ///
    /// `GET /logs/all` with one query parameter per set filter field.
    pub async fn all_logs(&self, filter: &LogFilter) -> Result<LogPage, Error> {
        self.get("/logs/all", RequestOptions::new().queries(filter.to_query()))
            .await
    }

    /// `GET /logs/stats`
    pub async fn log_stats(&self) -> Result<LogStats, Error> {
        self.get("/logs/stats", RequestOptions::new()).await
    }

    /// `DELETE /logs/clear?clear_realtime=true&clear_blocked=true&clear_stats=true`
    ///
    /// Only the selected categories are sent.
    pub async fn clear_logs(&self, selection: ClearSelection) -> Result<ClearLogsResponse, Error> {
        self.delete("/logs/clear", RequestOptions::new().queries(selection.to_query()))
            .await
    }
}
