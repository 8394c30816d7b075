use std::sync::Arc;

use chrono::{DateTime, Utc};
use rampart_api::{
    BlockedLogs, FirewallRule, LogPage, LogStats, ModeStatus, RealtimeLogs, WhitelistEntry,
};

use crate::error::CoreError;

/// Payload cached under a [`QueryKey`](super::QueryKey).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Rules(Vec<FirewallRule>),
    Whitelist(Vec<WhitelistEntry>),
    Mode(ModeStatus),
    RealtimeLogs(RealtimeLogs),
    BlockedLogs(BlockedLogs),
    AllLogs(LogPage),
    LogStats(LogStats),
}

impl QueryData {
    pub fn as_rules(&self) -> Option<&[FirewallRule]> {
        match self {
            Self::Rules(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_whitelist(&self) -> Option<&[WhitelistEntry]> {
        match self {
            Self::Whitelist(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_mode(&self) -> Option<ModeStatus> {
        match self {
            Self::Mode(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_stats(&self) -> Option<&LogStats> {
        match self {
            Self::LogStats(s) => Some(s),
            _ => None,
        }
    }
}

/// Last failure recorded for a query. Cloneable so every observer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub message: String,
    pub status: Option<u16>,
    /// The next scheduled refresh may clear it on its own.
    pub transient: bool,
}

impl From<&CoreError> for QueryError {
    fn from(err: &CoreError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status(),
            transient: err.is_transient(),
        }
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for QueryError {}

/// What observers of a query see.
///
/// A failed refresh sets `error` but leaves `data` from the last success in
/// place.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub data: Option<Arc<QueryData>>,
    pub error: Option<QueryError>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_fetching: bool,
    /// Set by invalidation, cleared by the next successful fetch.
    pub is_stale: bool,
    /// Completed fetches, successful or not.
    pub fetch_count: u64,
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }
}
