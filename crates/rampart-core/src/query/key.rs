use std::fmt;

use rampart_api::{ConfigMode, LogFilter};

/// Identifies one cached fetch. Two subscriptions with equal keys share
/// state and an in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Rules,
    Whitelist,
    Mode(ConfigMode),
    RealtimeLogs { limit: u32, include_server: bool },
    BlockedLogs { limit: u32 },
    AllLogs(LogFilter),
    LogStats,
}

impl QueryKey {
    /// Whether this key reads log-derived data (logs or stats).
    pub fn is_log_data(&self) -> bool {
        matches!(
            self,
            Self::RealtimeLogs { .. } | Self::BlockedLogs { .. } | Self::AllLogs(_) | Self::LogStats
        )
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules => f.write_str("rules"),
            Self::Whitelist => f.write_str("whitelist"),
            Self::Mode(mode) => write!(f, "config/{mode}"),
            Self::RealtimeLogs {
                limit,
                include_server,
            } => write!(f, "logs/realtime?limit={limit}&srv={include_server}"),
            Self::BlockedLogs { limit } => write!(f, "logs/blocked?limit={limit}"),
            Self::AllLogs(filter) => {
                f.write_str("logs/all")?;
                for (i, (k, v)) in filter.to_query().iter().enumerate() {
                    write!(f, "{}{k}={v}", if i == 0 { '?' } else { '&' })?;
                }
                Ok(())
            }
            Self::LogStats => f.write_str("logs/stats"),
        }
    }
}
