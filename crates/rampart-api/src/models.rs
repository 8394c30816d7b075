// Firewall API wire types
//
// Request and response shapes for every endpoint binding. Deserialization is
// the schema check for the client core: a 2xx body that does not fit these
// types surfaces as `Error::MalformedResponse`. Optional and defaulted fields
// follow what the server actually omits.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ── Generic responses ────────────────────────────────────────────────

/// `{ status, message }` acknowledgement returned by mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ApiMessage {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// The server's message, or `fallback` when it sent none.
    pub fn message_or(&self, fallback: &str) -> String {
        if self.message.trim().is_empty() {
            fallback.to_owned()
        } else {
            self.message.clone()
        }
    }
}

// ── Rules ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
}

impl RuleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleProtocol {
    Tcp,
    Udp,
    All,
}

impl RuleProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::All => "all",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(RuleAction, Direction, RuleProtocol, ConfigMode, ModeStatus);

/// The user-editable part of a rule. Port 0 means "all ports".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSpec {
    pub action: RuleAction,
    pub direction: Direction,
    pub protocol: RuleProtocol,
    pub port: u16,
    pub host: String,
}

impl RuleSpec {
    /// Human-readable summary, e.g. `DENY incoming TCP port 22 from 0.0.0.0`.
    pub fn describe(&self) -> String {
        let direction = match self.direction {
            Direction::In => "incoming",
            Direction::Out => "outgoing",
        };
        let port = if self.port == 0 {
            "all ports".to_owned()
        } else {
            format!("port {}", self.port)
        };
        format!(
            "{} {direction} {} {port} from {}",
            self.action.as_str().to_uppercase(),
            self.protocol.as_str().to_uppercase(),
            self.host
        )
    }
}

/// A rule as stored by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<u32>,
    pub action: RuleAction,
    pub direction: Direction,
    pub protocol: RuleProtocol,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl FirewallRule {
    pub fn spec(&self) -> RuleSpec {
        RuleSpec {
            action: self.action,
            direction: self.direction,
            protocol: self.protocol,
            port: self.port,
            host: self.host.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RulesResponse {
    #[serde(default)]
    pub rules: Vec<FirewallRule>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NextRuleIdResponse {
    pub rule_id: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RuleOperation {
    Add,
    Update,
}

/// `{ "rule": { "operation": ..., "rule_id": ..., <spec fields> } }`
#[derive(Debug, Serialize)]
pub(crate) struct ManageRuleBody<'a> {
    pub rule: ManagedRule<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ManagedRule<'a> {
    pub operation: RuleOperation,
    pub rule_id: u32,
    #[serde(flatten)]
    pub spec: &'a RuleSpec,
}

// ── Whitelist ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub ip_address: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WhitelistResponse {
    #[serde(default)]
    pub whitelist: Option<Vec<WhitelistEntry>>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum WhitelistOperation {
    Add,
    Remove,
}

#[derive(Debug, Serialize)]
pub(crate) struct ManageWhitelistBody {
    pub operation: WhitelistOperation,
    pub ip_address: String,
}

// ── Config modes ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigMode {
    Lockdown,
    Stealth,
}

impl ConfigMode {
    pub const ALL: [Self; 2] = [Self::Lockdown, Self::Stealth];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lockdown => "lockdown",
            Self::Stealth => "stealth",
        }
    }

    /// Capitalized name used in notices ("Lockdown mode enabled").
    pub fn title(self) -> &'static str {
        match self {
            Self::Lockdown => "Lockdown",
            Self::Stealth => "Stealth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeStatus {
    On,
    Off,
}

impl ModeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl From<bool> for ModeStatus {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModeResponse {
    pub data: ModeData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModeData {
    pub status: ModeStatus,
}

/// `{ "config": { "<mode>": "on" | "off" } }`
#[derive(Debug, Serialize)]
pub(crate) struct ManageConfigBody {
    pub config: std::collections::BTreeMap<&'static str, ModeStatus>,
}

// ── Logs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogAction {
    #[serde(alias = "allow")]
    Allow,
    #[serde(alias = "deny")]
    Deny,
}

impl LogAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Deny => "DENY",
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an IP protocol number to its name. Unknown values pass through.
pub fn protocol_display_name(raw: &str) -> &str {
    match raw.trim() {
        "1" => "ICMP",
        "2" => "IGMP",
        "6" => "TCP",
        "17" => "UDP",
        _ => raw,
    }
}

/// One logged packet. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ns: Option<u64>,
    pub src_ip: String,
    pub dst_ip: String,
    /// Absent for portless protocols such as ICMP.
    #[serde(default)]
    pub src_port: Option<u16>,
    #[serde(default)]
    pub dst_port: Option<u16>,
    /// Either a protocol name or a numeric IP protocol code.
    #[serde(deserialize_with = "string_or_number")]
    pub protocol: String,
    #[serde(default)]
    pub length: u32,
    pub action: LogAction,
    #[serde(default)]
    pub reason: String,
}

impl LogEntry {
    pub fn protocol_name(&self) -> &str {
        protocol_display_name(&self.protocol)
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Code(u64),
        Name(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Code(code) => code.to_string(),
        Raw::Name(name) => name,
    })
}

/// `GET /logs/realtime`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeLogs {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub server_logs_included: bool,
    #[serde(default)]
    pub total_logs_available: u64,
}

/// `GET /logs/blocked`. The server has used both field spellings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedLogs {
    #[serde(default, alias = "blocked_requests")]
    pub logs: Vec<LogEntry>,
    #[serde(default, alias = "count")]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// `GET /logs/all`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPage {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub server_logs_included: bool,
    #[serde(default)]
    pub filters: serde_json::Value,
}

/// Filters and pagination for `GET /logs/all`. Unset fields are omitted
/// from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogFilter {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub action: Option<LogAction>,
    pub protocol: Option<String>,
    pub src_ip: Option<String>,
    pub dst_ip: Option<String>,
    pub min_port: Option<u16>,
    pub max_port: Option<u16>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub srv: Option<bool>,
}

impl LogFilter {
    /// Query pairs in a stable order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                query.push((key, value));
            }
        };
        push("limit", self.limit.map(|v| v.to_string()));
        push("offset", self.offset.map(|v| v.to_string()));
        push("action", self.action.map(|a| a.as_str().to_owned()));
        push("protocol", self.protocol.clone());
        push("src_ip", self.src_ip.clone());
        push("dst_ip", self.dst_ip.clone());
        push("min_port", self.min_port.map(|v| v.to_string()));
        push("max_port", self.max_port.map(|v| v.to_string()));
        push("date_from", self.date_from.clone());
        push("date_to", self.date_to.clone());
        push("srv", self.srv.map(|v| v.to_string()));
        query
    }
}

// ── Stats ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDetail {
    pub reason: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficStats {
    #[serde(default)]
    pub allowed: u64,
    #[serde(default)]
    pub blocked: u64,
    #[serde(default)]
    pub blocked_details: Vec<BlockedDetail>,
}

impl TrafficStats {
    pub fn total(&self) -> u64 {
        self.allowed.saturating_add(self.blocked)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub label: String,
    pub data: Vec<f64>,
    #[serde(rename = "backgroundColor")]
    pub background_color: Vec<String>,
}

/// Chart series for the stats view. Every dataset carries exactly one
/// value and one color per label; anything else is rejected on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChartData")]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Deserialize)]
struct RawChartData {
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    datasets: Vec<Dataset>,
}

impl TryFrom<RawChartData> for ChartData {
    type Error = String;

    fn try_from(raw: RawChartData) -> Result<Self, Self::Error> {
        let expected = raw.labels.len();
        for ds in &raw.datasets {
            if ds.data.len() != expected || ds.background_color.len() != expected {
                return Err(format!(
                    "chart dataset {:?} has {} values and {} colors for {expected} labels",
                    ds.label,
                    ds.data.len(),
                    ds.background_color.len()
                ));
            }
        }
        Ok(Self {
            labels: raw.labels,
            datasets: raw.datasets,
        })
    }
}

/// `GET /logs/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStats {
    pub stats: TrafficStats,
    #[serde(default)]
    pub chart_data: ChartData,
}

// ── Clearing ─────────────────────────────────────────────────────────

/// Which log categories `DELETE /logs/clear` should wipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClearSelection {
    pub realtime: bool,
    pub blocked: bool,
    pub stats: bool,
}

impl ClearSelection {
    pub const ALL: Self = Self {
        realtime: true,
        blocked: true,
        stats: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.realtime || self.blocked || self.stats)
    }

    pub(crate) fn to_query(self) -> Vec<(&'static str, String)> {
        [
            ("clear_realtime", self.realtime),
            ("clear_blocked", self.blocked),
            ("clear_stats", self.stats),
        ]
        .into_iter()
        .filter(|(_, on)| *on)
        .map(|(key, _)| (key, "true".to_owned()))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearLogsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub results: serde_json::Value,
    #[serde(default)]
    pub message: String,
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: Option<LoginData>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    #[serde(default)]
    pub username: Option<String>,
}

impl LoginResponse {
    /// The identity the server vouched for, from `data.username` or `user`.
    pub fn identity(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.username.as_deref())
            .or(self.user.as_deref())
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_description() {
        let spec = RuleSpec {
            action: RuleAction::Deny,
            direction: Direction::In,
            protocol: RuleProtocol::Tcp,
            port: 22,
            host: "0.0.0.0".into(),
        };
        assert_eq!(spec.describe(), "DENY incoming TCP port 22 from 0.0.0.0");

        let all = RuleSpec {
            action: RuleAction::Allow,
            direction: Direction::Out,
            protocol: RuleProtocol::All,
            port: 0,
            host: "10.0.0.1".into(),
        };
        assert_eq!(all.describe(), "ALLOW outgoing ALL all ports from 10.0.0.1");
    }

    #[test]
    fn protocol_codes_map_to_names() {
        assert_eq!(protocol_display_name("1"), "ICMP");
        assert_eq!(protocol_display_name("2"), "IGMP");
        assert_eq!(protocol_display_name("6"), "TCP");
        assert_eq!(protocol_display_name("17"), "UDP");
        assert_eq!(protocol_display_name("47"), "47");
        assert_eq!(protocol_display_name("tcp"), "tcp");
    }

    #[test]
    fn log_entry_accepts_numeric_protocol() {
        let entry: LogEntry = serde_json::from_value(json!({
            "timestamp": "2025-01-01 12:00:00",
            "src_ip": "10.0.0.5",
            "dst_ip": "10.0.0.1",
            "src_port": 51000,
            "dst_port": 22,
            "protocol": 6,
            "length": 60,
            "action": "DENY",
            "reason": "rule 3"
        }))
        .unwrap();
        assert_eq!(entry.protocol, "6");
        assert_eq!(entry.protocol_name(), "TCP");
        assert_eq!(entry.action, LogAction::Deny);
    }

    #[test]
    fn log_entry_without_ports() {
        let entry: LogEntry = serde_json::from_value(json!({
            "timestamp": "2025-01-01 12:00:00",
            "src_ip": "10.0.0.5",
            "dst_ip": "10.0.0.1",
            "protocol": "ICMP",
            "action": "ALLOW"
        }))
        .unwrap();
        assert_eq!(entry.src_port, None);
        assert_eq!(entry.reason, "");
    }

    #[test]
    fn blocked_logs_accept_legacy_field_names() {
        let logs: BlockedLogs = serde_json::from_value(json!({
            "blocked_requests": [],
            "count": 7
        }))
        .unwrap();
        assert_eq!(logs.total, 7);
        assert!(logs.logs.is_empty());
    }

    #[test]
    fn chart_data_rejects_mismatched_lengths() {
        let bad = json!({
            "stats": { "allowed": 1, "blocked": 2, "blocked_details": [] },
            "chart_data": {
                "labels": ["Allowed", "Blocked"],
                "datasets": [{ "label": "Traffic", "data": [1], "backgroundColor": ["#0f0", "#f00"] }]
            }
        });
        assert!(serde_json::from_value::<LogStats>(bad).is_err());

        let good = json!({
            "stats": { "allowed": 1, "blocked": 2, "blocked_details": [] },
            "chart_data": {
                "labels": ["Allowed", "Blocked"],
                "datasets": [{ "label": "Traffic", "data": [1, 2], "backgroundColor": ["#0f0", "#f00"] }]
            }
        });
        let stats: LogStats = serde_json::from_value(good).unwrap();
        assert_eq!(stats.stats.total(), 3);
    }

    #[test]
    fn log_filter_query_skips_unset_fields() {
        let filter = LogFilter {
            limit: Some(50),
            action: Some(LogAction::Deny),
            min_port: Some(1024),
            src_ip: Some(String::new()),
            ..LogFilter::default()
        };
        assert_eq!(
            filter.to_query(),
            vec![
                ("limit", "50".to_owned()),
                ("action", "DENY".to_owned()),
                ("min_port", "1024".to_owned()),
            ]
        );
    }

    #[test]
    fn clear_selection_query_flags() {
        let sel = ClearSelection {
            realtime: true,
            blocked: false,
            stats: true,
        };
        assert_eq!(
            sel.to_query(),
            vec![
                ("clear_realtime", "true".to_owned()),
                ("clear_stats", "true".to_owned())
            ]
        );
        assert!(ClearSelection::default().is_empty());
    }

    #[test]
    fn manage_rule_body_nests_spec_fields() {
        let spec = RuleSpec {
            action: RuleAction::Deny,
            direction: Direction::In,
            protocol: RuleProtocol::Udp,
            port: 53,
            host: "192.168.1.10".into(),
        };
        let body = ManageRuleBody {
            rule: ManagedRule {
                operation: RuleOperation::Add,
                rule_id: 4,
                spec: &spec,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "rule": {
                "operation": "add", "rule_id": 4, "action": "deny",
                "direction": "in", "protocol": "udp", "port": 53, "host": "192.168.1.10"
            }})
        );
    }

    #[test]
    fn login_identity_from_either_field() {
        let a: LoginResponse =
            serde_json::from_value(json!({ "status": "success", "data": { "username": "admin" } }))
                .unwrap();
        assert_eq!(a.identity(), Some("admin"));

        let b: LoginResponse =
            serde_json::from_value(json!({ "status": "success", "user": "ops" })).unwrap();
        assert_eq!(b.identity(), Some("ops"));

        let c: LoginResponse = serde_json::from_value(json!({ "status": "error" })).unwrap();
        assert_eq!(c.identity(), None);
    }
}
