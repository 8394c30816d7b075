// ── Command API ──
//
// Every write against the firewall API is a `Command`. The controller runs
// it, emits a success notice, and invalidates the queries it touched.

use rampart_api::{ClearLogsResponse, ClearSelection, ConfigMode, ModeStatus, RuleSpec};

use crate::error::CoreError;
use crate::query::QueryKey;
use crate::templates::TemplateId;
use crate::validate;

/// All write operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Rules ────────────────────────────────────────────────────────
    /// Reserve the next id and create a rule under it.
    CreateRule(RuleSpec),
    UpdateRule { rule_id: u32, spec: RuleSpec },
    DeleteRule { rule_id: u32 },
    ApplyTemplate(TemplateId),

    // ── Whitelist ────────────────────────────────────────────────────
    /// Dotted-quad address, sent as typed.
    AddWhitelist(String),
    RemoveWhitelist(String),

    // ── Modes ────────────────────────────────────────────────────────
    SetMode { mode: ConfigMode, status: ModeStatus },

    // ── Logs ─────────────────────────────────────────────────────────
    ClearLogs(ClearSelection),
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Done; carries the notice text shown to the user.
    Ok { message: String },
    RuleCreated { rule_id: u32, message: String },
    TemplateApplied { rule_ids: Vec<u32>, message: String },
    LogsCleared(ClearLogsResponse),
}

impl CommandResult {
    pub fn message(&self) -> &str {
        match self {
            Self::Ok { message }
            | Self::RuleCreated { message, .. }
            | Self::TemplateApplied { message, .. } => message,
            Self::LogsCleared(resp) => &resp.message,
        }
    }
}

impl Command {
    /// `AddWhitelist` from user input, rejecting anything that is not a
    /// dotted-quad IPv4 address.
    pub fn add_whitelist(input: &str) -> Result<Self, CoreError> {
        validate::validate_whitelist_ip(input).map(|ip| Self::AddWhitelist(ip.to_owned()))
    }

    /// `RemoveWhitelist` from user input.
    pub fn remove_whitelist(input: &str) -> Result<Self, CoreError> {
        validate::validate_whitelist_ip(input).map(|ip| Self::RemoveWhitelist(ip.to_owned()))
    }

    /// For destructive commands, the action a user must confirm by typing
    /// "yes".
    pub fn confirmation_action(&self) -> Option<String> {
        match self {
            Self::DeleteRule { rule_id } => Some(format!("delete rule {rule_id}")),
            Self::ApplyTemplate(id) => Some(format!("apply the {id} template")),
            Self::SetMode { mode, status } => Some(format!(
                "{} {mode} mode",
                if status.is_on() { "enable" } else { "disable" }
            )),
            Self::ClearLogs(_) => Some("clear logs".to_owned()),
            Self::CreateRule(_)
            | Self::UpdateRule { .. }
            | Self::AddWhitelist(_)
            | Self::RemoveWhitelist(_) => None,
        }
    }

    /// Whether running this command makes `key`'s cached data stale.
    pub fn affects(&self, key: &QueryKey) -> bool {
        match self {
            Self::CreateRule(_)
            | Self::UpdateRule { .. }
            | Self::DeleteRule { .. }
            | Self::ApplyTemplate(_) => matches!(key, QueryKey::Rules),
            Self::AddWhitelist(_) | Self::RemoveWhitelist(_) => matches!(key, QueryKey::Whitelist),
            Self::SetMode { mode, .. } => key == &QueryKey::Mode(*mode),
            Self::ClearLogs(sel) => match key {
                QueryKey::RealtimeLogs { .. } => sel.realtime,
                QueryKey::BlockedLogs { .. } => sel.blocked,
                QueryKey::LogStats => sel.stats,
                // The history view shows both streams.
                QueryKey::AllLogs(_) => sel.realtime || sel.blocked,
                _ => false,
            },
        }
    }
}
