// ── Controller facade ──
//
// Ties the API client, auth service, and query cache together behind one
// cheaply cloneable handle. Reads go straight to the bindings; writes run as
// `Command`s which notify on success and invalidate affected queries.

use std::sync::Arc;

use rampart_api::{
    ApiClient, BlockedLogs, ClearLogsResponse, ConfigMode, FirewallRule,
    LogFilter, LogPage, LogStats, ModeStatus, Notice, RealtimeLogs, WhitelistEntry,
};
use tracing::{debug, info};

use crate::auth::AuthService;
use crate::command::{Command, CommandResult};
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::query::{QueryClient, QueryKey, RefreshPolicy, Subscription};
use crate::validate;

/// The main entry point for consumers.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ClientConfig,
    api: ApiClient,
    auth: AuthService,
    queries: QueryClient<ApiClient>,
}

impl Controller {
    /// Build the HTTP client from `config`. Does not contact the server.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let api = config.build_api_client()?;
        Ok(Self::with_api_client(config, api))
    }

    /// Use a pre-configured client (custom notifier, redirect, or store).
    pub fn with_api_client(config: ClientConfig, api: ApiClient) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                config,
                auth: AuthService::new(api.clone()),
                queries: QueryClient::new(api.clone()),
                api,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    pub fn queries(&self) -> &QueryClient<ApiClient> {
        &self.inner.queries
    }

    // ── Session ──────────────────────────────────────────────────

    /// Log in with the configured credentials.
    pub async fn authenticate(&self) -> Result<(), CoreError> {
        let creds = self
            .inner
            .config
            .credentials
            .as_ref()
            .ok_or_else(|| CoreError::Config {
                message: "no username configured for this profile".into(),
            })?;

        self.inner
            .auth
            .try_login(&creds.username, &creds.password)
            .await?;
        Ok(())
    }

    /// Stop every subscription's poll task.
    pub fn shutdown(&self) {
        self.inner.queries.shutdown();
    }

    // ── Reads ────────────────────────────────────────────────────

    pub async fn rules(&self) -> Result<Vec<FirewallRule>, CoreError> {
        Ok(self.inner.api.list_rules().await?)
    }

    pub async fn next_rule_id(&self) -> Result<u32, CoreError> {
        Ok(self.inner.api.next_rule_id().await?)
    }

    pub async fn whitelist(&self) -> Result<Vec<WhitelistEntry>, CoreError> {
        Ok(self.inner.api.list_whitelist().await?)
    }

    pub async fn mode(&self, mode: ConfigMode) -> Result<ModeStatus, CoreError> {
        Ok(self.inner.api.get_mode(mode).await?)
    }

    pub async fn realtime_logs(&self, limit: u32, include_server: bool) -> Result<RealtimeLogs, CoreError> {
        Ok(self.inner.api.realtime_logs(limit, include_server).await?)
    }

    pub async fn blocked_logs(&self, limit: u32) -> Result<BlockedLogs, CoreError> {
        Ok(self.inner.api.blocked_logs(limit).await?)
    }

    pub async fn all_logs(&self, filter: &LogFilter) -> Result<LogPage, CoreError> {
        Ok(self.inner.api.all_logs(filter).await?)
    }

    pub async fn log_stats(&self) -> Result<LogStats, CoreError> {
        Ok(self.inner.api.log_stats().await?)
    }

    /// Watch `key`, refreshing at the configured period for its view.
    pub fn subscribe(&self, key: QueryKey) -> Subscription {
        let period = self.inner.config.refresh.for_key(&key);
        self.inner.queries.subscribe(key, RefreshPolicy::every(period))
    }

    // ── Command execution ────────────────────────────────────────

    /// Run a non-destructive command. Destructive ones fail with
    /// [`CoreError::ConfirmationMismatch`]; use
    /// [`execute_confirmed`](Self::execute_confirmed) for those.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if let Some(action) = cmd.confirmation_action() {
            return Err(CoreError::ConfirmationMismatch { action });
        }
        self.run(cmd).await
    }

    /// Run a command after checking the user typed "yes".
    pub async fn execute_confirmed(&self, cmd: Command, typed: &str) -> Result<CommandResult, CoreError> {
        if let Some(action) = cmd.confirmation_action() {
            validate::confirm(&action, typed)?;
        }
        self.run(cmd).await
    }

    async fn run(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        debug!(?cmd, "executing command");
        let outcome = self.apply(&cmd).await;

        // Refetch even on failure so watched views show server truth.
        let queries = &self.inner.queries;
        queries.invalidate_matching(|key| cmd.affects(key)).await;

        let result = outcome?;
        self.inner.api.notify(&Notice::success(result.message()));
        info!(message = result.message(), "command succeeded");
        Ok(result)
    }

    async fn apply(&self, cmd: &Command) -> Result<CommandResult, CoreError> {
        let api = &self.inner.api;
        let done = |message: String| CommandResult::Ok { message };

        match cmd {
            Command::CreateRule(spec) => {
                validate::validate_rule(spec)?;
                let rule_id = api.next_rule_id().await?;
                let resp = api.create_rule(rule_id, spec).await?;
                Ok(CommandResult::RuleCreated {
                    rule_id,
                    message: resp.message_or("Rule added successfully"),
                })
            }
            Command::UpdateRule { rule_id, spec } => {
                validate::validate_rule(spec)?;
                let resp = api.update_rule(*rule_id, spec).await?;
                Ok(done(resp.message_or("Rule updated successfully")))
            }
            Command::DeleteRule { rule_id } => {
                let resp = api.delete_rule(*rule_id).await?;
                Ok(done(resp.message_or("Rule deleted successfully")))
            }
            Command::ApplyTemplate(id) => {
                let template = id.template();
                let mut rule_ids = Vec::with_capacity(template.rules.len());
                for spec in &template.rules {
                    let rule_id = api.next_rule_id().await?;
                    api.create_rule(rule_id, spec).await?;
                    rule_ids.push(rule_id);
                }
                Ok(CommandResult::TemplateApplied {
                    rule_ids,
                    message: format!("Applied {} template", template.name),
                })
            }
            Command::AddWhitelist(ip) => {
                let resp = api.add_whitelist(ip).await?;
                Ok(done(resp.message_or("IP address added to whitelist")))
            }
            Command::RemoveWhitelist(ip) => {
                let resp = api.remove_whitelist(ip).await?;
                Ok(done(resp.message_or("IP address removed from whitelist")))
            }
            Command::SetMode { mode, status } => {
                api.set_mode(*mode, *status).await?;
                let verb = if status.is_on() { "enabled" } else { "disabled" };
                Ok(done(format!("{} mode {verb}", mode.title())))
            }
            Command::ClearLogs(selection) => {
                if selection.is_empty() {
                    return Err(CoreError::validation(
                        "selection",
                        "choose at least one of realtime, blocked, or stats",
                    ));
                }
                let resp = api.clear_logs(*selection).await?;
                let message = if resp.message.trim().is_empty() {
                    "Logs cleared successfully".to_owned()
                } else {
                    resp.message.clone()
                };
                Ok(CommandResult::LogsCleared(ClearLogsResponse { message, ..resp }))
            }
        }
    }
}
