//! `rampart watch`: keep one view on screen and redraw it on every poll.

use std::io::{self, IsTerminal};
use std::time::Duration;

use rampart_core::{Controller, QueryData, QueryKey, QueryState, RefreshPolicy};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs, WatchTarget};
use crate::error::CliError;
use crate::output;

use super::{logs, rules::RuleRow, whitelist::WhitelistRow};

/// Shortest accepted refresh period.
const MIN_INTERVAL: Duration = Duration::from_millis(500);

fn key_for(args: &WatchArgs) -> QueryKey {
    match args.target {
        WatchTarget::Stats => QueryKey::LogStats,
        WatchTarget::Realtime => QueryKey::RealtimeLogs {
            limit: args.limit,
            include_server: args.server,
        },
        WatchTarget::Blocked => QueryKey::BlockedLogs { limit: args.limit },
        WatchTarget::Rules => QueryKey::Rules,
        WatchTarget::Whitelist => QueryKey::Whitelist,
    }
}

pub(crate) fn parse_interval(raw: &str) -> Result<Duration, CliError> {
    let interval = humantime::parse_duration(raw).map_err(|e| CliError::Validation {
        field: "interval".into(),
        reason: e.to_string(),
    })?;
    if interval < MIN_INTERVAL {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: format!("must be at least {}", humantime::format_duration(MIN_INTERVAL)),
        });
    }
    Ok(interval)
}

fn render_data(global: &GlobalOpts, data: &QueryData) -> String {
    match data {
        QueryData::Rules(rules) => {
            output::render_list(&global.output, rules, |r| RuleRow::from(r), |r| {
                r.rule_id.map_or_else(|| "-".into(), |id| id.to_string())
            })
        }
        QueryData::Whitelist(entries) => output::render_list(
            &global.output,
            entries,
            |e| WhitelistRow::from(e),
            |e| e.ip_address.clone(),
        ),
        QueryData::Mode(status) => {
            output::render_single(&global.output, status, ToString::to_string, ToString::to_string)
        }
        QueryData::RealtimeLogs(page) => logs::render_logs(global, &page.logs),
        QueryData::BlockedLogs(page) => logs::render_logs(global, &page.logs),
        QueryData::AllLogs(page) => logs::render_logs(global, &page.logs),
        QueryData::LogStats(stats) => logs::render_stats(global, stats),
    }
}

fn render_state(global: &GlobalOpts, state: &QueryState, interval: Duration) -> String {
    let mut out = String::new();
    if matches!(global.output, OutputFormat::Table) {
        let when = state
            .updated_at
            .map_or_else(|| "never".into(), |t| t.format("%H:%M:%S").to_string());
        out.push_str(&format!(
            "updated {when}, every {}\n\n",
            humantime::format_duration(interval)
        ));
    }
    if let Some(data) = &state.data {
        out.push_str(&render_data(global, data));
    }
    if let Some(err) = &state.error {
        if !out.is_empty() {
            out.push('\n');
        }
        match err.status {
            Some(status) => out.push_str(&format!("error ({status}): {}", err.message)),
            None => out.push_str(&format!("error: {}", err.message)),
        }
        if err.transient {
            out.push_str(&format!(
                " (retrying in {})",
                humantime::format_duration(interval)
            ));
        }
    }
    out
}

pub async fn handle(
    controller: &Controller,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let key = key_for(&args);
    let interval = match args.interval.as_deref() {
        Some(raw) => parse_interval(raw)?,
        None => controller.config().refresh.for_key(&key),
    };
    let clear_screen =
        matches!(global.output, OutputFormat::Table) && io::stdout().is_terminal();

    tracing::debug!(?key, ?interval, "watching");
    let mut sub = controller.queries().subscribe(key, RefreshPolicy::every(interval));
    let mut shown: u32 = 0;
    let mut last_fetch = 0;

    loop {
        let state = tokio::select! {
            changed = sub.changed() => match changed {
                Some(state) => state,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        };

        // Only redraw once per completed fetch.
        if state.is_fetching || state.fetch_count == last_fetch {
            continue;
        }
        last_fetch = state.fetch_count;

        if clear_screen {
            print!("\x1b[2J\x1b[H");
        }
        output::print_output(&render_state(global, &state, interval), global.quiet);

        shown += 1;
        if args.count.is_some_and(|n| shown >= n) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn interval_parses_human_durations() {
        assert_eq!(parse_interval("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_interval("1m 30s").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn transient_errors_show_retry_hint() {
        use clap::Parser;
        use rampart_core::QueryError;

        let cli = crate::cli::Cli::try_parse_from(["rampart", "watch", "stats"]).unwrap();
        let mut state = QueryState {
            error: Some(QueryError {
                message: "HTTP error 503: Service Unavailable".into(),
                status: Some(503),
                transient: true,
            }),
            ..QueryState::default()
        };
        let text = render_state(&cli.global, &state, Duration::from_secs(5));
        assert!(text.contains("error (503)"), "{text}");
        assert!(text.contains("retrying in 5s"), "{text}");

        state.error = Some(QueryError {
            message: "Session expired. Please log in again.".into(),
            status: Some(401),
            transient: false,
        });
        let text = render_state(&cli.global, &state, Duration::from_secs(5));
        assert!(!text.contains("retrying"), "{text}");
    }

    #[test]
    fn interval_rejects_garbage_and_tiny_values() {
        assert!(matches!(parse_interval("soon"), Err(CliError::Validation { .. })));
        assert!(matches!(parse_interval("10ms"), Err(CliError::Validation { .. })));
    }
}
