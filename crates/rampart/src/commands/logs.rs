//! Traffic log command handlers.

use std::fmt::Write as _;

use tabled::Tabled;

use rampart_api::{ClearSelection, LogAction, LogEntry, LogFilter, LogStats};
use rampart_core::{Command as CoreCommand, CommandResult, Controller};

use crate::cli::{GlobalOpts, LogFilterArgs, LogsArgs, LogsCommand, OutputFormat, RuleActionArg};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Log table row ───────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct LogRow {
    #[tabled(rename = "Time")]
    timestamp: String,
    #[tabled(rename = "Action")]
    action: &'static str,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

fn endpoint(ip: &str, port: Option<u16>) -> String {
    match port {
        Some(p) => format!("{ip}:{p}"),
        None => ip.to_owned(),
    }
}

impl From<&LogEntry> for LogRow {
    fn from(e: &LogEntry) -> Self {
        Self {
            timestamp: e.timestamp.clone(),
            action: e.action.as_str(),
            protocol: e.protocol_name().to_owned(),
            source: endpoint(&e.src_ip, e.src_port),
            destination: endpoint(&e.dst_ip, e.dst_port),
            reason: e.reason.clone(),
        }
    }
}

pub(crate) fn render_logs(global: &GlobalOpts, logs: &[LogEntry]) -> String {
    output::render_list(
        &global.output,
        logs,
        |e| LogRow::from(e),
        |e| format!("{} {} {} -> {}", e.timestamp, e.action.as_str(), e.src_ip, e.dst_ip),
    )
}

// ── Stats detail ────────────────────────────────────────────────────

pub(crate) fn stats_detail(s: &LogStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Allowed:  {}", s.stats.allowed);
    let _ = writeln!(out, "Blocked:  {}", s.stats.blocked);
    let _ = write!(out, "Total:    {}", s.stats.total());
    if !s.stats.blocked_details.is_empty() {
        let _ = write!(out, "\n\nBlocked by reason:");
        for d in &s.stats.blocked_details {
            let _ = write!(out, "\n  {:<24} {}", d.reason, d.count);
        }
    }
    for set in &s.chart_data.datasets {
        let _ = write!(out, "\n\n{}:", set.label);
        for (label, value) in s.chart_data.labels.iter().zip(&set.data) {
            let _ = write!(out, "\n  {label:<24} {value}");
        }
    }
    out
}

pub(crate) fn render_stats(global: &GlobalOpts, stats: &LogStats) -> String {
    output::render_single(&global.output, stats, stats_detail, |s| {
        format!("{} {} {}", s.stats.allowed, s.stats.blocked, s.stats.total())
    })
}

// ── Filter mapping ──────────────────────────────────────────────────

fn to_filter(args: LogFilterArgs) -> LogFilter {
    LogFilter {
        limit: args.limit,
        offset: args.offset,
        action: args.action.map(|a| match a {
            RuleActionArg::Allow => LogAction::Allow,
            RuleActionArg::Deny => LogAction::Deny,
        }),
        protocol: args.protocol,
        src_ip: args.src_ip,
        dst_ip: args.dst_ip,
        min_port: args.min_port,
        max_port: args.max_port,
        date_from: args.from,
        date_to: args.to,
        srv: args.server.then_some(true),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LogsCommand::Realtime { limit, server } => {
            let page = controller.realtime_logs(limit, server).await?;
            output::print_output(&render_logs(global, &page.logs), global.quiet);
            Ok(())
        }

        LogsCommand::Blocked { limit } => {
            let page = controller.blocked_logs(limit).await?;
            output::print_output(&render_logs(global, &page.logs), global.quiet);
            Ok(())
        }

        LogsCommand::All(filter) => {
            let page = controller.all_logs(&to_filter(filter)).await?;
            output::print_output(&render_logs(global, &page.logs), global.quiet);
            if !global.quiet && matches!(global.output, OutputFormat::Table) {
                let end = u64::from(page.offset) + page.logs.len() as u64;
                eprintln!("Showing {}-{end} of {}", page.offset, page.total);
            }
            Ok(())
        }

        LogsCommand::Stats => {
            let stats = controller.log_stats().await?;
            output::print_output(&render_stats(global, &stats), global.quiet);
            Ok(())
        }

        LogsCommand::Clear {
            realtime,
            blocked,
            stats,
            all,
        } => {
            let selection = if all {
                ClearSelection::ALL
            } else {
                ClearSelection {
                    realtime,
                    blocked,
                    stats,
                }
            };
            if selection.is_empty() {
                return Err(CliError::Validation {
                    field: "selection".into(),
                    reason: "pass --realtime, --blocked, --stats, or --all".into(),
                });
            }
            let result = util::execute(controller, CoreCommand::ClearLogs(selection), global).await?;
            // Table mode already showed the success notice.
            if let CommandResult::LogsCleared(resp) = result
                && !matches!(global.output, OutputFormat::Table)
            {
                let out = output::render_single(
                    &global.output,
                    &resp,
                    |r| r.message.clone(),
                    |r| r.status.clone(),
                );
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }
    }
}
