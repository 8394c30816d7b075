//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.
//! Notices from the client core go to stderr so stdout stays parseable.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};
use tracing::debug;

use rampart_api::{Notice, NoticeLevel, Notifier};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled for `stream`.
pub fn should_color(mode: &ColorMode, stream: &impl IsTerminal) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stream.is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Notices ──────────────────────────────────────────────────────────

/// Prints client-core notices to stderr.
pub struct StderrNotifier {
    color: bool,
    quiet: bool,
    muted: AtomicBool,
}

impl StderrNotifier {
    pub fn new(mode: &ColorMode, quiet: bool) -> Self {
        Self {
            color: should_color(mode, &io::stderr()),
            quiet,
            muted: AtomicBool::new(false),
        }
    }

    /// Drop non-error notices until unmuted (the implicit per-command login).
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }
}

impl Notifier for StderrNotifier {
    fn notify(&self, notice: &Notice) {
        // Failures surface as the command's diagnostic or in the watch view.
        if notice.level == NoticeLevel::Error {
            debug!(notice = %notice.message, "error notice");
            return;
        }
        if self.quiet || self.muted.load(Ordering::Relaxed) {
            return;
        }
        let mark = match notice.level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Warning => "!",
            NoticeLevel::Info | NoticeLevel::Error => "•",
        };
        let line = if self.color {
            match notice.level {
                NoticeLevel::Success => format!("{} {}", mark.green(), notice.message),
                NoticeLevel::Warning => format!("{} {}", mark.yellow(), notice.message),
                NoticeLevel::Info | NoticeLevel::Error => {
                    format!("{} {}", mark.cyan(), notice.message)
                }
            }
        } else {
            format!("{mark} {}", notice.message)
        };
        let _ = writeln!(io::stderr().lock(), "{line}");
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted
/// string, since detail views don't use the `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return "(none)".into();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: {e}"))
}
