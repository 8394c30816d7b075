//! Clap derive structures for the `rampart` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Compiled by `build.rs` as well, so it depends on clap alone.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rampart -- administer a firewall API from the command line
#[derive(Debug, Parser)]
#[command(
    name = "rampart",
    version,
    about = "Administer a firewall host from the command line",
    long_about = "Manage firewall rules, the IP whitelist, lockdown and stealth modes,\n\
        and traffic logs on a remote firewall admin API.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "RAMPART_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, short = 'a', env = "RAMPART_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Login username (overrides profile)
    #[arg(long, short = 'u', env = "RAMPART_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "RAMPART_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "RAMPART_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "RAMPART_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session
    Login,

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Manage firewall rules
    #[command(alias = "r")]
    Rules(RulesArgs),

    /// Manage the IP whitelist
    #[command(alias = "wl")]
    Whitelist(WhitelistArgs),

    /// Read or toggle lockdown and stealth modes
    Mode(ModeArgs),

    /// Inspect and clear traffic logs
    Logs(LogsArgs),

    /// Live view that refreshes on an interval
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RULES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// List all rules
    #[command(alias = "ls")]
    List,

    /// Show the id the next rule will get
    NextId,

    /// Create a rule under the next free id
    Add(RuleArgs),

    /// Replace an existing rule
    Update {
        /// Rule id
        id: u32,

        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Delete a rule
    #[command(alias = "rm")]
    Delete {
        /// Rule id
        id: u32,
    },

    /// List built-in rule templates
    Templates,

    /// Create every rule in a built-in template
    ApplyTemplate {
        /// Template name (see `rules templates`)
        name: String,
    },
}

/// Fields of one rule.
#[derive(Debug, Args)]
pub struct RuleArgs {
    /// Allow or deny matching traffic
    #[arg(long, value_enum)]
    pub action: RuleActionArg,

    /// Traffic direction
    #[arg(long, value_enum, default_value = "in")]
    pub direction: DirectionArg,

    /// Protocol
    #[arg(long, value_enum, default_value = "tcp")]
    pub protocol: ProtocolArg,

    /// Port (0 = all ports)
    #[arg(long, default_value = "0")]
    pub port: u16,

    /// Host or address the rule applies to
    #[arg(long)]
    pub host: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RuleActionArg {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProtocolArg {
    Tcp,
    Udp,
    All,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WHITELIST
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WhitelistArgs {
    #[command(subcommand)]
    pub command: WhitelistCommand,
}

#[derive(Debug, Subcommand)]
pub enum WhitelistCommand {
    /// List whitelisted addresses
    #[command(alias = "ls")]
    List,

    /// Whitelist an IPv4 address
    Add {
        /// Dotted-quad IPv4 address
        ip: String,
    },

    /// Remove an address from the whitelist
    #[command(alias = "rm")]
    Remove {
        /// Dotted-quad IPv4 address
        ip: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MODES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ModeArgs {
    #[command(subcommand)]
    pub command: ModeCommand,
}

#[derive(Debug, Subcommand)]
pub enum ModeCommand {
    /// Show mode status (all modes when none is given)
    Get {
        #[arg(value_enum)]
        mode: Option<ModeArg>,
    },

    /// Turn a mode on or off
    Set {
        #[arg(value_enum)]
        mode: ModeArg,

        #[arg(value_enum)]
        state: SwitchArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Drop everything not explicitly allowed
    Lockdown,
    /// Hide the host from scans
    Stealth,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SwitchArg {
    On,
    Off,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// Most recent traffic
    Realtime {
        /// Max entries
        #[arg(long, short = 'l', default_value = "50")]
        limit: u32,

        /// Include the server's own traffic
        #[arg(long)]
        server: bool,
    },

    /// Most recent blocked traffic
    Blocked {
        /// Max entries
        #[arg(long, short = 'l', default_value = "50")]
        limit: u32,
    },

    /// Search the full log history
    All(LogFilterArgs),

    /// Allowed/blocked totals and chart data
    Stats,

    /// Delete stored logs
    Clear {
        /// Clear realtime logs
        #[arg(long)]
        realtime: bool,

        /// Clear blocked logs
        #[arg(long)]
        blocked: bool,

        /// Reset statistics
        #[arg(long)]
        stats: bool,

        /// Clear everything
        #[arg(long, conflicts_with_all = ["realtime", "blocked", "stats"])]
        all: bool,
    },
}

#[derive(Debug, Args)]
pub struct LogFilterArgs {
    /// Max entries per page
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,

    /// Pagination offset
    #[arg(long)]
    pub offset: Option<u32>,

    /// Only entries with this action
    #[arg(long, value_enum)]
    pub action: Option<RuleActionArg>,

    /// Protocol name or number
    #[arg(long)]
    pub protocol: Option<String>,

    /// Source address
    #[arg(long)]
    pub src_ip: Option<String>,

    /// Destination address
    #[arg(long)]
    pub dst_ip: Option<String>,

    /// Lowest port
    #[arg(long)]
    pub min_port: Option<u16>,

    /// Highest port
    #[arg(long)]
    pub max_port: Option<u16>,

    /// Earliest date (as the server accepts it, e.g. 2025-03-01)
    #[arg(long)]
    pub from: Option<String>,

    /// Latest date
    #[arg(long)]
    pub to: Option<String>,

    /// Include the server's own traffic
    #[arg(long)]
    pub server: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// What to watch
    #[arg(value_enum)]
    pub target: WatchTarget,

    /// Refresh period, e.g. "5s" or "1m" (default depends on the view)
    #[arg(long, short = 'i')]
    pub interval: Option<String>,

    /// Max log entries (realtime and blocked views)
    #[arg(long, short = 'l', default_value = "50")]
    pub limit: u32,

    /// Include the server's own traffic (realtime view)
    #[arg(long)]
    pub server: bool,

    /// Exit after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WatchTarget {
    Stats,
    Realtime,
    Blocked,
    Rules,
    Whitelist,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key (api_url, username, password_env, insecure, timeout, ca_cert, session_file)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
