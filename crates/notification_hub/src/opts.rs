use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

/// Struct that gets generated from `RawOpt`.
#[derive(Debug, PartialEq)]
pub struct Opt {
    pub log_debug: bool,
    pub config_path: Option<std::path::PathBuf>,
    pub action: Action,
}

#[derive(Parser, Debug, PartialEq)]
#[command(author = "xi", version, about)]
pub struct RawOpt {
    /// Write out debug logs.
    #[arg(long = "debug", global = true)]
    log_debug: bool,

    /// override path to configuration directory (directory that contains config.json)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Action {
    /// Generate a shell completion script
    ShellCompletions {
        #[arg(short, long)]
        shell: clap_complete::Shell,
    },

    /// Run the notification server in the foreground.
    #[command(name = "daemon", alias = "d")]
    Daemon,

    #[command(flatten)]
    Client(ActionClient),
}

/// Actions that talk to a running server over D-Bus.
#[derive(Subcommand, Debug, PartialEq)]
pub enum ActionClient {
    /// Print the number of open notifications
    #[command(name = "count")]
    Count,

    /// Print the number of open notifications, and again whenever it changes
    #[command(name = "watch")]
    Watch,

    /// List the open notifications
    #[command(name = "list", alias = "ls")]
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Close a notification, as if the sending application asked for it
    #[command(name = "close")]
    Close { id: u32 },

    /// Dismiss a notification, as if the user clicked it away
    #[command(name = "dismiss", alias = "rm")]
    Dismiss { id: u32 },

    /// Invoke an action of a notification
    #[command(name = "invoke")]
    Invoke { id: u32, action_key: String },

    /// Mark all threads as seen
    #[command(name = "ack")]
    Acknowledge,

    /// Print the server information and capabilities
    #[command(name = "info")]
    Info,

    /// Send a notification
    #[command(name = "notify", alias = "send")]
    Notify(NotifyArgs),
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct NotifyArgs {
    /// Application name to send as
    #[arg(short, long = "app", default_value = "notification-hub")]
    pub app_name: String,

    /// Id of a notification to replace
    #[arg(short, long, default_value_t = 0)]
    pub replaces: u32,

    /// Icon name or path
    #[arg(short, long, default_value = "")]
    pub icon: String,

    /// Expiry in milliseconds, -1 for the server default, 0 for never
    #[arg(short = 't', long = "timeout", default_value_t = -1, allow_negative_numbers = true)]
    pub expire_timeout: i32,

    /// key=value hint; `true`/`false` and integers are sent as such, everything else as a string
    #[arg(long = "hint", value_parser = parse_hint_arg)]
    pub hints: Vec<(String, HintArg)>,

    /// key=label action
    #[arg(long = "action", value_parser = crate::util::parse_key_value)]
    pub actions: Vec<(String, String)>,

    pub summary: String,

    #[arg(default_value = "")]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintArg {
    Bool(bool),
    Int(i32),
    Str(String),
}

impl Opt {
    pub fn from_env() -> Self {
        let raw: RawOpt = RawOpt::parse();
        raw.into()
    }
}

impl From<RawOpt> for Opt {
    fn from(other: RawOpt) -> Self {
        let RawOpt { action, log_debug, config } = other;
        Opt { action, log_debug, config_path: config }
    }
}

fn parse_hint_arg(s: &str) -> Result<(String, HintArg)> {
    let (key, value) = crate::util::parse_key_value(s)?;
    if key.is_empty() {
        bail!("hint names can't be empty: {}", s);
    }
    let value = match value.as_str() {
        "true" => HintArg::Bool(true),
        "false" => HintArg::Bool(false),
        other => other.parse().map(HintArg::Int).unwrap_or(HintArg::Str(value)),
    };
    Ok((key, value))
}
