//! §6 CLI surface: "specified only where tests depend on it" — a thin
//! interface-side driver, not a general chat client.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "genesis",
    about = "Discovers one agent offering a service and relays messages to it over RPC"
)]
pub struct CliArgs {
    /// `service_name` the target agent advertises.
    #[arg(long)]
    pub select_service: String,

    /// Require the target agent's advertised `name` to match exactly.
    #[arg(long)]
    pub select_name: Option<String>,

    /// Address the first matching agent observed, instead of waiting out
    /// the full `--max-wait` window for a better candidate to appear.
    #[arg(long)]
    pub select_first: bool,

    /// A message to send; repeatable, sent in the order given.
    #[arg(long = "message", action = clap::ArgAction::Append)]
    pub messages: Vec<String>,

    /// Newline-delimited messages, appended after any `--message` values.
    /// Blank lines are skipped.
    #[arg(long)]
    pub messages_file: Option<PathBuf>,

    /// Seconds to wait for a matching agent advertisement (DISCOVERY_TIMEOUT
    /// past this).
    #[arg(long, default_value_t = 5)]
    pub max_wait: u64,

    /// Seconds allowed for the first RPC round trip (BIND_TIMEOUT past
    /// this).
    #[arg(long, default_value_t = 5)]
    pub connect_timeout: u64,

    /// Seconds allowed for each subsequent RPC round trip.
    #[arg(long, default_value_t = 30)]
    pub request_timeout: u64,

    /// Seconds to sleep between sending consecutive messages.
    #[arg(long, default_value_t = 0)]
    pub sleep_between: u64,

    /// Repeatable; raises log verbosity (info -> debug -> trace).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// All messages to send, in order: `--message` values first, then
    /// non-blank lines from `--messages-file`.
    pub fn all_messages(&self) -> anyhow::Result<Vec<String>> {
        let mut messages = self.messages.clone();
        if let Some(path) = &self.messages_file {
            let content = std::fs::read_to_string(path)?;
            messages.extend(content.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from));
        }
        Ok(messages)
    }
}
