use std::str::FromStr;

use anyhow::{Result, anyhow};
use display::{Display, State};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// A line typed on stdin while the matrix is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `stopped`, `running` or `killed`.
    State(State),
    /// `show <window>`
    Show(String),
    /// `windows`
    Windows,
    /// `dump`
    Dump,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or_else(|| anyhow!("empty command"))?;
        match (command, words.next()) {
            ("show", Some(name)) => Ok(Self::Show(name.to_owned())),
            ("show", None) => Err(anyhow!("usage: show <window>")),
            ("windows", None) => Ok(Self::Windows),
            ("dump", None) => Ok(Self::Dump),
            (state, None) => State::from_str(state)
                .map(Self::State)
                .map_err(|_| anyhow!("unknown command {state:?}")),
            _ => Err(anyhow!("unexpected arguments in {line:?}")),
        }
    }
}

/// Applies commands read from stdin until the display loop exits. Closing
/// stdin leaves the display running.
pub async fn run(display: &Display) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => apply(display, command).await,
            Err(err) => warn!("{err}"),
        }
        if display.is_terminated() {
            return Ok(());
        }
    }
    info!("console input closed");
    display.closed().await;
    Ok(())
}

async fn apply(display: &Display, command: Command) {
    match command {
        Command::State(state) => display.set_state(state).await,
        Command::Show(name) => match display.set_foreground(&name) {
            Ok(()) => info!(%name, "window brought to the foreground"),
            Err(err) => warn!("{err}"),
        },
        Command::Windows => {
            let mut names = display.windows();
            names.sort();
            let foreground = display.foreground();
            info!(windows = ?names, %foreground, "registered windows");
        }
        Command::Dump => {
            let mut out = Vec::new();
            match display.debug(&mut out, "console") {
                Ok(()) => info!("\n{}", String::from_utf8_lossy(&out)),
                Err(err) => warn!("failed to dump display state: {err}"),
            }
        }
    }
}
