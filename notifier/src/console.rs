//! Line-oriented console control for the headless binary.
//!
//! Each line typed on stdin becomes an [`AppEvent`] posted to the
//! controller. List and row numbers are 1-based, as printed.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::events::{AppEvent, ListPosition};
use crate::scheduler::DeferredCallScheduler;

pub const HELP: &str = "\
commands:
  reload                   reload followed channels now
  select online|offline N  show info for the N-th channel of a list
  open online|offline N    open the N-th channel of a list in the browser
  event N                  open the channel of the N-th event, newest first
  list                     show channel lists and recent events
  quit                     exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Post(AppEvent),
    Help,
}

/// Parse one console line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let event = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("reload", []) => AppEvent::ReloadChannels,
        ("list", []) => AppEvent::ListChannels,
        ("quit" | "exit", []) => AppEvent::Shutdown,
        ("help" | "?", []) => return Ok(Some(ConsoleCommand::Help)),
        ("select", [list, n]) => AppEvent::SelectChannel(parse_position(list, n)?),
        ("open", [list, n]) => AppEvent::ActivateChannel(parse_position(list, n)?),
        ("event", [n]) => AppEvent::OpenTimelineEntry(parse_row(n)?),
        _ => return Err(format!("Unrecognized command '{}', try 'help'", line.trim())),
    };
    Ok(Some(ConsoleCommand::Post(event)))
}

fn parse_position(list: &str, n: &str) -> Result<ListPosition, String> {
    let index = parse_row(n)?;
    match list.to_ascii_lowercase().as_str() {
        "online" => Ok(ListPosition::online(index)),
        "offline" => Ok(ListPosition::offline(index)),
        other => Err(format!("Unknown list '{other}', expected online or offline")),
    }
}

fn parse_row(n: &str) -> Result<usize, String> {
    match n.parse::<usize>() {
        Ok(row) if row >= 1 => Ok(row - 1),
        _ => Err(format!("Expected a number from 1, got '{n}'")),
    }
}

/// Read commands from `reader` until EOF or shutdown.
pub async fn read_commands<R>(reader: R, scheduler: DeferredCallScheduler<AppEvent>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Console read failed: {e}");
                break;
            }
        };
        match parse_command(&line) {
            Ok(Some(ConsoleCommand::Post(event))) => {
                if !scheduler.post(event) {
                    break;
                }
            }
            Ok(Some(ConsoleCommand::Help)) => tracing::info!("\n{HELP}"),
            Ok(None) => {}
            Err(e) => tracing::warn!("{e}"),
        }
    }
    tracing::debug!("Console input closed");
}

/// Spawn a task reading commands from stdin.
pub fn spawn_stdin(scheduler: DeferredCallScheduler<AppEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(read_commands(BufReader::new(tokio::io::stdin()), scheduler))
}
