//! Line-based control commands read from stdin while `artrec run` is active.

use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use artrec_core::{Control, MergeMode, Mode};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub const HELP: &str =
    "commands: mode <0|1|2|idle|record|playback>, timeline <name>, merge <ltp|htp>, loop <on|off>, status, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Mode(Mode),
    Timeline(String),
    Merge(MergeMode),
    Loop(bool),
    Status,
    Quit,
}

impl FromStr for Request {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };
        let request = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("mode", arg) if !arg.is_empty() => Request::Mode(arg.parse()?),
            ("timeline", arg) if !arg.is_empty() => Request::Timeline(arg.to_string()),
            ("merge", arg) if !arg.is_empty() => Request::Merge(arg.parse()?),
            ("loop", arg) if !arg.is_empty() => Request::Loop(parse_switch(arg)?),
            ("status", "") => Request::Status,
            ("quit" | "exit", "") => Request::Quit,
            _ => bail!("unrecognised command '{line}'"),
        };
        Ok(request)
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(anyhow!("expected on or off, got '{other}'")),
    }
}

/// Forward stdin commands to the reactor until `quit` or end of input.
///
/// `status` replies are printed to stdout as one JSON line.
pub async fn read_commands(tx: mpsc::Sender<Control>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("stdin closed, control commands disabled");
                return;
            }
            Err(err) => {
                warn!(error = %err, "failed to read control command");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let request = match line.parse::<Request>() {
            Ok(request) => request,
            Err(err) => {
                eprintln!("error: {err}");
                eprintln!("hint: {HELP}");
                continue;
            }
        };

        let control = match request {
            Request::Mode(mode) => Control::SetMode(mode),
            Request::Timeline(name) => Control::SelectTimeline(name),
            Request::Merge(mode) => Control::SetMergeMode(mode),
            Request::Loop(enabled) => Control::SetLoop(enabled),
            Request::Quit => {
                let _ = tx.send(Control::Shutdown).await;
                return;
            }
            Request::Status => {
                let (reply, rx) = oneshot::channel();
                if tx.send(Control::Status(reply)).await.is_err() {
                    return;
                }
                if let Ok(state) = rx.await {
                    match serde_json::to_string(&state) {
                        Ok(json) => println!("{json}"),
                        Err(err) => warn!(error = %err, "failed to encode status"),
                    }
                }
                continue;
            }
        };
        if tx.send(control).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use artrec_core::{MergeMode, Mode};

    use super::Request;

    #[test]
    fn parses_mode_by_number_and_name() {
        assert_eq!("mode 1".parse::<Request>().unwrap(), Request::Mode(Mode::Record));
        assert_eq!(
            "MODE playback".parse::<Request>().unwrap(),
            Request::Mode(Mode::Playback)
        );
        assert!("mode 7".parse::<Request>().is_err());
        assert!("mode".parse::<Request>().is_err());
    }

    #[test]
    fn timeline_name_keeps_inner_spaces() {
        assert_eq!(
            "timeline  my show.jsonl ".parse::<Request>().unwrap(),
            Request::Timeline("my show.jsonl".to_string())
        );
    }

    #[test]
    fn parses_settings() {
        assert_eq!(
            "merge htp".parse::<Request>().unwrap(),
            Request::Merge(MergeMode::Htp)
        );
        assert_eq!("loop on".parse::<Request>().unwrap(), Request::Loop(true));
        assert_eq!("loop off".parse::<Request>().unwrap(), Request::Loop(false));
        assert!("loop maybe".parse::<Request>().is_err());
    }

    #[test]
    fn parses_bare_verbs() {
        assert_eq!("status".parse::<Request>().unwrap(), Request::Status);
        assert_eq!("quit".parse::<Request>().unwrap(), Request::Quit);
        assert!("status now".parse::<Request>().is_err());
        assert!("jump".parse::<Request>().is_err());
    }
}
