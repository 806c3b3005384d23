//! Console control surface.
//!
//! Reads one command per line from stdin and forwards it to the event loop.
//! Parsing is separate from reading so it can be tested directly.

use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::thread;

use crate::pattern::{Pattern, UnknownPattern};

/// A request for the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    SetInterval(u64),
    SetPattern(Pattern),
    SetDistance(u32),
    Status,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("{0} expects an argument")]
    MissingArgument(&'static str),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error(transparent)]
    Pattern(#[from] UnknownPattern),
}

pub const HELP: &str = "commands: toggle | interval <secs> | pattern <linear|circular> \
                        | distance <px> | status | quit";

/// Parses one console line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let command = match head.to_ascii_lowercase().as_str() {
        "toggle" | "t" => Command::Toggle,
        "interval" | "i" => Command::SetInterval(number(arg, "interval")?),
        "pattern" | "p" => {
            Command::SetPattern(arg.ok_or(ParseError::MissingArgument("pattern"))?.parse()?)
        }
        "distance" | "d" => Command::SetDistance(number(arg, "distance")?),
        "status" | "s" => Command::Status,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_owned())),
    };
    Ok(Some(command))
}

fn number<T: std::str::FromStr>(arg: Option<&str>, name: &'static str) -> Result<T, ParseError> {
    let arg = arg.ok_or(ParseError::MissingArgument(name))?;
    arg.parse()
        .map_err(|_| ParseError::InvalidNumber(arg.to_owned()))
}

/// Spawns the stdin reader. EOF on stdin is not a quit request: the daemon
/// keeps running detached from a terminal.
pub fn spawn_console(tx: Sender<Command>) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new().name("console".into()).spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::debug!("control: stdin read failed: {e}");
                    break;
                }
            };
            match parse_line(&line) {
                Ok(Some(cmd)) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("{e}\n{HELP}"),
            }
        }
        log::debug!("control: console input closed");
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        assert_eq!(parse_line("toggle"), Ok(Some(Command::Toggle)));
        assert_eq!(parse_line("interval 60"), Ok(Some(Command::SetInterval(60))));
        assert_eq!(
            parse_line("pattern circular"),
            Ok(Some(Command::SetPattern(Pattern::Circular)))
        );
        assert_eq!(parse_line("distance 4"), Ok(Some(Command::SetDistance(4))));
        assert_eq!(parse_line("status"), Ok(Some(Command::Status)));
        assert_eq!(parse_line("quit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn accepts_short_forms_and_case() {
        assert_eq!(parse_line("  T "), Ok(Some(Command::Toggle)));
        assert_eq!(parse_line("I 10"), Ok(Some(Command::SetInterval(10))));
        assert_eq!(
            parse_line("p Linear"),
            Ok(Some(Command::SetPattern(Pattern::Linear)))
        );
    }

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse_line("   "), Ok(None));
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!(
            parse_line("jump"),
            Err(ParseError::UnknownCommand("jump".into()))
        );
        assert_eq!(
            parse_line("interval"),
            Err(ParseError::MissingArgument("interval"))
        );
        assert_eq!(
            parse_line("distance -1"),
            Err(ParseError::InvalidNumber("-1".into()))
        );
        assert!(matches!(
            parse_line("pattern zigzag"),
            Err(ParseError::Pattern(_))
        ));
    }
}
