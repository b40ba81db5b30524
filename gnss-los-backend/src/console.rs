///! Operator commands typed on stdin, e.g. `toggle GPS` or `/pause`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*/?(\S+)\s*(.*?)\s*$").unwrap());

pub const HELP: &str = "\
Commands:
  enable <group>    show a constellation
  disable <group>   hide a constellation
  toggle <group>    flip a constellation
  groups            list constellations and their state
  status            show the current visibility table
  pause | resume    stop or restart the simulation clock
  speed <x>         set the clock multiplier
  help              this text
  quit              exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Enable(String),
    Disable(String),
    Toggle(String),
    Groups,
    Status,
    Pause,
    Resume,
    Speed(f64),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid argument '{0}'")]
    InvalidArgument(String),
}

/// Split a line into command word and the rest
fn split_command(line: &str) -> Option<(String, String)> {
    let caps = COMMAND_RE.captures(line)?;
    let command = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
    let args = caps.get(2).map_or("", |m| m.as_str()).to_string();
    Some((command, args))
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let (command, args) = split_command(line).ok_or(CommandError::Empty)?;

    let group = |name: &'static str| {
        if args.is_empty() {
            Err(CommandError::MissingArgument(name))
        } else {
            Ok(args.clone())
        }
    };

    match command.as_str() {
        "enable" | "on" | "show" => group("enable").map(Command::Enable),
        "disable" | "off" | "hide" => group("disable").map(Command::Disable),
        "toggle" | "t" => group("toggle").map(Command::Toggle),
        "groups" | "g" => Ok(Command::Groups),
        "status" | "s" => Ok(Command::Status),
        "pause" => Ok(Command::Pause),
        "resume" | "play" => Ok(Command::Resume),
        "speed" => {
            let value = group("speed")?;
            match value.parse::<f64>() {
                Ok(x) if x.is_finite() && x >= 0.0 => Ok(Command::Speed(x)),
                _ => Err(CommandError::InvalidArgument(value)),
            }
        }
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}
