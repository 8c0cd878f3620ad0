//! Typed operator commands and their one-line textual form.

use crate::model::compass::{Compass, CompassError};
use crate::model::position::{Coordinate, PositionError};
use core::fmt;
use core::str::FromStr;
use thiserror::Error;

/// One operator command, as recorded in a session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Propagate,
    /// `at` is unknown when no observer saw the entity.
    Spotted {
        at: Coordinate,
        observers: Vec<Coordinate>,
    },
    LastSeen {
        at: Coordinate,
        observers: Vec<Coordinate>,
    },
    Motion {
        sensor: Coordinate,
        direction: Option<Compass>,
    },
    Sniffed {
        hunter: Coordinate,
        detected: bool,
    },
    Mission {
        objective: Coordinate,
    },
    Precognition,
    Postcognition {
        at: Coordinate,
    },
    Flash {
        at: Coordinate,
    },
    Smoke {
        at: Coordinate,
    },
    Unique,
    Hidden,
    Identity {
        is_target: bool,
    },
}

impl Command {
    pub const NAMES: [&'static str; 13] = [
        "propagate",
        "spotted",
        "last_seen",
        "motion",
        "sniffed",
        "mission",
        "precog",
        "postcog",
        "flash",
        "smoke",
        "unique",
        "hidden",
        "bluejay",
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Command::Propagate => "propagate",
            Command::Spotted { .. } => "spotted",
            Command::LastSeen { .. } => "last_seen",
            Command::Motion { .. } => "motion",
            Command::Sniffed { .. } => "sniffed",
            Command::Mission { .. } => "mission",
            Command::Precognition => "precog",
            Command::Postcognition { .. } => "postcog",
            Command::Flash { .. } => "flash",
            Command::Smoke { .. } => "smoke",
            Command::Unique => "unique",
            Command::Hidden => "hidden",
            Command::Identity { .. } => "bluejay",
        }
    }

    /// Parses one log line. Leading and trailing whitespace is ignored.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = Tokens::new(line);
        let name = tokens.next().ok_or(CommandError::Empty)?;
        let command = match name {
            "propagate" => Command::Propagate,
            "spotted" => {
                let at = tokens.position("agent position")?;
                let observers = tokens.positions("observer position")?;
                Command::Spotted { at, observers }
            }
            "last_seen" => {
                let at = tokens.position("agent position")?;
                let observers = tokens.positions("observer position")?;
                Command::LastSeen { at, observers }
            }
            "motion" => {
                let sensor = tokens.on_board("sensor position")?;
                let raw = tokens.require("direction")?;
                let direction = if raw.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(raw.parse::<Compass>()?)
                };
                Command::Motion { sensor, direction }
            }
            "sniffed" => {
                let hunter = tokens.on_board("hunter position")?;
                let detected = tokens.flag("detected")?;
                Command::Sniffed { hunter, detected }
            }
            "mission" => Command::Mission {
                objective: tokens.on_board("objective position")?,
            },
            "precog" => Command::Precognition,
            "postcog" => Command::Postcognition {
                at: tokens.on_board("agent position")?,
            },
            "flash" => Command::Flash {
                at: tokens.on_board("grenade position")?,
            },
            "smoke" => Command::Smoke {
                at: tokens.on_board("grenade position")?,
            },
            "unique" => Command::Unique,
            "hidden" => Command::Hidden,
            "bluejay" => Command::Identity {
                is_target: tokens.flag("identity")?,
            },
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        tokens.finish()?;
        Ok(command)
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            Command::Propagate
            | Command::Precognition
            | Command::Unique
            | Command::Hidden => Ok(()),
            Command::Spotted { at, observers } | Command::LastSeen { at, observers } => {
                write!(f, " {at}")?;
                for observer in observers {
                    write!(f, " {observer}")?;
                }
                Ok(())
            }
            Command::Motion { sensor, direction } => match direction {
                Some(direction) => write!(f, " {sensor} {direction}"),
                None => write!(f, " {sensor} none"),
            },
            Command::Sniffed { hunter, detected } => {
                write!(f, " {hunter} {}", flag_token(*detected))
            }
            Command::Mission { objective } => write!(f, " {objective}"),
            Command::Postcognition { at } | Command::Flash { at } | Command::Smoke { at } => {
                write!(f, " {at}")
            }
            Command::Identity { is_target } => write!(f, " {}", flag_token(*is_target)),
        }
    }
}

fn flag_token(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

struct Tokens<'a> {
    inner: core::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            inner: line.split_whitespace(),
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next()
    }

    fn require(&mut self, argument: &'static str) -> Result<&'a str, CommandError> {
        self.next().ok_or(CommandError::MissingArgument(argument))
    }

    fn position(&mut self, argument: &'static str) -> Result<Coordinate, CommandError> {
        let token = self.require(argument)?;
        Ok(Coordinate::parse(token)?)
    }

    fn on_board(&mut self, argument: &'static str) -> Result<Coordinate, CommandError> {
        let coord = self.position(argument)?;
        if !coord.on_board() {
            return Err(CommandError::UnknownPosition(argument));
        }
        Ok(coord)
    }

    /// One or more on-board positions, consuming the rest of the line.
    fn positions(&mut self, argument: &'static str) -> Result<Vec<Coordinate>, CommandError> {
        let mut positions = vec![self.on_board(argument)?];
        while let Some(token) = self.next() {
            let coord = Coordinate::parse(token)?;
            if !coord.on_board() {
                return Err(CommandError::UnknownPosition(argument));
            }
            positions.push(coord);
        }
        Ok(positions)
    }

    fn flag(&mut self, argument: &'static str) -> Result<bool, CommandError> {
        let token = self.require(argument)?;
        match token.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(CommandError::InvalidFlag(token.to_string())),
        }
    }

    fn finish(mut self) -> Result<(), CommandError> {
        match self.next() {
            Some(extra) => Err(CommandError::UnexpectedArgument(extra.to_string())),
            None => Ok(()),
        }
    }
}

/// Errors raised while parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("{0} must be a board position, not '??'")]
    UnknownPosition(&'static str),
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error(transparent)]
    Direction(#[from] CompassError),
    #[error("expected True or False, found '{0}'")]
    InvalidFlag(String),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}
