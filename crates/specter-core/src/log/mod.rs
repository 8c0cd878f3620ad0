pub mod command;
pub mod replay;

pub use command::{Command, CommandError};
pub use replay::{ReplayError, ReplayStop, ReplaySummary, SessionRecorder, replay, replay_recorded};
