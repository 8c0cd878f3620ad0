//! Replaying and recording observation command logs.

use super::command::{Command, CommandError};
use crate::belief::engine::{BeliefEngine, EngineError};
use std::io::{self, BufRead, Write};
use thiserror::Error;

const TARGET: &str = "specter_core::replay";

/// Why a replay finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayStop {
    EndOfInput,
    /// A blank line ends the log; `line` is its 1-based number.
    BlankLine { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub stop: ReplayStop,
}

/// A replay failure. The engine keeps every command applied before `line`.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read command log: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Command {
        line: usize,
        #[source]
        source: CommandError,
    },
    #[error("line {line}: {source}")]
    Engine {
        line: usize,
        #[source]
        source: EngineError,
    },
}

impl ReplayError {
    /// 1-based line of the offending command, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ReplayError::Io(_) => None,
            ReplayError::Command { line, .. } | ReplayError::Engine { line, .. } => Some(*line),
        }
    }
}

/// Applies every command in `reader` to `engine` until end of input or a
/// blank line.
pub fn replay<R: BufRead>(
    engine: &mut BeliefEngine,
    reader: R,
) -> Result<ReplaySummary, ReplayError> {
    replay_with(engine, reader, |_| Ok(()))
}

/// Like [`replay`], echoing each applied command to `recorder`.
pub fn replay_recorded<R: BufRead, W: Write>(
    engine: &mut BeliefEngine,
    reader: R,
    recorder: &mut SessionRecorder<W>,
) -> Result<ReplaySummary, ReplayError> {
    replay_with(engine, reader, |command| recorder.record(command))
}

fn replay_with<R, F>(
    engine: &mut BeliefEngine,
    reader: R,
    mut applied_hook: F,
) -> Result<ReplaySummary, ReplayError>
where
    R: BufRead,
    F: FnMut(&Command) -> io::Result<()>,
{
    let mut applied = 0;
    for (offset, raw) in reader.lines().enumerate() {
        let line = offset + 1;
        let raw = raw?;
        if raw.trim().is_empty() {
            tracing::debug!(target: TARGET, line, applied, "blank line ends replay");
            return Ok(ReplaySummary {
                applied,
                stop: ReplayStop::BlankLine { line },
            });
        }
        let command =
            Command::parse(&raw).map_err(|source| ReplayError::Command { line, source })?;
        engine
            .apply(&command)
            .map_err(|source| ReplayError::Engine { line, source })?;
        applied_hook(&command)?;
        applied += 1;
        tracing::trace!(
            target: TARGET,
            line,
            command = command.name(),
            particles = engine.particle_count(),
            "replayed"
        );
    }
    Ok(ReplaySummary {
        applied,
        stop: ReplayStop::EndOfInput,
    })
}

/// Writes accepted commands, one per line, in their canonical form.
#[derive(Debug)]
pub struct SessionRecorder<W: Write> {
    writer: W,
    recorded: usize,
}

impl<W: Write> SessionRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            recorded: 0,
        }
    }

    pub fn record(&mut self, command: &Command) -> io::Result<()> {
        writeln!(self.writer, "{command}")?;
        self.writer.flush()?;
        self.recorded += 1;
        Ok(())
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
