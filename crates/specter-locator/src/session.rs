//! Interactive operator loop over a belief engine.

use std::io::{self, BufRead, Write};

use specter_core::belief::{BeliefEngine, BeliefSummary, EngineError};
use specter_core::log::{
    Command, CommandError, ReplayError, ReplaySummary, SessionRecorder, replay, replay_recorded,
};
use specter_core::model::{Coordinate, PositionError};
use thiserror::Error;

use crate::render;

const TARGET: &str = "specter_locator::session";

/// A diagnostic request that never touches the belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    LineOfSight(Coordinate),
    Inspect(usize),
    Top(Option<usize>),
    Status,
    Map,
    Json,
    Reset,
    Quit,
}

impl Query {
    /// Recognises a query line; `None` means the line is a log command.
    pub fn parse(line: &str) -> Option<Result<Query, SessionError>> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?;
        let argument = tokens.next();
        let query = match name {
            "los" => argument
                .ok_or(SessionError::MissingArgument("observer position"))
                .and_then(|token| Coordinate::parse(token).map_err(SessionError::from))
                .map(Query::LineOfSight),
            "inspect" => argument
                .ok_or(SessionError::MissingArgument("particle index"))
                .and_then(parse_count)
                .map(Query::Inspect),
            "top" => argument.map(parse_count).transpose().map(Query::Top),
            "status" => Ok(Query::Status),
            "map" => Ok(Query::Map),
            "json" => Ok(Query::Json),
            "reset" => Ok(Query::Reset),
            "quit" | "exit" => Ok(Query::Quit),
            _ => return None,
        };
        Some(query)
    }
}

fn parse_count(token: &str) -> Result<usize, SessionError> {
    token
        .parse()
        .map_err(|_| SessionError::InvalidNumber(token.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("expected a non-negative number, found '{0}'")]
    InvalidNumber(String),
    #[error("no particle at index {index} ({count} particles)")]
    NoSuchParticle { index: usize, count: usize },
    #[error("observer position must be on the board")]
    OffBoardObserver,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Engine plus optional command recording. A reset ends the recording so
/// the log never mixes two beliefs.
pub struct Session<W: Write> {
    engine: BeliefEngine,
    recorder: Option<SessionRecorder<W>>,
    recording: bool,
    top: usize,
}

impl<W: Write> Session<W> {
    pub fn new(engine: BeliefEngine, recorder: Option<SessionRecorder<W>>, top: usize) -> Self {
        Self {
            recording: recorder.is_some(),
            engine,
            recorder,
            top,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    fn active_recorder(&mut self) -> Option<&mut SessionRecorder<W>> {
        self.recorder.as_mut().filter(|_| self.recording)
    }

    pub fn engine(&self) -> &BeliefEngine {
        &self.engine
    }

    pub fn recorder(&self) -> Option<&SessionRecorder<W>> {
        self.recorder.as_ref()
    }

    pub fn into_recorder(self) -> Option<SessionRecorder<W>> {
        self.recorder
    }

    /// Replays a command log, recording what was applied.
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<ReplaySummary, ReplayError> {
        let recorder = self.recorder.as_mut().filter(|_| self.recording);
        match recorder {
            Some(recorder) => replay_recorded(&mut self.engine, reader, recorder),
            None => replay(&mut self.engine, reader),
        }
    }

    /// Applies a log command, recording it once the engine accepts it.
    pub fn execute(&mut self, command: &Command) -> Result<(), SessionError> {
        self.engine.apply(command)?;
        if let Some(recorder) = self.active_recorder() {
            recorder.record(command)?;
        }
        tracing::info!(
            target: TARGET,
            command = %command,
            particles = self.engine.particle_count(),
            "command applied"
        );
        Ok(())
    }

    /// Handles one input line, writing any response to `out`.
    pub fn handle_line(&mut self, line: &str, out: &mut impl Write) -> Result<Flow, SessionError> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        if let Some(query) = Query::parse(line) {
            return self.answer(query?, out);
        }
        let command = Command::parse(line)?;
        self.execute(&command)?;
        writeln!(
            out,
            "{}: {} particles",
            command.name(),
            self.engine.particle_count()
        )?;
        if self.engine.is_inconsistent() {
            writeln!(out, "warning: belief is empty; check the last observation")?;
        }
        Ok(Flow::Continue)
    }

    fn answer(&mut self, query: Query, out: &mut impl Write) -> Result<Flow, SessionError> {
        match query {
            Query::LineOfSight(observer) => {
                if !observer.on_board() {
                    return Err(SessionError::OffBoardObserver);
                }
                let visible = self.engine.line_of_sight(observer);
                writeln!(out, "{}", render::cells(&visible))?;
            }
            Query::Inspect(index) => {
                let particle =
                    self.engine
                        .particle(index)
                        .ok_or(SessionError::NoSuchParticle {
                            index,
                            count: self.engine.particle_count(),
                        })?;
                write!(out, "{}", render::particle(index, particle))?;
            }
            Query::Top(limit) => {
                write!(out, "{}", render::summary(&self.engine, limit.unwrap_or(self.top)))?;
            }
            Query::Status => write!(out, "{}", render::summary(&self.engine, self.top))?,
            Query::Map => write!(out, "{}", render::heat_map(&self.engine))?,
            Query::Json => {
                let summary = BeliefSummary::capture(&self.engine, self.top);
                writeln!(out, "{}", summary.to_json()?)?;
            }
            Query::Reset => {
                self.engine.reset();
                tracing::info!(target: TARGET, "belief reset");
                writeln!(out, "reset: {} particles", self.engine.particle_count())?;
                if let Some(recorded) = self.active_recorder().map(|recorder| recorder.recorded()) {
                    self.recording = false;
                    tracing::info!(target: TARGET, recorded, "recording stopped at reset");
                    writeln!(
                        out,
                        "recording stopped: the output log keeps the {recorded} commands before the reset"
                    )?;
                }
            }
            Query::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Reads lines until end of input or `quit`. Bad lines are reported and
    /// skipped; only I/O failures end the loop early.
    pub fn run<R: BufRead, O: Write>(&mut self, input: R, out: &mut O) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            match self.handle_line(&line, out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(SessionError::Io(err)) => return Err(err),
                Err(err) => {
                    tracing::debug!(target: TARGET, line = %line, error = %err, "rejected input");
                    writeln!(out, "error: {err}")?;
                }
            }
            out.flush()?;
        }
        Ok(())
    }
}
