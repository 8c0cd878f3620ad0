use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use specter_core::AppInfo;
use specter_core::belief::BeliefEngine;
use specter_core::log::{ReplayStop, SessionRecorder};
use specter_locator::config::LocatorConfig;
use specter_locator::logging::init_logging;
use specter_locator::render;
use specter_locator::session::Session;

/// Belief tracker for a hidden-movement board game.
#[derive(Debug, Parser)]
#[command(
    name = "specter-locator",
    author,
    version,
    about = "Tracks where the hidden agent could be from the hunters' observations"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the board layout file.
    #[arg(long, value_name = "FILE")]
    board: Option<PathBuf>,

    /// Replay this command log before reading stdin.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Record every accepted command to this log.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the belief after replaying and exit without reading stdin.
    #[arg(long)]
    replay_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match cli.config.as_ref() {
        Some(path) => LocatorConfig::from_path(path)?,
        None => LocatorConfig::default(),
    };

    if let Some(board) = cli.board {
        config.board.layout = Some(board);
    }

    if let Some(input) = cli.input {
        config.session.input = Some(input);
    }

    if let Some(output) = cli.output {
        config.session.output = Some(output);
    }

    config.validate()?;
    let _logging_guard = init_logging(&config.logging)?;

    let board = config.load_board()?;
    let engine = BeliefEngine::new(board, config.rules.clone());
    let recorder = match config.session.output.as_ref() {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating session log at {}", path.display()))?;
            Some(SessionRecorder::new(BufWriter::new(file)))
        }
        None => None,
    };
    let mut session = Session::new(engine, recorder, config.session.top);

    if let Some(path) = config.session.input.as_ref() {
        let file =
            File::open(path).with_context(|| format!("opening command log {}", path.display()))?;
        match session.replay(BufReader::new(file)) {
            Ok(summary) => {
                println!("Replayed {} commands from {}", summary.applied, path.display());
                if let ReplayStop::BlankLine { line } = summary.stop {
                    println!("Stopped at blank line {line}");
                }
            }
            Err(err) if cli.replay_only => {
                print!("{}", render::summary(session.engine(), config.session.top));
                return Err(err).with_context(|| format!("replaying {}", path.display()));
            }
            Err(err) => {
                eprintln!("Replay of {} stopped: {err}", path.display());
            }
        }
    }

    if cli.replay_only {
        print!("{}", render::summary(session.engine(), config.session.top));
        return Ok(());
    }

    println!(
        "{} {} ({}). Type commands, or `quit`.",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::codename()
    );
    print!("{}", render::summary(session.engine(), config.session.top));
    let stdin = io::stdin();
    let stdout = io::stdout();
    session.run(stdin.lock(), &mut stdout.lock())?;
    Ok(())
}
