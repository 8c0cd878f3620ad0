use serde::Deserialize;
use specter_core::model::{Board, LayoutError};
use specter_core::rules::{Rules, RulesError};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_TOP_CELLS: usize = 5;
const DEFAULT_LOG_FILE: &str = "specter-locator.jsonl";

/// Root locator configuration loaded from YAML. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocatorConfig {
    pub board: BoardConfig,
    pub rules: Rules,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl LocatorConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: LocatorConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.rules
            .validate()
            .map_err(|RulesError::InvalidField { field, message }| {
                ValidationError::InvalidField {
                    field: format!("rules.{field}"),
                    message,
                }
            })?;
        self.board.validate()?;
        self.session.validate()?;
        self.logging.normalize();
        self.logging.validate()?;
        Ok(())
    }

    /// The configured board layout, or an all-open board when none is set.
    pub fn load_board(&self) -> Result<Board, LayoutError> {
        match self.board.layout.as_ref() {
            Some(path) => Board::load(path),
            None => Ok(Board::open()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoardConfig {
    /// Text layout, one line per row.
    pub layout: Option<PathBuf>,
}

impl BoardConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.layout.as_ref() {
            Some(path) if path.as_os_str().is_empty() => Err(ValidationError::InvalidField {
                field: "board.layout".to_string(),
                message: "path must not be empty".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Command log locations and display settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Log replayed before the interactive session starts.
    pub input: Option<PathBuf>,
    /// Log every accepted command is appended to.
    pub output: Option<PathBuf>,
    /// Number of cells listed in summaries.
    pub top: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            top: DEFAULT_TOP_CELLS,
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.top == 0 {
            return Err(ValidationError::InvalidField {
                field: "session.top".to_string(),
                message: "must list at least one cell".to_string(),
            });
        }
        if let (Some(input), Some(output)) = (self.input.as_ref(), self.output.as_ref()) {
            if input == output {
                return Err(ValidationError::InvalidField {
                    field: "session.output".to_string(),
                    message: "must differ from session.input".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to compact stderr output.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enable_structured: bool,
    pub tracing_level: String,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.level().is_none() {
            return Err(ValidationError::InvalidField {
                field: "logging.tracing_level".to_string(),
                message: format!("unknown level '{}'", self.tracing_level),
            });
        }
        if self.enable_structured && self.log_dir.as_os_str().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "logging.log_dir".to_string(),
                message: "structured logging needs a directory".to_string(),
            });
        }
        Ok(())
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(DEFAULT_LOG_FILE)
    }
}

fn default_tracing_level() -> String {
    "warn".to_string()
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
