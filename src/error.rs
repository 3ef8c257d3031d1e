use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    /// Reading or writing a journal stream failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The search pattern did not compile
    #[error("Invalid regular expression: {0}")]
    InvalidPattern(String),

    /// A search was requested before anything was ever logged
    #[error("There are no log entries yet!")]
    NoEntries,

    #[error("Could not create configuration directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Could not open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Malformed settings file: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Could not determine configuration directory")]
    NoConfigRoot,

    /// Search command without its pattern argument
    #[error("No regular expression given")]
    MissingPattern,
}

impl From<regex::Error> for LogError {
    fn from(err: regex::Error) -> Self {
        LogError::InvalidPattern(err.to_string())
    }
}
