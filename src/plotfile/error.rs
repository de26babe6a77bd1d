use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}': {details} (at line ~{line})")]
    Parse {
        path: PathBuf,
        line: usize,
        details: String,
    },

    #[error("variable '{0}' is not present in the plotfile")]
    MissingVariable(String),

    #[error("particle component '{component}' is not present for species '{species}'")]
    MissingComponent { species: String, component: String },

    #[error("unsupported real format in '{path}': {details}")]
    UnsupportedFormat { path: PathBuf, details: String },

    #[error("'{path}' ended before {expected} bytes of data could be read")]
    Truncated { path: PathBuf, expected: usize },
}

impl Error {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(path: &Path, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            line,
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
