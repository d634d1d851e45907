use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid glob pattern: {0}")]
    Pattern(String),

    #[error("Failed to create archive at {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write archive entry `{name}`: {message}")]
    Write { name: String, message: String },
}

impl From<globset::Error> for ArchiveError {
    fn from(err: globset::Error) -> Self {
        ArchiveError::Pattern(err.to_string())
    }
}
