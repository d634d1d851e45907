use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Message;
use codescan_archive::ArchiveError;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Failed to resolve workspace directory: {0}")]
    Workspace(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Unable to read archive {}: {message}", .path.display())]
    ArchiveUnreadable { path: PathBuf, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// The HTTP exchange succeeded but the service refused the submission.
    #[error("Scan request rejected (result_code {result_code}): {}", format_messages(.messages))]
    Rejected {
        result_code: i64,
        messages: Vec<Message>,
    },
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Parse(err.to_string())
    }
}

fn format_messages(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "no messages".to_string();
    }
    let mut out = String::new();
    for (i, m) in messages.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "#{} {} {}", m.sequence, m.level, m.message_id);
    }
    out
}
