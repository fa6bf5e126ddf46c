//! Error taxonomy shared by the reader core.
//!
//! Only extraction errors are fatal (to the import attempt). Synthesis and
//! playback errors are recoverable and are absorbed by the scheduler; store
//! errors are logged and otherwise ignored. Out-of-range navigation is a
//! silent no-op and has no error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported {format} content: {reason}")]
    Unsupported { format: String, reason: String },

    #[error("could not read {format}: {reason}. Try converting to TXT format")]
    Malformed { format: String, reason: String },

    #[error("no text could be extracted from {0}")]
    Empty(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("speech request failed: {0}")]
    Transport(String),

    #[error("speech provider returned status {0}")]
    Status(u16),

    #[error("invalid speech endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SynthesisError::Status(status.as_u16()),
            None => SynthesisError::Transport(err.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("audio device unavailable: {0}")]
    Device(String),

    #[error("failed to load audio: {0}")]
    Fetch(String),

    #[error("failed to decode audio: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("progress store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to parse progress: {0}")]
    Deserialize(#[from] toml::de::Error),
}
