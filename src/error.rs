//! Error types for the analysis engine
//!
//! Only unreadable input and bad configuration are errors. Too little signal
//! is reported through [`crate::types::Scored::InsufficientEvidence`].

use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for results returned by the analysis pipeline.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read audio from {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unrecognized audio container: {0}")]
    Unsupported(String),
    #[error("no decodable audio track found")]
    NoAudioTrack,
    #[error("sample rate not specified in audio stream")]
    MissingSampleRate,
    #[error("audio codec failure: {0}")]
    Codec(String),
    #[error("audio stream decoded to zero samples")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config JSON")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("audio capture failed: {0}")]
    Capture(String),
    #[error("failed to start analysis workers: {0}")]
    Worker(String),
}

impl AnalysisError {
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }
}
