//! Acoustic scoring engine for speech coaching.
//!
//! Batch path: [`audio::decoder`] -> [`pitch`] -> [`intonation`], and
//! [`audio::decoder`] -> [`timbre`]. Live path: capture -> [`live`].

pub mod aggregate;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod intonation;
pub mod live;
pub mod pipeline;
pub mod pitch;
pub mod stats;
pub mod timbre;
pub mod types;

pub use error::{AnalysisError, ConfigError, DecodeError};
pub use types::{
    ExerciseScoreResult, IntonationResult, PcmBuffer, PitchFrame, Scored, TimbreResult,
    UtteranceBoundary,
};
