//! Live practice exercises scored from a rolling buffer of readings.

mod buffer;
mod estimator;
pub mod intonation;
pub mod projection;
pub mod session;

pub use buffer::LiveSampleBuffer;
pub use estimator::FrameEstimator;
pub use intonation::score_intonation;
pub use projection::{score_projection, VolumeZone};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::LiveConfig;
use crate::types::ExerciseScoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    /// Pitch variety, pauses and emphasis, sampled at the pitch cadence.
    Intonation,
    /// Loudness zones and consistency, sampled at the loudness cadence.
    Projection,
}

impl ExerciseKind {
    pub fn cadence_hz(self, config: &LiveConfig) -> u32 {
        match self {
            ExerciseKind::Intonation => config.pitch_rate_hz,
            ExerciseKind::Projection => config.loudness_rate_hz,
        }
    }

    /// Score a fully collected buffer.
    pub fn score(self, buffer: &LiveSampleBuffer, config: &LiveConfig) -> ExerciseScoreResult {
        match self {
            ExerciseKind::Intonation => {
                ExerciseScoreResult::Intonation(score_intonation(buffer.as_slice(), config))
            }
            ExerciseKind::Projection => {
                ExerciseScoreResult::Projection(score_projection(&buffer.loudness(), config))
            }
        }
    }
}
