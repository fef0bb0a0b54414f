//! Core types shared by the batch and live analysis paths

use serde::{Deserialize, Serialize};

/// Decoded mono PCM audio at a known sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (44100 once decoded)
    pub sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clip duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Per-window pitch estimate. `f0_hz == None` marks an unvoiced window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitchFrame {
    pub index: usize,
    pub f0_hz: Option<f32>,
}

impl PitchFrame {
    pub fn voiced(index: usize, f0_hz: f32) -> Self {
        Self {
            index,
            f0_hz: Some(f0_hz),
        }
    }

    pub fn unvoiced(index: usize) -> Self {
        Self { index, f0_hz: None }
    }

    pub fn is_voiced(&self) -> bool {
        self.f0_hz.is_some()
    }
}

/// Utterance timing supplied by the transcription layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceBoundary {
    #[serde(alias = "start_time")]
    pub start: f64, // seconds
    #[serde(alias = "end_time")]
    pub end: f64, // seconds
    #[serde(default)]
    pub text: String,
}

impl UtteranceBoundary {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// True when the transcribed text closes a sentence.
    pub fn ends_sentence(&self) -> bool {
        matches!(self.text.trim_end().chars().last(), Some('.' | '!' | '?'))
    }
}

/// A measured value, or an explicit marker that the input did not carry
/// enough signal to measure it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Scored<T> {
    Measured(T),
    InsufficientEvidence,
}

impl<T> Scored<T> {
    pub fn is_measured(&self) -> bool {
        matches!(self, Scored::Measured(_))
    }

    pub fn measured(self) -> Option<T> {
        match self {
            Scored::Measured(value) => Some(value),
            Scored::InsufficientEvidence => None,
        }
    }

    pub fn value_or(self, neutral: T) -> T {
        self.measured().unwrap_or(neutral)
    }
}

impl<T: Default> Scored<T> {
    /// The documented all-zero record when evidence is missing.
    pub fn unwrap_or_default(self) -> T {
        self.measured().unwrap_or_default()
    }
}

/// Batch intonation analysis over one clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntonationResult {
    pub falling_intonation: Scored<u8>,
    /// 1 - coefficient of variation, clamped to [0, 1]
    pub pitch_stability: f32,
    pub mean_pitch_hz: f32,
    pub pitch_range_hz: f32,
    pub voiced_frames: usize,
}

impl IntonationResult {
    pub const NEUTRAL_FALLING_SCORE: u8 = 50;
    pub const NEUTRAL_STABILITY: f32 = 0.5;

    /// Fallback when the clip has no voiced frames at all.
    pub fn neutral() -> Self {
        Self {
            falling_intonation: Scored::InsufficientEvidence,
            pitch_stability: Self::NEUTRAL_STABILITY,
            mean_pitch_hz: 0.0,
            pitch_range_hz: 0.0,
            voiced_frames: 0,
        }
    }

    /// Score with the neutral 50 substituted for missing evidence.
    pub fn falling_intonation_score(&self) -> u8 {
        self.falling_intonation
            .value_or(Self::NEUTRAL_FALLING_SCORE)
    }
}

/// Three-band timbre scores, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TimbreResult {
    pub nasality_score: f32,
    pub brightness_score: f32,
    pub depth_score: f32,
    pub windows_analyzed: usize,
}

/// One instantaneous reading from the live capture front end
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LiveScoreSample {
    pub timestamp_secs: f64,
    /// Estimated pitch, 0.0 when unvoiced
    pub pitch_hz: f32,
    /// Loudness on a 0-100 scale
    pub loudness: f32,
}

impl LiveScoreSample {
    pub fn is_voiced(&self) -> bool {
        self.pitch_hz > 0.0
    }
}

/// Live intonation exercise result
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct IntonationExerciseScore {
    pub variation_score: f32,
    pub pause_score: f32,
    pub emphasis_score: f32,
    pub overall_score: f32,
    pub pitch_std_dev_hz: f32,
    pub pause_count: usize,
    pub emphasis_moments: usize,
    pub voiced_samples: usize,
}

/// Live projection/volume exercise result
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProjectionExerciseScore {
    pub score: f32,
    pub avg_volume: f32,
    pub peak_volume: f32,
    pub time_in_optimal_pct: f32,
    pub consistency: f32,
    pub saturation_pct: f32,
    pub whisper_pct: f32,
    pub valid_samples: usize,
}

/// Result handed back when a live exercise finishes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "exercise", content = "result", rename_all = "snake_case")]
pub enum ExerciseScoreResult {
    Intonation(Scored<IntonationExerciseScore>),
    Projection(Scored<ProjectionExerciseScore>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_punctuation_detection() {
        assert!(UtteranceBoundary::new(0.0, 0.4, "Done.").ends_sentence());
        assert!(UtteranceBoundary::new(0.0, 0.4, "Really?  ").ends_sentence());
        assert!(!UtteranceBoundary::new(0.0, 0.4, "and then").ends_sentence());
        assert!(!UtteranceBoundary::new(0.0, 0.4, "").ends_sentence());
    }

    #[test]
    fn neutral_result_reports_fallback_score() {
        let neutral = IntonationResult::neutral();
        assert_eq!(neutral.falling_intonation_score(), 50);
        assert_eq!(neutral.pitch_stability, 0.5);
        assert!(!neutral.falling_intonation.is_measured());
    }

    #[test]
    fn scored_serializes_with_status_tag() {
        let measured = serde_json::to_value(Scored::Measured(72u8)).unwrap();
        assert_eq!(measured["status"], "measured");
        assert_eq!(measured["value"], 72);
        let missing = serde_json::to_value(Scored::<u8>::InsufficientEvidence).unwrap();
        assert_eq!(missing["status"], "insufficient_evidence");
    }

    #[test]
    fn boundary_accepts_transcript_field_names() {
        let boundary: UtteranceBoundary =
            serde_json::from_str(r#"{"start_time": 1.0, "end_time": 2.5, "text": "Hi."}"#)
                .unwrap();
        assert_eq!(boundary.duration(), 1.5);
    }
}
