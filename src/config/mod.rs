//! Named, overridable analysis constants.
//!
//! Every threshold and calibration value the engine uses lives here so it can
//! be recalibrated from JSON without touching the algorithms.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub pitch: PitchConfig,
    pub intonation: IntonationConfig,
    pub timbre: TimbreConfig,
    pub live: LiveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    pub window_size: usize,
    pub hop_size: usize,
    pub min_frequency_hz: f32,
    pub max_frequency_hz: f32,
    /// YIN absolute threshold on the normalized difference function.
    pub threshold: f32,
    /// Windows with mean-square energy below this are unvoiced.
    pub silence_energy: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_size: 512,
            min_frequency_hz: 50.0,
            max_frequency_hz: 500.0,
            threshold: 0.15,
            silence_energy: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntonationConfig {
    pub tail_window_secs: f64,
    /// A tail needs at least this many voiced points to be fitted.
    pub min_tail_points: usize,
    /// Slope in Hz per frame step below which a tail counts as falling.
    pub falling_slope_threshold: f32,
    pub long_utterance_secs: f64,
}

impl Default for IntonationConfig {
    fn default() -> Self {
        Self {
            tail_window_secs: 0.5,
            min_tail_points: 6,
            falling_slope_threshold: -0.5,
            long_utterance_secs: 1.0,
        }
    }
}

/// Affine map from a band energy ratio to a clamped score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub offset: f32,
    pub gain: f32,
    pub min: f32,
    pub max: f32,
}

impl Calibration {
    pub const fn new(offset: f32, gain: f32, min: f32, max: f32) -> Self {
        Self {
            offset,
            gain,
            min,
            max,
        }
    }

    pub fn apply(&self, ratio: f32) -> f32 {
        ((ratio - self.offset) * self.gain).clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimbreConfig {
    pub window_size: usize,
    pub max_windows: usize,
    pub chest_hz: f32,
    pub nasal_hz: f32,
    pub presence_hz: f32,
    pub epsilon: f32,
    pub depth: Calibration,
    pub nasality: Calibration,
    pub brightness: Calibration,
}

impl Default for TimbreConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            max_windows: 30,
            chest_hz: 150.0,
            nasal_hz: 500.0,
            presence_hz: 3000.0,
            epsilon: 1e-9,
            depth: Calibration::new(0.20, 200.0, 10.0, 95.0),
            nasality: Calibration::new(0.30, 200.0, 5.0, 90.0),
            brightness: Calibration::new(0.05, 300.0, 10.0, 95.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub pitch_rate_hz: u32,
    pub loudness_rate_hz: u32,
    pub exercise_secs: f64,
    /// Estimator clarity must exceed this for a pitch to count as voiced.
    pub clarity_threshold: f32,
    pub min_voiced_samples: usize,
    pub min_loudness_samples: usize,
    /// Loudness readings at or below this are treated as no signal.
    pub loudness_noise_floor: f32,
    pub pause_min_samples: usize,
    pub pause_max_samples: usize,
    pub emphasis_window: usize,
    /// dBFS mapped to loudness 0; 0 dBFS maps to 100.
    pub loudness_floor_db: f32,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            pitch_rate_hz: 20,
            loudness_rate_hz: 10,
            exercise_secs: 30.0,
            clarity_threshold: 0.3,
            min_voiced_samples: 30,
            min_loudness_samples: 20,
            loudness_noise_floor: 3.0,
            pause_min_samples: 6,
            pause_max_samples: 60,
            emphasis_window: 10,
            loudness_floor_db: -60.0,
        }
    }
}

impl AnalysisConfig {
    /// Load from a file or inline JSON, falling back to defaults when neither
    /// is given.
    pub fn load(path: Option<&Path>, json: Option<&str>) -> Result<Self, ConfigError> {
        let config = match (path, json) {
            (Some(path), _) => Self::from_file(path)?,
            (None, Some(raw)) => Self::from_json(raw)?,
            (None, None) => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let pitch = &self.pitch;
        ensure(pitch.hop_size > 0, "pitch.hop_size must be positive")?;
        ensure(
            pitch.window_size >= 4,
            "pitch.window_size must be at least 4 samples",
        )?;
        ensure(
            pitch.min_frequency_hz > 0.0 && pitch.min_frequency_hz < pitch.max_frequency_hz,
            "pitch frequency range must satisfy 0 < min < max",
        )?;
        ensure(
            pitch.threshold > 0.0 && pitch.threshold < 1.0,
            "pitch.threshold must lie in (0, 1)",
        )?;

        let intonation = &self.intonation;
        ensure(
            intonation.tail_window_secs > 0.0,
            "intonation.tail_window_secs must be positive",
        )?;
        ensure(
            intonation.min_tail_points >= 2,
            "intonation.min_tail_points must be at least 2",
        )?;

        let timbre = &self.timbre;
        ensure(timbre.window_size > 0, "timbre.window_size must be positive")?;
        ensure(timbre.max_windows > 0, "timbre.max_windows must be positive")?;
        ensure(timbre.epsilon > 0.0, "timbre.epsilon must be positive")?;
        for (label, calibration) in [
            ("depth", &timbre.depth),
            ("nasality", &timbre.nasality),
            ("brightness", &timbre.brightness),
        ] {
            ensure(
                calibration.min <= calibration.max
                    && calibration.min >= 0.0
                    && calibration.max <= 100.0,
                &format!("timbre.{label} clamp must satisfy 0 <= min <= max <= 100"),
            )?;
        }

        let live = &self.live;
        ensure(
            live.pitch_rate_hz > 0 && live.loudness_rate_hz > 0,
            "live sampling rates must be positive",
        )?;
        ensure(
            live.pause_min_samples <= live.pause_max_samples,
            "live.pause_min_samples must not exceed live.pause_max_samples",
        )?;
        ensure(
            live.emphasis_window > 0,
            "live.emphasis_window must be positive",
        )?;
        ensure(
            live.loudness_floor_db < 0.0,
            "live.loudness_floor_db must be negative",
        )?;
        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message.to_string()))
    }
}
