//! Frame-wise fundamental frequency estimation.

mod yin;

pub use yin::{PitchEstimate, YinDetector};

use serde::Serialize;
use tracing::debug;

use crate::config::PitchConfig;
use crate::types::{PcmBuffer, PitchFrame};

/// Ordered pitch frames at a fixed hop spacing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchTrack {
    pub frames: Vec<PitchFrame>,
    pub hop_size: usize,
    pub sample_rate: u32,
}

impl PitchTrack {
    /// Voiced f0 values in frame order.
    pub fn voiced(&self) -> Vec<f32> {
        self.frames.iter().filter_map(|frame| frame.f0_hz).collect()
    }

    pub fn voiced_count(&self) -> usize {
        self.frames.iter().filter(|frame| frame.is_voiced()).count()
    }

    /// Start time of a frame in seconds.
    pub fn frame_time(&self, index: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (index * self.hop_size) as f64 / self.sample_rate as f64
    }
}

#[derive(Debug, Clone)]
pub struct PitchTracker {
    config: PitchConfig,
}

impl PitchTracker {
    pub fn new(config: PitchConfig) -> Self {
        Self { config }
    }

    /// Number of analysis windows that fit in `total_samples`.
    pub fn frame_count(&self, total_samples: usize) -> usize {
        let window = self.config.window_size;
        if total_samples < window || self.config.hop_size == 0 {
            return 0;
        }
        (total_samples - window) / self.config.hop_size + 1
    }

    pub fn track(&self, pcm: &PcmBuffer) -> PitchTrack {
        let detector = YinDetector::from_config(&self.config, pcm.sample_rate);
        let window = self.config.window_size;
        let hop = self.config.hop_size;

        let frames: Vec<PitchFrame> = (0..self.frame_count(pcm.len()))
            .map(|index| {
                let start = index * hop;
                let slice = &pcm.samples[start..start + window];
                if mean_square(slice) < self.config.silence_energy {
                    return PitchFrame::unvoiced(index);
                }
                match detector.detect(slice) {
                    Some(estimate) if estimate.periodic => {
                        PitchFrame::voiced(index, estimate.frequency_hz)
                    }
                    _ => PitchFrame::unvoiced(index),
                }
            })
            .collect();

        let track = PitchTrack {
            frames,
            hop_size: hop,
            sample_rate: pcm.sample_rate,
        };
        debug!(
            frames = track.frames.len(),
            voiced = track.voiced_count(),
            "pitch tracking complete"
        );
        track
    }
}

impl Default for PitchTracker {
    fn default() -> Self {
        Self::new(PitchConfig::default())
    }
}

pub(crate) fn mean_square(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|s| s * s).sum::<f32>() / window.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::TARGET_SAMPLE_RATE;
    use std::f32::consts::PI;

    fn sine(frequency: f32, seconds: f32) -> PcmBuffer {
        let total = (TARGET_SAMPLE_RATE as f32 * seconds) as usize;
        let samples = (0..total)
            .map(|i| (2.0 * PI * frequency * i as f32 / TARGET_SAMPLE_RATE as f32).sin() * 0.5)
            .collect();
        PcmBuffer::new(samples, TARGET_SAMPLE_RATE)
    }

    #[test]
    fn frame_count_follows_hop_formula() {
        let tracker = PitchTracker::default();
        assert_eq!(tracker.frame_count(2047), 0);
        assert_eq!(tracker.frame_count(2048), 1);
        assert_eq!(tracker.frame_count(44_100), (44_100 - 2048) / 512 + 1);
    }

    #[test]
    fn tracks_steady_tone() {
        let track = PitchTracker::default().track(&sine(220.0, 0.5));
        let voiced = track.voiced();
        assert_eq!(voiced.len(), track.frames.len());
        assert!(voiced.iter().all(|f0| (f0 - 220.0).abs() < 2.0), "{voiced:?}");
    }

    #[test]
    fn silence_is_unvoiced() {
        let pcm = PcmBuffer::new(vec![0.0; 22_050], TARGET_SAMPLE_RATE);
        let track = PitchTracker::default().track(&pcm);
        assert!(!track.frames.is_empty());
        assert_eq!(track.voiced_count(), 0);
    }

    #[test]
    fn out_of_range_tone_is_unvoiced() {
        let track = PitchTracker::default().track(&sine(900.0, 0.25));
        assert_eq!(track.voiced_count(), 0);
    }

    #[test]
    fn aperiodic_frames_stay_unvoiced_in_batch() {
        let mut state = 0x1234_5678_u32;
        let mut pcm = sine(230.0, 0.25);
        for sample in &mut pcm.samples {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            *sample += 0.55 * ((state as f32 / u32::MAX as f32) * 2.0 - 1.0);
        }
        let track = PitchTracker::default().track(&pcm);
        assert!(!track.frames.is_empty());
        assert_eq!(track.voiced_count(), 0);
    }

    #[test]
    fn frame_times_use_hop_spacing() {
        let track = PitchTracker::default().track(&sine(150.0, 0.2));
        assert!((track.frame_time(2) - 1024.0 / 44_100.0).abs() < 1e-9);
    }
}
