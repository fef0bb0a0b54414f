use crate::config::{LiveConfig, PitchConfig};
use crate::pitch::{mean_square, YinDetector};
use crate::types::LiveScoreSample;

/// Turns one captured analysis frame into a pitch + loudness reading.
#[derive(Debug, Clone)]
pub struct FrameEstimator {
    detector: YinDetector,
    silence_energy: f32,
    clarity_threshold: f32,
    loudness_floor_db: f32,
}

impl FrameEstimator {
    pub fn new(pitch: &PitchConfig, live: &LiveConfig, sample_rate: u32) -> Self {
        Self {
            detector: YinDetector::from_config(pitch, sample_rate),
            silence_energy: pitch.silence_energy,
            clarity_threshold: live.clarity_threshold,
            loudness_floor_db: live.loudness_floor_db,
        }
    }

    pub fn estimate(&self, frame: &[f32], timestamp_secs: f64) -> LiveScoreSample {
        LiveScoreSample {
            timestamp_secs,
            pitch_hz: self.pitch(frame),
            loudness: self.loudness(frame),
        }
    }

    /// Pitch in Hz, or 0 when the estimator is not confident enough. Clarity
    /// alone decides voicing here, not the detector's absolute threshold.
    fn pitch(&self, frame: &[f32]) -> f32 {
        if mean_square(frame) < self.silence_energy {
            return 0.0;
        }
        self.detector
            .detect(frame)
            .filter(|estimate| estimate.clarity > self.clarity_threshold)
            .map_or(0.0, |estimate| estimate.frequency_hz)
    }

    /// RMS level mapped linearly from the dBFS floor (0) to full scale (100).
    fn loudness(&self, frame: &[f32]) -> f32 {
        let rms = mean_square(frame).sqrt();
        if rms <= 0.0 {
            return 0.0;
        }
        let dbfs = 20.0 * rms.log10();
        ((dbfs - self.loudness_floor_db) / -self.loudness_floor_db * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn estimator() -> FrameEstimator {
        FrameEstimator::new(&PitchConfig::default(), &LiveConfig::default(), 44_100)
    }

    fn tone(frequency: f32, amplitude: f32) -> Vec<f32> {
        (0..2048)
            .map(|i| (2.0 * PI * frequency * i as f32 / 44_100.0).sin() * amplitude)
            .collect()
    }

    #[test]
    fn voiced_frame_reports_pitch_and_level() {
        let sample = estimator().estimate(&tone(200.0, 0.5), 1.5);
        assert_eq!(sample.timestamp_secs, 1.5);
        assert!((sample.pitch_hz - 200.0).abs() < 1.5);
        // 0.5 amplitude sine: rms 0.354 -> about -9 dBFS
        assert!((sample.loudness - 84.9).abs() < 0.5, "{}", sample.loudness);
    }

    fn noisy_tone(frequency: f32) -> Vec<f32> {
        let mut state = 0x9e37_79b9_u32;
        tone(frequency, 0.5)
            .into_iter()
            .map(|sample| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                sample + 0.55 * ((state as f32 / u32::MAX as f32) * 2.0 - 1.0)
            })
            .collect()
    }

    #[test]
    fn clarity_threshold_decides_voicing() {
        let frame = noisy_tone(230.0);
        let voiced = estimator().estimate(&frame, 0.0);
        assert!(voiced.is_voiced(), "noisy tone should pass a 0.3 clarity gate");

        let strict = LiveConfig {
            clarity_threshold: 0.9,
            ..LiveConfig::default()
        };
        let gated = FrameEstimator::new(&PitchConfig::default(), &strict, 44_100);
        assert_eq!(gated.estimate(&frame, 0.0).pitch_hz, 0.0);
    }

    #[test]
    fn silent_frame_is_unvoiced_and_quiet() {
        let sample = estimator().estimate(&[0.0; 2048], 0.0);
        assert_eq!(sample.pitch_hz, 0.0);
        assert_eq!(sample.loudness, 0.0);
        assert!(!sample.is_voiced());
    }

    #[test]
    fn full_scale_square_clamps_loudness() {
        let frame: Vec<f32> = (0..2048).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert_eq!(estimator().estimate(&frame, 0.0).loudness, 100.0);
    }
}
