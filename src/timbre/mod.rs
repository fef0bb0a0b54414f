//! Three-band spectral timbre scoring (depth, nasality, brightness).

mod goertzel;

pub use goertzel::{goertzel_magnitude, hann_window};

use ndarray::{Array2, Axis};
use serde::Serialize;
use tracing::debug;

use crate::config::TimbreConfig;
use crate::types::{PcmBuffer, TimbreResult};

/// Magnitudes at the three anchor frequencies for one windowed frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpectralBandSample {
    /// ~150 Hz, perceived vocal depth
    pub chest: f32,
    /// ~500 Hz, perceived boxiness
    pub nasal: f32,
    /// ~3000 Hz, perceived clarity
    pub presence: f32,
}

impl SpectralBandSample {
    fn to_row(self) -> [f32; 3] {
        [self.chest, self.nasal, self.presence]
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimbreAnalyzer {
    config: TimbreConfig,
}

impl TimbreAnalyzer {
    pub fn new(config: TimbreConfig) -> Self {
        Self { config }
    }

    /// Band magnitudes for up to `max_windows` evenly spaced Hann-tapered
    /// windows, one row per window.
    pub fn band_samples(&self, pcm: &PcmBuffer) -> Vec<SpectralBandSample> {
        let window_size = self.config.window_size;
        let total = pcm.len();
        if total < window_size {
            return Vec::new();
        }
        let step = (total / self.config.max_windows).max(1);
        let taper = hann_window(window_size);

        (0..self.config.max_windows)
            .map(|i| i * step)
            .take_while(|&start| start + window_size <= total)
            .map(|start| {
                let windowed: Vec<f32> = pcm.samples[start..start + window_size]
                    .iter()
                    .zip(&taper)
                    .map(|(sample, weight)| sample * weight)
                    .collect();
                SpectralBandSample {
                    chest: goertzel_magnitude(&windowed, self.config.chest_hz, pcm.sample_rate),
                    nasal: goertzel_magnitude(&windowed, self.config.nasal_hz, pcm.sample_rate),
                    presence: goertzel_magnitude(
                        &windowed,
                        self.config.presence_hz,
                        pcm.sample_rate,
                    ),
                }
            })
            .collect()
    }

    /// Score a clip. Degenerate clips with no full window score all zeros.
    pub fn analyze(&self, pcm: &PcmBuffer) -> TimbreResult {
        let bands = self.band_samples(pcm);
        let mut matrix = Array2::<f32>::zeros((bands.len(), 3));
        for (mut row, band) in matrix.outer_iter_mut().zip(&bands) {
            row.assign(&ndarray::arr1(&band.to_row()));
        }
        let Some(averages) = matrix.mean_axis(Axis(0)) else {
            return TimbreResult::default();
        };

        let total = averages.sum() + self.config.epsilon;
        let chest_ratio = averages[0] / total;
        let nasal_ratio = averages[1] / total;
        let presence_ratio = averages[2] / total;
        debug!(
            windows = bands.len(),
            chest_ratio, nasal_ratio, presence_ratio, "timbre band ratios"
        );

        TimbreResult {
            nasality_score: self.config.nasality.apply(nasal_ratio),
            brightness_score: self.config.brightness.apply(presence_ratio),
            depth_score: self.config.depth.apply(chest_ratio),
            windows_analyzed: bands.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::TARGET_SAMPLE_RATE;
    use std::f32::consts::PI;

    fn tone(frequency: f32, seconds: f32) -> PcmBuffer {
        let total = (TARGET_SAMPLE_RATE as f32 * seconds) as usize;
        let samples = (0..total)
            .map(|i| (2.0 * PI * frequency * i as f32 / TARGET_SAMPLE_RATE as f32).sin() * 0.6)
            .collect();
        PcmBuffer::new(samples, TARGET_SAMPLE_RATE)
    }

    #[test]
    fn chest_tone_scores_deep_and_dark() {
        let result = TimbreAnalyzer::default().analyze(&tone(150.0, 1.0));
        // step 1470: the 30th window would overrun a 1 s clip
        assert_eq!(result.windows_analyzed, 29);
        assert_eq!(result.depth_score, 95.0);
        assert_eq!(result.nasality_score, 5.0);
        assert_eq!(result.brightness_score, 10.0);
    }

    #[test]
    fn presence_tone_inverts_the_ranking() {
        let result = TimbreAnalyzer::default().analyze(&tone(3000.0, 1.0));
        assert_eq!(result.brightness_score, 95.0);
        assert_eq!(result.depth_score, 10.0);
        assert_eq!(result.nasality_score, 5.0);
    }

    #[test]
    fn nasal_tone_raises_nasality() {
        let result = TimbreAnalyzer::default().analyze(&tone(500.0, 1.0));
        assert_eq!(result.nasality_score, 90.0);
    }

    #[test]
    fn short_clip_degrades_to_zero() {
        let pcm = PcmBuffer::new(vec![0.2; 1000], TARGET_SAMPLE_RATE);
        assert_eq!(TimbreAnalyzer::default().analyze(&pcm), TimbreResult::default());
    }

    #[test]
    fn silent_clip_stays_within_bounds() {
        let pcm = PcmBuffer::new(vec![0.0; 44_100], TARGET_SAMPLE_RATE);
        let result = TimbreAnalyzer::default().analyze(&pcm);
        assert_eq!(result.depth_score, 10.0);
        assert_eq!(result.nasality_score, 5.0);
        assert_eq!(result.brightness_score, 10.0);
    }

    #[test]
    fn windows_are_evenly_spaced() {
        let analyzer = TimbreAnalyzer::default();
        let pcm = tone(200.0, 0.1);
        let bands = analyzer.band_samples(&pcm);
        // 4410 samples: step 147, last start must leave room for a full window
        assert_eq!(bands.len(), (4410 - 2048) / 147 + 1);
    }
}
