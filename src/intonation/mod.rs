//! Pitch statistics and sentence-final contour classification.

use tracing::debug;

use crate::config::IntonationConfig;
use crate::pitch::PitchTrack;
use crate::stats;
use crate::types::{IntonationResult, Scored, UtteranceBoundary};

#[derive(Debug, Clone, Default)]
pub struct IntonationClassifier {
    config: IntonationConfig,
}

impl IntonationClassifier {
    pub fn new(config: IntonationConfig) -> Self {
        Self { config }
    }

    /// Summarize the voiced pitch of a clip and score how many qualifying
    /// utterances end on a falling contour.
    pub fn classify(
        &self,
        track: &PitchTrack,
        clip_duration_secs: f64,
        utterances: &[UtteranceBoundary],
    ) -> IntonationResult {
        let voiced = track.voiced();
        let Some((min_pitch, max_pitch)) = stats::min_max(&voiced) else {
            return IntonationResult::neutral();
        };

        let mean_pitch = stats::mean(&voiced);
        let std_dev = stats::std_dev(&voiced);
        let pitch_stability = if mean_pitch > 0.0 {
            (1.0 - std_dev / mean_pitch).clamp(0.0, 1.0)
        } else {
            IntonationResult::NEUTRAL_STABILITY
        };

        IntonationResult {
            falling_intonation: self.falling_intonation(&voiced, clip_duration_secs, utterances),
            pitch_stability,
            mean_pitch_hz: mean_pitch,
            pitch_range_hz: max_pitch - min_pitch,
            voiced_frames: voiced.len(),
        }
    }

    /// Percentage of fitted utterance tails whose slope falls below the
    /// threshold. Voiced frames are mapped to wall-clock time linearly over
    /// the whole clip.
    fn falling_intonation(
        &self,
        voiced: &[f32],
        clip_duration_secs: f64,
        utterances: &[UtteranceBoundary],
    ) -> Scored<u8> {
        if clip_duration_secs <= 0.0 || voiced.is_empty() {
            return Scored::InsufficientEvidence;
        }
        let items_per_second = voiced.len() as f64 / clip_duration_secs;

        let mut considered = 0usize;
        let mut falling = 0usize;
        for utterance in utterances.iter().filter(|u| self.qualifies(u)) {
            let Some(tail) = self.tail(voiced, items_per_second, utterance) else {
                continue;
            };
            let Some(slope) = stats::ols_slope(tail) else {
                continue;
            };
            considered += 1;
            if slope < self.config.falling_slope_threshold {
                falling += 1;
            }
            debug!(
                start = utterance.start,
                end = utterance.end,
                points = tail.len(),
                slope,
                "fitted utterance tail"
            );
        }

        if considered == 0 {
            return Scored::InsufficientEvidence;
        }
        let score = (100.0 * falling as f64 / considered as f64).round();
        Scored::Measured(score.clamp(0.0, 100.0) as u8)
    }

    fn qualifies(&self, utterance: &UtteranceBoundary) -> bool {
        utterance.ends_sentence() || utterance.duration() >= self.config.long_utterance_secs
    }

    fn tail<'a>(
        &self,
        voiced: &'a [f32],
        items_per_second: f64,
        utterance: &UtteranceBoundary,
    ) -> Option<&'a [f32]> {
        let tail_start = utterance
            .start
            .max(utterance.end - self.config.tail_window_secs)
            .max(0.0);
        let start = (tail_start * items_per_second).floor() as usize;
        let end = ((utterance.end.max(0.0) * items_per_second).floor() as usize).min(voiced.len());
        if start >= end || end - start < self.config.min_tail_points {
            return None;
        }
        Some(&voiced[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PitchFrame;

    fn track(values: &[Option<f32>]) -> PitchTrack {
        PitchTrack {
            frames: values
                .iter()
                .enumerate()
                .map(|(index, f0)| PitchFrame { index, f0_hz: *f0 })
                .collect(),
            hop_size: 512,
            sample_rate: 44_100,
        }
    }

    /// 2 seconds of voiced frames: flat, then a tail moving by `step` Hz per frame.
    fn contour(step: f32) -> PitchTrack {
        let values: Vec<Option<f32>> = (0..172)
            .map(|i| {
                if i < 129 {
                    Some(200.0)
                } else {
                    Some(200.0 + step * (i - 129) as f32)
                }
            })
            .collect();
        track(&values)
    }

    #[test]
    fn unvoiced_clip_returns_neutral_fallback() {
        let result = IntonationClassifier::default().classify(
            &track(&[None; 40]),
            0.5,
            &[UtteranceBoundary::new(0.0, 0.5, "Hello.")],
        );
        assert_eq!(result, IntonationResult::neutral());
        assert_eq!(result.falling_intonation_score(), 50);
    }

    #[test]
    fn falling_tail_scores_full_marks() {
        let result = IntonationClassifier::default().classify(
            &contour(-2.0),
            2.0,
            &[UtteranceBoundary::new(0.0, 2.0, "That is final.")],
        );
        assert_eq!(result.falling_intonation, Scored::Measured(100));
    }

    #[test]
    fn rising_tail_scores_zero() {
        let result = IntonationClassifier::default().classify(
            &contour(2.0),
            2.0,
            &[UtteranceBoundary::new(0.0, 2.0, "Is it final?")],
        );
        assert_eq!(result.falling_intonation, Scored::Measured(0));
    }

    #[test]
    fn mixed_utterances_average() {
        let mut values: Vec<Option<f32>> = (0..86).map(|i| Some(220.0 - 3.0 * i as f32)).collect();
        values.extend((0..86).map(|i| Some(150.0 + 3.0 * i as f32)));
        let result = IntonationClassifier::default().classify(
            &track(&values),
            2.0,
            &[
                UtteranceBoundary::new(0.0, 1.0, "Going down."),
                UtteranceBoundary::new(1.0, 2.0, "Going up?"),
            ],
        );
        assert_eq!(result.falling_intonation, Scored::Measured(50));
    }

    #[test]
    fn short_unpunctuated_utterance_is_ignored() {
        let result = IntonationClassifier::default().classify(
            &contour(-2.0),
            2.0,
            &[UtteranceBoundary::new(1.5, 2.0, "and so")],
        );
        assert_eq!(result.falling_intonation, Scored::InsufficientEvidence);
        assert_eq!(result.falling_intonation_score(), 50);
    }

    #[test]
    fn long_unpunctuated_utterance_qualifies() {
        let result = IntonationClassifier::default().classify(
            &contour(-2.0),
            2.0,
            &[UtteranceBoundary::new(0.5, 2.0, "and so")],
        );
        assert_eq!(result.falling_intonation, Scored::Measured(100));
    }

    #[test]
    fn steady_pitch_is_fully_stable() {
        let result = IntonationClassifier::default().classify(&contour(0.0), 2.0, &[]);
        assert_eq!(result.pitch_stability, 1.0);
        assert_eq!(result.mean_pitch_hz, 200.0);
        assert_eq!(result.pitch_range_hz, 0.0);
        assert_eq!(result.voiced_frames, 172);
    }

    #[test]
    fn stability_stays_in_unit_interval() {
        let values: Vec<Option<f32>> = (0..60)
            .map(|i| Some(if i % 2 == 0 { 51.0 } else { 499.0 }))
            .collect();
        let result = IntonationClassifier::default().classify(&track(&values), 1.0, &[]);
        assert!((0.0..=1.0).contains(&result.pitch_stability));
        assert_eq!(result.pitch_range_hz, 448.0);
    }
}
