//! Loudness zone scoring for the live projection exercise.

use serde::Serialize;

use crate::config::LiveConfig;
use crate::stats;
use crate::types::{ProjectionExerciseScore, Scored};

const OPTIMAL_WEIGHT: f32 = 0.5;
const CONSISTENCY_WEIGHT: f32 = 0.3;
const BASELINE_BONUS: f32 = 20.0;
const CONSISTENCY_PENALTY_PER_HZ: f32 = 2.5;
const SATURATION_PENALTY: f32 = 0.20;
const WHISPER_PENALTY: f32 = 0.10;

/// Ordered, non-overlapping loudness buckets on the 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeZone {
    Silence,
    Whisper,
    Conversation,
    Projection,
    Saturation,
}

impl VolumeZone {
    pub fn classify(loudness: f32) -> Self {
        match loudness {
            l if l < 10.0 => VolumeZone::Silence,
            l if l < 40.0 => VolumeZone::Whisper,
            l if l < 70.0 => VolumeZone::Conversation,
            l if l < 90.0 => VolumeZone::Projection,
            _ => VolumeZone::Saturation,
        }
    }

    /// Conversation and projection together form the target range.
    pub fn is_optimal(self) -> bool {
        matches!(self, VolumeZone::Conversation | VolumeZone::Projection)
    }
}

/// Score a finished projection exercise from its loudness readings.
pub fn score_projection(loudness: &[f32], config: &LiveConfig) -> Scored<ProjectionExerciseScore> {
    let valid: Vec<f32> = loudness
        .iter()
        .copied()
        .filter(|&l| l > config.loudness_noise_floor)
        .collect();
    if valid.len() < config.min_loudness_samples {
        return Scored::InsufficientEvidence;
    }

    let total = valid.len() as f32;
    let percent_in = |predicate: fn(VolumeZone) -> bool| {
        valid
            .iter()
            .filter(|&&l| predicate(VolumeZone::classify(l)))
            .count() as f32
            / total
            * 100.0
    };
    let time_in_optimal_pct = percent_in(VolumeZone::is_optimal);
    let saturation_pct = percent_in(|zone| zone == VolumeZone::Saturation);
    let whisper_pct = percent_in(|zone| zone == VolumeZone::Whisper);

    let consistency = (100.0 - CONSISTENCY_PENALTY_PER_HZ * stats::std_dev(&valid)).max(0.0);
    let peak_volume = stats::min_max(&valid).map_or(0.0, |(_, hi)| hi);

    let score = stats::clamp_score(
        OPTIMAL_WEIGHT * time_in_optimal_pct + CONSISTENCY_WEIGHT * consistency + BASELINE_BONUS
            - saturation_pct * SATURATION_PENALTY
            - whisper_pct * WHISPER_PENALTY,
    );

    Scored::Measured(ProjectionExerciseScore {
        score,
        avg_volume: stats::mean(&valid),
        peak_volume,
        time_in_optimal_pct,
        consistency,
        saturation_pct,
        whisper_pct,
        valid_samples: valid.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zones_partition_the_scale() {
        assert_eq!(VolumeZone::classify(0.0), VolumeZone::Silence);
        assert_eq!(VolumeZone::classify(9.99), VolumeZone::Silence);
        assert_eq!(VolumeZone::classify(10.0), VolumeZone::Whisper);
        assert_eq!(VolumeZone::classify(40.0), VolumeZone::Conversation);
        assert_eq!(VolumeZone::classify(70.0), VolumeZone::Projection);
        assert_eq!(VolumeZone::classify(90.0), VolumeZone::Saturation);
        assert_eq!(VolumeZone::classify(100.0), VolumeZone::Saturation);
        assert!(VolumeZone::Conversation.is_optimal());
        assert!(!VolumeZone::Whisper.is_optimal());
    }

    #[test]
    fn steady_projection_scores_perfectly() {
        let score = score_projection(&[80.0; 300], &LiveConfig::default())
            .measured()
            .unwrap();
        assert_eq!(score.time_in_optimal_pct, 100.0);
        assert_eq!(score.consistency, 100.0);
        assert_eq!(score.score, 100.0);
        assert_eq!(score.peak_volume, 80.0);
        assert_eq!(score.valid_samples, 300);
    }

    #[test]
    fn whispering_is_penalized() {
        let score = score_projection(&[25.0; 100], &LiveConfig::default())
            .measured()
            .unwrap();
        assert_eq!(score.whisper_pct, 100.0);
        // 0 + 30 + 20 - 10
        assert_eq!(score.score, 40.0);
    }

    #[test]
    fn shouting_is_penalized() {
        let mut readings = vec![95.0; 50];
        readings.extend([75.0; 50]);
        let score = score_projection(&readings, &LiveConfig::default())
            .measured()
            .unwrap();
        assert_relative_eq!(score.saturation_pct, 50.0);
        // std dev 10 -> consistency 75; 25 + 22.5 + 20 - 10 = 57.5
        assert_relative_eq!(score.consistency, 75.0);
        assert!((57.0..=58.0).contains(&score.score), "{}", score.score);
    }

    #[test]
    fn noise_floor_readings_do_not_count() {
        let mut readings = vec![2.0; 500];
        readings.extend([60.0; 19]);
        let result = score_projection(&readings, &LiveConfig::default());
        assert_eq!(result, Scored::InsufficientEvidence);
        assert_eq!(result.unwrap_or_default(), ProjectionExerciseScore::default());
    }
}
