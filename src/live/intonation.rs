//! Variation, pause and emphasis scoring for the live intonation exercise.

use crate::config::LiveConfig;
use crate::stats;
use crate::types::{IntonationExerciseScore, LiveScoreSample, Scored};

const VARIATION_WEIGHT: f32 = 0.4;
const PAUSE_WEIGHT: f32 = 0.2;
const EMPHASIS_WEIGHT: f32 = 0.4;

/// Score a finished intonation exercise. Returns insufficient evidence when
/// fewer than `min_voiced_samples` readings carried a pitch.
pub fn score_intonation(
    samples: &[LiveScoreSample],
    config: &LiveConfig,
) -> Scored<IntonationExerciseScore> {
    let raw: Vec<f32> = samples.iter().map(|s| s.pitch_hz.max(0.0)).collect();
    let voiced: Vec<f32> = raw.iter().copied().filter(|&p| p > 0.0).collect();
    if voiced.len() < config.min_voiced_samples {
        return Scored::InsufficientEvidence;
    }

    let std_dev = stats::std_dev(&voiced);
    let variation = variation_score(std_dev);

    let pause_count = stats::interior_zero_runs(&raw)
        .into_iter()
        .filter(|len| (config.pause_min_samples..=config.pause_max_samples).contains(len))
        .count();
    let pause = pause_score(pause_count);

    let emphasis_moments =
        stats::local_extrema(&voiced, config.emphasis_window, 0.5 * std_dev).total();
    let emphasis = emphasis_score(emphasis_moments);

    let overall = stats::clamp_score(
        VARIATION_WEIGHT * variation + PAUSE_WEIGHT * pause + EMPHASIS_WEIGHT * emphasis,
    );

    Scored::Measured(IntonationExerciseScore {
        variation_score: variation,
        pause_score: pause,
        emphasis_score: emphasis,
        overall_score: overall,
        pitch_std_dev_hz: std_dev,
        pause_count,
        emphasis_moments,
        voiced_samples: voiced.len(),
    })
}

/// Reward pitch spread in the expressive 10-50 Hz band; penalize monotone
/// delivery below it and theatrical swings above it.
pub fn variation_score(std_dev: f32) -> f32 {
    let score = if std_dev < 10.0 {
        (std_dev / 10.0) * 40.0
    } else if std_dev <= 50.0 {
        40.0 + ((std_dev - 10.0) / 40.0) * 60.0
    } else if std_dev <= 80.0 {
        100.0 - ((std_dev - 50.0) / 30.0) * 20.0
    } else {
        (80.0 - ((std_dev - 80.0) / 20.0) * 30.0).max(50.0)
    };
    score.clamp(0.0, 100.0)
}

/// Strategic pauses: none reads as rushed, more than six as hesitation.
pub fn pause_score(count: usize) -> f32 {
    let n = count as f32;
    let score = match count {
        0 => 30.0,
        1..=2 => 50.0 + 15.0 * n,
        3..=6 => 80.0 + 5.0 * (n - 2.0),
        _ => (100.0 - 10.0 * (n - 6.0)).max(40.0),
    };
    score.clamp(0.0, 100.0)
}

pub fn emphasis_score(moments: usize) -> f32 {
    let moments = moments as f32;
    let score = if moments < 2.0 {
        moments * 30.0
    } else if moments <= 10.0 {
        60.0 + ((moments - 2.0) / 8.0) * 40.0
    } else {
        (100.0 - (moments - 10.0) * 5.0).max(50.0)
    };
    score.clamp(0.0, 100.0)
}
