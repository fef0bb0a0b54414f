//! Merges engine output with text metrics computed outside the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::ClipAnalysis;
use crate::types::{IntonationResult, TimbreResult};

/// Named numeric metrics produced by the transcription layer
/// (words per minute, filler counts, ...). The engine does not interpret them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextMetrics(pub BTreeMap<String, f64>);

impl TextMetrics {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }
}

/// One result record combining acoustic and text features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechFeatures {
    pub duration_secs: f64,
    pub falling_intonation_score: u8,
    pub intonation: IntonationResult,
    pub timbre: TimbreResult,
    pub text_metrics: TextMetrics,
}

#[derive(Debug, Default)]
pub struct FeatureAggregator {}

impl FeatureAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&self, analysis: ClipAnalysis, text_metrics: TextMetrics) -> SpeechFeatures {
        SpeechFeatures {
            duration_secs: analysis.duration_secs,
            falling_intonation_score: analysis.intonation.falling_intonation_score(),
            intonation: analysis.intonation,
            timbre: analysis.timbre,
            text_metrics,
        }
    }
}
