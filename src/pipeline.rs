//! Batch analysis of recorded clips.

use std::path::{Path, PathBuf};
use std::thread;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::audio::decoder;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::intonation::IntonationClassifier;
use crate::pitch::PitchTracker;
use crate::timbre::TimbreAnalyzer;
use crate::types::{IntonationResult, PcmBuffer, TimbreResult, UtteranceBoundary};

/// Engine output for one clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipAnalysis {
    pub duration_secs: f64,
    pub pitch_frames: usize,
    pub intonation: IntonationResult,
    pub timbre: TimbreResult,
}

/// Run both analysis paths over an already decoded buffer.
pub fn analyze_pcm(
    pcm: &PcmBuffer,
    utterances: &[UtteranceBoundary],
    config: &AnalysisConfig,
) -> ClipAnalysis {
    let duration_secs = pcm.duration_secs();
    let track = PitchTracker::new(config.pitch.clone()).track(pcm);
    let intonation = IntonationClassifier::new(config.intonation.clone()).classify(
        &track,
        duration_secs,
        utterances,
    );
    let timbre = TimbreAnalyzer::new(config.timbre.clone()).analyze(pcm);

    info!(
        duration_secs,
        voiced_frames = intonation.voiced_frames,
        falling = ?intonation.falling_intonation,
        "clip analysis complete"
    );
    ClipAnalysis {
        duration_secs,
        pitch_frames: track.frames.len(),
        intonation,
        timbre,
    }
}

pub fn analyze_bytes(
    bytes: Vec<u8>,
    utterances: &[UtteranceBoundary],
    config: &AnalysisConfig,
) -> Result<ClipAnalysis> {
    let pcm = decoder::decode_bytes(bytes)?;
    Ok(analyze_pcm(&pcm, utterances, config))
}

pub fn analyze_file(
    path: &Path,
    utterances: &[UtteranceBoundary],
    config: &AnalysisConfig,
) -> Result<ClipAnalysis> {
    let pcm = decoder::decode_file(path)?;
    info!(
        path = %path.display(),
        samples = pcm.len(),
        sample_rate = pcm.sample_rate,
        "decoded clip"
    );
    Ok(analyze_pcm(&pcm, utterances, config))
}

/// Analyze independent clips on a pool of `jobs` workers (one fewer than the
/// available cores by default). A failing clip does not affect the others;
/// results come back in input order.
pub fn analyze_batch(
    paths: &[PathBuf],
    config: &AnalysisConfig,
    jobs: Option<usize>,
) -> Result<Vec<Result<ClipAnalysis>>> {
    let jobs = jobs.unwrap_or_else(default_jobs).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|err| AnalysisError::Worker(err.to_string()))?;
    info!(clips = paths.len(), jobs, "analyzing batch");

    let results: Vec<Result<ClipAnalysis>> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let result = analyze_file(path, &[], config);
                if let Err(err) = &result {
                    warn!(path = %path.display(), error = %err, "clip analysis failed");
                }
                result
            })
            .collect()
    });
    Ok(results)
}

pub fn default_jobs() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}
