//! Capture loop driving one live exercise.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info};

use super::{ExerciseKind, FrameEstimator, LiveSampleBuffer};
use crate::audio::capture::{CaptureConfig, LiveCapture};
use crate::audio::resample::linear_resample;
use crate::audio::TARGET_SAMPLE_RATE;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::types::{ExerciseScoreResult, LiveScoreSample};

const CAPTURE_POLL_MS: u64 = 20;

pub trait CaptureSource {
    /// Start delivering audio; returns the source sample rate.
    fn start(&mut self) -> Result<u32>;
    fn recv_chunk(&mut self, timeout: Duration) -> Option<Vec<f32>>;
    fn stop(&mut self);
}

/// One exercise: captured audio is cut into cadence ticks, each tick yields a
/// reading, and the readings are scored once capture has stopped.
pub struct ExerciseSession<C: CaptureSource> {
    kind: ExerciseKind,
    capture: C,
    config: AnalysisConfig,
    estimator: FrameEstimator,
    buffer: LiveSampleBuffer,
    capture_rate: Option<u32>,
    pending: Vec<f32>,
    history: VecDeque<f32>,
    tick_samples: usize,
    cadence_hz: u32,
}

impl<C: CaptureSource> ExerciseSession<C> {
    pub fn new(kind: ExerciseKind, config: AnalysisConfig, capture: C) -> Self {
        let cadence_hz = kind.cadence_hz(&config.live);
        let estimator = FrameEstimator::new(&config.pitch, &config.live, TARGET_SAMPLE_RATE);
        let buffer = LiveSampleBuffer::for_duration(config.live.exercise_secs, cadence_hz);
        Self {
            kind,
            capture,
            estimator,
            buffer,
            capture_rate: None,
            pending: Vec::new(),
            history: VecDeque::with_capacity(config.pitch.window_size),
            tick_samples: (TARGET_SAMPLE_RATE / cadence_hz.max(1)) as usize,
            cadence_hz,
            config,
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn start(&mut self) -> Result<()> {
        let rate = self.capture.start()?;
        if rate == 0 {
            return Err(AnalysisError::capture("capture source reported a zero sample rate"));
        }
        self.capture_rate = Some(rate);
        info!(
            exercise = ?self.kind,
            capture_rate = rate,
            cadence_hz = self.cadence_hz,
            "exercise capture started"
        );
        Ok(())
    }

    /// Pull at most one chunk from the capture source and turn every complete
    /// tick into a reading. Returns `None` when no audio arrived.
    pub fn poll(&mut self) -> Result<Option<usize>> {
        let rate = self
            .capture_rate
            .ok_or_else(|| AnalysisError::capture("capture stream not started"))?;
        let Some(chunk) = self
            .capture
            .recv_chunk(Duration::from_millis(CAPTURE_POLL_MS))
        else {
            return Ok(None);
        };
        self.pending
            .extend(linear_resample(&chunk, rate, TARGET_SAMPLE_RATE));

        let mut produced = 0;
        while self.pending.len() >= self.tick_samples {
            let tick: Vec<f32> = self.pending.drain(..self.tick_samples).collect();
            self.push_history(&tick);
            let timestamp = self.buffer.len() as f64 / self.cadence_hz as f64;
            let frame: Vec<f32> = self.history.iter().copied().collect();
            let sample = self.estimator.estimate(&frame, timestamp);
            self.buffer.push(sample);
            produced += 1;
        }
        let log_every = (self.cadence_hz as usize * 5).max(1);
        if produced > 0 && (self.buffer.len() - produced) / log_every != self.buffer.len() / log_every {
            debug!(
                readings = self.buffer.len(),
                elapsed_secs = self.elapsed_secs(),
                "exercise progress"
            );
        }
        Ok(Some(produced))
    }

    /// Seconds of audio turned into readings so far.
    pub fn elapsed_secs(&self) -> f64 {
        self.buffer.len() as f64 / self.cadence_hz as f64
    }

    pub fn latest(&self) -> Option<&LiveScoreSample> {
        self.buffer.last()
    }

    pub fn readings(&self) -> &[LiveScoreSample] {
        self.buffer.as_slice()
    }

    /// Stop capturing and score the collected readings. The buffer is
    /// released with the session.
    pub fn finish(mut self) -> ExerciseScoreResult {
        self.capture.stop();
        info!(
            exercise = ?self.kind,
            readings = self.buffer.len(),
            "exercise capture stopped; scoring"
        );
        self.kind.score(&self.buffer, &self.config.live)
    }

    /// Stop capturing and discard everything collected.
    pub fn cancel(mut self) {
        self.capture.stop();
        info!(exercise = ?self.kind, "exercise cancelled");
    }

    fn push_history(&mut self, tick: &[f32]) {
        let window = self.config.pitch.window_size;
        self.history.extend(tick.iter().copied());
        while self.history.len() > window {
            self.history.pop_front();
        }
    }
}

/// Microphone-backed capture source.
pub struct LiveCaptureSource {
    config: CaptureConfig,
    live: Option<LiveCapture>,
}

impl LiveCaptureSource {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config, live: None }
    }
}

impl CaptureSource for LiveCaptureSource {
    fn start(&mut self) -> Result<u32> {
        let live = LiveCapture::start(&self.config)
            .map_err(|err| AnalysisError::capture(format!("{err:#}")))?;
        let sample_rate = live.sample_rate();
        self.live = Some(live);
        Ok(sample_rate)
    }

    fn recv_chunk(&mut self, timeout: Duration) -> Option<Vec<f32>> {
        self.live
            .as_ref()
            .and_then(|capture| capture.recv_chunk(timeout))
    }

    fn stop(&mut self) {
        if let Some(capture) = self.live.take() {
            capture.stop();
        }
    }
}

/// Replays prepared samples in fixed-size chunks.
pub struct MockCapture {
    sample_rate: u32,
    chunks: VecDeque<Vec<f32>>,
    started: bool,
}

impl MockCapture {
    pub fn from_samples(sample_rate: u32, samples: Vec<f32>, chunk_len: usize) -> Self {
        let chunks = if chunk_len == 0 {
            VecDeque::from([samples])
        } else {
            samples.chunks(chunk_len).map(<[f32]>::to_vec).collect()
        };
        Self {
            sample_rate,
            chunks,
            started: false,
        }
    }
}

impl CaptureSource for MockCapture {
    fn start(&mut self) -> Result<u32> {
        self.started = true;
        Ok(self.sample_rate)
    }

    fn recv_chunk(&mut self, _timeout: Duration) -> Option<Vec<f32>> {
        if !self.started {
            return None;
        }
        self.chunks.pop_front()
    }

    fn stop(&mut self) {
        self.started = false;
    }
}
