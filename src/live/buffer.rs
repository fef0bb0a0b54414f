use crate::types::LiveScoreSample;

/// Append-only readings for one exercise. The capture loop is the only
/// writer; scoring reads the buffer once capture has stopped.
#[derive(Debug, Clone, Default)]
pub struct LiveSampleBuffer {
    samples: Vec<LiveScoreSample>,
}

impl LiveSampleBuffer {
    /// Pre-size for `duration_secs` of readings at `rate_hz`.
    pub fn for_duration(duration_secs: f64, rate_hz: u32) -> Self {
        let expected = (duration_secs.max(0.0) * rate_hz as f64).ceil() as usize;
        Self {
            samples: Vec::with_capacity(expected),
        }
    }

    pub fn push(&mut self, sample: LiveScoreSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&LiveScoreSample> {
        self.samples.last()
    }

    pub fn as_slice(&self) -> &[LiveScoreSample] {
        &self.samples
    }

    pub fn loudness(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.loudness).collect()
    }
}

impl FromIterator<LiveScoreSample> for LiveSampleBuffer {
    fn from_iter<I: IntoIterator<Item = LiveScoreSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
