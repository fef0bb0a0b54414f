use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub device_name: Option<String>,
    pub latency_ms: RangeInclusive<u32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            latency_ms: 100..=200,
        }
    }
}

/// Running microphone stream delivering mono f32 chunks at the device rate.
pub struct LiveCapture {
    stream: Stream,
    receiver: Receiver<Vec<f32>>,
    finished: Arc<AtomicBool>,
    sample_rate: u32,
}

impl LiveCapture {
    pub fn start(config: &CaptureConfig) -> Result<Self> {
        let device = select_device(config)?;
        let supported = device
            .default_input_config()
            .context("failed to query default input config")?;
        let stream_config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: BufferSize::Default,
        };
        let sample_rate = stream_config.sample_rate.0;
        let capacity = channel_capacity(sample_rate, &config.latency_ms);
        let (sender, receiver) = mpsc::sync_channel::<Vec<f32>>(capacity);
        let finished = Arc::new(AtomicBool::new(false));

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_input_stream::<f32>(&device, &stream_config, sender, &finished),
            SampleFormat::I16 => build_input_stream::<i16>(&device, &stream_config, sender, &finished),
            SampleFormat::U16 => build_input_stream::<u16>(&device, &stream_config, sender, &finished),
            other => Err(anyhow!("unsupported input sample format {:?}", other)),
        }?;
        stream.play().context("failed to start live capture stream")?;
        info!(
            sample_rate,
            channels = stream_config.channels,
            "live capture stream started"
        );

        Ok(Self {
            stream,
            receiver,
            finished,
            sample_rate,
        })
    }

    pub fn recv_chunk(&self, timeout: Duration) -> Option<Vec<f32>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(chunk) => Some(chunk),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn stop(&self) {
        self.finished.store(true, Ordering::SeqCst);
        let _ = self.stream.pause();
    }
}

impl Drop for LiveCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

fn select_device(config: &CaptureConfig) -> Result<Device> {
    let host = cpal::default_host();
    if let Some(name) = config.device_name.as_deref() {
        for device in host
            .input_devices()
            .context("listing input devices failed")?
        {
            if device.name().map(|n| n == name).unwrap_or(false) {
                return Ok(device);
            }
        }
        return Err(anyhow!("input device '{}' not found", name));
    }
    host.default_input_device()
        .context("no default input device available")
}

fn build_input_stream<T>(
    device: &Device,
    config: &StreamConfig,
    sender: SyncSender<Vec<f32>>,
    finished: &Arc<AtomicBool>,
) -> Result<Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let finished = finished.clone();
    device
        .build_input_stream(
            config,
            move |data: &[T], _| {
                if finished.load(Ordering::Relaxed) || channels == 0 {
                    return;
                }
                let mono = data
                    .chunks(channels)
                    .map(|frame| {
                        mix_to_mono(frame.iter().map(|&s| f32::from_sample(s)))
                    })
                    .collect();
                // A full channel means the consumer is behind; drop the chunk.
                let _ = sender.try_send(mono);
            },
            |err| warn!(error = %err, "audio input stream error"),
            None,
        )
        .context("failed to build input stream")
}

fn channel_capacity(sample_rate: u32, latency_ms: &RangeInclusive<u32>) -> usize {
    let max_latency = (*latency_ms.end()).max(*latency_ms.start());
    let frames = (sample_rate as u64 * max_latency as u64) / 1000;
    (frames / 1024).max(2) as usize
}

pub fn mix_to_mono(frame: impl ExactSizeIterator<Item = f32>) -> f32 {
    let len = frame.len();
    if len == 0 {
        return 0.0;
    }
    frame.sum::<f32>() / len as f32
}
