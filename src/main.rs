//! Vocalyzer command line: analyze recorded clips, transcode them to the
//! canonical 44.1 kHz mono WAV, or run a live exercise. Feature records are
//! printed as JSON on stdout; logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vocalyzer::aggregate::{FeatureAggregator, TextMetrics};
use vocalyzer::audio::capture::CaptureConfig;
use vocalyzer::audio::{decoder, encoder};
use vocalyzer::cli::{
    AnalyzeArgs, BatchArgs, Cli, Command, ConfigArgs, ExerciseArgs, TranscodeArgs,
};
use vocalyzer::config::AnalysisConfig;
use vocalyzer::live::session::{CaptureSource, ExerciseSession, LiveCaptureSource};
use vocalyzer::pipeline::{self, ClipAnalysis};
use vocalyzer::types::{ExerciseScoreResult, UtteranceBoundary};

/// Wall-clock slack past the exercise length before a stalled capture is abandoned.
const STALL_GRACE: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => handle_analyze(&args),
        Command::Batch(args) => handle_batch(&args),
        Command::Transcode(args) => handle_transcode(&args),
        Command::Exercise(args) => handle_exercise(&args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &ConfigArgs) -> Result<AnalysisConfig> {
    AnalysisConfig::load(args.config_file.as_deref(), args.config_json.as_deref())
        .context("Failed to load analysis config")
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<()> {
    ensure!(
        args.input.is_file(),
        "Input path is not a file: {:?}",
        args.input
    );
    let config = load_config(&args.config)?;
    let utterances = match &args.utterances {
        Some(path) => read_json::<Vec<UtteranceBoundary>>(path, "utterance boundaries")?,
        None => Vec::new(),
    };
    let text_metrics = match &args.text_metrics {
        Some(path) => read_json::<TextMetrics>(path, "text metrics")?,
        None => TextMetrics::default(),
    };

    info!(
        input = %args.input.display(),
        utterances = utterances.len(),
        "analyzing clip"
    );
    let analysis = pipeline::analyze_file(&args.input, &utterances, &config)
        .with_context(|| format!("Failed to analyze {:?}", args.input))?;
    let features = FeatureAggregator::new().merge(analysis, text_metrics);
    print_json(&features, args.pretty)
}

#[derive(Serialize)]
struct BatchEntry {
    input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<ClipAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn handle_batch(args: &BatchArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let results = pipeline::analyze_batch(&args.inputs, &config, args.jobs.map(usize::from))
        .context("Failed to run batch analysis")?;
    let entries: Vec<BatchEntry> = results
        .into_iter()
        .zip(&args.inputs)
        .map(|(result, input)| match result {
            Ok(analysis) => BatchEntry {
                input: input.clone(),
                analysis: Some(analysis),
                error: None,
            },
            Err(err) => BatchEntry {
                input: input.clone(),
                analysis: None,
                error: Some(err.to_string()),
            },
        })
        .collect();
    print_json(&entries, args.pretty)
}

fn handle_transcode(args: &TranscodeArgs) -> Result<()> {
    let pcm = decoder::decode_file(&args.input)
        .with_context(|| format!("Failed to decode {:?}", args.input))?;
    encoder::encode_wav(&pcm, &args.output)?;
    info!(
        output = %args.output.display(),
        samples = pcm.len(),
        sample_rate = pcm.sample_rate,
        "wrote canonical PCM"
    );
    Ok(())
}

fn handle_exercise(args: &ExerciseArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let duration = args.duration.unwrap_or(config.live.exercise_secs);
    ensure!(
        duration > 0.0,
        "Exercise duration must be positive, got: {}",
        duration
    );
    let capture = LiveCaptureSource::new(CaptureConfig {
        device_name: args.device.clone(),
        ..CaptureConfig::default()
    });
    let session = ExerciseSession::new(args.kind, config, capture);
    eprintln!(
        "Recording {:?} exercise for {:.0} seconds...",
        session.kind(),
        duration
    );
    let result = run_exercise(session, duration)?;
    print_json(&result, args.pretty)
}

/// Drive a session until `duration_secs` of audio has been scored. The
/// length bound lives here, with the caller, not in the scorers.
fn run_exercise<C: CaptureSource>(
    mut session: ExerciseSession<C>,
    duration_secs: f64,
) -> Result<ExerciseScoreResult> {
    session.start().context("Failed to start exercise capture")?;
    let deadline = Duration::from_secs_f64(duration_secs) + STALL_GRACE;
    let started = Instant::now();
    while session.elapsed_secs() < duration_secs {
        session.poll().context("Exercise capture failed")?;
        if started.elapsed() > deadline {
            warn!(
                elapsed_secs = session.elapsed_secs(),
                "capture stalled; scoring what was collected"
            );
            break;
        }
    }
    Ok(session.finish())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, label: &str) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} from {:?}", label, path))?;
    serde_json::from_str(&data).with_context(|| format!("Failed to parse {} JSON", label))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocalyzer::live::session::MockCapture;
    use vocalyzer::live::ExerciseKind;

    #[test]
    fn run_exercise_stops_at_duration() {
        let capture = MockCapture::from_samples(44_100, vec![0.2; 44_100 * 3], 2048);
        let session =
            ExerciseSession::new(ExerciseKind::Projection, AnalysisConfig::default(), capture);
        let result = run_exercise(session, 2.0).unwrap();
        let ExerciseScoreResult::Projection(scored) = result else {
            panic!("expected projection result");
        };
        let score = scored.measured().unwrap();
        assert!(score.valid_samples >= 20 && score.valid_samples <= 21);
    }

    #[test]
    fn reads_utterance_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utterances.json");
        fs::write(&path, r#"[{"start": 0.0, "end": 1.2, "text": "Hello there."}]"#).unwrap();
        let utterances: Vec<UtteranceBoundary> = read_json(&path, "utterances").unwrap();
        assert_eq!(utterances.len(), 1);
        assert!(utterances[0].ends_sentence());
    }
}
