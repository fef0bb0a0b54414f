use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::live::ExerciseKind;

/// Vocalyzer - acoustic scoring for speech coaching
///
/// Scores recorded clips for intonation and timbre, and runs live
/// intonation and projection exercises from the microphone.
#[derive(Parser, Debug)]
#[command(name = "vocalyzer", version)]
#[command(
    about = "Objective pitch, timbre and projection scores for speech coaching",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one recorded clip and print its feature record as JSON.
    Analyze(AnalyzeArgs),
    /// Analyze several clips concurrently (no utterance boundaries).
    Batch(BatchArgs),
    /// Decode any supported container to canonical 44.1 kHz mono WAV.
    Transcode(TranscodeArgs),
    /// Run a live exercise from the microphone and print its score.
    Exercise(ExerciseArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a JSON calibration/config file.
    #[arg(long, value_name = "PATH", conflicts_with = "config_json")]
    pub config_file: Option<PathBuf>,
    /// Inline JSON calibration/config.
    #[arg(long, value_name = "JSON", conflicts_with = "config_file")]
    pub config_json: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Input audio file (WAV, MP3, OGG, FLAC, ...).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// JSON array of {start, end, text} utterance boundaries.
    #[arg(long, value_name = "PATH")]
    pub utterances: Option<PathBuf>,
    /// JSON object of externally computed text metrics to merge in.
    #[arg(long = "text-metrics", value_name = "PATH")]
    pub text_metrics: Option<PathBuf>,
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,
    /// Worker threads (defaults to one fewer than the available cores).
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,
    #[command(flatten)]
    pub config: ConfigArgs,
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TranscodeArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ExerciseArgs {
    #[arg(value_enum)]
    pub kind: ExerciseKind,
    /// Exercise length in seconds (defaults to the configured duration).
    #[arg(long)]
    pub duration: Option<f64>,
    /// Optional input device name.
    #[arg(long)]
    pub device: Option<String>,
    #[command(flatten)]
    pub config: ConfigArgs,
    #[arg(long)]
    pub pretty: bool,
}
