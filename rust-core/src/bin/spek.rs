//! `spek` - print the cutoff frequency and dominant band of audio files

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use spek::analysis::{AnalysisSummary, Analyzer};
use spek::audio::decode::{decode_file, is_supported};
use spek::config::AnalysisConfig;
use spek::spectrum::{PowerScaling, WindowType};

const LOCAL_CONFIG: &str = "spek.toml";

#[derive(Parser, Debug)]
#[command(name = "spek", version)]
#[command(about = "Estimate the effective bandwidth and dominant frequency band of audio files")]
struct Args {
    /// Audio files or directories to analyze (directories are searched recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// TOML config file (defaults to ./spek.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// STFT frame size in samples
    #[arg(long)]
    frame_size: Option<usize>,

    /// Samples shared by consecutive frames
    #[arg(long)]
    overlap: Option<usize>,

    /// Window function (hann, hamming, blackman, rectangular)
    #[arg(long)]
    window: Option<WindowType>,

    /// Power normalization (raw, spectrum, density)
    #[arg(long)]
    scaling: Option<PowerScaling>,

    /// Store linear power instead of dB
    #[arg(long)]
    power: bool,

    /// Cutoff threshold in dB
    #[arg(long, allow_hyphen_values = true)]
    threshold_db: Option<f64>,

    /// Noise floor in dB
    #[arg(long, allow_hyphen_values = true)]
    floor_db: Option<f64>,

    /// Band boundaries in Hz, comma-separated (e.g. 0,1000,4000,22050)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    bands: Option<Vec<f64>>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct FileResult {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<AnalysisSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();

    let config = build_config(&args)?;
    let files = collect_audio_files(&args.inputs);
    if files.is_empty() {
        anyhow::bail!("No audio files found");
    }
    info!("Analyzing {} file(s)", files.len());

    let results: Vec<FileResult> = files
        .par_iter()
        .map_init(
            || Analyzer::new(config.clone()),
            |analyzer, path| {
                let outcome = analyzer
                    .as_mut()
                    .map_err(|e| anyhow::anyhow!("{}", e))
                    .and_then(|analyzer| analyze_file(analyzer, path));
                match outcome {
                    Ok(summary) => FileResult {
                        path: path.clone(),
                        summary: Some(summary),
                        error: None,
                    },
                    Err(e) => FileResult {
                        path: path.clone(),
                        summary: None,
                        error: Some(format!("{:#}", e)),
                    },
                }
            },
        )
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            print_result(result);
        }
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", failed, results.len());
    }

    Ok(())
}

/// Config file first, then explicit flags on top
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let path = args.config.clone().or_else(|| {
        let local = PathBuf::from(LOCAL_CONFIG);
        local.exists().then_some(local)
    });

    let mut config = match path {
        Some(path) => {
            let config = AnalysisConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            config
        }
        None => AnalysisConfig::default(),
    };

    if let Some(frame_size) = args.frame_size {
        config.frame_size = frame_size;
    }
    if let Some(overlap) = args.overlap {
        config.overlap = overlap;
    }
    if let Some(window) = args.window {
        config.window = window;
    }
    if let Some(scaling) = args.scaling {
        config.scaling = scaling;
    }
    if args.power {
        config.decibels = false;
    }
    if let Some(threshold_db) = args.threshold_db {
        config.threshold_db = threshold_db;
    }
    if let Some(floor_db) = args.floor_db {
        config.floor_db = floor_db;
    }
    if let Some(bands) = &args.bands {
        config.bands = bands.clone();
    }

    config.validate().context("Invalid analysis configuration")?;
    Ok(config)
}

fn collect_audio_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && is_supported(p))
                .collect();
            found.sort();
            files.extend(found);
        } else if input.exists() {
            files.push(input.clone());
        } else {
            warn!("Skipping missing path {}", input.display());
        }
    }

    files
}

fn analyze_file(analyzer: &mut Analyzer, path: &Path) -> Result<AnalysisSummary> {
    let waveform = decode_file(path).with_context(|| format!("Failed to decode {}", path.display()))?;
    let report = analyzer
        .analyze(&waveform)
        .with_context(|| format!("Failed to analyze {}", path.display()))?;
    Ok(report.summary())
}

fn print_result(result: &FileResult) {
    println!("{}", result.path.display());

    let summary = match (&result.summary, &result.error) {
        (Some(summary), _) => summary,
        (None, Some(error)) => {
            println!("  Error: {}", error);
            println!();
            return;
        }
        (None, None) => return,
    };

    let nyquist = summary.sample_rate as f64 / 2.0;
    println!("  Sample Rate: {} Hz", summary.sample_rate);
    println!("  Channels: {}", summary.channels);
    println!("  Duration: {:.2}s ({} frames)", summary.duration_secs, summary.frames);

    if summary.cutoff.is_found() {
        println!(
            "  Cutoff: {:.0} Hz ({:.1}% of Nyquist)",
            summary.cutoff_hz,
            100.0 * summary.cutoff_hz / nyquist
        );
    } else {
        println!("  Cutoff: none (no bin above threshold)");
    }

    if let Some(band) = summary.dominant_band {
        println!("  Dominant Band: {:.0}-{:.0} Hz", band.low_hz, band.high_hz);
    }
    println!();
}
