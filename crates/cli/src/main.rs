use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use sitting_core::detection::domain::object_detector::ObjectDetector;
use sitting_core::detection::infrastructure::bytetrack_tracker::ByteTracker;
use sitting_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use sitting_core::history::domain::history_ledger::{
    export_history, HistoryEntry, HistoryLedger, MediaType,
};
use sitting_core::history::domain::report_generator::{ReportData, ReportFormat, ReportGenerator};
use sitting_core::history::infrastructure::file_report_generator::FileReportGenerator;
use sitting_core::history::infrastructure::jsonl_history_ledger::JsonlHistoryLedger;
use sitting_core::pipeline::evaluate_image_use_case::EvaluateImageUseCase;
use sitting_core::pipeline::evaluate_video_use_case::EvaluateVideoUseCase;
use sitting_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use sitting_core::shared::constants::{
    COCO_LABELS, DEFAULT_CONFIDENCE, TRACKER_MAX_LOST, YOLO_MODEL_NAME,
};
use sitting_core::shared::model_resolver;
use sitting_core::sitting::domain::sitting_config::SittingConfig;
use sitting_core::sitting::domain::sitting_engine::SittingEngine;
use sitting_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use sitting_core::video::infrastructure::image_file_reader::ImageFileReader;

const HISTORY_FILE: &str = "history.jsonl";
const REPORTS_DIR: &str = "reports";

/// Counts people sitting on chairs and tables in an image or video.
#[derive(Parser)]
#[command(name = "sitting")]
struct Cli {
    /// Input image (.jpg, .jpeg, .png) or video (.mp4).
    input: PathBuf,

    /// YOLO ONNX model (default: yolov8n.onnx from the model cache).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Accumulated contact seconds for a video track to count as sitting.
    #[arg(long)]
    sitting_seconds: Option<f64>,

    /// JSON file with person_label, furniture_labels and sitting_seconds.
    #[arg(long)]
    config: Option<PathBuf>,

    /// History ledger file (default: history.jsonl in the app data dir).
    #[arg(long)]
    history: Option<PathBuf>,

    /// Do not record this run in the history ledger.
    #[arg(long)]
    no_history: bool,

    /// Write a report into this directory.
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Report format: text or json. Implies a report in the default dir.
    #[arg(long)]
    report_format: Option<String>,

    /// Export the full history ledger as a JSON array after the run.
    #[arg(long)]
    export_history: Option<PathBuf>,
}

/// What one run produced, independent of media type.
struct Outcome {
    people_sitting: usize,
    sitting_ids: Vec<u32>,
    json: String,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let media_type = validate(&cli)?;

    let config = build_config(&cli)?;
    let engine = SittingEngine::new(&config)?;
    let detector = build_detector(&cli, &config)?;

    let outcome = match media_type {
        MediaType::Image => {
            let mut use_case =
                EvaluateImageUseCase::new(Box::new(ImageFileReader::new()), detector, engine);
            let verdict = use_case.execute(&cli.input)?;
            Outcome {
                people_sitting: verdict.unique_people_sitting,
                sitting_ids: verdict.sitting_ids.clone(),
                json: serde_json::to_string_pretty(&verdict)?,
            }
        }
        MediaType::Video => {
            let mut use_case = EvaluateVideoUseCase::new(
                Box::new(FfmpegReader::new()),
                detector,
                engine,
                Box::new(StdoutPipelineLogger::default()),
                None,
                None,
            );
            let verdict = use_case.execute(&cli.input)?;
            Outcome {
                people_sitting: verdict.unique_people_sitting,
                sitting_ids: verdict.sitting_ids.clone(),
                json: serde_json::to_string_pretty(&verdict)?,
            }
        }
    };
    println!("{}", outcome.json);

    let entry = HistoryEntry::now(
        display_name(&cli.input),
        media_type,
        outcome.people_sitting,
    );
    let mut ledger = open_ledger(&cli)?;
    if let (Some(ledger), false) = (ledger.as_mut(), cli.no_history) {
        ledger.append(&entry)?;
    }

    if let Some(dir) = report_dir(&cli)? {
        let format = match cli.report_format.as_deref() {
            Some(f) => f.parse::<ReportFormat>()?,
            None => ReportFormat::Text,
        };
        let data = ReportData {
            filename: entry.filename.clone(),
            media_type,
            people_sitting: outcome.people_sitting,
            sitting_ids: outcome.sitting_ids,
            generated_at: entry.timestamp,
        };
        FileReportGenerator::new(dir).generate(&data, format)?;
    }

    if let (Some(ledger), Some(path)) = (ledger.as_ref(), &cli.export_history) {
        let count = export_history(&**ledger, path)?;
        log::info!("Exported {count} history entries to {}", path.display());
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<SittingConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SittingConfig::default(),
    };
    if let Some(seconds) = cli.sitting_seconds {
        config.sitting_seconds = seconds;
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<SittingConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
    let config = serde_json::from_str::<SittingConfig>(&text)
        .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    Ok(config)
}

fn build_detector(
    cli: &Cli,
    config: &SittingConfig,
) -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>> {
    let model_path = model_resolver::resolve(cli.model.as_deref(), YOLO_MODEL_NAME, None)?;
    log::info!("Using model {}", model_path.display());

    if !COCO_LABELS
        .iter()
        .any(|l| l.eq_ignore_ascii_case(&config.person_label))
    {
        log::warn!(
            "Person label '{}' is not a model class; no person will be tracked",
            config.person_label
        );
    }
    let labels = COCO_LABELS.iter().map(|s| s.to_string()).collect();
    let tracker = ByteTracker::new(TRACKER_MAX_LOST).with_new_track_thresh(cli.confidence);
    Ok(Box::new(OnnxYoloDetector::new(
        &model_path,
        labels,
        &config.person_label,
        tracker,
        cli.confidence,
    )?))
}

/// Ledger for this run, or `None` when history is neither recorded nor exported.
fn open_ledger(cli: &Cli) -> Result<Option<Box<dyn HistoryLedger>>, Box<dyn std::error::Error>> {
    if cli.no_history && cli.export_history.is_none() {
        return Ok(None);
    }
    let path = match &cli.history {
        Some(path) => path.clone(),
        None => model_resolver::app_data_dir()
            .ok_or("Could not determine data directory for history")?
            .join(HISTORY_FILE),
    };
    let ledger: Box<dyn HistoryLedger> = Box::new(JsonlHistoryLedger::new(path));
    Ok(Some(ledger))
}

/// Report destination, or `None` when no report was requested.
fn report_dir(cli: &Cli) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.report_dir {
        return Ok(Some(dir.clone()));
    }
    if cli.report_format.is_none() {
        return Ok(None);
    }
    let dir = model_resolver::app_data_dir()
        .ok_or("Could not determine data directory for reports")?
        .join(REPORTS_DIR);
    Ok(Some(dir))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn validate(cli: &Cli) -> Result<MediaType, Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    let media_type = MediaType::from_path(&cli.input).ok_or_else(|| {
        format!(
            "Unsupported file type: {} (expected .jpg, .jpeg, .png or .mp4)",
            cli.input.display()
        )
    })?;
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if let Some(seconds) = cli.sitting_seconds {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(format!("Sitting seconds must be >= 0, got {seconds}").into());
        }
    }
    if let Some(format) = &cli.report_format {
        format.parse::<ReportFormat>()?;
    }
    if let Some(config) = &cli.config {
        if !config.exists() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    Ok(media_type)
}
