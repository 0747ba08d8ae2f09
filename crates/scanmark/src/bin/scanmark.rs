use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use scanmark::core::init_with_level;
use scanmark::detect::{PreprocessConfig, RqrrDecoder};
use scanmark::eval::EvalOptions;
use scanmark::run::{annotate_image, run_directory, RecordOutcome};

#[derive(Parser)]
#[command(
    name = "scanmark",
    version,
    about = "QR/barcode detection evaluation harness"
)]
struct Cli {
    /// Log verbosity (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate every annotation record in a directory against its image.
    Run {
        /// Directory holding image files plus `<stem>.json` annotations.
        dir: PathBuf,

        /// JSON preprocessing configuration; defaults to the camera
        /// pipeline (grayscale, equalize, threshold 128, 1.5x upscale).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ignore extra detections when deciding pass/fail.
        #[arg(long)]
        allow_extra: bool,

        /// Skip the decoded-text equality precondition for matches.
        #[arg(long)]
        ignore_text: bool,

        /// Write the full per-image reports to this JSON file.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Decode one image without preprocessing and write an annotation
    /// record next to it, ready for hand correction.
    Annotate {
        image: PathBuf,

        /// Free-form description stored in the record.
        #[arg(long)]
        description: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_with_level(cli.log_level) {
        eprintln!("failed to install logger: {err}");
    }

    match cli.command {
        Command::Run {
            dir,
            config,
            allow_extra,
            ignore_text,
            report,
        } => cmd_run(&dir, config.as_deref(), allow_extra, ignore_text, report),
        Command::Annotate { image, description } => cmd_annotate(&image, description),
    }
}

fn cmd_run(
    dir: &Path,
    config_path: Option<&Path>,
    allow_extra: bool,
    ignore_text: bool,
    report_path: Option<PathBuf>,
) -> ExitCode {
    let config = match config_path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load preprocessing config: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => PreprocessConfig::default(),
    };
    let options = EvalOptions {
        require_text_match: !ignore_text,
        allow_extra_detections: allow_extra,
    };

    let summary = match run_directory(dir, RqrrDecoder, config, options) {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("run aborted: {err}");
            return ExitCode::FAILURE;
        }
    };

    for outcome in &summary.outcomes {
        match outcome {
            RecordOutcome::Report(r) => println!(
                "{} {} (tp={} fp={} fn={})",
                if r.pass { "PASS" } else { "FAIL" },
                r.image,
                r.true_positives,
                r.false_positives,
                r.false_negatives
            ),
            RecordOutcome::Failed { identifier, error } => {
                println!("FAIL {identifier} (pipeline error: {error})")
            }
        }
    }
    println!(
        "{} record(s): {} passed, {} failed",
        summary.outcomes.len(),
        summary.passed,
        summary.failed
    );

    if let Some(path) = report_path {
        if let Err(err) = summary.write_reports(&path) {
            eprintln!("failed to write report JSON: {err}");
            return ExitCode::FAILURE;
        }
        println!("wrote report JSON to {}", path.display());
    }

    if summary.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn cmd_annotate(image: &Path, description: Option<String>) -> ExitCode {
    match annotate_image(image, RqrrDecoder, description) {
        Ok(record) => {
            for (i, det) in record.expected_detections.iter().enumerate() {
                println!(
                    "symbol {}: {:?} at ({}, {})-({}, {})",
                    i, det.data, det.bbox.x_min, det.bbox.y_min, det.bbox.x_max, det.bbox.y_max
                );
            }
            println!(
                "wrote {} detection(s) for {}",
                record.expected_detections.len(),
                record.image
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("annotation failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &Path) -> Result<PreprocessConfig, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
