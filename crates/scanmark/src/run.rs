//! Glue between images on disk, the annotation store and the evaluation
//! engine: the directory test runner and the annotation-generation helper.

use crate::detect::{PipelineError, PreprocessConfig, SymbolDecoder, SymbolPipeline};
use crate::eval::{
    AnnotationError, AnnotationRecord, AnnotationStore, EvalError, EvalOptions, EvaluationReport,
    Evaluator,
};
use crate::{ExpectedDetection, FrameView};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors fatal to a whole run.
///
/// A broken annotation record or a missing image means a broken test
/// fixture and aborts everything; per-image pipeline failures are captured
/// in the [`RunSummary`] instead and the run continues.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error("failed to load image `{path}`")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Outcome of one record within a run.
#[derive(Debug)]
pub enum RecordOutcome {
    Report(EvaluationReport),
    /// The pipeline failed for this image; the run continued.
    Failed {
        identifier: String,
        error: PipelineError,
    },
}

/// Aggregated results over a directory of annotation records.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<RecordOutcome>,
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Reports of the records that produced one.
    pub fn reports(&self) -> impl Iterator<Item = &EvaluationReport> {
        self.outcomes.iter().filter_map(|o| match o {
            RecordOutcome::Report(r) => Some(r),
            RecordOutcome::Failed { .. } => None,
        })
    }

    /// Write all reports to `path` as pretty JSON.
    pub fn write_reports(&self, path: &Path) -> Result<(), RunError> {
        let reports: Vec<&EvaluationReport> = self.reports().collect();
        let json = serde_json::to_string_pretty(&reports)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Convert a decoded RGB image into the borrowed frame the pipeline
/// consumes.
pub fn frame_view(img: &image::RgbImage) -> FrameView<'_> {
    FrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        channels: 3,
        data: img.as_raw(),
    }
}

fn load_rgb(path: &Path) -> Result<image::RgbImage, RunError> {
    let reader = image::ImageReader::open(path).map_err(|err| RunError::Image {
        path: path.to_owned(),
        source: image::ImageError::IoError(err),
    })?;
    let img = reader.decode().map_err(|err| RunError::Image {
        path: path.to_owned(),
        source: err,
    })?;
    Ok(img.to_rgb8())
}

/// Evaluate every annotation record under `dir` against its image.
///
/// Records are processed in identifier order. Each record's image is
/// resolved relative to `dir` via the record's `image` field.
pub fn run_directory<D: SymbolDecoder>(
    dir: &Path,
    decoder: D,
    config: PreprocessConfig,
    options: EvalOptions,
) -> Result<RunSummary, RunError> {
    let store = AnnotationStore::new(dir);
    let evaluator = Evaluator::new(SymbolPipeline::new(decoder, config), options);

    let mut summary = RunSummary::default();
    for identifier in store.discover()? {
        let record = store.load(&identifier)?;
        let img = load_rgb(&dir.join(&record.image))?;
        let frame = frame_view(&img);

        match evaluator.evaluate(&frame, &record) {
            Ok(report) => {
                if report.pass {
                    summary.passed += 1;
                } else {
                    summary.failed += 1;
                    warn!(
                        "{identifier}: fp={} fn={}",
                        report.false_positives, report.false_negatives
                    );
                }
                summary.outcomes.push(RecordOutcome::Report(report));
            }
            Err(EvalError::Pipeline(error)) => {
                summary.failed += 1;
                warn!("{identifier}: pipeline failed: {error}");
                summary
                    .outcomes
                    .push(RecordOutcome::Failed { identifier, error });
            }
        }
    }

    info!(
        "{} record(s): {} passed, {} failed",
        summary.outcomes.len(),
        summary.passed,
        summary.failed
    );
    Ok(summary)
}

/// Detect symbols in `image_path` with preprocessing disabled and write an
/// annotation record next to the image, ready for hand correction.
///
/// The contrast stages are skipped because they are tuned for camera frames
/// and can break clean synthetic images.
pub fn annotate_image<D: SymbolDecoder>(
    image_path: &Path,
    decoder: D,
    description: Option<String>,
) -> Result<AnnotationRecord, RunError> {
    let img = load_rgb(image_path)?;
    let pipeline = SymbolPipeline::new(decoder, PreprocessConfig::passthrough());
    let detections = pipeline.detect(&frame_view(&img))?;

    let image_name = image_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| image_path.display().to_string());

    let record = AnnotationRecord {
        description: description.unwrap_or_else(|| format!("Test case for {image_name}")),
        image: image_name,
        expected_detections: detections
            .into_iter()
            .map(|d| ExpectedDetection {
                data: d.data,
                bbox: d.bbox,
            })
            .collect(),
        min_iou: crate::eval::DEFAULT_MIN_IOU,
    };

    let store = AnnotationStore::new(image_path.parent().unwrap_or_else(|| Path::new(".")));
    store.save(&record)?;
    info!(
        "wrote annotation for {} with {} detection(s)",
        record.image,
        record.expected_detections.len()
    );
    Ok(record)
}
