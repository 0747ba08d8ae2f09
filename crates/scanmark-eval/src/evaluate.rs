//! The evaluation engine: pipeline output scored against one record.

use crate::{match_detections, AnnotationRecord, EvaluationReport, MatchParams};
use log::info;
use scanmark_core::FrameView;
use scanmark_detect::{PipelineError, SymbolDecoder, SymbolPipeline};

/// Scoring strictness knobs.
#[derive(Clone, Copy, Debug)]
pub struct EvalOptions {
    /// Require decoded text to equal the annotated payload before a
    /// geometric match counts. A mismatched-text overlap is then reported
    /// as one false positive plus one false negative, never as a match.
    pub require_text_match: bool,
    /// Accept extra detections: `pass` ignores false positives.
    pub allow_extra_detections: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            require_text_match: true,
            allow_extra_detections: false,
        }
    }
}

/// Errors fatal to a single `evaluate` call.
#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Scores pipeline output against annotation records.
///
/// All configuration is fixed at construction and there is no per-call
/// state, so a single evaluator can serve concurrent calls over distinct
/// frames and records.
pub struct Evaluator<D: SymbolDecoder> {
    pipeline: SymbolPipeline<D>,
    options: EvalOptions,
}

impl<D: SymbolDecoder> Evaluator<D> {
    pub fn new(pipeline: SymbolPipeline<D>, options: EvalOptions) -> Self {
        Self { pipeline, options }
    }

    #[inline]
    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Run the detection pipeline on `frame` and score the result against
    /// `record`, using the record's own IoU threshold.
    pub fn evaluate(
        &self,
        frame: &FrameView<'_>,
        record: &AnnotationRecord,
    ) -> Result<EvaluationReport, EvalError> {
        let detections = self.pipeline.detect(frame)?;
        let params = MatchParams {
            min_iou: record.min_iou,
            require_text_match: self.options.require_text_match,
        };
        let outcome = match_detections(&detections, &record.expected_detections, &params);
        let report = EvaluationReport::from_outcome(
            record,
            &detections,
            &outcome,
            self.options.allow_extra_detections,
        );
        info!(
            "{}: tp={} fp={} fn={} -> {}",
            report.image,
            report.true_positives,
            report.false_positives,
            report.false_negatives,
            if report.pass { "pass" } else { "fail" }
        );
        Ok(report)
    }
}
