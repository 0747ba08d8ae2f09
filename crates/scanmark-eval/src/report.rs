//! The per-image evaluation report.

use crate::{AnnotationRecord, MatchOutcome};
use scanmark_core::{BBox, Detection, ExpectedDetection};
use serde::{Deserialize, Serialize};

/// One matched pair with the payload and both boxes, for reporting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub data: String,
    pub iou: f64,
    pub detected: BBox,
    pub expected: BBox,
}

/// Evaluation outcome for one image.
///
/// This is the input contract of the test runner: per-image pass/fail plus
/// the counts behind it, with enough detail to debug a failure from the
/// report alone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub image: String,
    pub min_iou: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub pass: bool,
    pub matches: Vec<MatchedPair>,
    /// Detections with no ground-truth partner.
    pub unmatched_detections: Vec<Detection>,
    /// Ground-truth entries no detection satisfied.
    pub unmatched_expected: Vec<ExpectedDetection>,
}

impl EvaluationReport {
    pub(crate) fn from_outcome(
        record: &AnnotationRecord,
        detections: &[Detection],
        outcome: &MatchOutcome,
        allow_extra_detections: bool,
    ) -> Self {
        let matches: Vec<MatchedPair> = outcome
            .matches
            .iter()
            .map(|m| MatchedPair {
                data: record.expected_detections[m.expected].data.clone(),
                iou: m.iou,
                detected: detections[m.detection].bbox,
                expected: record.expected_detections[m.expected].bbox,
            })
            .collect();
        let unmatched_detections: Vec<Detection> = outcome
            .unmatched_detections
            .iter()
            .map(|&i| detections[i].clone())
            .collect();
        let unmatched_expected: Vec<ExpectedDetection> = outcome
            .unmatched_expected
            .iter()
            .map(|&i| record.expected_detections[i].clone())
            .collect();

        let true_positives = matches.len();
        let false_positives = unmatched_detections.len();
        let false_negatives = unmatched_expected.len();
        let pass = false_negatives == 0 && (allow_extra_detections || false_positives == 0);

        Self {
            image: record.image.clone(),
            min_iou: record.min_iou,
            true_positives,
            false_positives,
            false_negatives,
            pass,
            matches,
            unmatched_detections,
            unmatched_expected,
        }
    }
}
