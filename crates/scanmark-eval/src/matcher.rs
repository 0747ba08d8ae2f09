//! Greedy IoU assignment between detections and ground truth.

use scanmark_core::{Detection, ExpectedDetection};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Matching threshold and preconditions.
#[derive(Clone, Copy, Debug)]
pub struct MatchParams {
    /// Minimum IoU for a pair to be eligible. Pairs with zero overlap are
    /// never matched, even at a zero threshold.
    pub min_iou: f64,
    /// Require equal payload text before considering a pair at all.
    pub require_text_match: bool,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            min_iou: crate::DEFAULT_MIN_IOU,
            require_text_match: true,
        }
    }
}

/// One committed pairing of a detection index with an expected index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxMatch {
    pub detection: usize,
    pub expected: usize,
    pub iou: f64,
}

/// Full matcher output over one image.
#[derive(Clone, Debug, Default)]
pub struct MatchOutcome {
    /// Committed pairs, in commit order (highest IoU first).
    pub matches: Vec<BoxMatch>,
    /// Detection indices with no partner: false positives.
    pub unmatched_detections: Vec<usize>,
    /// Expected indices with no partner: false negatives.
    pub unmatched_expected: Vec<usize>,
}

/// Greedily assign detections to expected detections by descending IoU.
///
/// Ties on IoU prefer the pair whose expected detection appears earliest,
/// then the earliest detection, so the outcome is deterministic for a given
/// input order. Greedy assignment over optimal bipartite matching is
/// deliberate: real scenes rarely produce ambiguous near-duplicate
/// overlaps, and reproducible results matter more here than optimality.
pub fn match_detections(
    detections: &[Detection],
    expected: &[ExpectedDetection],
    params: &MatchParams,
) -> MatchOutcome {
    let mut candidates = Vec::new();
    for (e_idx, exp) in expected.iter().enumerate() {
        for (d_idx, det) in detections.iter().enumerate() {
            if params.require_text_match && det.data != exp.data {
                continue;
            }
            let iou = det.bbox.iou(&exp.bbox);
            if iou <= 0.0 || iou < params.min_iou {
                continue;
            }
            candidates.push(BoxMatch {
                detection: d_idx,
                expected: e_idx,
                iou,
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.iou
            .partial_cmp(&a.iou)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.expected.cmp(&b.expected))
            .then_with(|| a.detection.cmp(&b.detection))
    });

    let mut detection_used = vec![false; detections.len()];
    let mut expected_used = vec![false; expected.len()];
    let mut matches = Vec::new();
    for cand in candidates {
        if detection_used[cand.detection] || expected_used[cand.expected] {
            continue;
        }
        detection_used[cand.detection] = true;
        expected_used[cand.expected] = true;
        matches.push(cand);
    }

    let unmatched_detections = (0..detections.len())
        .filter(|&i| !detection_used[i])
        .collect();
    let unmatched_expected = (0..expected.len()).filter(|&i| !expected_used[i]).collect();

    MatchOutcome {
        matches,
        unmatched_detections,
        unmatched_expected,
    }
}
