//! Ground-truth handling and detection scoring.
//!
//! An [`AnnotationStore`] loads hand-editable JSON records describing the
//! symbols expected in a test image; the [`Evaluator`] runs the detection
//! pipeline and scores its output with greedy IoU matching into an
//! [`EvaluationReport`].

mod annotation;
mod evaluate;
mod matcher;
mod report;

pub use annotation::{AnnotationError, AnnotationRecord, AnnotationStore, DEFAULT_MIN_IOU};
pub use evaluate::{EvalError, EvalOptions, Evaluator};
pub use matcher::{match_detections, BoxMatch, MatchOutcome, MatchParams};
pub use report::{EvaluationReport, MatchedPair};
