//! Umbrella crate for the `scanmark` workspace.
//!
//! `scanmark` checks how well a symbol decoder finds QR/barcodes in images:
//! a frame is pushed through a deterministic preprocessing chain, decoded,
//! mapped back into original-frame coordinates and scored against a
//! hand-editable annotation record with greedy IoU matching.
//!
//! This crate provides:
//! - stable re-exports of the underlying workspace crates
//! - (feature-gated) glue between images on disk, the annotation store and
//!   the evaluation engine, including the directory test runner
//!
//! ## Quickstart
//!
//! ```no_run
//! use scanmark::detect::{PreprocessConfig, RqrrDecoder};
//! use scanmark::eval::EvalOptions;
//! use scanmark::run::run_directory;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = run_directory(
//!     Path::new("test_images"),
//!     RqrrDecoder,
//!     PreprocessConfig::default(),
//!     EvalOptions::default(),
//! )?;
//! println!("{} passed, {} failed", summary.passed, summary.failed);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - [`core`]: frames, grayscale buffers, bounding boxes, detections.
//! - [`detect`]: preprocessing config/chain, decoder seam, pipeline.
//! - [`eval`]: annotation store, greedy matcher, evaluator, report.
//! - [`run`] (feature `image`): directory runner and annotation helper.

pub use scanmark_core as core;
pub use scanmark_detect as detect;
pub use scanmark_eval as eval;

pub use scanmark_core::{BBox, Detection, ExpectedDetection, FrameView};
pub use scanmark_detect::{PreprocessConfig, SymbolDecoder, SymbolPipeline};
pub use scanmark_eval::{
    AnnotationRecord, AnnotationStore, EvalOptions, EvaluationReport, Evaluator,
};

#[cfg(feature = "image")]
pub mod run;
