//! Detection pipeline: frame preprocessing, symbol decoding and coordinate
//! normalization.
//!
//! The decoder sits behind the narrow [`SymbolDecoder`] trait so the
//! pipeline can be exercised with a mock in tests and swapped between
//! backends without touching preprocessing or scoring.

mod decode;
mod normalize;
mod pipeline;
mod preprocess;
mod threshold;

#[cfg(feature = "rqrr")]
pub use decode::RqrrDecoder;
pub use decode::{DecodeError, SymbolDecoder};
pub use normalize::normalize_symbols;
pub use pipeline::{PipelineError, SymbolPipeline};
pub use preprocess::{
    preprocess, PreprocessConfig, PreprocessError, PreprocessedFrame, ThresholdConfig,
    ThresholdMethod,
};

pub use scanmark_core::RawSymbol;
