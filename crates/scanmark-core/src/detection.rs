use crate::BBox;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One decoded symbol as reported by a decoding backend.
///
/// Coordinates are in the *preprocessed* image space; the normalizer maps
/// them back into original-frame pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSymbol {
    /// Decoded payload. May be empty, never absent; treated as opaque text.
    pub data: String,
    /// Ordered outline of the symbol. Backends report at least three points
    /// for a non-degenerate symbol, typically four.
    pub polygon: Vec<Point2<f32>>,
}

/// Normalized detection in original-frame coordinates.
///
/// Produced by the normalizer and immutable afterwards. Confidence is
/// binary: a symbol either decoded or it does not appear here.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub data: String,
    pub bbox: BBox,
}

/// Ground-truth detection belonging to an annotation record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExpectedDetection {
    pub data: String,
    pub bbox: BBox,
}
