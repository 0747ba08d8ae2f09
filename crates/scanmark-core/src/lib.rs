//! Core types for QR/barcode detection evaluation.
//!
//! This crate is intentionally small: pixel buffers, axis-aligned bounding
//! boxes and detection records. It does *not* depend on any concrete symbol
//! decoder or image codec.

mod bbox;
mod detection;
mod image;
mod logger;

pub use bbox::BBox;
pub use detection::{Detection, ExpectedDetection, RawSymbol};
pub use image::{sample_bilinear, sample_bilinear_u8, FrameView, GrayImage, GrayImageView};
pub use logger::init_with_level;
