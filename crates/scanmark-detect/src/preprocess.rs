//! Deterministic frame preparation for symbol decoding.
//!
//! The chain mirrors the reference camera pipeline: luminance grayscale,
//! histogram equalization, binary threshold, uniform upscale. Every stage is
//! individually toggleable, and the cumulative geometric scale is recorded
//! so detections can be mapped back into original-frame coordinates.

use crate::threshold::{apply_binary_threshold, otsu_threshold};
use scanmark_core::{sample_bilinear_u8, FrameView, GrayImage};
use serde::{Deserialize, Serialize};

/// Errors produced while preparing a frame for decoding.
#[derive(thiserror::Error, Debug)]
pub enum PreprocessError {
    #[error("frame has zero area (width={width}, height={height})")]
    ZeroArea { width: usize, height: usize },

    #[error("unsupported channel count {channels} (expected 1, 3 or 4)")]
    UnsupportedChannels { channels: usize },

    #[error("frame buffer length mismatch (expected {expected} bytes, got {got})")]
    BufferMismatch { expected: usize, got: usize },

    #[error("scale factor must be positive and finite, got {value}")]
    InvalidScaleFactor { value: f32 },

    #[error("multi-channel frame ({channels} channels) requires the grayscale stage")]
    GrayscaleRequired { channels: usize },
}

fn default_true() -> bool {
    true
}

fn default_threshold_value() -> u8 {
    128
}

fn default_scale_factor() -> f32 {
    1.5
}

/// How the binary threshold cutoff is chosen.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Fixed cutoff from [`ThresholdConfig::value`].
    #[default]
    Fixed,
    /// Global Otsu cutoff computed from the image histogram.
    Otsu,
}

/// Binary threshold stage configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub method: ThresholdMethod,
    /// Cutoff for [`ThresholdMethod::Fixed`]; ignored for Otsu.
    #[serde(default = "default_threshold_value")]
    pub value: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method: ThresholdMethod::Fixed,
            value: 128,
        }
    }
}

/// Configuration of the preprocessing chain.
///
/// The defaults reproduce the reference camera pipeline: grayscale,
/// histogram equalization, fixed binary threshold at 128 and a 1.5x
/// bilinear upscale.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_true")]
    pub grayscale: bool,
    #[serde(default = "default_true")]
    pub equalize: bool,
    #[serde(default)]
    pub threshold: ThresholdConfig,
    /// Uniform geometric upscale; `1.0` disables the resampling stage.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            grayscale: true,
            equalize: true,
            threshold: ThresholdConfig::default(),
            scale_factor: 1.5,
        }
    }
}

impl PreprocessConfig {
    /// Configuration with every optional stage disabled.
    ///
    /// Contrast stages tuned for real camera frames can destroy the finder
    /// patterns of clean synthetic images; annotation generation runs with
    /// this configuration.
    pub fn passthrough() -> Self {
        Self {
            grayscale: true,
            equalize: false,
            threshold: ThresholdConfig {
                enabled: false,
                ..ThresholdConfig::default()
            },
            scale_factor: 1.0,
        }
    }
}

/// A prepared frame plus the cumulative scale applied relative to its
/// source.
#[derive(Clone, Debug)]
pub struct PreprocessedFrame {
    pub image: GrayImage,
    /// Product of all geometric transforms; positive and finite by
    /// construction.
    pub scale: f32,
}

/// Run the configured preprocessing chain over `frame`.
pub fn preprocess(
    frame: &FrameView<'_>,
    config: &PreprocessConfig,
) -> Result<PreprocessedFrame, PreprocessError> {
    validate(frame, config)?;

    let mut image = if frame.channels == 1 {
        GrayImage {
            width: frame.width,
            height: frame.height,
            data: frame.data.to_vec(),
        }
    } else {
        to_grayscale(frame)
    };

    if config.equalize {
        equalize_histogram(&mut image);
    }

    if config.threshold.enabled {
        let cutoff = match config.threshold.method {
            ThresholdMethod::Fixed => config.threshold.value,
            ThresholdMethod::Otsu => otsu_threshold(&image.data),
        };
        apply_binary_threshold(&mut image.data, cutoff);
    }

    let mut scale = 1.0f32;
    if (config.scale_factor - 1.0).abs() > f32::EPSILON {
        image = resample(&image, config.scale_factor);
        scale *= config.scale_factor;
    }

    Ok(PreprocessedFrame { image, scale })
}

fn validate(frame: &FrameView<'_>, config: &PreprocessConfig) -> Result<(), PreprocessError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PreprocessError::ZeroArea {
            width: frame.width,
            height: frame.height,
        });
    }
    if !matches!(frame.channels, 1 | 3 | 4) {
        return Err(PreprocessError::UnsupportedChannels {
            channels: frame.channels,
        });
    }
    if frame.data.len() != frame.expected_len() {
        return Err(PreprocessError::BufferMismatch {
            expected: frame.expected_len(),
            got: frame.data.len(),
        });
    }
    if !config.scale_factor.is_finite() || config.scale_factor <= 0.0 {
        return Err(PreprocessError::InvalidScaleFactor {
            value: config.scale_factor,
        });
    }
    if frame.channels != 1 && !config.grayscale {
        return Err(PreprocessError::GrayscaleRequired {
            channels: frame.channels,
        });
    }
    Ok(())
}

/// BT.601 luminance reduction. Alpha channels are ignored.
fn to_grayscale(frame: &FrameView<'_>) -> GrayImage {
    let mut data = Vec::with_capacity(frame.width * frame.height);
    for px in frame.data.chunks_exact(frame.channels) {
        let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
        data.push(y.round() as u8);
    }
    GrayImage {
        width: frame.width,
        height: frame.height,
        data,
    }
}

/// Classic CDF-based histogram equalization, remapping the darkest occupied
/// level to 0 and the brightest to 255.
fn equalize_histogram(image: &mut GrayImage) {
    let mut hist = [0u64; 256];
    for &v in &image.data {
        hist[v as usize] += 1;
    }

    let mut cdf = [0u64; 256];
    let mut acc = 0u64;
    for (i, &h) in hist.iter().enumerate() {
        acc += h;
        cdf[i] = acc;
    }

    let total = image.data.len() as u64;
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    if total == cdf_min {
        // Single-intensity image, nothing to spread.
        return;
    }

    let denom = (total - cdf_min) as f64;
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        if cdf[i] >= cdf_min {
            *entry = (((cdf[i] - cdf_min) as f64 / denom) * 255.0).round() as u8;
        }
    }

    for v in &mut image.data {
        *v = lut[*v as usize];
    }
}

/// Uniform bilinear resample by `factor`.
fn resample(src: &GrayImage, factor: f32) -> GrayImage {
    let width = ((src.width as f32) * factor).round().max(1.0) as usize;
    let height = ((src.height as f32) * factor).round().max(1.0) as usize;
    let view = src.as_view();

    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        let sy = (y as f32 + 0.5) / factor - 0.5;
        for x in 0..width {
            let sx = (x as f32 + 0.5) / factor - 0.5;
            data.push(sample_bilinear_u8(&view, sx, sy));
        }
    }

    GrayImage {
        width,
        height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: usize, height: usize, data: &[u8]) -> FrameView<'_> {
        FrameView {
            width,
            height,
            channels: 1,
            data,
        }
    }

    #[test]
    fn zero_area_frame_is_rejected() {
        let err = preprocess(&gray_frame(0, 4, &[]), &PreprocessConfig::default()).unwrap_err();
        assert!(matches!(err, PreprocessError::ZeroArea { width: 0, height: 4 }));
    }

    #[test]
    fn unsupported_channel_count_is_rejected() {
        let data = [0u8; 8];
        let frame = FrameView {
            width: 2,
            height: 2,
            channels: 2,
            data: &data,
        };
        let err = preprocess(&frame, &PreprocessConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::UnsupportedChannels { channels: 2 }
        ));
    }

    #[test]
    fn buffer_length_mismatch_is_rejected() {
        let data = [0u8; 5];
        let err = preprocess(&gray_frame(2, 2, &data), &PreprocessConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::BufferMismatch {
                expected: 4,
                got: 5
            }
        ));
    }

    #[test]
    fn non_positive_or_non_finite_scale_is_rejected() {
        let data = [0u8; 4];
        for bad in [0.0f32, -1.5, f32::NAN, f32::INFINITY] {
            let config = PreprocessConfig {
                scale_factor: bad,
                ..PreprocessConfig::default()
            };
            let err = preprocess(&gray_frame(2, 2, &data), &config).unwrap_err();
            assert!(matches!(err, PreprocessError::InvalidScaleFactor { .. }));
        }
    }

    #[test]
    fn multi_channel_frame_without_grayscale_stage_is_rejected() {
        let data = [0u8; 12];
        let frame = FrameView {
            width: 2,
            height: 2,
            channels: 3,
            data: &data,
        };
        let config = PreprocessConfig {
            grayscale: false,
            ..PreprocessConfig::default()
        };
        let err = preprocess(&frame, &config).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::GrayscaleRequired { channels: 3 }
        ));
    }

    #[test]
    fn grayscale_uses_bt601_luminance() {
        let data = [255u8, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let frame = FrameView {
            width: 2,
            height: 2,
            channels: 3,
            data: &data,
        };
        let out = preprocess(&frame, &PreprocessConfig::passthrough()).unwrap();
        assert_eq!(out.image.data, vec![76, 150, 29, 255]);
    }

    #[test]
    fn passthrough_keeps_pixels_and_reports_unit_scale() {
        let data = [10u8, 20, 30, 40, 50, 60];
        let out = preprocess(&gray_frame(3, 2, &data), &PreprocessConfig::passthrough()).unwrap();
        assert_eq!(out.scale, 1.0);
        assert_eq!(out.image.data, data.to_vec());
        assert_eq!((out.image.width, out.image.height), (3, 2));
    }

    #[test]
    fn equalization_stretches_a_two_level_image() {
        let data = [50u8, 50, 200, 200];
        let config = PreprocessConfig {
            equalize: true,
            ..PreprocessConfig::passthrough()
        };
        let out = preprocess(&gray_frame(2, 2, &data), &config).unwrap();
        assert_eq!(out.image.data, vec![0, 0, 255, 255]);
    }

    #[test]
    fn equalization_leaves_a_flat_image_alone() {
        let data = [90u8; 6];
        let config = PreprocessConfig {
            equalize: true,
            ..PreprocessConfig::passthrough()
        };
        let out = preprocess(&gray_frame(3, 2, &data), &config).unwrap();
        assert_eq!(out.image.data, data.to_vec());
    }

    #[test]
    fn fixed_threshold_binarizes() {
        let data = [0u8, 100, 129, 255];
        let config = PreprocessConfig {
            threshold: ThresholdConfig::default(),
            ..PreprocessConfig::passthrough()
        };
        let out = preprocess(&gray_frame(2, 2, &data), &config).unwrap();
        assert_eq!(out.image.data, vec![0, 0, 255, 255]);
    }

    #[test]
    fn otsu_threshold_binarizes_without_a_fixed_value() {
        let data = [10u8, 15, 240, 250];
        let config = PreprocessConfig {
            threshold: ThresholdConfig {
                enabled: true,
                method: ThresholdMethod::Otsu,
                value: 0,
            },
            ..PreprocessConfig::passthrough()
        };
        let out = preprocess(&gray_frame(2, 2, &data), &config).unwrap();
        assert_eq!(out.image.data, vec![0, 0, 255, 255]);
    }

    #[test]
    fn upscale_records_the_cumulative_scale() {
        let data = [128u8; 16];
        let config = PreprocessConfig {
            scale_factor: 1.5,
            ..PreprocessConfig::passthrough()
        };
        let out = preprocess(&gray_frame(4, 4, &data), &config).unwrap();
        assert_eq!(out.scale, 1.5);
        assert_eq!((out.image.width, out.image.height), (6, 6));
        // A constant image stays constant under clamped bilinear sampling.
        assert!(out.image.data.iter().all(|&v| v == 128));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: PreprocessConfig = serde_json::from_str("{}").unwrap();
        assert!(config.grayscale);
        assert!(config.equalize);
        assert!(config.threshold.enabled);
        assert_eq!(config.threshold.method, ThresholdMethod::Fixed);
        assert_eq!(config.threshold.value, 128);
        assert_eq!(config.scale_factor, 1.5);

        let config: PreprocessConfig =
            serde_json::from_str(r#"{"threshold": {"method": "otsu"}, "scale_factor": 2.0}"#)
                .unwrap();
        assert_eq!(config.threshold.method, ThresholdMethod::Otsu);
        assert_eq!(config.scale_factor, 2.0);
    }
}
