use crate::{
    normalize_symbols, preprocess, DecodeError, PreprocessConfig, PreprocessError, SymbolDecoder,
};
use log::debug;
use scanmark_core::{Detection, FrameView};

/// Errors from a full preprocess + decode + normalize run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidFrame(#[from] PreprocessError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Preprocess, decode and normalize with an immutable configuration.
///
/// The pipeline holds no per-call state; one instance can serve concurrent
/// detections over distinct frames.
pub struct SymbolPipeline<D: SymbolDecoder> {
    decoder: D,
    config: PreprocessConfig,
}

impl<D: SymbolDecoder> SymbolPipeline<D> {
    pub fn new(decoder: D, config: PreprocessConfig) -> Self {
        Self { decoder, config }
    }

    /// Preprocessing configuration applied to every frame.
    #[inline]
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Detect symbols in `frame`, reporting boxes in original-frame pixels.
    pub fn detect(&self, frame: &FrameView<'_>) -> Result<Vec<Detection>, PipelineError> {
        let prepared = preprocess(frame, &self.config)?;
        let symbols = self.decoder.decode_symbols(&prepared.image.as_view())?;
        debug!(
            "decoded {} symbol(s) at scale {:.2} from a {}x{} frame",
            symbols.len(),
            prepared.scale,
            frame.width,
            frame.height
        );
        Ok(normalize_symbols(symbols, prepared.scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;
    use scanmark_core::{BBox, GrayImageView, RawSymbol};

    /// Decoder returning a fixed set of symbols regardless of the image.
    struct FixedDecoder(Vec<RawSymbol>);

    impl SymbolDecoder for FixedDecoder {
        fn decode_symbols(
            &self,
            _image: &GrayImageView<'_>,
        ) -> Result<Vec<RawSymbol>, DecodeError> {
            Ok(self.0.clone())
        }
    }

    struct FaultyDecoder;

    impl SymbolDecoder for FaultyDecoder {
        fn decode_symbols(
            &self,
            _image: &GrayImageView<'_>,
        ) -> Result<Vec<RawSymbol>, DecodeError> {
            Err(DecodeError::Backend {
                reason: "corrupt buffer".to_owned(),
            })
        }
    }

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Point2<f32>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn detect_maps_symbols_back_to_frame_coordinates() {
        let decoder = FixedDecoder(vec![RawSymbol {
            data: "QR_00".to_owned(),
            polygon: quad(30.0, 30.0, 90.0, 90.0),
        }]);
        let config = PreprocessConfig {
            scale_factor: 1.5,
            ..PreprocessConfig::passthrough()
        };
        let pipeline = SymbolPipeline::new(decoder, config);

        let data = vec![255u8; 100 * 100];
        let frame = FrameView {
            width: 100,
            height: 100,
            channels: 1,
            data: &data,
        };
        let detections = pipeline.detect(&frame).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].data, "QR_00");
        assert_eq!(detections[0].bbox, BBox::new(20, 20, 60, 60));
    }

    #[test]
    fn empty_scene_is_not_an_error() {
        let pipeline = SymbolPipeline::new(FixedDecoder(vec![]), PreprocessConfig::passthrough());
        let data = vec![0u8; 16];
        let frame = FrameView {
            width: 4,
            height: 4,
            channels: 1,
            data: &data,
        };
        assert!(pipeline.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn preprocess_errors_abort_the_call() {
        let pipeline = SymbolPipeline::new(FixedDecoder(vec![]), PreprocessConfig::default());
        let frame = FrameView {
            width: 0,
            height: 0,
            channels: 1,
            data: &[],
        };
        let err = pipeline.detect(&frame).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFrame(_)));
    }

    #[test]
    fn decoder_faults_abort_the_call() {
        let pipeline = SymbolPipeline::new(FaultyDecoder, PreprocessConfig::passthrough());
        let data = vec![0u8; 16];
        let frame = FrameView {
            width: 4,
            height: 4,
            channels: 1,
            data: &data,
        };
        let err = pipeline.detect(&frame).unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }
}
