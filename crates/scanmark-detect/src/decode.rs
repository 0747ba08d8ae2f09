use scanmark_core::{GrayImageView, RawSymbol};

/// Errors raised by a decoding backend.
///
/// A decode fault is fatal only to the current evaluation call. An image
/// with no symbols is an empty result, not an error.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("symbol decoder failed: {reason}")]
    Backend { reason: String },
}

/// Narrow seam over an external symbol-decoding primitive.
///
/// The single capability is "decode symbols in a pixel buffer".
/// Implementations must be safe to call repeatedly and must not retain
/// references to the input buffer after returning. The order of the
/// returned symbols is backend-defined and not guaranteed stable; callers
/// may rely on it for reporting only, never for correctness.
pub trait SymbolDecoder {
    fn decode_symbols(&self, image: &GrayImageView<'_>) -> Result<Vec<RawSymbol>, DecodeError>;
}

#[cfg(feature = "rqrr")]
mod rqrr_backend {
    use super::{DecodeError, SymbolDecoder};
    use log::debug;
    use nalgebra::Point2;
    use scanmark_core::{GrayImageView, RawSymbol};

    /// Pure-Rust QR decoder backed by `rqrr`.
    ///
    /// Grids that are located but fail to decode are skipped, matching the
    /// behavior of decoders that only report decodable symbols.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct RqrrDecoder;

    impl SymbolDecoder for RqrrDecoder {
        fn decode_symbols(
            &self,
            image: &GrayImageView<'_>,
        ) -> Result<Vec<RawSymbol>, DecodeError> {
            let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
                image.width,
                image.height,
                |x, y| image.data[y * image.width + x],
            );

            let grids = prepared.detect_grids();
            let mut symbols = Vec::with_capacity(grids.len());
            for grid in grids {
                let polygon: Vec<Point2<f32>> = grid
                    .bounds
                    .iter()
                    .map(|p| Point2::new(p.x as f32, p.y as f32))
                    .collect();
                match grid.decode() {
                    Ok((_, data)) => symbols.push(RawSymbol { data, polygon }),
                    Err(err) => debug!("skipping undecodable grid: {err}"),
                }
            }
            Ok(symbols)
        }
    }
}

#[cfg(feature = "rqrr")]
pub use rqrr_backend::RqrrDecoder;
