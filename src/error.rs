use thiserror::Error;

use crate::BptcFormat;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("surface dimensions {width} x {height} contain no pixels")]
    ZeroSizedSurface { width: u32, height: u32 },

    #[error("surface pixel count {width} x {height} would overflow")]
    PixelCountWouldOverflow { width: u32, height: u32 },

    #[error("expected surface to have at least {expected} bytes but found {actual}")]
    NotEnoughData { expected: usize, actual: usize },

    #[error("block {block_index} uses the reserved all zero BC7 mode byte")]
    ReservedBlockMode { block_index: usize },

    #[error("decoding format {format:?} is not supported")]
    UnsupportedFormat { format: BptcFormat },

    #[error("the image format of the surface can not be determined")]
    UnrecognizedFormat,
}
