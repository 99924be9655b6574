//! Safe, pure Rust decoder for BPTC (BC6H and BC7) compressed texture data.
//!
//! The input is a tightly packed span of 16 byte blocks for a single 2D
//! image along with its pixel dimensions. Container parsing like DDS
//! headers, mipmap layout, and image file encoding are left to the caller.
//!
//! ```rust
//! use bptc_rs::{decode, output_size, BptcFormat};
//!
//! let data = [0x40u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
//! let mut rgba = vec![0u8; output_size(BptcFormat::Bc7Unorm, 4, 4)];
//! decode(BptcFormat::Bc7Unorm, 4, 4, &data, &mut rgba)?;
//! # Ok::<(), bptc_rs::DecodeError>(())
//! ```

pub mod bc6h;
pub mod bc7;
mod bits;
mod error;
mod surface;

pub use error::DecodeError;

/// The compressed format of a BPTC surface.
///
/// The tag usually comes from a container header, so an unrecognized value
/// is representable and simply fails to decode.
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BptcFormat {
    Unknown,
    Bc6hSfloat,
    Bc6hUfloat,
    Bc7Unorm,
}

impl BptcFormat {
    /// Size in bytes of a single decoded pixel.
    fn bytes_per_pixel(&self) -> usize {
        match self {
            BptcFormat::Unknown => 0,
            // Three half float channels.
            BptcFormat::Bc6hSfloat | BptcFormat::Bc6hUfloat => bc6h::CHANNELS * 2,
            // RGBA8.
            BptcFormat::Bc7Unorm => 4,
        }
    }
}

/// Size in bytes of the decoded image for `format` at `width` x `height`.
///
/// Returns 0 for [`BptcFormat::Unknown`]. This is a pure sizing function
/// and performs no validation of the compressed data.
pub fn output_size(format: BptcFormat, width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(format.bytes_per_pixel())
}

/// Decode the compressed blocks in `data` into the caller allocated
/// `output`, which must hold at least [`output_size`] bytes.
///
/// BC7 output is RGBA8 with a row stride of `width * 4` bytes. The BC6H
/// formats are not implemented yet and report
/// [`DecodeError::UnsupportedFormat`] without writing to `output`.
pub fn decode(
    format: BptcFormat,
    width: u32,
    height: u32,
    data: &[u8],
    output: &mut [u8],
) -> Result<(), DecodeError> {
    match format {
        BptcFormat::Unknown => Err(DecodeError::UnrecognizedFormat),
        BptcFormat::Bc6hSfloat => bc6h::decode_surface(width, height, data, output, true),
        BptcFormat::Bc6hUfloat => bc6h::decode_surface(width, height, data, output, false),
        BptcFormat::Bc7Unorm => surface::decode_bc7_surface(width, height, data, output),
    }
}

/// Decode the compressed blocks in `data` to a freshly allocated RGBA8
/// buffer.
pub fn rgba8_from_bptc(
    width: u32,
    height: u32,
    data: &[u8],
    format: BptcFormat,
) -> Result<Vec<u8>, DecodeError> {
    match format {
        BptcFormat::Bc7Unorm => {
            let mut rgba = vec![0u8; output_size(format, width, height)];
            decode(format, width, height, data, &mut rgba)?;
            Ok(rgba)
        }
        BptcFormat::Bc6hSfloat | BptcFormat::Bc6hUfloat => {
            Err(DecodeError::UnsupportedFormat { format })
        }
        BptcFormat::Unknown => Err(DecodeError::UnrecognizedFormat),
    }
}

/// Report which of the 8 BC7 modes the block at `(block_x, block_y)` uses.
///
/// `blocks_per_row` is the surface width in blocks, `ceil(width / 4)`.
/// Intended for diagnostics tooling that inspects mode usage across an
/// image.
pub fn block_mode(
    data: &[u8],
    block_x: u32,
    block_y: u32,
    blocks_per_row: u32,
) -> Result<u8, DecodeError> {
    // Adversarial coordinates can overflow the byte offset.
    let block_index = (block_y as usize)
        .checked_mul(blocks_per_row as usize)
        .and_then(|i| i.checked_add(block_x as usize))
        .ok_or(DecodeError::PixelCountWouldOverflow {
            width: block_x,
            height: block_y,
        })?;
    let offset = block_index
        .checked_mul(16)
        .filter(|offset| offset.checked_add(16).is_some())
        .ok_or(DecodeError::PixelCountWouldOverflow {
            width: block_x,
            height: block_y,
        })?;
    if data.len() < offset + 16 {
        return Err(DecodeError::NotEnoughData {
            expected: offset + 16,
            actual: data.len(),
        });
    }

    bc7::mode(data[offset])
        .map(|mode| mode as u8)
        .ok_or(DecodeError::ReservedBlockMode { block_index })
}

pub(crate) fn div_round_up(x: usize, d: usize) -> usize {
    (x + d - 1) / d
}
