//! BC6H block decoding.
//!
//! BC6H shares the 128 bit block size with BC7 but uses its own table of 14
//! modes, delta compressed 16 bit endpoints, and half float outputs. The
//! decoder itself is not implemented yet; the entry points declare the
//! interface and deterministically report the format as unsupported without
//! touching any output.

use half::f16;

use crate::{error::DecodeError, BptcFormat};

/// Decoded BC6H texels are three half float channels.
pub const CHANNELS: usize = 3;

/// A 4x4 block filled with a single RGB half float value.
pub fn solid_block(rgb: [f16; 3]) -> [[[f16; 3]; 4]; 4] {
    [[rgb; 4]; 4]
}

/// Decode a BC6H surface of `width` x `height` pixels to RGB half floats.
///
/// Always returns [`DecodeError::UnsupportedFormat`].
pub fn rgbf16_from_bc6h(
    width: u32,
    height: u32,
    data: &[u8],
    is_signed: bool,
) -> Result<Vec<f16>, DecodeError> {
    let _ = (width, height, data);
    Err(DecodeError::UnsupportedFormat {
        format: if is_signed {
            BptcFormat::Bc6hSfloat
        } else {
            BptcFormat::Bc6hUfloat
        },
    })
}

pub(crate) fn decode_surface(
    width: u32,
    height: u32,
    data: &[u8],
    output: &mut [u8],
    is_signed: bool,
) -> Result<(), DecodeError> {
    let _ = output;
    rgbf16_from_bc6h(width, height, data, is_signed).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bc6h_reports_unsupported() {
        assert!(matches!(
            rgbf16_from_bc6h(4, 4, &[0u8; 16], true),
            Err(DecodeError::UnsupportedFormat {
                format: BptcFormat::Bc6hSfloat
            })
        ));
        assert!(matches!(
            rgbf16_from_bc6h(4, 4, &[0u8; 16], false),
            Err(DecodeError::UnsupportedFormat {
                format: BptcFormat::Bc6hUfloat
            })
        ));
    }

    #[test]
    fn solid_block_fills_every_texel() {
        let gray = [f16::from_f32(0.5); 3];
        let block = solid_block(gray);
        assert!(block.iter().flatten().all(|texel| *texel == gray));
    }
}
