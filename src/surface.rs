//! Whole image decoding for BC7 compressed surfaces.

use crate::bc7::{self, Rgba8Block, BLOCK_HEIGHT, BLOCK_WIDTH};
use crate::{div_round_up, error::DecodeError};

const CHANNELS: usize = 4;
const BYTES_PER_BLOCK: usize = 16;

/// Decode a BC7 surface of `width` x `height` pixels into `output` as RGBA8.
///
/// Blocks are 16 bytes each and tightly packed in row-major order. Partial
/// blocks on the right and bottom edges are clipped to the surface.
pub(crate) fn decode_bc7_surface(
    width: u32,
    height: u32,
    data: &[u8],
    output: &mut [u8],
) -> Result<(), DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroSizedSurface { width, height });
    }

    let blocks_x = div_round_up(width as usize, BLOCK_WIDTH);
    let blocks_y = div_round_up(height as usize, BLOCK_HEIGHT);

    // Surface dimensions are not validated yet and may cause overflow.
    let expected = blocks_x
        .checked_mul(blocks_y)
        .and_then(|v| v.checked_mul(BYTES_PER_BLOCK))
        .ok_or(DecodeError::PixelCountWouldOverflow { width, height })?;
    if data.len() < expected {
        return Err(DecodeError::NotEnoughData {
            expected,
            actual: data.len(),
        });
    }

    let expected_output = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(DecodeError::PixelCountWouldOverflow { width, height })?;
    if output.len() < expected_output {
        return Err(DecodeError::NotEnoughData {
            expected: expected_output,
            actual: output.len(),
        });
    }

    for block_y in 0..blocks_y {
        for block_x in 0..blocks_x {
            let block_index = block_y * blocks_x + block_x;
            let block_start = block_index * BYTES_PER_BLOCK;
            // The length is validated above.
            let block = data[block_start..block_start + BYTES_PER_BLOCK]
                .try_into()
                .unwrap();

            let pixels = bc7::decode_block_at(&block, block_index)?;

            put_rgba_block(
                output,
                pixels,
                block_x * BLOCK_WIDTH,
                block_y * BLOCK_HEIGHT,
                width as usize,
                height as usize,
            );
        }
    }

    Ok(())
}

fn put_rgba_block(
    surface: &mut [u8],
    pixels: Rgba8Block,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) {
    // The data from each block updates up to 4 rows of the RGBA surface.
    // Add checks since the edges won't always have full blocks.
    let bytes_per_row = CHANNELS * BLOCK_WIDTH.min(width - x);

    for (row, row_pixels) in pixels.iter().enumerate().take(BLOCK_HEIGHT.min(height - y)) {
        // Convert pixel coordinates to byte coordinates.
        let surface_index = ((y + row) * width + x) * CHANNELS;
        surface[surface_index..surface_index + bytes_per_row]
            .copy_from_slice(&bytemuck::cast_slice(row_pixels)[..bytes_per_row]);
    }
}
