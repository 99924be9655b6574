//! BC7 block decoding.
//!
//! A BC7 block packs 4x4 RGBA texels into 128 bits. The low bits of the
//! first byte select one of 8 encodings by the position of the lowest set
//! bit, and the selected mode fixes the width of every later field.

mod tables;

use crate::{bits::BitReader, error::DecodeError};
use tables::{ANCHOR_SECOND_2, ANCHOR_SECOND_3, ANCHOR_THIRD_3, PARTITION_2, PARTITION_3};

pub(crate) const BLOCK_WIDTH: usize = 4;
pub(crate) const BLOCK_HEIGHT: usize = 4;

/// A decoded 4x4 block of RGBA8 texels in row-major order.
pub type Rgba8Block = [[[u8; 4]; BLOCK_WIDTH]; BLOCK_HEIGHT];

/// Field widths and subset count for one of the 8 BC7 encodings.
#[derive(Clone, Copy)]
struct Mode {
    subsets: usize,
    partition_bits: u32,
    rotation_bits: u32,
    index_selection_bits: u32,
    color_bits: u32,
    alpha_bits: u32,
    endpoint_p_bits: u32,
    shared_p_bits: u32,
    index_bits: u32,
    index2_bits: u32,
}

impl Mode {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        subsets: usize,
        partition_bits: u32,
        rotation_bits: u32,
        index_selection_bits: u32,
        color_bits: u32,
        alpha_bits: u32,
        endpoint_p_bits: u32,
        shared_p_bits: u32,
        index_bits: u32,
        index2_bits: u32,
    ) -> Self {
        Self {
            subsets,
            partition_bits,
            rotation_bits,
            index_selection_bits,
            color_bits,
            alpha_bits,
            endpoint_p_bits,
            shared_p_bits,
            index_bits,
            index2_bits,
        }
    }
}

// Subsets, partition, rotation, index selection, color, alpha,
// per endpoint p-bit, shared p-bit, primary and secondary index widths.
const MODES: [Mode; 8] = [
    Mode::new(3, 4, 0, 0, 4, 0, 1, 0, 3, 0),
    Mode::new(2, 6, 0, 0, 6, 0, 0, 1, 3, 0),
    Mode::new(3, 6, 0, 0, 5, 0, 0, 0, 2, 0),
    Mode::new(2, 6, 0, 0, 7, 0, 1, 0, 2, 0),
    Mode::new(1, 0, 2, 1, 5, 6, 0, 0, 2, 3),
    Mode::new(1, 0, 2, 0, 7, 8, 0, 0, 2, 2),
    Mode::new(1, 0, 0, 0, 7, 7, 1, 0, 4, 0),
    Mode::new(2, 6, 0, 0, 5, 5, 1, 0, 2, 0),
];

/// BC7 mode index from a block's first byte.
///
/// Returns `None` for an all zero byte, which the format reserves.
pub(crate) fn mode(mode_byte: u8) -> Option<usize> {
    if mode_byte == 0 {
        None
    } else {
        Some(mode_byte.trailing_zeros() as usize)
    }
}

/// Texel to subset assignment for a block, row-major.
fn subset_assignment(subsets: usize, partition: usize) -> [u8; 16] {
    match subsets {
        2 => PARTITION_2[partition],
        3 => PARTITION_3[partition],
        _ => [0; 16],
    }
}

/// Anchor texel for each subset of a block. Subset 0 always anchors at 0.
fn subset_anchors(subsets: usize, partition: usize) -> [usize; 3] {
    match subsets {
        2 => [0, ANCHOR_SECOND_2[partition] as usize, 0],
        3 => [
            0,
            ANCHOR_SECOND_3[partition] as usize,
            ANCHOR_THIRD_3[partition] as usize,
        ],
        _ => [0, 0, 0],
    }
}

/// Raw bitstream fields for one block before endpoint expansion.
///
/// Fields a mode does not store keep their zero defaults, so the decoding
/// loops can index them unconditionally.
#[derive(Default)]
struct Fields {
    partition: usize,
    rotation: u8,
    index_selection: u8,
    // Indexed as [subset][endpoint].
    colors: [[[u8; 3]; 2]; 3],
    alphas: [[u8; 2]; 3],
    p_bits: [[u8; 2]; 3],
    indices: [u8; 16],
    indices2: [u8; 16],
}

fn read_fields(mode: &Mode, mode_index: usize, block: &[u8; 16]) -> Fields {
    // Reading starts right after the unary mode selector.
    let mode_bits = mode_index + 1;
    let mut reader = BitReader::new(block, mode_bits, 128 - mode_bits);

    let mut fields = Fields {
        partition: reader.read_bits(mode.partition_bits) as usize,
        ..Default::default()
    };

    let partition = subset_assignment(mode.subsets, fields.partition);
    let anchors = subset_anchors(mode.subsets, fields.partition);

    fields.rotation = reader.read_bits(mode.rotation_bits);
    fields.index_selection = reader.read_bits(mode.index_selection_bits);

    // Color components are stored channel major, not endpoint major.
    for channel in 0..3 {
        for subset in 0..mode.subsets {
            for endpoint in 0..2 {
                fields.colors[subset][endpoint][channel] = reader.read_bits(mode.color_bits);
            }
        }
    }

    if mode.alpha_bits > 0 {
        for subset in 0..mode.subsets {
            for endpoint in 0..2 {
                fields.alphas[subset][endpoint] = reader.read_bits(mode.alpha_bits);
            }
        }
    }

    for subset in 0..mode.subsets {
        if mode.endpoint_p_bits > 0 {
            fields.p_bits[subset][0] = reader.read_bit();
            fields.p_bits[subset][1] = reader.read_bit();
        } else if mode.shared_p_bits > 0 {
            // A shared p-bit applies to both endpoints of the subset.
            let shared = reader.read_bit();
            fields.p_bits[subset] = [shared, shared];
        }
    }

    read_indices(
        &mut reader,
        &partition,
        &anchors,
        mode.index_bits,
        &mut fields.indices,
    );
    if mode.index2_bits > 0 {
        read_indices(
            &mut reader,
            &partition,
            &anchors,
            mode.index2_bits,
            &mut fields.indices2,
        );
    }

    // A structurally valid block consumes all 128 bits exactly.
    debug_assert!(reader.bits_left() == 0 && !reader.failed());

    fields
}

fn read_indices(
    reader: &mut BitReader,
    partition: &[u8; 16],
    anchors: &[usize; 3],
    index_bits: u32,
    out: &mut [u8; 16],
) {
    for (texel, value) in out.iter_mut().enumerate() {
        let subset = partition[texel] as usize;
        // The anchor texel's high index bit is always zero and not stored.
        let width = if texel == anchors[subset] {
            index_bits - 1
        } else {
            index_bits
        };
        *value = reader.read_bits(width);
    }
}

/// Endpoints expanded to full 8 bit precision.
///
/// Alpha defaults to opaque for modes without stored alpha.
struct Endpoints {
    colors: [[[u8; 3]; 2]; 3],
    alphas: [[u8; 2]; 3],
}

fn expand_endpoints(mode: &Mode, fields: &Fields) -> Endpoints {
    let p_count = if mode.endpoint_p_bits > 0 || mode.shared_p_bits > 0 {
        1
    } else {
        0
    };

    let mut endpoints = Endpoints {
        colors: [[[0u8; 3]; 2]; 3],
        alphas: [[0xFF; 2]; 3],
    };
    for subset in 0..mode.subsets {
        for endpoint in 0..2 {
            let p = fields.p_bits[subset][endpoint];
            for channel in 0..3 {
                endpoints.colors[subset][endpoint][channel] = expand_value(
                    fields.colors[subset][endpoint][channel],
                    mode.color_bits,
                    p,
                    p_count,
                );
            }
            if mode.alpha_bits > 0 {
                endpoints.alphas[subset][endpoint] =
                    expand_value(fields.alphas[subset][endpoint], mode.alpha_bits, p, p_count);
            }
        }
    }
    endpoints
}

/// Expand a truncated endpoint component to 8 bits.
///
/// The p-bit is appended below the stored value, the result is shifted so
/// its MSB lands in bit 7, and the high bits are replicated into the
/// vacated low bits. This is not a simple rescale.
fn expand_value(value: u8, value_bits: u32, p: u8, p_count: u32) -> u8 {
    let mut out = value << p_count;
    if p_count > 0 {
        out |= p;
    }
    let precision = value_bits + p_count;
    out <<= 8 - precision;
    if precision < 8 {
        out |= out >> precision;
    }
    out
}

const WEIGHTS_2: [u16; 4] = [0, 21, 43, 64];
const WEIGHTS_3: [u16; 8] = [0, 9, 18, 27, 37, 46, 55, 64];
const WEIGHTS_4: [u16; 16] = [0, 4, 9, 13, 17, 21, 26, 30, 34, 38, 43, 47, 51, 55, 60, 64];

/// Blend two endpoint values with the 64 scaled weight for `index`.
fn interpolate(e0: u8, e1: u8, index: u8, index_bits: u32) -> u8 {
    let weight = match index_bits {
        2 => WEIGHTS_2[index as usize],
        3 => WEIGHTS_3[index as usize],
        _ => WEIGHTS_4[index as usize],
    };
    (((64 - weight) * e0 as u16 + weight * e1 as u16 + 32) >> 6) as u8
}

/// A 4x4 block filled with a single RGBA8 value.
pub fn solid_block(rgba: [u8; 4]) -> Rgba8Block {
    [[rgba; BLOCK_WIDTH]; BLOCK_HEIGHT]
}

/// Decode a single 16 byte BC7 block to 4x4 RGBA8 texels.
pub fn decode_block(block: &[u8; 16]) -> Result<Rgba8Block, DecodeError> {
    decode_block_at(block, 0)
}

pub(crate) fn decode_block_at(
    block: &[u8; 16],
    block_index: usize,
) -> Result<Rgba8Block, DecodeError> {
    let mode_index = mode(block[0]).ok_or(DecodeError::ReservedBlockMode { block_index })?;
    let mode = &MODES[mode_index];

    let fields = read_fields(mode, mode_index, block);
    let endpoints = expand_endpoints(mode, &fields);
    let partition = subset_assignment(mode.subsets, fields.partition);

    // The index selection bit swaps which plane drives color and which
    // drives alpha. Modes with a single plane use it for both.
    let (color_plane, color_bits, alpha_plane, alpha_bits) = if mode.index2_bits == 0 {
        (&fields.indices, mode.index_bits, &fields.indices, mode.index_bits)
    } else if fields.index_selection != 0 {
        (&fields.indices2, mode.index2_bits, &fields.indices, mode.index_bits)
    } else {
        (&fields.indices, mode.index_bits, &fields.indices2, mode.index2_bits)
    };

    let mut pixels = [[[0u8; 4]; BLOCK_WIDTH]; BLOCK_HEIGHT];
    for texel in 0..BLOCK_WIDTH * BLOCK_HEIGHT {
        let subset = partition[texel] as usize;
        let [e0, e1] = endpoints.colors[subset];
        let index = color_plane[texel];

        let mut r = interpolate(e0[0], e1[0], index, color_bits);
        let mut g = interpolate(e0[1], e1[1], index, color_bits);
        let mut b = interpolate(e0[2], e1[2], index, color_bits);
        let mut a = if mode.alpha_bits > 0 {
            let [a0, a1] = endpoints.alphas[subset];
            interpolate(a0, a1, alpha_plane[texel], alpha_bits)
        } else {
            0xFF
        };

        // Rotation swaps the scalar channel back out of alpha, after
        // interpolation.
        match fields.rotation {
            1 => core::mem::swap(&mut a, &mut r),
            2 => core::mem::swap(&mut a, &mut g),
            3 => core::mem::swap(&mut a, &mut b),
            _ => (),
        }

        pixels[texel / BLOCK_WIDTH][texel % BLOCK_WIDTH] = [r, g, b, a];
    }

    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Writes fields into a block LSB first, mirroring how the reader
    // consumes them.
    struct BlockWriter {
        bytes: [u8; 16],
        bit: usize,
    }

    impl BlockWriter {
        fn new() -> Self {
            Self {
                bytes: [0u8; 16],
                bit: 0,
            }
        }

        fn write(&mut self, value: u8, count: u32) {
            for i in 0..count {
                if value >> i & 1 != 0 {
                    self.bytes[self.bit / 8] |= 1 << (self.bit % 8);
                }
                self.bit += 1;
            }
        }

        fn finish(self) -> [u8; 16] {
            assert_eq!(128, self.bit);
            self.bytes
        }
    }

    #[test]
    fn mode_from_lowest_set_bit() {
        for m in 0..8 {
            assert_eq!(Some(m), mode(1 << m));
        }
        // High bits past the selector belong to other fields.
        assert_eq!(Some(2), mode(0b1010_0100));
        assert_eq!(None, mode(0));
    }

    #[test]
    fn modes_consume_exactly_128_bits() {
        for (m, mode) in MODES.iter().enumerate() {
            let subsets = mode.subsets as u32;
            let mut bits = m as u32 + 1;
            bits += mode.partition_bits + mode.rotation_bits + mode.index_selection_bits;
            bits += subsets * 2 * 3 * mode.color_bits;
            bits += subsets * 2 * mode.alpha_bits;
            bits += subsets * 2 * mode.endpoint_p_bits;
            bits += subsets * mode.shared_p_bits;
            bits += 16 * mode.index_bits - subsets;
            if mode.index2_bits > 0 {
                bits += 16 * mode.index2_bits - subsets;
            }
            assert_eq!(128, bits, "mode {m}");
        }
    }

    #[test]
    fn exactly_one_p_bit_kind_per_mode() {
        for mode in &MODES {
            assert!(mode.endpoint_p_bits == 0 || mode.shared_p_bits == 0);
        }
    }

    #[test]
    fn partitions_start_in_subset_0() {
        for partition in 0..64 {
            assert_eq!(0, PARTITION_2[partition][0]);
            assert_eq!(0, PARTITION_3[partition][0]);
        }
    }

    #[test]
    fn partitions_use_all_subsets() {
        for partition in 0..64 {
            assert!(PARTITION_2[partition].iter().all(|&s| s <= 1));
            assert!(PARTITION_2[partition].contains(&1));

            assert!(PARTITION_3[partition].iter().all(|&s| s <= 2));
            assert!(PARTITION_3[partition].contains(&1));
            assert!(PARTITION_3[partition].contains(&2));
        }
    }

    #[test]
    fn anchors_lie_in_their_subset() {
        for partition in 0..64 {
            assert_eq!(1, PARTITION_2[partition][ANCHOR_SECOND_2[partition] as usize]);
            assert_eq!(1, PARTITION_3[partition][ANCHOR_SECOND_3[partition] as usize]);
            assert_eq!(2, PARTITION_3[partition][ANCHOR_THIRD_3[partition] as usize]);
        }
    }

    #[test]
    fn expand_value_full_precision_is_identity() {
        for value in [0u8, 1, 0x42, 0x7F, 0xFF] {
            assert_eq!(value, expand_value(value, 8, 0, 0));
        }
        // 7 stored bits plus a p-bit also reach 8 bit precision.
        assert_eq!(0xFF, expand_value(0x7F, 7, 1, 1));
        assert_eq!(0xFE, expand_value(0x7F, 7, 0, 1));
    }

    #[test]
    fn expand_value_replicates_high_bits() {
        // 101 -> 1010_0000 with 101 replicated into the low bits.
        assert_eq!(0b1011_0100, expand_value(0b101, 3, 0, 0));
        assert_eq!(0, expand_value(0, 4, 0, 0));
        assert_eq!(0xFF, expand_value(0xF, 4, 0, 0));
    }

    #[test]
    fn interpolate_endpoints_exactly() {
        for (bits, max_index) in [(2, 3), (3, 7), (4, 15)] {
            assert_eq!(17, interpolate(17, 200, 0, bits));
            assert_eq!(200, interpolate(17, 200, max_index, bits));
        }
    }

    #[test]
    fn decode_solid_mode_6_block() {
        let mut w = BlockWriter::new();
        w.write(0b100_0000, 7); // mode 6
        // Color components, channel major: r0 r1 g0 g1 b0 b1.
        w.write(0x7F, 7);
        w.write(0, 7);
        w.write(0x40, 7);
        w.write(0, 7);
        w.write(0x00, 7);
        w.write(0, 7);
        // Alpha endpoints.
        w.write(0x7F, 7);
        w.write(0, 7);
        // Per endpoint p-bits.
        w.write(1, 1);
        w.write(0, 1);
        // All indices zero selects endpoint 0 everywhere. The anchor texel
        // stores one bit fewer.
        w.write(0, 3);
        for _ in 1..16 {
            w.write(0, 4);
        }
        let block = w.finish();

        let pixels = decode_block(&block).unwrap();
        assert_eq!(solid_block([255, 129, 1, 255]), pixels);
    }

    #[test]
    fn decode_mode_6_indices_select_endpoint_1() {
        let mut w = BlockWriter::new();
        w.write(0b100_0000, 7); // mode 6
        // Endpoint 0 is zero, endpoint 1 expands to 255 in every channel.
        for _ in 0..3 {
            w.write(0, 7);
            w.write(0x7F, 7);
        }
        w.write(0, 7);
        w.write(0x7F, 7);
        w.write(0, 1);
        w.write(1, 1);
        // The anchor can only store up to index 7; every other texel uses
        // the maximum index.
        w.write(7, 3);
        for _ in 1..16 {
            w.write(15, 4);
        }
        let block = w.finish();

        let pixels = decode_block(&block).unwrap();
        // Weight 30 of 64 between 0 and 255 rounds to 120.
        assert_eq!([120u8; 4], pixels[0][0]);
        for texel in 1..16 {
            assert_eq!([255u8; 4], pixels[texel / 4][texel % 4]);
        }
    }

    #[test]
    fn decode_mode_1_two_subsets() {
        let mut w = BlockWriter::new();
        w.write(0b10, 2); // mode 1
        // Partition 0 assigns the left two columns to subset 0 and the
        // right two to subset 1, with the second anchor at texel 15.
        w.write(0, 6);
        // Color components, channel major: s0e0 s0e1 s1e0 s1e1.
        for _ in 0..3 {
            w.write(0x20, 6);
            w.write(0x3F, 6);
            w.write(0x15, 6);
            w.write(0x00, 6);
        }
        // Shared p-bits, one per subset.
        w.write(1, 1);
        w.write(0, 1);
        // Both anchors select endpoint 0 of their subset, every other texel
        // endpoint 1.
        w.write(0, 2);
        for _ in 1..15 {
            w.write(7, 3);
        }
        w.write(0, 2);
        let block = w.finish();

        let pixels = decode_block(&block).unwrap();
        for texel in 0..16 {
            // Subset 0 expands with p 1: endpoint 0 is 131, endpoint 1 is
            // 255. Subset 1 expands with p 0: endpoint 0 is 84, endpoint 1
            // is 0. Mode 1 stores no alpha.
            let expected = match (PARTITION_2[0][texel], texel) {
                (0, 0) => [131, 131, 131, 255],
                (0, _) => [255, 255, 255, 255],
                (1, 15) => [84, 84, 84, 255],
                _ => [0, 0, 0, 255],
            };
            assert_eq!(expected, pixels[texel / 4][texel % 4], "texel {texel}");
        }
    }

    fn mode_5_block(rotation: u8) -> [u8; 16] {
        let mut w = BlockWriter::new();
        w.write(0b10_0000, 6); // mode 5
        w.write(rotation, 2);
        // Color components, channel major.
        w.write(0x11, 7);
        w.write(0x2F, 7);
        w.write(0x22, 7);
        w.write(0x53, 7);
        w.write(0x33, 7);
        w.write(0x7A, 7);
        // Alpha endpoints.
        w.write(0xD0, 8);
        w.write(0x15, 8);
        // Primary and secondary index planes.
        w.write(0, 1);
        for _ in 1..16 {
            w.write(1, 2);
        }
        w.write(0, 1);
        for _ in 1..16 {
            w.write(2, 2);
        }
        w.finish()
    }

    #[test]
    fn rotation_1_swaps_red_and_alpha() {
        let base = decode_block(&mode_5_block(0)).unwrap();
        let rotated = decode_block(&mode_5_block(1)).unwrap();

        for y in 0..4 {
            for x in 0..4 {
                let [r, g, b, a] = base[y][x];
                assert_eq!([a, g, b, r], rotated[y][x]);
            }
        }
    }

    fn mode_4_block(index_selection: u8) -> [u8; 16] {
        let mut w = BlockWriter::new();
        w.write(0b1_0000, 5); // mode 4
        w.write(0, 2); // rotation
        w.write(index_selection, 1);
        // Endpoint 0 expands to 0, endpoint 1 to 255.
        for _ in 0..3 {
            w.write(0, 5);
            w.write(0x1F, 5);
        }
        w.write(0, 6);
        w.write(0x3F, 6);
        // Primary plane all at the maximum index, secondary plane all zero.
        w.write(1, 1);
        for _ in 1..16 {
            w.write(3, 2);
        }
        w.write(0, 2);
        for _ in 1..16 {
            w.write(0, 3);
        }
        w.finish()
    }

    #[test]
    fn index_selection_swaps_planes() {
        // Selection bit clear: color follows the primary plane (endpoint 1)
        // and alpha the secondary plane (endpoint 0).
        let pixels = decode_block(&mode_4_block(0)).unwrap();
        assert_eq!([255, 255, 255, 0], pixels[3][3]);

        // Selection bit set: the planes swap.
        let pixels = decode_block(&mode_4_block(1)).unwrap();
        assert_eq!([0, 0, 0, 255], pixels[3][3]);
    }

    #[test]
    fn decode_block_rejects_reserved_mode() {
        let result = decode_block(&[0u8; 16]);
        assert!(matches!(
            result,
            Err(DecodeError::ReservedBlockMode { block_index: 0 })
        ));
    }

    #[test]
    fn decode_block_is_deterministic() {
        let mut block = [0u8; 16];
        for (i, byte) in block.iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        assert_eq!(decode_block(&block).unwrap(), decode_block(&block).unwrap());
    }
}
