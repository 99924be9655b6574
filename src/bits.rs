/// Sequential bit extractor over a byte buffer.
///
/// Bits are read least significant bit first within each byte, and earlier
/// reads occupy the lower order positions of the returned value. The reader
/// has no knowledge of BC7 field semantics.
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
    remaining: usize,
    failed: bool,
}

impl<'a> BitReader<'a> {
    /// Create a reader over `data` starting at `bit_start` with `bit_count`
    /// readable bits.
    pub fn new(data: &'a [u8], bit_start: usize, bit_count: usize) -> Self {
        Self {
            data,
            bit_pos: bit_start,
            remaining: bit_count,
            failed: false,
        }
    }

    /// Read `count` bits, advancing the position.
    ///
    /// A `count` of zero is legal and reads nothing. Reading past the bit
    /// budget returns 0 and puts the reader in a failed state where every
    /// later read also fails.
    pub fn read_bits(&mut self, count: u32) -> u8 {
        debug_assert!(count <= 8);
        if self.failed || count as usize > self.remaining {
            self.failed = true;
            return 0;
        }

        let mut count = count as usize;
        let mut out = 0u8;
        let mut out_off = 0;
        while count > 0 {
            // Copy as many bits as the current byte still holds.
            let bit = self.bit_pos % 8;
            let take = count.min(8 - bit);
            let bits = (self.data[self.bit_pos / 8] >> bit) & (((1u16 << take) - 1) as u8);

            out |= bits << out_off;
            out_off += take;
            self.bit_pos += take;
            self.remaining -= take;
            count -= take;
        }
        out
    }

    pub fn read_bit(&mut self) -> u8 {
        self.read_bits(1)
    }

    /// Bits left in the budget.
    pub fn bits_left(&self) -> usize {
        self.remaining
    }

    /// Whether any read has exceeded the bit budget.
    pub fn failed(&self) -> bool {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_bits_lsb_first() {
        // 0xD2 is 0,1,0,0,1,0,1,1 starting from bit 0.
        let mut reader = BitReader::new(&[0xD2, 0x0B], 0, 16);
        assert_eq!(0b010, reader.read_bits(3));
        assert_eq!(0b1010, reader.read_bits(4));
    }

    #[test]
    fn read_bits_across_byte_boundary() {
        let mut reader = BitReader::new(&[0xD2, 0x0B], 0, 16);
        assert_eq!(0b010, reader.read_bits(3));
        assert_eq!(0b1010, reader.read_bits(4));
        // Bit 7 of the first byte followed by bits 0..4 of the second.
        assert_eq!(0b10111, reader.read_bits(5));
        assert_eq!(4, reader.bits_left());
    }

    #[test]
    fn read_bits_starting_offset() {
        let mut reader = BitReader::new(&[0b1110_0000, 0b0000_0101], 5, 11);
        assert_eq!(0b111, reader.read_bits(3));
        assert_eq!(0b101, reader.read_bits(3));
        assert_eq!(5, reader.bits_left());
    }

    #[test]
    fn read_zero_bits() {
        let mut reader = BitReader::new(&[0xFF], 0, 8);
        assert_eq!(0, reader.read_bits(0));
        assert_eq!(8, reader.bits_left());
        assert!(!reader.failed());
    }

    #[test]
    fn read_past_budget_fails_sticky() {
        let mut reader = BitReader::new(&[0xFF, 0xFF], 0, 10);
        assert_eq!(0xFF, reader.read_bits(8));
        assert_eq!(0, reader.read_bits(3));
        assert!(reader.failed());
        // The reader stays failed even for reads that would otherwise fit.
        assert_eq!(0, reader.read_bits(1));
        assert!(reader.failed());
    }
}
