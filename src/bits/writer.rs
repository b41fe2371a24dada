use std::slice;

/// Sequential MSB-first bit writer. Owns its buffer; callers only ever see it
/// through [`bytes`](Self::bytes) or [`iter`](Self::iter).
#[derive(Default)]
pub struct BitBarrelWriter {
    buffer: Vec<u8>,
    /// Bits already filled in the last byte of `buffer`. Zero means the next
    /// bit opens a new byte.
    bit_pos: u8,
}

impl BitBarrelWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(bytes),
            bit_pos: 0,
        }
    }

    /// Appends the low `num_bits` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, num_bits: u32) {
        assert!(
            (1..=32).contains(&num_bits),
            "bit width {num_bits} out of range"
        );
        let mut left = num_bits;
        while left > 0 {
            if self.bit_pos == 0 {
                self.buffer.push(0);
            }
            let free = 8 - u32::from(self.bit_pos);
            let take = free.min(left);
            let chunk = (value >> (left - take)) & ((1 << take) - 1);
            let last = self.buffer.len() - 1;
            self.buffer[last] |= u8::try_from(chunk << (free - take)).unwrap();
            left -= take;
            self.bit_pos = (self.bit_pos + u8::try_from(take).unwrap()) % 8;
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bits(value.into(), 8);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bits(value.into(), 16);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bits(value, 32);
    }

    pub fn set_next_bit(&mut self, value: bool) {
        self.write_bits(value.into(), 1);
    }

    /// Closes the current byte, leaving its unwritten bits zero. Does nothing
    /// if the cursor is already on a byte boundary.
    pub fn advance_next_byte(&mut self) {
        self.bit_pos = 0;
    }

    /// Bytes written so far, counting a zero-padded partial trailing byte.
    pub fn byte_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn iter(&self) -> slice::Iter<'_, u8> {
        self.buffer.iter()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl<'a> IntoIterator for &'a BitBarrelWriter {
    type Item = &'a u8;
    type IntoIter = slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::BitBarrelWriter;
    use crate::bits::BitBarrel;
    use std::error::Error;

    #[test]
    fn nibble_then_advance() {
        let mut w = BitBarrelWriter::new();
        w.write_bits(0b1011, 4);
        w.advance_next_byte();
        assert_eq!(w.bytes(), [0b1011_0000]);
        assert_eq!(w.byte_count(), 1);
    }

    #[test]
    fn advance_when_aligned_is_a_no_op() {
        let mut w = BitBarrelWriter::new();
        w.advance_next_byte();
        assert_eq!(w.byte_count(), 0);
        w.write_u8(0xaa);
        w.advance_next_byte();
        w.write_u8(0x55);
        assert_eq!(w.bytes(), [0xaa, 0x55]);
    }

    #[test]
    fn partial_byte_counts_before_advance() {
        let mut w = BitBarrelWriter::new();
        w.set_next_bit(true);
        assert_eq!(w.byte_count(), 1);
        assert!(!w.is_aligned());
        assert_eq!(w.bytes(), [0x80]);
    }

    #[test]
    fn widths_pack_without_gaps() {
        let mut w = BitBarrelWriter::new();
        w.write_bits(0b101, 3);
        w.write_bits(0b1_1001_1010_0110, 13);
        w.write_bits(0, 1);
        w.write_bits(0b111_1111, 7);
        assert_eq!(w.bytes(), [0b1011_1001, 0b1010_0110, 0b0111_1111]);
        assert_eq!(w.byte_count(), (3 + 13 + 1 + 7) / 8);
    }

    #[test]
    fn only_low_bits_are_written() {
        let mut w = BitBarrelWriter::new();
        w.write_bits(0xffff_fff5, 4);
        w.write_bits(0xf0, 4);
        assert_eq!(w.bytes(), [0x50]);
    }

    #[test]
    fn fixed_width_writes() {
        let mut w = BitBarrelWriter::new();
        w.write_u16(0x1234);
        w.set_next_bit(true);
        w.write_u32(0x8000_0001);
        w.advance_next_byte();
        w.write_u8(0x7f);
        assert_eq!(
            w.bytes(),
            [0x12, 0x34, 0xc0, 0x00, 0x00, 0x00, 0x80, 0x7f]
        );
    }

    #[test]
    fn iterates_committed_bytes() {
        let mut w = BitBarrelWriter::with_capacity(2);
        w.write_u16(0xbeef);
        let collected: Vec<u8> = w.iter().copied().collect();
        assert_eq!(collected, [0xbe, 0xef]);
        assert_eq!((&w).into_iter().count(), 2);
        assert_eq!(w.into_bytes(), vec![0xbe, 0xef]);
    }

    #[test]
    fn reader_sees_what_writer_wrote() -> Result<(), Box<dyn Error>> {
        let fields = [(0x3u32, 2u32), (0x1ff, 9), (0, 5), (0xabcd_ef01, 32), (1, 1)];
        let mut w = BitBarrelWriter::new();
        for (value, width) in fields {
            w.write_bits(value, width);
        }
        let mut r = BitBarrel::new(w.bytes());
        for (value, width) in fields {
            assert_eq!(r.read_bits(width)?, value);
        }
        Ok(())
    }

    #[test]
    #[should_panic]
    fn oversized_width_panics() {
        BitBarrelWriter::new().write_bits(0, 33);
    }
}
