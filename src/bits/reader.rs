use crate::error::{Error, Result};

/// Sequential MSB-first bit reader over a borrowed byte slice.
///
/// The cursor is a byte index plus a bit offset (0-7) counted from the most
/// significant bit of that byte.
#[derive(Clone)]
pub struct BitBarrel<'a> {
    buf: &'a [u8],
    byte: usize,
    bit: u8,
}

impl<'a> BitBarrel<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            byte: 0,
            bit: 0,
        }
    }

    /// Index of the byte holding the next unread bit.
    pub fn byte_position(&self) -> usize {
        self.byte
    }

    pub fn bit_offset(&self) -> u8 {
        self.bit
    }

    pub fn remaining_bits(&self) -> usize {
        (self.buf.len() - self.byte.min(self.buf.len())) * 8 - usize::from(self.bit)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_bits() == 0
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Reads the next `num_bits` bits as an unsigned integer. The cursor does
    /// not move if the buffer runs out.
    pub fn read_bits(&mut self, num_bits: u32) -> Result<u32> {
        assert!(
            (1..=32).contains(&num_bits),
            "bit width {num_bits} out of range"
        );
        let have = self.remaining_bits();
        if have < num_bits as usize {
            return Err(Error::OutOfBits {
                offset: self.byte,
                need: num_bits,
                have,
            });
        }

        let mut result = 0u32;
        let mut left = num_bits;
        while left > 0 {
            let avail = 8 - u32::from(self.bit);
            let take = avail.min(left);
            let shift = avail - take;
            let mask = (1u32 << take) - 1;
            let chunk = (u32::from(self.buf[self.byte]) >> shift) & mask;
            result = (result << take) | chunk;
            left -= take;
            self.bit += u8::try_from(take).unwrap();
            if self.bit == 8 {
                self.bit = 0;
                self.byte += 1;
            }
        }
        Ok(result)
    }

    /// Reads a field of at most 8 bits.
    pub fn read_bits_u8(&mut self, num_bits: u32) -> Result<u8> {
        assert!(num_bits <= 8, "{num_bits}-bit field does not fit in a u8");
        Ok(self.read_bits(num_bits)?.try_into().unwrap())
    }

    /// Reads a field of at most 16 bits.
    pub fn read_bits_u16(&mut self, num_bits: u32) -> Result<u16> {
        assert!(num_bits <= 16, "{num_bits}-bit field does not fit in a u16");
        Ok(self.read_bits(num_bits)?.try_into().unwrap())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bits_u8(8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bits_u16(16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bits(32)
    }

    /// Skips the rest of the current byte. Does nothing when already aligned.
    pub fn advance_next_byte(&mut self) {
        if self.bit != 0 {
            self.bit = 0;
            self.byte += 1;
        }
    }
}
