//! Head coordinates of a stuffed bit stream.

/// Position of a bit inside a block, split into the active word and the
/// number of bits still unread (or unwritten) in it.
///
/// Bits inside a word are consumed most significant first: with
/// `bits_left == 64` the next bit is bit 63 of `word_index`, with
/// `bits_left == 1` it is bit 0. A normalized cursor never has
/// `bits_left == 0`; stepping past the last bit of a word moves to the top
/// of the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitCursor {
    word_index: usize,
    bits_left: u32,
}

impl BitCursor {
    pub const START: BitCursor = BitCursor {
        word_index: 0,
        bits_left: 64,
    };

    #[inline]
    pub fn from_offset(offset: u64) -> BitCursor {
        BitCursor {
            word_index: (offset / 64) as usize,
            bits_left: 64 - (offset % 64) as u32,
        }
    }

    /// Bit offset from the start of the block.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.word_index as u64 * 64 + (64 - self.bits_left) as u64
    }

    #[inline]
    pub fn word_index(&self) -> usize {
        self.word_index
    }

    #[inline]
    pub fn bits_left(&self) -> u32 {
        self.bits_left
    }

    /// Bits already consumed in the active word.
    #[inline]
    pub fn bits_used(&self) -> u32 {
        64 - self.bits_left
    }

    /// Moves forward by `bits`, crossing word boundaries as needed.
    #[inline]
    pub fn advance(&mut self, bits: u64) {
        if bits < self.bits_left as u64 {
            self.bits_left -= bits as u32;
        } else {
            *self = BitCursor::from_offset(self.offset() + bits);
        }
    }
}

impl Default for BitCursor {
    fn default() -> Self {
        BitCursor::START
    }
}

/// A head position expressed as a block and an offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitPosition {
    pub block: usize,
    pub offset: u64,
}

impl BitPosition {
    pub fn new(block: usize, offset: u64) -> BitPosition {
        BitPosition { block, offset }
    }
}

#[cfg(test)]
mod tests {
    use super::BitCursor;

    #[test]
    fn test_offset_round_trip() {
        for offset in [0u64, 1, 63, 64, 65, 127, 128, 1000] {
            assert_eq!(BitCursor::from_offset(offset).offset(), offset);
        }
        let c = BitCursor::from_offset(70);
        assert_eq!((c.word_index(), c.bits_left(), c.bits_used()), (1, 58, 6));
    }

    #[test]
    fn test_advance_normalizes_at_word_end() {
        let mut c = BitCursor::START;
        c.advance(63);
        assert_eq!((c.word_index(), c.bits_left()), (0, 1));
        c.advance(1);
        assert_eq!((c.word_index(), c.bits_left()), (1, 64));
        c.advance(130);
        assert_eq!(c.offset(), 194);
        assert_eq!((c.word_index(), c.bits_left()), (3, 62));
    }
}
