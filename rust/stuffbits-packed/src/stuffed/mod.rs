//! Block-chained bit stream with a movable head.
//!
//! A [`StuffedBits`] is a list of fixed-capacity blocks. Writes go through
//! the head; when a coded value does not fit in the last block, that block is
//! sealed at the head and a fresh one is appended. A value is never split
//! across blocks, so reads can move to the next block only on a value
//! boundary.

mod codes;
mod cursor;
pub mod fibonacci;
mod persist;

use stuffbits_bits::bits::build_low_bit_mask;
use stuffbits_collections::BlockArena;
use stuffbits_collections::block_arena::zeroed_words;
use stuffbits_common::{Error, Result};

pub use codes::{MAX_CODED_VALUE, delta_len, gamma_len, unary_len, zeckendorf_len};
pub use cursor::{BitCursor, BitPosition};

/// Default block capacity: 16 MiB of bits.
pub const DEFAULT_BLOCK_BITS: u64 = 16 * 1024 * 1024 * 8;

/// Smallest accepted block capacity.
pub const MIN_BLOCK_BITS: u64 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuffedBitsOptions {
    /// Capacity of each newly allocated block, in bits. Rounded up to whole
    /// words.
    pub block_bits: u64,
}

impl Default for StuffedBitsOptions {
    fn default() -> Self {
        StuffedBitsOptions {
            block_bits: DEFAULT_BLOCK_BITS,
        }
    }
}

impl StuffedBitsOptions {
    pub fn with_block_bits(mut self, block_bits: u64) -> Self {
        self.block_bits = block_bits;
        self
    }
}

/// Layout of one block in the chain, as reported by
/// [`StuffedBits::block_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Global bit position of the block's first bit.
    pub begin: u64,
    /// Bits written into the block.
    pub used: u64,
    /// Allocated capacity in bits.
    pub capacity: u64,
}

#[derive(Clone)]
struct Block {
    bgn: u64,
    len: u64,
    words: Box<[u64]>,
}

impl Block {
    fn new(bgn: u64, capacity_bits: u64) -> Block {
        Block {
            bgn,
            len: 0,
            words: zeroed_words((capacity_bits / 64) as usize),
        }
    }

    #[inline]
    fn capacity(&self) -> u64 {
        self.words.len() as u64 * 64
    }
}

/// A variable-length bit stream of universally coded integers.
///
/// The stream is not safe for concurrent mutation; use one instance per
/// reader/writer or synchronize externally.
#[derive(Clone)]
pub struct StuffedBits {
    block_bits: u64,
    blocks: BlockArena<Block>,
    block: usize,
    cursor: BitCursor,
}

impl StuffedBits {
    /// Creates an empty stream with the default block size.
    pub fn new() -> StuffedBits {
        Self::empty(DEFAULT_BLOCK_BITS)
    }

    pub fn with_options(options: StuffedBitsOptions) -> Result<StuffedBits> {
        Self::with_block_bits(options.block_bits)
    }

    pub fn with_block_bits(block_bits: u64) -> Result<StuffedBits> {
        stuffbits_common::verify_arg!(block_bits, block_bits >= MIN_BLOCK_BITS);
        Ok(Self::empty(block_bits.next_multiple_of(64)))
    }

    fn empty(block_bits: u64) -> StuffedBits {
        let mut blocks = BlockArena::new();
        blocks.push_with(|_| Block::new(0, block_bits));
        StuffedBits {
            block_bits,
            blocks,
            block: 0,
            cursor: BitCursor::START,
        }
    }

    /// Configured capacity of new blocks, in bits.
    #[inline]
    pub fn block_bits(&self) -> u64 {
        self.block_bits
    }

    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_info(&self, index: usize) -> Option<BlockInfo> {
        self.blocks.get(index).map(|b| BlockInfo {
            begin: b.bgn,
            used: b.len,
            capacity: b.capacity(),
        })
    }

    /// Total number of bits written.
    pub fn get_length(&self) -> u64 {
        self.blocks.last().map_or(0, |b| b.bgn + b.len)
    }

    /// Global bit position of the head.
    pub fn get_position(&self) -> u64 {
        self.blocks[self.block].bgn + self.cursor.offset()
    }

    /// Head position as a block and an offset inside it.
    pub fn block_position(&self) -> BitPosition {
        BitPosition::new(self.block, self.cursor.offset())
    }

    /// Moves the head to global bit `position`, which may be anywhere up to
    /// and including the end of the written data. A position on a block
    /// boundary resolves to the start of the later block.
    pub fn set_position(&mut self, position: u64) -> Result<()> {
        let length = self.get_length();
        if position > length {
            return Err(Error::out_of_bounds("stuffed bits position", position, length + 1));
        }
        let last = self.blocks.len() - 1;
        let block = self
            .blocks
            .as_slice()
            .partition_point(|b| b.bgn <= position)
            .saturating_sub(1)
            .min(last);
        self.block = block;
        self.cursor = BitCursor::from_offset(position - self.blocks[block].bgn);
        Ok(())
    }

    /// Moves the head to `position.offset` within block `position.block`.
    ///
    /// Sealed blocks accept offsets up to their used length; the last block
    /// accepts offsets up to its capacity.
    pub fn set_block_position(&mut self, position: BitPosition) -> Result<()> {
        let num_blocks = self.blocks.len();
        stuffbits_common::verify_bounds!("stuffed bits block", position.block, num_blocks);
        let block = &self.blocks[position.block];
        let limit = if position.block + 1 == num_blocks {
            block.capacity()
        } else {
            block.len
        };
        stuffbits_common::verify_bounds!("stuffed bits block offset", position.offset, limit + 1);
        self.block = position.block;
        self.cursor = BitCursor::from_offset(position.offset);
        Ok(())
    }

    /// Pads with zero bits up to the next multiple of 8 in global position.
    pub fn byte_align(&mut self) -> Result<()> {
        let pad = (8 - self.get_position() % 8) % 8;
        if pad > 0 {
            self.set_binary(pad as u32, 0)?;
        }
        Ok(())
    }

    /// Renders word `w` of the block under the head.
    pub fn display_word(&self, w: usize) -> Option<String> {
        self.blocks[self.block]
            .words
            .get(w)
            .map(|&word| stuffbits_bits::bits::display_word(word))
    }

    /// Reads one bit and advances the head.
    pub fn get_bit(&mut self) -> Result<bool> {
        self.begin_read("get_bit");
        Ok(self.take_bits(1, "get_bit")? != 0)
    }

    /// Returns the next bit without moving the head.
    pub fn test_bit(&mut self) -> Result<bool> {
        self.begin_read("test_bit");
        self.ensure_readable(1, "test_bit")?;
        let block = &self.blocks[self.block];
        let word = block.words[self.cursor.word_index()];
        Ok(word >> (self.cursor.bits_left() - 1) & 1 != 0)
    }

    /// Writes one bit.
    pub fn set_bit(&mut self, on: bool) -> Result<()> {
        self.begin_write(1, "set_bit")?;
        self.put_bits(1, on as u64);
        Ok(())
    }

    /// Prepares the head for a write of `bits` bits.
    ///
    /// In the last block, a write that would run past capacity seals the
    /// block at the head and continues in a new block. In an earlier block,
    /// the write must end inside that block's written data.
    fn begin_write(&mut self, bits: u64, operation: &str) -> Result<()> {
        let offset = self.cursor.offset();
        if self.block + 1 < self.blocks.len() {
            let len = self.blocks[self.block].len;
            if offset + bits > len {
                return Err(Error::precondition(
                    operation,
                    format!(
                        "write of {bits} bits at offset {offset} would grow sealed block {} \
                         (used {len})",
                        self.block
                    ),
                ));
            }
            return Ok(());
        }

        if offset + bits <= self.blocks[self.block].capacity() {
            return Ok(());
        }
        if bits > self.block_bits {
            return Err(Error::precondition(
                operation,
                format!(
                    "a {bits}-bit value cannot fit in a {}-bit block",
                    self.block_bits
                ),
            ));
        }
        self.ensure_space();
        Ok(())
    }

    /// Seals the last block at the head and appends a new block.
    fn ensure_space(&mut self) {
        let sealed = self.block;
        let len = self.cursor.offset();
        let bgn = {
            let block = &mut self.blocks[sealed];
            block.len = len;
            block.bgn + len
        };
        let block_bits = self.block_bits;
        self.block = self.blocks.push_with(|_| Block::new(bgn, block_bits));
        self.cursor = BitCursor::START;
        log::debug!(
            "stuffed bits: sealed block {sealed} at {len} bits, allocated block {} at {bgn}",
            self.block
        );
    }

    /// Prepares the head for reading a value. At the exact end of a block's
    /// written data, moves to the start of the next block.
    fn begin_read(&mut self, operation: &str) {
        let offset = self.cursor.offset();
        let len = self.blocks[self.block].len;
        if offset == len && self.block + 1 < self.blocks.len() {
            self.block += 1;
            self.cursor = BitCursor::START;
            log::trace!("stuffed bits: {operation} moved to block {}", self.block);
        }
    }

    fn ensure_readable(&self, bits: u64, operation: &str) -> Result<()> {
        let offset = self.cursor.offset();
        let len = self.blocks[self.block].len;
        if offset + bits > len {
            return Err(Error::precondition(
                operation,
                format!(
                    "read of {bits} bits at offset {offset} runs past the {len} bits written \
                     in block {}",
                    self.block
                ),
            ));
        }
        Ok(())
    }

    /// Reads `width` (at most 64) bits as an integer, MSB first.
    fn take_bits(&mut self, width: u32, operation: &str) -> Result<u64> {
        debug_assert!(width <= 64);
        if width == 0 {
            return Ok(0);
        }
        self.ensure_readable(width as u64, operation)?;

        let words = &self.blocks[self.block].words;
        let w = self.cursor.word_index();
        let left = self.cursor.bits_left();
        let value = if width <= left {
            (words[w] >> (left - width)) & build_low_bit_mask::<u64>(width)
        } else {
            let rest = width - left;
            let high = words[w] & build_low_bit_mask::<u64>(left);
            (high << rest) | (words[w + 1] >> (64 - rest))
        };
        self.cursor.advance(width as u64);
        Ok(value)
    }

    /// Counts 1 bits up to the next 0 bit and consumes them and the 0.
    fn take_unary(&mut self, operation: &str) -> Result<u64> {
        let mut count = 0u64;
        loop {
            let offset = self.cursor.offset();
            let block = &self.blocks[self.block];
            let available = (block.len.saturating_sub(offset)).min(self.cursor.bits_left() as u64);
            if available == 0 {
                return Err(Error::precondition(
                    operation,
                    format!(
                        "unary run at offset {offset} has no terminator in the {} bits written \
                         in block {}",
                        block.len, self.block
                    ),
                ));
            }
            let available = available as u32;
            // Left-align the unread bits of the active word.
            let bits = block.words[self.cursor.word_index()] << self.cursor.bits_used();
            let ones = bits.leading_ones().min(available);
            if ones < available {
                self.cursor.advance(ones as u64 + 1);
                return Ok(count + ones as u64);
            }
            count += ones as u64;
            self.cursor.advance(ones as u64);
        }
    }

    /// Writes the low `width` (at most 64) bits of `value`, MSB first.
    /// Space must have been reserved with `begin_write`.
    fn put_bits(&mut self, width: u32, value: u64) {
        debug_assert!(width <= 64);
        if width == 0 {
            return;
        }
        let value = value & build_low_bit_mask::<u64>(width);
        let w = self.cursor.word_index();
        let left = self.cursor.bits_left();
        let block = &mut self.blocks[self.block];
        if width <= left {
            let shift = left - width;
            let mask = build_low_bit_mask::<u64>(width) << shift;
            block.words[w] = (block.words[w] & !mask) | (value << shift);
        } else {
            let rest = width - left;
            block.words[w] = (block.words[w] & !build_low_bit_mask::<u64>(left)) | (value >> rest);
            let shift = 64 - rest;
            block.words[w + 1] = (block.words[w + 1] & !(build_low_bit_mask::<u64>(rest) << shift))
                | (value << shift);
        }
        self.cursor.advance(width as u64);
        let end = self.cursor.offset();
        if end > block.len {
            block.len = end;
        }
    }

    /// Writes `count` 1 bits followed by a 0 bit.
    fn put_unary(&mut self, count: u64) {
        let mut remaining = count;
        while remaining >= 64 {
            self.put_bits(64, u64::MAX);
            remaining -= 64;
        }
        // `remaining` ones then a zero, as one chunk of at most 64 bits.
        let width = remaining as u32 + 1;
        self.put_bits(width, build_low_bit_mask::<u64>(remaining as u32) << 1);
    }
}

impl Default for StuffedBits {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StuffedBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StuffedBits")
            .field("block_bits", &self.block_bits)
            .field("num_blocks", &self.blocks.len())
            .field("length", &self.get_length())
            .field("position", &self.block_position())
            .finish()
    }
}
