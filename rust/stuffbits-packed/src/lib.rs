//! Packed integer storage: a concurrent fixed-width [`WordArray`] and the
//! block-chained [`StuffedBits`] stream of universal codes.

pub mod stuffed;
pub mod word_array;

#[cfg(test)]
mod tests;

pub use stuffbits_bits::BitArray;
pub use stuffed::{
    BitCursor, BitPosition, BlockInfo, DEFAULT_BLOCK_BITS, StuffedBits, StuffedBitsOptions,
};
pub use word_array::{DEFAULT_SEGMENT_BITS, WordArray, WordArrayOptions};
