//! Bit-level building blocks: a fixed-size MSB-first bit array and word
//! manipulation helpers shared by the packed containers.

pub mod bit_array;
pub mod bits;

pub use bit_array::BitArray;
