//! Word-level bit helpers.
//!
//! Masks and "keep/clear" helpers are generic over the unsigned primitive word
//! types (`u64` for stream words, `u128` for packed array values). Positions
//! counted from the *left* are counted from the most significant bit.

use num_traits::{PrimInt, Unsigned};

#[inline]
fn word_bits<T: PrimInt>() -> u32 {
    T::zero().count_zeros()
}

/// Returns a mask with the low `num_bits` bits set (`0x000fff`).
///
/// Zero bits yields an empty mask; `num_bits` at or above the word width
/// yields all ones.
#[inline]
pub fn build_low_bit_mask<T: PrimInt + Unsigned>(num_bits: u32) -> T {
    let bits = word_bits::<T>();
    if num_bits == 0 {
        T::zero()
    } else if num_bits >= bits {
        T::max_value()
    } else {
        T::max_value() >> (bits - num_bits) as usize
    }
}

/// Returns a mask with the high `num_bits` bits set (`0xfff000`).
#[inline]
pub fn build_high_bit_mask<T: PrimInt + Unsigned>(num_bits: u32) -> T {
    let bits = word_bits::<T>();
    if num_bits == 0 {
        T::zero()
    } else if num_bits >= bits {
        T::max_value()
    } else {
        T::max_value() << (bits - num_bits) as usize
    }
}

/// Clears the leftmost `l` bits of `v`.
#[inline]
pub fn clear_left_bits<T: PrimInt + Unsigned>(v: T, l: u32) -> T {
    if l >= word_bits::<T>() {
        return T::zero();
    }
    v & (T::max_value() >> l as usize)
}

/// Keeps only the leftmost `l` bits of `v`.
#[inline]
pub fn save_left_bits<T: PrimInt + Unsigned>(v: T, l: u32) -> T {
    v & build_high_bit_mask::<T>(l)
}

/// Clears the rightmost `r` bits of `v`.
#[inline]
pub fn clear_right_bits<T: PrimInt + Unsigned>(v: T, r: u32) -> T {
    if r >= word_bits::<T>() {
        return T::zero();
    }
    v & (T::max_value() << r as usize)
}

/// Keeps only the rightmost `r` bits of `v`.
#[inline]
pub fn save_right_bits<T: PrimInt + Unsigned>(v: T, r: u32) -> T {
    v & build_low_bit_mask::<T>(r)
}

/// Clears everything except the leftmost `l` and rightmost `r` bits.
#[inline]
pub fn clear_middle_bits<T: PrimInt + Unsigned>(v: T, l: u32, r: u32) -> T {
    save_right_bits(v, r) | save_left_bits(v, l)
}

/// Keeps everything except the leftmost `l` and rightmost `r` bits.
#[inline]
pub fn save_middle_bits<T: PrimInt + Unsigned>(v: T, l: u32, r: u32) -> T {
    clear_right_bits(v, r) & clear_left_bits(v, l)
}

/// Number of bits needed to represent `x`, i.e. `floor(log2(x)) + 1`.
/// Zero needs zero bits.
#[inline]
pub fn count_bits_64(x: u64) -> u32 {
    u64::BITS - x.leading_zeros()
}

#[inline]
pub fn count_bits_32(x: u32) -> u32 {
    u32::BITS - x.leading_zeros()
}

/// Spreads 21 two-bit groups into 21 three-bit groups: `aabbcc` becomes
/// `0aa0bb0cc`. Handy for printing 2-bit packed words as octal.
///
/// # Panics
///
/// Panics in debug builds if `v` uses more than 42 bits.
#[inline]
pub fn expand_to_3(v: u64) -> u64 {
    debug_assert!(v >> 42 == 0, "expand_to_3 input {v:#x} exceeds 42 bits");
    (0..21).fold(0u64, |o, i| o | ((v & (0b11 << (2 * i))) << i))
}

/// Inverse of [`expand_to_3`]: drops the high bit of each three-bit group.
#[inline]
pub fn compress_to_2(v: u64) -> u64 {
    (0..21).fold(0u64, |o, i| o | ((v & (0b11 << (3 * i))) >> i))
}

/// Renders a word as 64 `0`/`1` characters, most significant bit first.
pub fn display_word(word: u64) -> String {
    (0..64)
        .map(|i| if word & (1u64 << (63 - i)) != 0 { '1' } else { '0' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks() {
        assert_eq!(build_low_bit_mask::<u64>(0), 0);
        assert_eq!(build_low_bit_mask::<u64>(1), 1);
        assert_eq!(build_low_bit_mask::<u64>(12), 0xfff);
        assert_eq!(build_low_bit_mask::<u64>(64), u64::MAX);
        assert_eq!(build_low_bit_mask::<u64>(100), u64::MAX);
        assert_eq!(build_high_bit_mask::<u64>(4), 0xf000_0000_0000_0000);
        assert_eq!(build_high_bit_mask::<u64>(0), 0);
        assert_eq!(build_low_bit_mask::<u128>(65), (1u128 << 65) - 1);
        assert_eq!(build_high_bit_mask::<u128>(128), u128::MAX);
        assert_eq!(build_low_bit_mask::<u32>(31), 0x7fff_ffff);
    }

    #[test]
    fn test_save_and_clear() {
        let v = 0xf0f0_0000_0000_0f0fu64;
        assert_eq!(clear_left_bits(v, 8), 0x00f0_0000_0000_0f0f);
        assert_eq!(save_left_bits(v, 8), 0xf000_0000_0000_0000);
        assert_eq!(clear_right_bits(v, 8), 0xf0f0_0000_0000_0f00);
        assert_eq!(save_right_bits(v, 8), 0x0f);
        assert_eq!(clear_left_bits(v, 64), 0);
        assert_eq!(clear_right_bits(v, 64), 0);
        assert_eq!(save_left_bits(v, 0), 0);
        assert_eq!(save_right_bits(v, 0), 0);
        assert_eq!(clear_middle_bits(v, 4, 4), 0xf000_0000_0000_000f);
        assert_eq!(save_middle_bits(v, 4, 4), 0x00f0_0000_0000_0f00);

        let w = u128::MAX;
        assert_eq!(save_right_bits(w, 70), (1u128 << 70) - 1);
        assert_eq!(clear_left_bits(w, 120), 0xff);
    }

    #[test]
    fn test_count_bits() {
        assert_eq!(count_bits_64(0), 0);
        assert_eq!(count_bits_64(1), 1);
        assert_eq!(count_bits_64(2), 2);
        assert_eq!(count_bits_64(255), 8);
        assert_eq!(count_bits_64(256), 9);
        assert_eq!(count_bits_64(u64::MAX), 64);
        assert_eq!(count_bits_32(0x8000_0000), 32);
    }

    #[test]
    fn test_expand_compress() {
        assert_eq!(expand_to_3(0b11_10_01), 0b011_010_001);
        assert_eq!(compress_to_2(0b011_010_001), 0b11_10_01);

        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..1000 {
            let v = rng.u64(..1u64 << 42);
            assert_eq!(compress_to_2(expand_to_3(v)), v);
        }
    }

    #[test]
    fn test_display_word() {
        let s = display_word(0x8000_0000_0000_0001);
        assert_eq!(s.len(), 64);
        assert!(s.starts_with("10"));
        assert!(s.ends_with("01"));
        assert_eq!(s.matches('1').count(), 2);
        assert_eq!(display_word(0), "0".repeat(64));
    }
}
