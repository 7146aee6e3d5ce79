//! A fixed-size array of bits with MSB-first word layout.

use stuffbits_common::Result;

/// A fixed-capacity, dense flag set.
///
/// # Storage Format
///
/// Bits live in `u64` words, most significant bit first:
/// - Bit 0 is the MSB of the first word
/// - Bit 63 is the LSB of the first word
/// - Bit 64 is the MSB of the second word, and so on
///
/// The number of words allocated is `len.div_ceil(64)`. The capacity is fixed
/// by the first allocation; a later `allocate` call is a no-op.
///
/// Out-of-range access through [`get_bit`], [`set_bit`] and [`flip_bit`] is a
/// caller bug and panics. The `try_*` variants report it as
/// [`ErrorKind::OutOfBounds`](stuffbits_common::ErrorKind::OutOfBounds)
/// instead.
///
/// [`get_bit`]: BitArray::get_bit
/// [`set_bit`]: BitArray::set_bit
/// [`flip_bit`]: BitArray::flip_bit
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BitArray {
    len: u64,
    bits: Box<[u64]>,
}

impl BitArray {
    /// Creates an array of `len` bits, all zero.
    pub fn new(len: u64) -> BitArray {
        let mut array = BitArray::unallocated();
        array.allocate(len);
        array
    }

    /// Creates an array with no storage. [`allocate`](Self::allocate) must be
    /// called before any bit can be accessed.
    pub fn unallocated() -> BitArray {
        BitArray {
            len: 0,
            bits: Box::default(),
        }
    }

    /// Reserves `len` zero bits. Does nothing if the array already holds
    /// storage, so the first call fixes the capacity.
    pub fn allocate(&mut self, len: u64) {
        if self.is_allocated() {
            return;
        }
        self.bits = vec![0u64; len.div_ceil(64) as usize].into_boxed_slice();
        self.len = len;
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        !self.bits.is_empty()
    }

    /// Returns the capacity in bits.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Zeroes every bit without releasing the storage.
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Returns the value of bit `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= len()`.
    #[inline]
    pub fn get_bit(&self, pos: u64) -> bool {
        self.check_index(pos);
        let (word, mask) = Self::locate(pos);
        self.bits[word] & mask != 0
    }

    /// Sets bit `pos` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= len()`.
    #[inline]
    pub fn set_bit(&mut self, pos: u64, value: bool) {
        self.check_index(pos);
        let (word, mask) = Self::locate(pos);
        if value {
            self.bits[word] |= mask;
        } else {
            self.bits[word] &= !mask;
        }
    }

    /// Inverts bit `pos` and returns its previous value.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= len()`.
    #[inline]
    pub fn flip_bit(&mut self, pos: u64) -> bool {
        self.check_index(pos);
        let (word, mask) = Self::locate(pos);
        let prev = self.bits[word] & mask != 0;
        self.bits[word] ^= mask;
        prev
    }

    pub fn try_get_bit(&self, pos: u64) -> Result<bool> {
        self.verify_index(pos)?;
        Ok(self.get_bit(pos))
    }

    pub fn try_set_bit(&mut self, pos: u64, value: bool) -> Result<()> {
        self.verify_index(pos)?;
        self.set_bit(pos, value);
        Ok(())
    }

    pub fn try_flip_bit(&mut self, pos: u64) -> Result<bool> {
        self.verify_index(pos)?;
        Ok(self.flip_bit(pos))
    }

    /// Counts the set bits.
    pub fn count_ones(&self) -> u64 {
        self.bits.iter().map(|w| w.count_ones() as u64).sum()
    }

    /// Returns an iterator over the positions of set bits, in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = u64> + '_ {
        self.bits.iter().enumerate().flat_map(|(i, &word)| {
            let base = i as u64 * 64;
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let lz = w.leading_zeros();
                w &= !(1u64 << (63 - lz));
                Some(base + lz as u64)
            })
        })
    }

    /// The underlying words, in MSB-first layout.
    #[inline]
    pub fn storage(&self) -> &[u64] {
        &self.bits
    }

    #[inline]
    fn locate(pos: u64) -> (usize, u64) {
        ((pos >> 6) as usize, 1u64 << (63 - (pos & 63)))
    }

    #[inline]
    fn check_index(&self, pos: u64) {
        assert!(
            pos < self.len,
            "bit index {pos} out of bounds (len {})",
            self.len
        );
    }

    #[inline]
    fn verify_index(&self, pos: u64) -> Result<()> {
        stuffbits_common::verify_bounds!("bit array", pos, self.len);
        Ok(())
    }
}

impl std::fmt::Debug for BitArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitArray")
            .field("len", &self.len)
            .field("ones", &self.count_ones())
            .finish()
    }
}
