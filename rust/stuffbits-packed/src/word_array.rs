//! Growable, segmented array of fixed-width integers with word-span locking.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use stuffbits_bits::bits::build_low_bit_mask;
use stuffbits_collections::{BlockArena, SpinLockSet};
use stuffbits_common::{Result, verify_arg};

/// Default segment size: 64 KiB of packed data, expressed in bits.
pub const DEFAULT_SEGMENT_BITS: u64 = 64 * 1024 * 8;

/// Largest supported value width.
pub const MAX_VALUE_WIDTH: u32 = 128;

/// Construction parameters for a [`WordArray`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordArrayOptions {
    pub value_width: u32,
    pub segment_bits: u64,
    pub use_locks: bool,
}

impl Default for WordArrayOptions {
    fn default() -> Self {
        WordArrayOptions {
            value_width: 64,
            segment_bits: DEFAULT_SEGMENT_BITS,
            use_locks: true,
        }
    }
}

impl WordArrayOptions {
    pub fn new(value_width: u32) -> Self {
        WordArrayOptions {
            value_width,
            ..Default::default()
        }
    }

    pub fn with_value_width(mut self, value_width: u32) -> Self {
        self.value_width = value_width;
        self
    }

    pub fn with_segment_bits(mut self, segment_bits: u64) -> Self {
        self.segment_bits = segment_bits;
        self
    }

    pub fn with_locks(mut self, use_locks: bool) -> Self {
        self.use_locks = use_locks;
        self
    }
}

struct Segment {
    words: Box<[AtomicU64]>,
    locks: SpinLockSet,
}

impl Segment {
    fn new(num_words: usize, num_locks: usize) -> Segment {
        Segment {
            words: (0..num_words).map(|_| AtomicU64::new(0)).collect(),
            locks: SpinLockSet::new(num_locks),
        }
    }
}

/// A packed array of `value_width`-bit integers, safe for concurrent access.
///
/// Values are stored back to back, MSB-first, in fixed-size segments of
/// `u64` words. Element `i` lives in segment `i / values_per_segment`; a value
/// never straddles two segments, but may straddle up to three words within
/// its segment.
///
/// Segments are allocated when an index inside them is first written (or by
/// [`allocate`](Self::allocate)); every segment before it is allocated too.
///
/// ## Locking
///
/// Each segment partitions its words into lock regions of
/// [`words_per_lock`](Self::words_per_lock) words. A region is never
/// narrower than a value, so one access touches at most two adjacent regions. An
/// access takes the lower region's lock first and then the higher one, and
/// releases them in reverse. Concurrent accesses to the same or neighboring
/// elements are serialized; none can tear a value.
///
/// Growing the segment list takes an exclusive lock on the list and waits for
/// in-flight accesses to finish.
pub struct WordArray {
    value_width: u32,
    value_mask: u128,
    segment_bits: u64,
    values_per_segment: u64,
    words_per_segment: usize,
    words_per_lock: usize,
    use_locks: bool,
    segments: RwLock<BlockArena<Segment>>,
    num_values: AtomicU64,
    num_values_lock: SpinLockSet,
}

impl WordArray {
    /// Creates an empty array with the given options.
    ///
    /// Fails with `InvalidArgument` if the width is outside `1..=128` or a
    /// segment cannot hold a single value.
    pub fn new(options: WordArrayOptions) -> Result<WordArray> {
        let WordArrayOptions {
            value_width,
            segment_bits,
            use_locks,
        } = options;
        verify_arg!(value_width, value_width >= 1 && value_width <= MAX_VALUE_WIDTH);
        verify_arg!(segment_bits, segment_bits >= value_width as u64);

        let values_per_segment = segment_bits / value_width as u64;
        let words_per_lock = (value_width as usize).div_ceil(64).max(2);
        let words_per_segment = ((values_per_segment * value_width as u64).div_ceil(64) as usize)
            .next_multiple_of(words_per_lock);

        Ok(WordArray {
            value_width,
            value_mask: build_low_bit_mask::<u128>(value_width),
            segment_bits,
            values_per_segment,
            words_per_segment,
            words_per_lock,
            use_locks,
            segments: RwLock::new(BlockArena::new()),
            num_values: AtomicU64::new(0),
            num_values_lock: SpinLockSet::new(1),
        })
    }

    /// Creates an array of `value_width`-bit values with default segment size
    /// and locking.
    pub fn with_width(value_width: u32) -> Result<WordArray> {
        WordArray::new(WordArrayOptions::new(value_width))
    }

    #[inline]
    pub fn value_width(&self) -> u32 {
        self.value_width
    }

    #[inline]
    pub fn value_mask(&self) -> u128 {
        self.value_mask
    }

    #[inline]
    pub fn segment_bits(&self) -> u64 {
        self.segment_bits
    }

    #[inline]
    pub fn values_per_segment(&self) -> u64 {
        self.values_per_segment
    }

    #[inline]
    pub fn words_per_lock(&self) -> usize {
        self.words_per_lock
    }

    #[inline]
    pub fn uses_locks(&self) -> bool {
        self.use_locks
    }

    pub fn num_segments(&self) -> usize {
        self.segments.read().unwrap().len()
    }

    /// Number of elements backed by allocated segments.
    pub fn capacity(&self) -> u64 {
        self.num_segments() as u64 * self.values_per_segment
    }

    /// One past the highest index ever written.
    #[inline]
    pub fn num_values(&self) -> u64 {
        self.num_values.load(Ordering::Acquire)
    }

    /// Makes sure indices `0..num_elements` are backed by storage. Existing
    /// values are untouched.
    pub fn allocate(&self, num_elements: u64) {
        if num_elements == 0 {
            return;
        }
        self.ensure_segments(self.segment_of(num_elements - 1) + 1);
    }

    /// Zeroes every allocated value. Segments stay allocated and the
    /// high-water mark is kept.
    pub fn clear(&self) {
        let segments = self.segments.write().unwrap();
        for segment in segments.iter() {
            for word in segment.words.iter() {
                word.store(0, Ordering::Relaxed);
            }
        }
    }

    /// Returns the value at `index`. Elements that were allocated but never
    /// written read as zero.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not backed by an allocated segment.
    pub fn get(&self, index: u64) -> u128 {
        let segments = self.segments.read().unwrap();
        let seg = self.segment_of(index);
        assert!(
            seg < segments.len(),
            "word array index {index} out of bounds (capacity {})",
            segments.len() as u64 * self.values_per_segment
        );
        self.read_value(&segments[seg], index)
    }

    /// Like [`get`](Self::get), but reports an index past the allocated
    /// storage as `OutOfBounds`.
    pub fn try_get(&self, index: u64) -> Result<u128> {
        let segments = self.segments.read().unwrap();
        let seg = self.segment_of(index);
        stuffbits_common::verify_bounds!(
            "word array",
            index,
            segments.len() as u64 * self.values_per_segment
        );
        Ok(self.read_value(&segments[seg], index))
    }

    /// Stores the low `value_width` bits of `value` at `index`, allocating
    /// segments as needed.
    pub fn set(&self, index: u64, value: u128) {
        let seg = self.segment_of(index);
        self.ensure_segments(seg + 1);
        {
            let segments = self.segments.read().unwrap();
            self.write_value(&segments[seg], index, value & self.value_mask);
        }
        self.bump_num_values(index + 1);
    }

    /// Renders every written value, one per line, for debugging.
    pub fn dump_values(&self) -> String {
        let digits = (self.value_width as usize).div_ceil(4);
        (0..self.num_values())
            .map(|i| format!("{i:>10} {:0digits$x}\n", self.get(i)))
            .collect()
    }

    #[inline]
    fn segment_of(&self, index: u64) -> usize {
        (index / self.values_per_segment) as usize
    }

    /// Bit position of `index` within its segment.
    #[inline]
    fn bit_offset(&self, index: u64) -> u64 {
        (index % self.values_per_segment) * self.value_width as u64
    }

    fn ensure_segments(&self, count: usize) {
        if self.segments.read().unwrap().len() >= count {
            return;
        }
        let mut segments = self.segments.write().unwrap();
        let num_locks = self.words_per_segment / self.words_per_lock;
        let added = segments.grow_to(count, |_| Segment::new(self.words_per_segment, num_locks));
        if added > 0 {
            log::debug!(
                "word array: allocated {added} segment(s), now {} ({} words each)",
                segments.len(),
                self.words_per_segment
            );
        }
    }

    fn bump_num_values(&self, count: u64) {
        if self.num_values.load(Ordering::Acquire) >= count {
            return;
        }
        self.num_values_lock.lock(0);
        if self.num_values.load(Ordering::Relaxed) < count {
            self.num_values.store(count, Ordering::Release);
        }
        self.num_values_lock.unlock(0);
    }

    /// Lock regions covering the word span of the value at `bit_pos`.
    #[inline]
    fn lock_span(&self, bit_pos: u64) -> (usize, usize) {
        let first_word = (bit_pos / 64) as usize;
        let last_word = ((bit_pos + self.value_width as u64 - 1) / 64) as usize;
        (first_word / self.words_per_lock, last_word / self.words_per_lock)
    }

    fn read_value(&self, segment: &Segment, index: u64) -> u128 {
        let bit_pos = self.bit_offset(index);
        if self.use_locks {
            let (first, last) = self.lock_span(bit_pos);
            let _guard = segment.locks.lock_span(first, last);
            read_bits(&segment.words, bit_pos, self.value_width)
        } else {
            read_bits(&segment.words, bit_pos, self.value_width)
        }
    }

    fn write_value(&self, segment: &Segment, index: u64, value: u128) {
        let bit_pos = self.bit_offset(index);
        if self.use_locks {
            let (first, last) = self.lock_span(bit_pos);
            let _guard = segment.locks.lock_span(first, last);
            write_bits(&segment.words, bit_pos, self.value_width, value);
        } else {
            write_bits(&segment.words, bit_pos, self.value_width, value);
        }
    }
}

impl std::fmt::Debug for WordArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordArray")
            .field("value_width", &self.value_width)
            .field("values_per_segment", &self.values_per_segment)
            .field("words_per_segment", &self.words_per_segment)
            .field("words_per_lock", &self.words_per_lock)
            .field("num_segments", &self.num_segments())
            .field("num_values", &self.num_values())
            .finish()
    }
}

/// Reads `width` bits starting at MSB-first bit position `bit_pos`.
fn read_bits(words: &[AtomicU64], bit_pos: u64, width: u32) -> u128 {
    let mut value = 0u128;
    let mut pos = bit_pos;
    let mut remaining = width;
    while remaining > 0 {
        let offset = (pos % 64) as u32;
        let take = (64 - offset).min(remaining);
        let word = words[(pos / 64) as usize].load(Ordering::Relaxed);
        let chunk = (word << offset) >> (64 - take);
        value = (value << take) | chunk as u128;
        pos += take as u64;
        remaining -= take;
    }
    value
}

/// Writes the low `width` bits of `value` at MSB-first bit position `bit_pos`.
/// The caller holds the locks covering the span.
fn write_bits(words: &[AtomicU64], bit_pos: u64, width: u32, value: u128) {
    let mut pos = bit_pos;
    let mut remaining = width;
    while remaining > 0 {
        let offset = (pos % 64) as u32;
        let take = (64 - offset).min(remaining);
        let shift = 64 - offset - take;
        let mask = build_low_bit_mask::<u64>(take);
        let chunk = (value >> (remaining - take)) as u64 & mask;

        let word = &words[(pos / 64) as usize];
        let old = word.load(Ordering::Relaxed);
        word.store((old & !(mask << shift)) | (chunk << shift), Ordering::Relaxed);

        pos += take as u64;
        remaining -= take;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;

    use super::{read_bits, write_bits};

    #[test]
    fn test_bits_msb_first_across_words() {
        let words: Vec<AtomicU64> = (0..3).map(|_| AtomicU64::new(0)).collect();
        write_bits(&words, 60, 8, 0xa5);
        assert_eq!(words[0].load(std::sync::atomic::Ordering::Relaxed), 0xa);
        assert_eq!(
            words[1].load(std::sync::atomic::Ordering::Relaxed),
            0x5000_0000_0000_0000
        );
        assert_eq!(read_bits(&words, 60, 8), 0xa5);

        write_bits(&words, 1, 128, u128::MAX - 1);
        assert_eq!(read_bits(&words, 1, 128), u128::MAX - 1);
        assert_eq!(read_bits(&words, 0, 1), 0);
        assert_eq!(read_bits(&words, 129, 63), 0);
    }
}
