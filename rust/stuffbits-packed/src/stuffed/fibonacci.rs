//! Fibonacci numbers backing the Zeckendorf code.

pub const FIBONACCI_TABLE_LEN: usize = 93;

/// `FIBONACCI[0] = FIBONACCI[1] = 1`, each later entry the sum of the two
/// before it. The last entry is the largest Fibonacci number that fits in a
/// `u64`.
pub const FIBONACCI: [u64; FIBONACCI_TABLE_LEN] = build_table();

const fn build_table() -> [u64; FIBONACCI_TABLE_LEN] {
    let mut table = [0u64; FIBONACCI_TABLE_LEN];
    table[0] = 1;
    table[1] = 1;
    let mut i = 2;
    while i < FIBONACCI_TABLE_LEN {
        table[i] = table[i - 1] + table[i - 2];
        i += 1;
    }
    table
}

/// Index of the largest table entry not above `x`, searching from index 1.
///
/// `x` must be at least 1.
pub(crate) fn largest_index_at_most(x: u64) -> usize {
    debug_assert!(x >= 1);
    FIBONACCI[1..].partition_point(|&f| f <= x)
}
