//! Universal codes over the stuffed bit stream.
//!
//! Every code writes most significant bit first. A value is written only
//! after its full length is known and reserved, so a coded value always lies
//! inside a single block.

use stuffbits_common::{Error, Result};

use super::StuffedBits;
use super::fibonacci::{FIBONACCI, FIBONACCI_TABLE_LEN, largest_index_at_most};

/// Largest value the gamma, delta and Zeckendorf codes accept.
pub const MAX_CODED_VALUE: u64 = u64::MAX - 1;

/// Width in bits of the unary code for `value`.
#[inline]
pub fn unary_len(value: u64) -> Option<u64> {
    value.checked_add(1)
}

/// Width in bits of the Elias gamma code for `value`.
#[inline]
pub fn gamma_len(value: u64) -> Option<u64> {
    let n = floor_log2_succ(value)? as u64;
    Some(2 * n + 1)
}

/// Width in bits of the Elias delta code for `value`.
#[inline]
pub fn delta_len(value: u64) -> Option<u64> {
    let n = floor_log2_succ(value)?;
    Some(gamma_len(n as u64)? + n as u64)
}

/// Width in bits of the Zeckendorf code for `value`.
#[inline]
pub fn zeckendorf_len(value: u64) -> Option<u64> {
    let x = value.checked_add(1)?;
    Some(largest_index_at_most(x) as u64 + 1)
}

/// `floor(log2(value + 1))`, or `None` when `value + 1` overflows.
#[inline]
fn floor_log2_succ(value: u64) -> Option<u32> {
    value.checked_add(1).map(|x| 63 - x.leading_zeros())
}

fn value_too_large(operation: &str, value: u64) -> Error {
    Error::precondition(
        operation,
        format!("value {value} exceeds the largest codable value {MAX_CODED_VALUE}"),
    )
}

impl StuffedBits {
    /// Writes the low `width` bits of `value`. `width` may be 0, which writes
    /// nothing.
    pub fn set_binary(&mut self, width: u32, value: u64) -> Result<u64> {
        verify_width(width)?;
        self.begin_write(width as u64, "set_binary")?;
        self.put_bits(width, value);
        Ok(width as u64)
    }

    /// Reads a `width`-bit value. Width 0 reads nothing and returns 0.
    pub fn get_binary(&mut self, width: u32) -> Result<u64> {
        verify_width(width)?;
        if width == 0 {
            return Ok(0);
        }
        self.begin_read("get_binary");
        self.take_bits(width, "get_binary")
    }

    /// Writes `value` one bits followed by a zero bit.
    pub fn set_unary(&mut self, value: u64) -> Result<u64> {
        let len = unary_len(value).ok_or_else(|| value_too_large("set_unary", value))?;
        self.begin_write(len, "set_unary")?;
        self.put_unary(value);
        Ok(len)
    }

    pub fn get_unary(&mut self) -> Result<u64> {
        self.begin_read("get_unary");
        self.take_unary("get_unary")
    }

    /// Writes the Elias gamma code of `value`: with `n = floor(log2(value+1))`,
    /// `n` in unary, then the low `n` bits of `value + 1`.
    pub fn set_gamma(&mut self, value: u64) -> Result<u64> {
        let n = floor_log2_succ(value).ok_or_else(|| value_too_large("set_gamma", value))?;
        let len = 2 * n as u64 + 1;
        self.begin_write(len, "set_gamma")?;
        self.put_unary(n as u64);
        self.put_bits(n, value + 1);
        Ok(len)
    }

    pub fn get_gamma(&mut self) -> Result<u64> {
        self.begin_read("get_gamma");
        self.take_gamma("get_gamma")
    }

    /// Writes the Elias delta code of `value`: the gamma code of
    /// `n = floor(log2(value+1))`, then the low `n` bits of `value + 1`.
    pub fn set_delta(&mut self, value: u64) -> Result<u64> {
        let n = floor_log2_succ(value).ok_or_else(|| value_too_large("set_delta", value))?;
        let m = 63 - (n as u64 + 1).leading_zeros();
        let len = 2 * m as u64 + 1 + n as u64;
        self.begin_write(len, "set_delta")?;
        self.put_unary(m as u64);
        self.put_bits(m, n as u64 + 1);
        self.put_bits(n, value + 1);
        Ok(len)
    }

    pub fn get_delta(&mut self) -> Result<u64> {
        self.begin_read("get_delta");
        let n = self.take_gamma("get_delta")?;
        if n >= 64 {
            return Err(Error::malformed_stream(
                "delta code",
                format!("length prefix {n} exceeds 63"),
            ));
        }
        let bits = self.take_bits(n as u32, "get_delta")?;
        Ok(((1u64 << n) | bits) - 1)
    }

    /// Writes the Zeckendorf code of `value`: one bit per Fibonacci number
    /// in the representation of `value + 1`, smallest first, then a closing
    /// one bit. The codeword ends at its only pair of adjacent one bits.
    pub fn set_zeckendorf(&mut self, value: u64) -> Result<u64> {
        let mut rest = value
            .checked_add(1)
            .ok_or_else(|| value_too_large("set_zeckendorf", value))?;
        let top = largest_index_at_most(rest);
        let len = top as u64 + 1;
        self.begin_write(len, "set_zeckendorf")?;

        // Greedy selection from the top; bit i - 1 of `selected` stands for
        // FIBONACCI[i].
        let mut selected = [false; FIBONACCI_TABLE_LEN];
        for i in (1..=top).rev() {
            if FIBONACCI[i] <= rest {
                rest -= FIBONACCI[i];
                selected[i - 1] = true;
            }
        }
        debug_assert_eq!(rest, 0);

        for chunk in selected[..top].chunks(64) {
            let bits = chunk.iter().fold(0u64, |acc, &b| (acc << 1) | b as u64);
            self.put_bits(chunk.len() as u32, bits);
        }
        self.put_bits(1, 1);
        Ok(len)
    }

    pub fn get_zeckendorf(&mut self) -> Result<u64> {
        self.begin_read("get_zeckendorf");
        let mut sum = 0u64;
        let mut prev = false;
        let mut index = 1;
        loop {
            let bit = self.take_bits(1, "get_zeckendorf")? != 0;
            if bit && prev {
                return Ok(sum - 1);
            }
            if bit {
                if index >= FIBONACCI_TABLE_LEN {
                    return Err(Error::malformed_stream(
                        "zeckendorf code",
                        "codeword is longer than the Fibonacci table",
                    ));
                }
                sum = sum.checked_add(FIBONACCI[index]).ok_or_else(|| {
                    Error::malformed_stream("zeckendorf code", "value overflows 64 bits")
                })?;
            }
            prev = bit;
            index += 1;
            if index > FIBONACCI_TABLE_LEN {
                return Err(Error::malformed_stream(
                    "zeckendorf code",
                    "codeword is longer than the Fibonacci table",
                ));
            }
        }
    }

    /// Reads `count` values of `width` bits each.
    pub fn get_binary_batch(&mut self, width: u32, count: usize) -> Result<Vec<u64>> {
        (0..count).map(|_| self.get_binary(width)).collect()
    }

    /// Writes every value with `width` bits. Returns the bits written.
    pub fn set_binary_batch(&mut self, width: u32, values: &[u64]) -> Result<u64> {
        values.iter().map(|&v| self.set_binary(width, v)).sum()
    }

    pub fn get_unary_batch(&mut self, count: usize) -> Result<Vec<u64>> {
        (0..count).map(|_| self.get_unary()).collect()
    }

    pub fn set_unary_batch(&mut self, values: &[u64]) -> Result<u64> {
        values.iter().map(|&v| self.set_unary(v)).sum()
    }

    pub fn get_gamma_batch(&mut self, count: usize) -> Result<Vec<u64>> {
        (0..count).map(|_| self.get_gamma()).collect()
    }

    pub fn set_gamma_batch(&mut self, values: &[u64]) -> Result<u64> {
        values.iter().map(|&v| self.set_gamma(v)).sum()
    }

    pub fn get_delta_batch(&mut self, count: usize) -> Result<Vec<u64>> {
        (0..count).map(|_| self.get_delta()).collect()
    }

    pub fn set_delta_batch(&mut self, values: &[u64]) -> Result<u64> {
        values.iter().map(|&v| self.set_delta(v)).sum()
    }

    pub fn get_zeckendorf_batch(&mut self, count: usize) -> Result<Vec<u64>> {
        (0..count).map(|_| self.get_zeckendorf()).collect()
    }

    pub fn set_zeckendorf_batch(&mut self, values: &[u64]) -> Result<u64> {
        values.iter().map(|&v| self.set_zeckendorf(v)).sum()
    }

    fn take_gamma(&mut self, operation: &str) -> Result<u64> {
        let n = self.take_unary(operation)?;
        if n >= 64 {
            return Err(Error::malformed_stream(
                "gamma code",
                format!("unary prefix {n} exceeds 63"),
            ));
        }
        let bits = self.take_bits(n as u32, operation)?;
        Ok(((1u64 << n) | bits) - 1)
    }
}

fn verify_width(width: u32) -> Result<()> {
    if width > 64 {
        return Err(Error::invalid_arg(
            "width",
            format!("binary width {width} is outside 0..=64"),
        ));
    }
    Ok(())
}
