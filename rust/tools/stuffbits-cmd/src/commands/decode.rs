//! Decode command implementation

use anyhow::{Context, Result};
use stuffbits_packed::{StuffedBits, StuffedBitsOptions};

use super::CodeKind;

/// Run the decode command
pub fn run(code: CodeKind, width: u32, count: Option<usize>, path: String) -> Result<()> {
    for value in decode_values(code, width, count, &path)? {
        println!("{value}");
    }
    Ok(())
}

/// Decodes `count` values, or every value up to the end of the stream.
pub fn decode_values(
    code: CodeKind,
    width: u32,
    count: Option<usize>,
    path: &str,
) -> Result<Vec<u64>> {
    let mut bits = StuffedBits::from_file(path, StuffedBitsOptions::default())
        .with_context(|| format!("Failed to load {path}"))?;

    let mut values = Vec::new();
    loop {
        match count {
            Some(count) if values.len() == count => break,
            None if bits.get_position() == bits.get_length() => break,
            _ => {}
        }
        let value = code
            .read(&mut bits, width)
            .with_context(|| format!("Failed to decode value {}", values.len()))?;
        values.push(value);
    }
    Ok(values)
}
