//! Encode command implementation

use anyhow::{Context, Result};
use stuffbits_packed::{StuffedBits, StuffedBitsOptions};

use super::CodeKind;

/// Run the encode command
pub fn run(
    code: CodeKind,
    width: u32,
    block_bits: Option<u64>,
    output: String,
    values: Vec<u64>,
) -> Result<()> {
    let mut options = StuffedBitsOptions::default();
    if let Some(block_bits) = block_bits {
        options = options.with_block_bits(block_bits);
    }
    let mut bits = StuffedBits::with_options(options).context("Invalid stream options")?;

    let written = code
        .write(&mut bits, width, &values)
        .with_context(|| format!("Failed to encode values with the {code:?} code"))?;
    bits.dump_to_file(&output)
        .with_context(|| format!("Failed to write {output}"))?;

    log::info!(
        "encoded {} value(s) into {written} bits across {} block(s)",
        values.len(),
        bits.num_blocks()
    );
    println!(
        "Wrote {} value(s), {written} bits, to {output}",
        values.len()
    );
    Ok(())
}
