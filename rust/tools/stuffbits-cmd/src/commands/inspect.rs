//! Inspect command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use stuffbits_packed::{BitPosition, StuffedBits, StuffedBitsOptions};

#[derive(Serialize)]
pub struct StreamSummary {
    path: String,
    block_count: usize,
    total_bits: u64,
    blocks: Vec<BlockSummary>,
}

#[derive(Serialize)]
struct BlockSummary {
    index: usize,
    begin: u64,
    used: u64,
    capacity: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_word: Option<String>,
}

/// Run the inspect command
pub fn run(verbose: u8, path: String) -> Result<()> {
    let summary = summarize(&path, verbose)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub fn summarize(path: &str, verbose: u8) -> Result<StreamSummary> {
    let mut bits = StuffedBits::from_file(path, StuffedBitsOptions::default())
        .with_context(|| format!("Failed to load {path}"))?;

    let mut blocks = Vec::with_capacity(bits.num_blocks());
    for index in 0..bits.num_blocks() {
        let Some(info) = bits.block_info(index) else {
            break;
        };
        let first_word = if verbose > 0 && info.used > 0 {
            bits.set_block_position(BitPosition::new(index, 0))
                .with_context(|| format!("Failed to seek to block {index}"))?;
            bits.display_word(0)
        } else {
            None
        };
        blocks.push(BlockSummary {
            index,
            begin: info.begin,
            used: info.used,
            capacity: info.capacity,
            first_word,
        });
    }

    Ok(StreamSummary {
        path: path.to_string(),
        block_count: bits.num_blocks(),
        total_bits: bits.get_length(),
        blocks,
    })
}
