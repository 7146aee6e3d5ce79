//! Command implementations for stuffbits-cmd

use clap::ValueEnum;
use stuffbits_packed::StuffedBits;

pub mod decode;
pub mod encode;
pub mod inspect;

/// Universal code selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodeKind {
    Binary,
    Unary,
    Gamma,
    Delta,
    Zeckendorf,
}

impl CodeKind {
    /// Writes `values` at the head. Returns the number of bits written.
    pub fn write(
        self,
        bits: &mut StuffedBits,
        width: u32,
        values: &[u64],
    ) -> stuffbits_common::Result<u64> {
        match self {
            CodeKind::Binary => bits.set_binary_batch(width, values),
            CodeKind::Unary => bits.set_unary_batch(values),
            CodeKind::Gamma => bits.set_gamma_batch(values),
            CodeKind::Delta => bits.set_delta_batch(values),
            CodeKind::Zeckendorf => bits.set_zeckendorf_batch(values),
        }
    }

    /// Reads one value at the head.
    pub fn read(self, bits: &mut StuffedBits, width: u32) -> stuffbits_common::Result<u64> {
        match self {
            CodeKind::Binary => bits.get_binary(width),
            CodeKind::Unary => bits.get_unary(),
            CodeKind::Gamma => bits.get_gamma(),
            CodeKind::Delta => bits.get_delta(),
            CodeKind::Zeckendorf => bits.get_zeckendorf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CodeKind, decode, encode};

    #[test]
    fn test_encode_decode_file() {
        let dir = tempfile::tempdir().unwrap();
        let values = vec![0, 1, 5, 1000, 123_456_789];
        for (i, code) in [
            CodeKind::Binary,
            CodeKind::Unary,
            CodeKind::Gamma,
            CodeKind::Delta,
            CodeKind::Zeckendorf,
        ]
        .into_iter()
        .enumerate()
        {
            let values: Vec<u64> = if code == CodeKind::Unary {
                values.iter().map(|v| v % 100).collect()
            } else {
                values.clone()
            };
            let path = dir.path().join(format!("stream{i}.bits"));
            let path = path.to_str().unwrap().to_string();
            encode::run(code, 32, Some(256), path.clone(), values.clone()).unwrap();

            assert_eq!(decode::decode_values(code, 32, None, &path).unwrap(), values);
            assert_eq!(
                decode::decode_values(code, 32, Some(2), &path).unwrap(),
                values[..2]
            );
            assert!(decode::decode_values(code, 32, Some(values.len() + 1), &path).is_err());
        }
    }

    #[test]
    fn test_inspect_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.bits");
        let path = path.to_str().unwrap().to_string();
        let values: Vec<u64> = (0..200).collect();
        encode::run(CodeKind::Gamma, 0, Some(128), path.clone(), values).unwrap();

        let summary = super::inspect::summarize(&path, 1).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        let blocks = json["blocks"].as_array().unwrap();
        assert_eq!(json["block_count"].as_u64().unwrap() as usize, blocks.len());
        assert!(blocks.len() > 1);
        assert_eq!(blocks[0]["begin"], 0);
        assert!(blocks[0]["first_word"].is_string());
    }
}
