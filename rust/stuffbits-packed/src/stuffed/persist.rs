//! Raw dump and load of the block chain.
//!
//! Layout, all words in native byte order:
//!
//! ```text
//! u64 block_count
//! block_count x { u64 used_bits; ceil(used_bits / 64) x u64 word }
//! ```
//!
//! There is no header or version; a dump is only readable on a host with the
//! writer's byte order.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{ByteOrder, NativeEndian, ReadBytesExt};
use stuffbits_collections::BlockArena;
use stuffbits_common::{Error, Result};
use stuffbits_io::{FileWriter, SealingWrite};

use super::{BitCursor, Block, StuffedBits, StuffedBitsOptions};

const READ_BUFFER_SIZE: usize = 256 * 1024;
const MAX_PREALLOCATED_WORDS: usize = 1 << 20;

impl StuffedBits {
    /// Loads a dump produced by [`dump_to_buffer`](Self::dump_to_buffer),
    /// using `options` for blocks appended after the loaded ones.
    pub fn from_reader<R: Read + ?Sized>(
        reader: &mut R,
        options: StuffedBitsOptions,
    ) -> Result<StuffedBits> {
        let mut bits = StuffedBits::with_options(options)?;
        bits.load_from_buffer(reader)?;
        Ok(bits)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<StuffedBits> {
        let mut reader = bytes;
        Self::from_reader(&mut reader, StuffedBitsOptions::default())
    }

    pub fn from_file(path: impl AsRef<Path>, options: StuffedBitsOptions) -> Result<StuffedBits> {
        let mut bits = StuffedBits::with_options(options)?;
        bits.load_from_file(path)?;
        Ok(bits)
    }

    /// Serializes the block list into `writer`. The writer is not sealed.
    pub fn dump_to_buffer(&self, writer: &mut dyn SealingWrite) -> Result<()> {
        let bytes = self.to_bytes();
        writer
            .write_all(&bytes)
            .map_err(|e| Error::io("dumping stuffed bits", e))?;
        log::debug!(
            "stuffed bits: dumped {} block(s), {} bits, {} bytes",
            self.blocks.len(),
            self.get_length(),
            bytes.len()
        );
        Ok(())
    }

    /// Writes the dump to a new file at `path`, failing if it exists.
    pub fn dump_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let context = format!("dumping stuffed bits to {}", path.display());
        let mut writer = FileWriter::create(path).map_err(|e| Error::io(&context, e))?;
        self.dump_to_buffer(&mut writer)?;
        writer.seal().map_err(|e| Error::io(&context, e))
    }

    /// Returns the dump as a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_blocks(&self.blocks)
    }

    /// Replaces the content with a dump read from `reader` and moves the head
    /// to the start.
    ///
    /// Blocks keep their dumped used lengths. Sealed blocks are sized to
    /// their used words; the last block gets the larger of the configured
    /// block size and its used length rounded up to a word, so appends
    /// continue in it.
    pub fn load_from_buffer<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<()> {
        let blocks = read_blocks(reader, self.block_bits)?;
        log::debug!(
            "stuffed bits: loaded {} block(s), {} bits",
            blocks.len(),
            blocks.last().map_or(0, |b| b.bgn + b.len)
        );
        self.blocks = blocks;
        self.block = 0;
        self.cursor = BitCursor::START;
        Ok(())
    }

    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| Error::io(format!("opening {}", path.display()), e))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
        self.load_from_buffer(&mut reader)
    }
}

fn encode_blocks(blocks: &BlockArena<Block>) -> Vec<u8> {
    let total_words: usize = 1 + blocks
        .iter()
        .map(|b| 1 + b.len.div_ceil(64) as usize)
        .sum::<usize>();
    let mut out = vec![0u8; total_words * 8];
    NativeEndian::write_u64(&mut out[..8], blocks.len() as u64);
    let mut pos = 8;
    for block in blocks {
        let used = &block.words[..block.len.div_ceil(64) as usize];
        NativeEndian::write_u64(&mut out[pos..pos + 8], block.len);
        pos += 8;
        NativeEndian::write_u64_into(used, &mut out[pos..pos + used.len() * 8]);
        pos += used.len() * 8;
    }
    debug_assert_eq!(pos, out.len());
    out
}

fn read_blocks<R: Read + ?Sized>(r: &mut R, block_bits: u64) -> Result<BlockArena<Block>> {
    let count = r.read_u64::<NativeEndian>().map_err(|e| load_error(e, "block count"))?;
    let mut blocks = BlockArena::new();
    let mut bgn = 0u64;
    for i in 0..count {
        let len = r
            .read_u64::<NativeEndian>()
            .map_err(|e| load_error(e, &format!("length of block {i}")))?;
        let used_words = len.div_ceil(64);
        let capacity_words = if i + 1 == count {
            (block_bits / 64).max(used_words) as usize
        } else {
            used_words as usize
        };

        // Grow as words arrive so a corrupt length fails on EOF, not on allocation.
        let mut words = Vec::with_capacity(capacity_words.min(MAX_PREALLOCATED_WORDS));
        for _ in 0..used_words {
            let word = r
                .read_u64::<NativeEndian>()
                .map_err(|e| load_error(e, &format!("words of block {i}")))?;
            words.push(word);
        }
        words.resize(capacity_words, 0);
        let block = Block {
            bgn,
            len,
            words: words.into_boxed_slice(),
        };
        bgn = bgn.checked_add(len).ok_or_else(|| {
            Error::malformed_stream("stuffed bits dump", "total length overflows 64 bits")
        })?;
        blocks.push_with(|_| block);
    }
    if blocks.is_empty() {
        blocks.push_with(|_| Block::new(0, block_bits));
    }
    Ok(blocks)
}

fn load_error(e: std::io::Error, what: &str) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::malformed_stream("stuffed bits dump", format!("truncated while reading {what}"))
    } else {
        Error::io(format!("loading stuffed bits: {what}"), e)
    }
}
