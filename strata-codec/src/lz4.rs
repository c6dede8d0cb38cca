//! Thin wrapper around `lz4_flex`'s raw block API, shared by the
//! string/binary codec and the streaming compressor's two-stage finalize
//! pass. We carry the decompressed length ourselves (callers always know
//! it) rather than using `lz4_flex`'s length-prefixed helpers.

use lz4_flex::block::{compress, decompress, DecompressError};
use strata_base::{Error, Result};

pub fn compress_block(input: &[u8]) -> Vec<u8> {
    compress(input)
}

pub fn decompress_block(input: &[u8], decompressed_len: usize) -> Result<Vec<u8>> {
    decompress(input, decompressed_len)
        .map_err(|e: DecompressError| Error::corrupt_encoding(format!("lz4 decompress failed: {e}")))
}
