//! Binary/string block codec: one LZ4 pass with a verbatim fallback.

use strata_base::Result;

use crate::lz4;

pub fn encode(input: &[u8]) -> Result<Vec<u8>> {
    let compressed = lz4::compress_block(input);
    if compressed.len() > input.len() {
        let mut out = Vec::with_capacity(input.len() + 1);
        out.push(0);
        out.extend_from_slice(input);
        Ok(out)
    } else {
        let mut out = Vec::with_capacity(compressed.len() + 1);
        out.push(1);
        out.extend_from_slice(&compressed);
        Ok(out)
    }
}

pub fn decode(input: &[u8], original_len: usize) -> Result<Vec<u8>> {
    if input.is_empty() {
        return if original_len == 0 {
            Ok(Vec::new())
        } else {
            Err(strata_base::Error::corrupt_encoding("empty binary buffer"))
        };
    }
    let mode = input[0];
    if mode == 0 {
        Ok(input[1..].to_vec())
    } else {
        lz4::decompress_block(&input[1..], original_len)
    }
}
