//! Integer block codec: zig-zag delta encoding packed with Simple-8B.

use strata_base::{Error, Result};

use crate::bits::{checked_delta, zigzag_decode, zigzag_encode};
use crate::simple8b::{self, GroupBuilder};
use crate::types::ElementType;

pub(crate) fn is_signed(ty: ElementType) -> bool {
    use ElementType::*;
    matches!(ty, Tiny | Small | Int | Big)
}

pub(crate) fn read_elem(bytes: &[u8], width: usize, signed: bool) -> i64 {
    match (width, signed) {
        (1, true) => bytes[0] as i8 as i64,
        (1, false) => bytes[0] as i64,
        (2, true) => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
        (2, false) => u16::from_le_bytes([bytes[0], bytes[1]]) as i64,
        (4, true) => i32::from_le_bytes(bytes[0..4].try_into().unwrap()) as i64,
        (4, false) => u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as i64,
        (8, true) => i64::from_le_bytes(bytes[0..8].try_into().unwrap()),
        (8, false) => u64::from_le_bytes(bytes[0..8].try_into().unwrap()) as i64,
        _ => unreachable!("unsupported integer width"),
    }
}

pub(crate) fn write_elem(out: &mut Vec<u8>, width: usize, signed: bool, v: i64) {
    match (width, signed) {
        (1, true) => out.push(v as i8 as u8),
        (1, false) => out.push(v as u8),
        (2, _) => out.extend_from_slice(&(v as i16).to_le_bytes()),
        (4, _) => out.extend_from_slice(&(v as i32).to_le_bytes()),
        (8, _) => out.extend_from_slice(&v.to_le_bytes()),
        _ => unreachable!("unsupported integer width"),
    }
}

pub fn encode(input: &[u8], n: usize, ty: ElementType) -> Result<Vec<u8>> {
    let width = ty
        .fixed_width()
        .filter(|_| ty.is_integer())
        .ok_or_else(|| Error::invalid_argument("not an integer element type"))?;
    if input.len() != n * width {
        return Err(Error::invalid_argument("input length does not match n * width"));
    }
    let signed = is_signed(ty);

    let mut prev = 0i64;
    let mut builder = GroupBuilder::new();
    let mut words = Vec::new();
    let mut overflowed = false;
    for i in 0..n {
        let v = read_elem(&input[i * width..], width, signed);
        let delta = match checked_delta(v, prev) {
            Some(d) => d,
            None => {
                overflowed = true;
                break;
            }
        };
        let z = zigzag_encode(delta);
        if z >= simple8b::MAX_VALUE {
            overflowed = true;
            break;
        }
        if let Some(w) = builder.push(z) {
            words.push(w);
        }
        prev = v;
    }
    if !overflowed {
        if let Some(w) = builder.seal() {
            words.push(w);
        }
    }

    let compressed_len = 1 + words.len() * 8;
    if overflowed || compressed_len > n * width + 1 {
        if overflowed {
            tracing::debug!(target: "strata", ?ty, "integer encode overflowed, falling back to verbatim");
        }
        let mut out = Vec::with_capacity(n * width + 1);
        out.push(1);
        out.extend_from_slice(input);
        return Ok(out);
    }

    let mut out = Vec::with_capacity(compressed_len);
    out.push(0);
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    Ok(out)
}

pub fn decode(input: &[u8], n: usize, ty: ElementType) -> Result<Vec<u8>> {
    let width = ty
        .fixed_width()
        .filter(|_| ty.is_integer())
        .ok_or_else(|| Error::invalid_argument("not an integer element type"))?;
    let signed = is_signed(ty);

    if input.is_empty() {
        return Err(Error::corrupt_encoding("empty integer buffer"));
    }
    let mode = input[0];
    if mode == 1 {
        let need = n * width;
        if input.len() < 1 + need {
            return Err(Error::corrupt_encoding("verbatim integer buffer too short"));
        }
        return Ok(input[1..1 + need].to_vec());
    }

    let mut out = Vec::with_capacity(n * width);
    let mut prev = 0i64;
    let mut produced = 0usize;
    let mut pos = 1usize;
    while produced < n {
        if pos + 8 > input.len() {
            return Err(Error::corrupt_encoding("truncated Simple-8B word"));
        }
        let word = u64::from_le_bytes(input[pos..pos + 8].try_into().unwrap());
        pos += 8;
        let want = n - produced;
        let (_elems, zs) = simple8b::unpack_word(word, want);
        for z in zs {
            let delta = zigzag_decode(z);
            let v = prev.wrapping_add(delta);
            prev = v;
            write_elem(&mut out, width, signed, v);
            produced += 1;
        }
    }
    Ok(out)
}
