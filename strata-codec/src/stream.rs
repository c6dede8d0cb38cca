//! Streaming compressor: feeds a column one element at a time and
//! materializes the same bytes the block codecs would have produced, plus
//! an optional second LZ4 pass over the whole thing at `finalize`.
//!
//! Per-type feeders mirror the block codecs one value at a time rather than
//! over a whole slice, so the two must stay bit-for-bit identical (the
//! streaming-equivalence property). Integer and timestamp feeders can hit
//! the same numeric overflow the block codecs guard against; both recover
//! by decoding what they've already written back to raw bytes (using that
//! type's own block decoder, since the partial stream is a valid encoded
//! prefix) and switching to copy mode for the remainder of the column. The
//! source only implements this back-conversion for timestamps; we
//! generalize it to integers too rather than leaving them half-compressed
//! (see DESIGN.md).

use strata_base::{Error, Result};

use crate::bits::{checked_delta, zigzag_encode};
use crate::boolean;
use crate::float;
use crate::integer;
use crate::lz4;
use crate::simple8b::{self, GroupBuilder};
use crate::timestamp;
use crate::types::ElementType;

/// Whether `finalize` applies a second LZ4 pass over the accumulated buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    OneStage,
    TwoStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Active,
    Finalized,
}

struct TimestampState {
    prev: i64,
    prev_delta: i64,
    flag_pos: usize,
    copy_mode: bool,
}

struct IntegerState {
    ty: ElementType,
    width: usize,
    signed: bool,
    prev: i64,
    builder: GroupBuilder,
    copy_mode: bool,
}

struct FloatState {
    width_bits: u32,
    prev_bits: u64,
    flag_pos: usize,
}

enum Feeder {
    Timestamp(TimestampState),
    Integer(IntegerState),
    Float(FloatState),
    Binary,
    Bool,
    None,
}

/// Single-owner stateful compressor: `reset` a column's type, `feed` each
/// element, `finalize` to get the encoded bytes. Not safe for concurrent use
/// on one instance, but an instance can be reused serially across columns
/// (and, serially, across threads).
pub struct StreamCompressor {
    phase: Phase,
    ty: ElementType,
    alg: Algorithm,
    auto_alloc: bool,
    n_val: usize,
    buf0: Vec<u8>,
    buf1: Vec<u8>,
    feeder: Feeder,
}

impl StreamCompressor {
    pub fn new() -> Self {
        StreamCompressor {
            phase: Phase::Fresh,
            ty: ElementType::Binary,
            alg: Algorithm::OneStage,
            auto_alloc: true,
            n_val: 0,
            buf0: Vec::with_capacity(1024),
            buf1: Vec::new(),
            feeder: Feeder::None,
        }
    }

    /// Begins a new column. Legal from any phase.
    pub fn reset(&mut self, ty: ElementType, alg: Algorithm, auto_alloc: bool) -> Result<()> {
        self.ty = ty;
        self.alg = alg;
        self.auto_alloc = auto_alloc;
        self.n_val = 0;
        self.buf0.clear();
        self.buf1.clear();

        self.feeder = match ty {
            ElementType::Timestamp => {
                self.buf0.push(1); // 1 = currently compressing, matches the block codec's inverted mode byte.
                Feeder::Timestamp(TimestampState {
                    prev: 0,
                    prev_delta: 0,
                    flag_pos: 0,
                    copy_mode: false,
                })
            }
            ElementType::Bool => Feeder::Bool,
            ElementType::Binary => Feeder::Binary,
            ElementType::Float => {
                self.buf0.push(0);
                Feeder::Float(FloatState {
                    width_bits: 32,
                    prev_bits: 0,
                    flag_pos: 0,
                })
            }
            ElementType::Double => {
                self.buf0.push(0);
                Feeder::Float(FloatState {
                    width_bits: 64,
                    prev_bits: 0,
                    flag_pos: 0,
                })
            }
            _ if ty.is_integer() => {
                self.buf0.push(0);
                let width = ty.fixed_width().expect("integer types are fixed-width");
                Feeder::Integer(IntegerState {
                    ty,
                    width,
                    signed: integer::is_signed(ty),
                    prev: 0,
                    builder: GroupBuilder::new(),
                    copy_mode: false,
                })
            }
            _ => return Err(Error::invalid_argument("unsupported element type")),
        };

        self.phase = Phase::Active;
        Ok(())
    }

    /// Feeds one element. `bytes` must be exactly the element's fixed width
    /// (or, for binary, any length — the column's total is the sum of feeds).
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        if self.phase != Phase::Active {
            return Err(Error::invalid_argument("feed outside Active phase"));
        }

        match &mut self.feeder {
            Feeder::Timestamp(_) => self.feed_timestamp(bytes)?,
            Feeder::Integer(_) => self.feed_integer(bytes)?,
            Feeder::Float(_) => self.feed_float(bytes)?,
            Feeder::Binary => {
                self.buf0.extend_from_slice(bytes);
                self.n_val += 1;
            }
            Feeder::Bool => self.feed_bool(bytes)?,
            Feeder::None => return Err(Error::invalid_argument("feed before reset")),
        }
        Ok(())
    }

    fn feed_timestamp(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != 8 {
            return Err(Error::invalid_argument("timestamp element must be 8 bytes"));
        }
        let ts = i64::from_le_bytes(bytes.try_into().unwrap());

        let copy_mode = match &self.feeder {
            Feeder::Timestamp(st) => st.copy_mode,
            _ => unreachable!(),
        };

        if !copy_mode {
            let stepped = {
                let st = match &mut self.feeder {
                    Feeder::Timestamp(st) => st,
                    _ => unreachable!(),
                };
                timestamp::step(&mut st.prev, &mut st.prev_delta, ts)
            };
            match stepped {
                Some((k, z)) => {
                    let even = self.n_val % 2 == 0;
                    let st = match &mut self.feeder {
                        Feeder::Timestamp(st) => st,
                        _ => unreachable!(),
                    };
                    if even {
                        st.flag_pos = self.buf0.len();
                        self.buf0.push(k as u8);
                    } else {
                        self.buf0[st.flag_pos] |= (k as u8) << 4;
                    }
                    self.buf0.extend_from_slice(&z.to_le_bytes()[..k as usize]);
                    self.n_val += 1;
                    return Ok(());
                }
                None => {
                    tracing::debug!(target: "strata", "streaming timestamp overflowed, switching to copy mode");
                    let raw = timestamp::decode(&self.buf0, self.n_val)?;
                    self.buf0.clear();
                    self.buf0.push(0);
                    self.buf0.extend_from_slice(&raw);
                    if let Feeder::Timestamp(st) = &mut self.feeder {
                        st.copy_mode = true;
                    }
                }
            }
        }

        self.buf0.extend_from_slice(&ts.to_le_bytes());
        self.n_val += 1;
        Ok(())
    }

    fn feed_integer(&mut self, bytes: &[u8]) -> Result<()> {
        let (ty, width, signed, copy_mode) = match &self.feeder {
            Feeder::Integer(st) => (st.ty, st.width, st.signed, st.copy_mode),
            _ => unreachable!(),
        };
        if bytes.len() != width {
            return Err(Error::invalid_argument("integer element width mismatch"));
        }
        let v = integer::read_elem(bytes, width, signed);

        if !copy_mode {
            let prev = match &self.feeder {
                Feeder::Integer(st) => st.prev,
                _ => unreachable!(),
            };
            let fits = checked_delta(v, prev).and_then(|delta| {
                let z = zigzag_encode(delta);
                if z < simple8b::MAX_VALUE { Some(z) } else { None }
            });
            match fits {
                Some(z) => {
                    let st = match &mut self.feeder {
                        Feeder::Integer(st) => st,
                        _ => unreachable!(),
                    };
                    if let Some(w) = st.builder.push(z) {
                        self.buf0.extend_from_slice(&w.to_le_bytes());
                    }
                    st.prev = v;
                    self.n_val += 1;
                    return Ok(());
                }
                None => {
                    tracing::debug!(target: "strata", "streaming integer overflowed, switching to copy mode");
                    if let Feeder::Integer(st) = &mut self.feeder {
                        if let Some(w) = st.builder.seal() {
                            self.buf0.extend_from_slice(&w.to_le_bytes());
                        }
                    }
                    let raw = integer::decode(&self.buf0, self.n_val, ty)?;
                    self.buf0.clear();
                    self.buf0.push(1);
                    self.buf0.extend_from_slice(&raw);
                    if let Feeder::Integer(st) = &mut self.feeder {
                        st.copy_mode = true;
                    }
                }
            }
        }

        integer::write_elem(&mut self.buf0, width, signed, v);
        self.n_val += 1;
        Ok(())
    }

    fn feed_float(&mut self, bytes: &[u8]) -> Result<()> {
        let width_bits = match &self.feeder {
            Feeder::Float(st) => st.width_bits,
            _ => unreachable!(),
        };
        let width = (width_bits / 8) as usize;
        if bytes.len() != width {
            return Err(Error::invalid_argument("float element width mismatch"));
        }
        let mut raw = [0u8; 8];
        raw[..width].copy_from_slice(bytes);
        let bits = u64::from_le_bytes(raw);

        let st = match &mut self.feeder {
            Feeder::Float(st) => st,
            _ => unreachable!(),
        };
        let diff = bits ^ st.prev_bits;
        st.prev_bits = bits;
        let (direction, mut nbytes) = float::classify(diff, width_bits);
        let payload = if direction == 1 {
            let ctz = diff.trailing_zeros();
            diff >> ((ctz / 8) * 8)
        } else {
            diff
        };
        if nbytes > 0 {
            nbytes -= 1;
        }
        let nib = (direction << 3) | nbytes as u8;

        let even = self.n_val % 2 == 0;
        if even {
            let st = match &mut self.feeder {
                Feeder::Float(st) => st,
                _ => unreachable!(),
            };
            st.flag_pos = self.buf0.len();
            self.buf0.push(nib);
        } else {
            let flag_pos = match &self.feeder {
                Feeder::Float(st) => st.flag_pos,
                _ => unreachable!(),
            };
            self.buf0[flag_pos] |= nib << 4;
        }
        self.buf0.extend_from_slice(&payload.to_le_bytes()[..(nbytes as usize + 1)]);
        self.n_val += 1;
        Ok(())
    }

    fn feed_bool(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != 1 || bytes[0] > boolean::NULL {
            return Err(Error::invalid_argument("boolean tag out of range"));
        }
        let mod4 = self.n_val & 3;
        if mod4 == 0 {
            self.buf0.push(0);
        }
        let last = self.buf0.len() - 1;
        self.buf0[last] |= bytes[0] << (mod4 * 2);
        self.n_val += 1;
        Ok(())
    }

    /// Consumes buffered state and returns the final encoded bytes. Empty
    /// when no elements were fed. Further `feed` calls are rejected until
    /// the next `reset`.
    pub fn finalize(&mut self) -> Result<&[u8]> {
        if self.phase != Phase::Active {
            return Err(Error::invalid_argument("finalize outside Active phase"));
        }
        self.phase = Phase::Finalized;

        if self.n_val == 0 {
            self.buf0.clear();
            return Ok(&self.buf0);
        }

        match self.alg {
            Algorithm::OneStage => Ok(&self.buf0),
            Algorithm::TwoStage => {
                let compressed = lz4::compress_block(&self.buf0);
                self.buf1.clear();
                if compressed.len() > self.buf0.len() {
                    self.buf1.push(1);
                    self.buf1.extend_from_slice(&self.buf0);
                } else {
                    self.buf1.push(0);
                    self.buf1.extend_from_slice(&compressed);
                }
                Ok(&self.buf1)
            }
        }
    }
}

impl Default for StreamCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[cfg(test)]
    use test_log::test;

    fn le_i32(v: i32) -> Vec<u8> {
        v.to_le_bytes().to_vec()
    }
    fn le_i64(v: i64) -> Vec<u8> {
        v.to_le_bytes().to_vec()
    }

    #[test]
    fn test_streaming_equivalence_integer() {
        let vals: Vec<i32> = vec![100, 101, 102, 103, 104, 105, 106, 107];
        let mut sc = StreamCompressor::new();
        sc.reset(ElementType::Int, Algorithm::OneStage, true).unwrap();
        for v in &vals {
            sc.feed(&le_i32(*v)).unwrap();
        }
        let streamed = sc.finalize().unwrap().to_vec();

        let input: Vec<u8> = vals.iter().flat_map(|v| v.to_le_bytes()).collect();
        let blocked = integer::encode(&input, vals.len(), ElementType::Int).unwrap();
        assert_eq!(streamed, blocked);
    }

    #[test]
    fn test_streaming_equivalence_timestamp() {
        let vals: Vec<i64> = vec![1000, 2000, 3000, 4000, 5000];
        let mut sc = StreamCompressor::new();
        sc.reset(ElementType::Timestamp, Algorithm::OneStage, true).unwrap();
        for v in &vals {
            sc.feed(&le_i64(*v)).unwrap();
        }
        let streamed = sc.finalize().unwrap().to_vec();

        let input: Vec<u8> = vals.iter().flat_map(|v| v.to_le_bytes()).collect();
        let blocked = timestamp::encode(&input, vals.len()).unwrap();
        assert_eq!(streamed, blocked);
    }

    #[test]
    fn test_streaming_equivalence_float() {
        let vals: Vec<f32> = vec![1.5, 1.5, 1.5, 2.25, -3.0];
        let mut sc = StreamCompressor::new();
        sc.reset(ElementType::Float, Algorithm::OneStage, true).unwrap();
        for v in &vals {
            sc.feed(&v.to_le_bytes()).unwrap();
        }
        let streamed = sc.finalize().unwrap().to_vec();

        let input: Vec<u8> = vals.iter().flat_map(|v| v.to_le_bytes()).collect();
        let blocked = float::encode_f32(&input, vals.len()).unwrap();
        assert_eq!(streamed, blocked);
    }

    #[test]
    fn test_streaming_integer_overflow_switches_to_copy_mode() {
        let mut sc = StreamCompressor::new();
        sc.reset(ElementType::Big, Algorithm::OneStage, true).unwrap();
        sc.feed(&le_i64(i64::MIN)).unwrap();
        sc.feed(&le_i64(i64::MAX)).unwrap();
        let out = sc.finalize().unwrap().to_vec();
        assert_eq!(out[0], 1);
        assert_eq!(&out[1..], &[le_i64(i64::MIN), le_i64(i64::MAX)].concat()[..]);

        let decoded = integer::decode(&out, 2, ElementType::Big).unwrap();
        assert_eq!(decoded, [le_i64(i64::MIN), le_i64(i64::MAX)].concat());
    }

    #[test]
    fn test_streaming_timestamp_overflow_switches_to_copy_mode() {
        let mut sc = StreamCompressor::new();
        sc.reset(ElementType::Timestamp, Algorithm::OneStage, true).unwrap();
        sc.feed(&le_i64(i64::MIN)).unwrap();
        sc.feed(&le_i64(i64::MAX)).unwrap();
        let out = sc.finalize().unwrap().to_vec();
        assert_eq!(out[0], 0);

        let decoded = timestamp::decode(&out, 2).unwrap();
        assert_eq!(decoded, [le_i64(i64::MIN), le_i64(i64::MAX)].concat());
    }

    #[test]
    fn test_streaming_bool() {
        let tags = vec![boolean::TRUE, boolean::FALSE, boolean::TRUE, boolean::TRUE, boolean::FALSE];
        let mut sc = StreamCompressor::new();
        sc.reset(ElementType::Bool, Algorithm::OneStage, true).unwrap();
        for t in &tags {
            sc.feed(&[*t]).unwrap();
        }
        let streamed = sc.finalize().unwrap().to_vec();
        let decoded = boolean::decode_bitpack(&streamed, tags.len()).unwrap();
        assert_eq!(decoded, tags);
    }

    #[test]
    fn test_streaming_binary() {
        let mut sc = StreamCompressor::new();
        sc.reset(ElementType::Binary, Algorithm::OneStage, true).unwrap();
        sc.feed(b"hello ").unwrap();
        sc.feed(b"world").unwrap();
        let streamed = sc.finalize().unwrap().to_vec();
        assert_eq!(streamed, b"hello world");
    }

    #[test]
    fn test_finalize_empty_column() {
        let mut sc = StreamCompressor::new();
        sc.reset(ElementType::Int, Algorithm::OneStage, true).unwrap();
        let out = sc.finalize().unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_two_stage_finalize() {
        let vals: Vec<i32> = (0..50).collect();

        let mut one_stage = StreamCompressor::new();
        one_stage.reset(ElementType::Int, Algorithm::OneStage, true).unwrap();
        for v in &vals {
            one_stage.feed(&le_i32(*v)).unwrap();
        }
        let primary = one_stage.finalize().unwrap().to_vec();

        let mut two_stage = StreamCompressor::new();
        two_stage.reset(ElementType::Int, Algorithm::TwoStage, true).unwrap();
        for v in &vals {
            two_stage.feed(&le_i32(*v)).unwrap();
        }
        let out = two_stage.finalize().unwrap().to_vec();

        let inner = if out[0] == 0 {
            lz4::decompress_block(&out[1..], primary.len()).unwrap()
        } else {
            out[1..].to_vec()
        };
        assert_eq!(inner, primary);
    }

    #[test]
    fn test_feed_before_reset_is_rejected() {
        let mut sc = StreamCompressor::new();
        assert!(sc.feed(&[1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_feed_after_finalize_is_rejected() {
        let mut sc = StreamCompressor::new();
        sc.reset(ElementType::Int, Algorithm::OneStage, true).unwrap();
        sc.feed(&le_i32(1)).unwrap();
        sc.finalize().unwrap();
        assert!(sc.feed(&le_i32(2)).is_err());
    }
}
