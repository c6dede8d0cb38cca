//! Columnar block codecs and the streaming compressor for time-series
//! telemetry: Simple-8B integer packing, delta-of-delta timestamps, XOR
//! float/double coding, 2-bit/RLE booleans, and an LZ4 binary pass-through.
//!
//! Each type family lives in its own module and exposes a block-oriented
//! `encode`/`decode` pair over a whole column at once. [`stream`] offers the
//! same semantics one element at a time, for callers that don't have the
//! whole column materialized up front.

mod binary;
mod bits;
mod boolean;
mod float;
mod integer;
mod lz4;
mod simple8b;
mod stream;
mod timestamp;
mod types;

pub use boolean::{decode_bitpack, decode_rle, encode_bitpack, encode_rle, FALSE, NULL, TRUE};
pub use stream::{Algorithm, StreamCompressor};
pub use types::ElementType;

use strata_base::{Error, Result};

/// Encodes one column of `n` elements of type `ty`.
///
/// `input` holds `n` fixed-width elements back to back for every type except
/// [`ElementType::Binary`] and [`ElementType::Bool`], where `input` is the
/// element's own byte representation (the raw string bytes for binary, one
/// tag byte per element for bool) and `n` is the element count.
///
/// Booleans dispatch to the 2-bit bitpack form; callers that want run-length
/// encoding call [`encode_rle`] directly, since the choice between the two
/// is a caller-side policy decision, not something this type tag can carry.
pub fn encode(input: &[u8], n: usize, ty: ElementType) -> Result<Vec<u8>> {
    match ty {
        ElementType::Timestamp => timestamp::encode(input, n),
        ElementType::Float => float::encode_f32(input, n),
        ElementType::Double => float::encode_f64(input, n),
        ElementType::Binary => binary::encode(input),
        ElementType::Bool => boolean::encode_bitpack(input),
        _ if ty.is_integer() => integer::encode(input, n, ty),
        _ => Err(Error::invalid_argument("unsupported element type")),
    }
}

/// Decodes one column of `n` elements of type `ty`, the inverse of
/// [`encode`]. For [`ElementType::Binary`], `n` is the original (decoded)
/// byte length rather than an element count.
pub fn decode(input: &[u8], n: usize, ty: ElementType) -> Result<Vec<u8>> {
    match ty {
        ElementType::Timestamp => timestamp::decode(input, n),
        ElementType::Float => float::decode_f32(input, n),
        ElementType::Double => float::decode_f64(input, n),
        ElementType::Binary => binary::decode(input, n),
        ElementType::Bool => boolean::decode_bitpack(input, n),
        _ if ty.is_integer() => integer::decode(input, n, ty),
        _ => Err(Error::invalid_argument("unsupported element type")),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[cfg(test)]
    use test_log::test;

    #[test]
    fn test_dispatch_roundtrips_integer() {
        let vals: Vec<i32> = vec![10, 11, 12, 13];
        let input: Vec<u8> = vals.iter().flat_map(|v| v.to_le_bytes()).collect();
        let encoded = encode(&input, vals.len(), ElementType::Int).unwrap();
        let decoded = decode(&encoded, vals.len(), ElementType::Int).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_dispatch_roundtrips_timestamp() {
        let vals: Vec<i64> = vec![1000, 2000, 3000];
        let input: Vec<u8> = vals.iter().flat_map(|v| v.to_le_bytes()).collect();
        let encoded = encode(&input, vals.len(), ElementType::Timestamp).unwrap();
        let decoded = decode(&encoded, vals.len(), ElementType::Timestamp).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_dispatch_roundtrips_float_and_double() {
        let f: Vec<f32> = vec![1.5, 1.5, -2.25];
        let fi: Vec<u8> = f.iter().flat_map(|v| v.to_le_bytes()).collect();
        let fe = encode(&fi, f.len(), ElementType::Float).unwrap();
        assert_eq!(decode(&fe, f.len(), ElementType::Float).unwrap(), fi);

        let d: Vec<f64> = vec![1.5, 1.5, -2.25];
        let di: Vec<u8> = d.iter().flat_map(|v| v.to_le_bytes()).collect();
        let de = encode(&di, d.len(), ElementType::Double).unwrap();
        assert_eq!(decode(&de, d.len(), ElementType::Double).unwrap(), di);
    }

    #[test]
    fn test_dispatch_roundtrips_binary() {
        let input = b"hello world".to_vec();
        let encoded = encode(&input, input.len(), ElementType::Binary).unwrap();
        let decoded = decode(&encoded, input.len(), ElementType::Binary).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_dispatch_roundtrips_bool() {
        let tags = vec![TRUE, FALSE, TRUE, NULL, FALSE];
        let encoded = encode(&tags, tags.len(), ElementType::Bool).unwrap();
        let decoded = decode(&encoded, tags.len(), ElementType::Bool).unwrap();
        assert_eq!(decoded, tags);
    }

}
