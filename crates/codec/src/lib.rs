//! # Codec
//!
//! Self-describing payload encodings for the DiskSet storage engine.
//!
//! The engine stores each element as an opaque byte blob; a [`PayloadCodec`]
//! converts between element values and those blobs. The engine only requires
//! two things of a codec:
//!
//! - **Determinism**: encoding the same value always produces the same bytes.
//! - **Order preservation**: `decode(encode(v))` compares equal to `v` under
//!   the element ordering.
//!
//! The codec is pluggable — the engine never inspects payload bytes itself,
//! it only needs the encoded length before writing and a comparable value
//! after decoding.
//!
//! ## Example
//! ```rust
//! use codec::{I64Codec, PayloadCodec};
//!
//! let codec = I64Codec;
//! let bytes = codec.encode(&42).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), 42);
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("payload is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Converts element values to and from self-describing byte blobs.
///
/// Implementations must be deterministic, and decoding must yield a value
/// that compares equal to the one encoded.
pub trait PayloadCodec {
    /// The element type this codec handles.
    type Value: Ord + Clone;

    /// Encodes `value` into a byte blob.
    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError>;

    /// Decodes a byte blob back into a value.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Value, CodecError>;
}

/// Fixed-width signed 64-bit integers, little-endian, always 8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct I64Codec;

impl PayloadCodec for I64Codec {
    type Value = i64;

    fn encode(&self, value: &i64) -> Result<Vec<u8>, CodecError> {
        Ok(value.to_le_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<i64, CodecError> {
        let arr: [u8; 8] = bytes
            .try_into()
            .map_err(|_| CodecError::LengthMismatch {
                expected: 8,
                actual: bytes.len(),
            })?;
        Ok(i64::from_le_bytes(arr))
    }
}

/// UTF-8 strings; the payload is the raw string bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl PayloadCodec for Utf8Codec {
    type Value = String;

    fn encode(&self, value: &String) -> Result<Vec<u8>, CodecError> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodecError> {
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

/// Raw byte strings, stored verbatim and ordered lexicographically.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl PayloadCodec for BytesCodec {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------- i64 --------------------

    #[test]
    fn i64_roundtrip() {
        let codec = I64Codec;
        for v in [0i64, 1, -1, 42, i64::MIN, i64::MAX] {
            let bytes = codec.encode(&v).unwrap();
            assert_eq!(bytes.len(), 8);
            assert_eq!(codec.decode(&bytes).unwrap(), v);
        }
    }

    #[test]
    fn i64_encoding_is_deterministic() {
        let codec = I64Codec;
        assert_eq!(codec.encode(&7).unwrap(), codec.encode(&7).unwrap());
    }

    #[test]
    fn i64_decode_preserves_ordering() {
        let codec = I64Codec;
        let mut values = vec![5i64, -3, 0, i64::MIN, 99, i64::MAX];
        values.sort();
        let decoded: Vec<i64> = values
            .iter()
            .map(|v| codec.decode(&codec.encode(v).unwrap()).unwrap())
            .collect();
        assert_eq!(decoded, values);
    }

    #[test]
    fn i64_rejects_wrong_length() {
        let codec = I64Codec;
        let err = codec.decode(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LengthMismatch {
                expected: 8,
                actual: 3
            }
        ));
    }

    // -------------------- strings --------------------

    #[test]
    fn utf8_roundtrip() {
        let codec = Utf8Codec;
        for s in ["", "abc", "héllo wörld", "日本語"] {
            let bytes = codec.encode(&s.to_string()).unwrap();
            assert_eq!(codec.decode(&bytes).unwrap(), s);
        }
    }

    #[test]
    fn utf8_rejects_invalid_bytes() {
        let codec = Utf8Codec;
        let err = codec.decode(&[0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, CodecError::Utf8(_)));
    }

    // -------------------- raw bytes --------------------

    #[test]
    fn bytes_roundtrip() {
        let codec = BytesCodec;
        let v = vec![0x00, 0xFF, 0x80, 0x01];
        let bytes = codec.encode(&v).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), v);
    }

    #[test]
    fn empty_bytes_roundtrip() {
        let codec = BytesCodec;
        let bytes = codec.encode(&Vec::new()).unwrap();
        assert!(bytes.is_empty());
        assert_eq!(codec.decode(&bytes).unwrap(), Vec::<u8>::new());
    }
}
