//! Variable-length unsigned integers.
//!
//! Seven payload bits per byte, least significant group first. Every byte
//! except the last has its high bit set. Encodings are canonical: the
//! decoder rejects a zero-valued trailing group and anything wider than 64
//! bits, so a `u64` never takes more than [`MAX_VARINT_LEN`] bytes.

use bytes::BufMut;

use crate::error::CodecError;

/// Longest possible encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Append the varint encoding of `value` to `buf`.
pub fn write_varint<B: BufMut>(buf: &mut B, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Encode `value` into a fresh buffer.
pub fn varint_bytes(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN);
    write_varint(&mut buf, value);
    buf
}

/// Number of bytes [`write_varint`] emits for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Decode one varint from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn read_varint(bytes: &[u8]) -> Result<(u64, usize), CodecError> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if shift + 7 >= u64::BITS && u32::from(byte) >= 1 << (u64::BITS - shift) {
            return Err(CodecError::VarintOverflow);
        }
        if byte == 0 && shift != 0 {
            return Err(CodecError::NonCanonicalVarint);
        }

        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }

    Err(CodecError::TruncatedInput {
        needed: bytes.len() + 1,
        remaining: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte_values() {
        assert_eq!(varint_bytes(0), vec![0x00]);
        assert_eq!(varint_bytes(1), vec![0x01]);
        assert_eq!(varint_bytes(127), vec![0x7f]);
    }

    #[test]
    fn test_multi_byte_values() {
        assert_eq!(varint_bytes(128), vec![0x80, 0x01]);
        assert_eq!(varint_bytes(300), vec![0xac, 0x02]);
        assert_eq!(varint_bytes(16_384), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn test_max_value_takes_ten_bytes() {
        let bytes = varint_bytes(u64::MAX);
        assert_eq!(bytes.len(), MAX_VARINT_LEN);
        assert_eq!(bytes[9], 0x01);
        assert_eq!(read_varint(&bytes).unwrap(), (u64::MAX, MAX_VARINT_LEN));
    }

    #[test]
    fn test_varint_len_matches_encoding() {
        for value in [0, 1, 127, 128, 300, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            assert_eq!(varint_len(value), varint_bytes(value).len(), "value {value}");
        }
    }

    #[test]
    fn test_write_into_any_buffer() {
        let mut buf = bytes::BytesMut::new();
        write_varint(&mut buf, 300);
        write_varint(&mut buf, 1);
        assert_eq!(&buf[..], &[0xac, 0x02, 0x01]);
    }

    #[test]
    fn test_read_stops_at_terminator() {
        let (value, used) = read_varint(&[0xac, 0x02, 0xff, 0xff]).unwrap();
        assert_eq!(value, 300);
        assert_eq!(used, 2);
    }

    #[test]
    fn test_empty_input_is_truncated() {
        assert!(matches!(
            read_varint(&[]),
            Err(CodecError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_dangling_continuation_is_truncated() {
        assert!(matches!(
            read_varint(&[0x80, 0x80]),
            Err(CodecError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_overlong_encoding_rejected() {
        // 0 padded with an extra zero group.
        assert_eq!(read_varint(&[0x80, 0x00]), Err(CodecError::NonCanonicalVarint));
        // 1 padded the same way.
        assert_eq!(read_varint(&[0x81, 0x00]), Err(CodecError::NonCanonicalVarint));
    }

    #[test]
    fn test_overflow_rejected() {
        let mut bytes = vec![0xff; 9];
        bytes.push(0x02);
        assert_eq!(read_varint(&bytes), Err(CodecError::VarintOverflow));
    }

    #[test]
    fn test_endless_continuation_is_bounded() {
        let bytes = vec![0xff; 64];
        assert_eq!(read_varint(&bytes), Err(CodecError::VarintOverflow));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn roundtrip_is_minimal(value in any::<u64>()) {
                let bytes = varint_bytes(value);
                prop_assert_eq!(bytes.len(), varint_len(value));
                prop_assert_eq!(read_varint(&bytes).unwrap(), (value, bytes.len()));
            }

            #[test]
            fn strict_prefix_never_decodes(value in 128u64..) {
                let bytes = varint_bytes(value);
                for cut in 0..bytes.len() {
                    let is_truncated = matches!(
                        read_varint(&bytes[..cut]),
                        Err(CodecError::TruncatedInput { .. })
                    );
                    prop_assert!(is_truncated);
                }
            }
        }
    }
}
