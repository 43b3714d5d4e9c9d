//! The binary archive: a write sink and a read cursor over a byte buffer.
//!
//! Both halves speak the same wire format:
//! - raw blobs are copied verbatim,
//! - strings and byte vectors are `varint(len) || bytes`,
//! - arrays are `varint(count)` followed by the elements with no separators.
//!
//! The reader never reads out of bounds. It checks every length against the
//! bytes that remain, and once an operation fails the reader keeps returning
//! that first error, so a caller that ignores one failure cannot decode
//! garbage after it.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::CodecError;
use crate::varint;

/// Write half of the archive.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    buf: BytesMut,
}

impl BinaryWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append raw bytes.
    pub fn write_blob(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Append a single raw byte (variant tags).
    pub fn write_u8(&mut self, byte: u8) {
        self.buf.put_u8(byte);
    }

    /// Append a little-endian `u32` (the block nonce).
    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    /// Append a varint.
    pub fn write_varint(&mut self, value: u64) {
        varint::write_varint(&mut self.buf, value);
    }

    /// Append a length-prefixed byte string.
    pub fn write_string(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.write_blob(bytes);
    }

    /// Open an array of `count` elements.
    pub fn begin_array(&mut self, count: usize) {
        self.write_varint(count as u64);
    }

    /// Binary archives put nothing between array elements.
    pub fn delimit_array(&mut self) {}

    /// Binary archives put nothing after the last array element.
    pub fn end_array(&mut self) {}

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish writing and take the blob.
    pub fn into_blob(self) -> Vec<u8> {
        Vec::from(self.buf)
    }
}

/// Read half of the archive, borrowing the buffer it decodes.
#[derive(Debug)]
pub struct BinaryReader<'a> {
    buf: &'a [u8],
    failed: Option<CodecError>,
}

impl<'a> BinaryReader<'a> {
    /// Start reading at the front of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, failed: None }
    }

    /// Bytes left to consume.
    pub fn remaining_bytes(&self) -> usize {
        self.buf.remaining()
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    /// True if no operation has failed yet.
    pub fn is_good(&self) -> bool {
        self.failed.is_none()
    }

    /// Record a failure and hand it back for `?`.
    pub fn fail(&mut self, err: CodecError) -> CodecError {
        self.failed.get_or_insert(err).clone()
    }

    fn check(&self) -> Result<(), CodecError> {
        match &self.failed {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn require(&mut self, needed: usize) -> Result<(), CodecError> {
        self.check()?;
        let remaining = self.remaining_bytes();
        if remaining < needed {
            return Err(self.fail(CodecError::TruncatedInput { needed, remaining }));
        }
        Ok(())
    }

    /// Consume exactly `len` raw bytes.
    pub fn read_blob(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        self.require(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Consume a fixed-size raw value.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        self.require(N)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    /// Consume a single raw byte.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    /// Consume a little-endian `u32`.
    pub fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        self.require(4)?;
        Ok(self.buf.get_u32_le())
    }

    /// Consume a varint.
    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        self.check()?;
        match varint::read_varint(self.buf) {
            Ok((value, used)) => {
                self.buf.advance(used);
                Ok(value)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Consume a varint that must fit a narrower integer type.
    pub fn read_varint_as<T: TryFrom<u64>>(&mut self) -> Result<T, CodecError> {
        let value = self.read_varint()?;
        T::try_from(value).map_err(|_| self.fail(CodecError::VarintOverflow))
    }

    /// Consume a length-prefixed byte string.
    pub fn read_string(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_varint()?;
        let remaining = self.remaining_bytes();
        let len = usize::try_from(len)
            .ok()
            .filter(|&len| len <= remaining)
            .ok_or_else(|| {
                self.fail(CodecError::TruncatedInput {
                    needed: usize::try_from(len).unwrap_or(usize::MAX),
                    remaining,
                })
            })?;
        Ok(self.read_blob(len)?.to_vec())
    }

    /// Open an array and return its element count.
    ///
    /// Every element takes at least one byte, so a count larger than the
    /// remaining input is rejected before the caller allocates for it.
    pub fn begin_array(&mut self) -> Result<usize, CodecError> {
        let count = self.read_varint()?;
        let remaining = self.remaining_bytes();
        match usize::try_from(count) {
            Ok(count) if count <= remaining => Ok(count),
            _ => Err(self.fail(CodecError::MalformedLength {
                length: count,
                remaining,
            })),
        }
    }

    /// Binary archives put nothing between array elements.
    pub fn delimit_array(&mut self) {}

    /// Binary archives put nothing after the last array element.
    pub fn end_array(&mut self) {}

    /// Fail unless the whole buffer has been consumed.
    pub fn finish(mut self) -> Result<(), CodecError> {
        self.check()?;
        match self.remaining_bytes() {
            0 => Ok(()),
            n => Err(self.fail(CodecError::TrailingBytes(n))),
        }
    }
}
