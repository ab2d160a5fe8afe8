use bytes::{Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Text encodings understood by [`ByteFrame::decode_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// 7-bit ASCII; any byte above 0x7f is rejected.
    Ascii,
    /// UTF-8; invalid sequences are rejected.
    Utf8,
}

/// A fixed-length packet buffer with bounds-checked little-endian accessors.
///
/// Writes never resize the frame. Every access whose `offset + width`
/// exceeds the length fails with [`FrameError::Bounds`].
#[derive(Clone, PartialEq, Eq)]
pub struct ByteFrame {
    buf: BytesMut,
}

impl ByteFrame {
    /// Allocate a zero-filled frame of `size` bytes.
    pub fn alloc(size: usize) -> Self {
        Self {
            buf: BytesMut::zeroed(size),
        }
    }

    /// Copy raw packet bytes into a new frame.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(bytes),
        }
    }

    /// Build a frame from integer values, each of which must fit in a byte.
    pub fn try_from_values<I>(values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<i64>,
    {
        let values = values.into_iter();
        let mut buf = BytesMut::with_capacity(values.size_hint().0);
        for (index, value) in values.enumerate() {
            let value = value.into();
            let byte = u8::try_from(value).map_err(|_| FrameError::Range { index, value })?;
            buf.extend_from_slice(&[byte]);
        }
        Ok(Self { buf })
    }

    /// Frame length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true for a zero-length frame.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the raw packet bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the frame into immutable bytes ready for the transport.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    fn span(&self, offset: usize, width: usize) -> Result<std::ops::Range<usize>> {
        match offset.checked_add(width) {
            Some(end) if end <= self.buf.len() => Ok(offset..end),
            _ => Err(FrameError::Bounds {
                offset,
                width,
                len: self.buf.len(),
            }),
        }
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        let range = self.span(offset, 1)?;
        Ok(self.buf[range.start])
    }

    pub fn read_u16_le(&self, offset: usize) -> Result<u16> {
        let range = self.span(offset, 2)?;
        let mut raw = [0u8; 2];
        raw.copy_from_slice(&self.buf[range]);
        Ok(u16::from_le_bytes(raw))
    }

    pub fn read_u32_le(&self, offset: usize) -> Result<u32> {
        let range = self.span(offset, 4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[range]);
        Ok(u32::from_le_bytes(raw))
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        let range = self.span(offset, 1)?;
        self.buf[range.start] = value;
        Ok(())
    }

    pub fn write_u16_le(&mut self, offset: usize, value: u16) -> Result<()> {
        let range = self.span(offset, 2)?;
        self.buf[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Decode the bytes in `start..end` as text.
    pub fn decode_text(&self, encoding: TextEncoding, start: usize, end: usize) -> Result<String> {
        let width = end.checked_sub(start).ok_or(FrameError::Bounds {
            offset: start,
            width: 0,
            len: self.buf.len(),
        })?;
        let range = self.span(start, width)?;
        let raw = &self.buf[range];
        match encoding {
            TextEncoding::Ascii if !raw.is_ascii() => {
                Err(FrameError::parse("text", "non-ASCII byte in ASCII field"))
            }
            TextEncoding::Ascii | TextEncoding::Utf8 => std::str::from_utf8(raw)
                .map(str::to_owned)
                .map_err(|err| FrameError::parse("text", err.to_string())),
        }
    }
}

impl From<&[u8]> for ByteFrame {
    fn from(bytes: &[u8]) -> Self {
        Self::from_slice(bytes)
    }
}

impl AsRef<[u8]> for ByteFrame {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl std::fmt::Debug for ByteFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteFrame({:02x?})", self.buf.as_ref())
    }
}
