//! Bounds-checked little-endian reader over a raw chart buffer.

use super::ChartError;

/// A forward-only cursor over the input bytes.
///
/// Every read advances the offset by the exact field width, mirroring the
/// packed on-disk layout; there is no seeking backwards.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Current byte offset, for error reporting.
    pub(crate) const fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ChartError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(ChartError::UnexpectedEof {
                offset: self.offset,
                needed: len,
            })?;
        let bytes = self.buf.get(self.offset..end).ok_or(ChartError::UnexpectedEof {
            offset: self.offset,
            needed: len,
        })?;
        self.offset = end;
        Ok(bytes)
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], ChartError> {
        let offset = self.offset;
        let bytes = self.take(N)?;
        bytes.try_into().map_err(|_| ChartError::UnexpectedEof {
            offset,
            needed: N,
        })
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ChartError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ChartError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ChartError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn f32(&mut self) -> Result<f32, ChartError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    /// Skip `len` padding bytes.
    pub(crate) fn pad(&mut self, len: usize) -> Result<(), ChartError> {
        self.take(len).map(|_| ())
    }

    /// Read a fixed-width field holding a NUL-terminated string; bytes after
    /// the first NUL are ignored.
    pub(crate) fn fixed_str(&mut self, width: usize) -> Result<String, ChartError> {
        let bytes = self.take(width)?;
        let text = bytes
            .split(|&byte| byte == 0)
            .next()
            .unwrap_or(bytes);
        Ok(String::from_utf8_lossy(text).into_owned())
    }
}
