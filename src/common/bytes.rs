//! Little-endian cursors over page buffers.
//!
//! Every on-disk structure is a fixed sequence of little-endian fields, so
//! codecs read and write through these two cursors instead of juggling
//! offsets by hand.

use super::{Error, Result};

/// Sequential reader over a byte slice.
///
/// Reads past the end fail with [`Error::Corrupted`] instead of panicking,
/// since the bytes may come from a damaged file.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the slice.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Borrow the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::truncated(&format!("{len} bytes at offset {}", self.pos)));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a string prefixed by a one-byte length.
    pub fn read_short_string(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Corrupted(format!("invalid UTF-8 string: {e}")))
    }
}

/// Sequential writer over a mutable byte slice.
///
/// Layouts are sized at compile time, so running out of room is a bug.
///
/// # Panics
/// Every `write_*` panics if the slice is too small.
pub struct ByteWriter<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        assert!(
            self.data.len() - self.pos >= bytes.len(),
            "buffer too small: need {} bytes at offset {}, have {}",
            bytes.len(),
            self.pos,
            self.data.len()
        );
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Write a string prefixed by a one-byte length.
    ///
    /// # Panics
    /// Panics if the string is longer than 255 bytes.
    pub fn write_short_string(&mut self, value: &str) {
        let len = u8::try_from(value.len()).expect("string longer than 255 bytes");
        self.write_u8(len);
        self.write_bytes(value.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_reader_sequence() {
        let mut buf = [0u8; 32];
        {
            let mut w = ByteWriter::new(&mut buf);
            w.write_u8(7);
            w.write_i16(-2);
            w.write_i32(-1);
            w.write_u64(u64::MAX);
            w.write_short_string("jazz");
            assert_eq!(w.position(), 1 + 2 + 4 + 8 + 5);
        }

        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_u8().unwrap(), 7);
        assert_eq!(r.read_i16().unwrap(), -2);
        assert_eq!(r.read_i32().unwrap(), -1);
        assert_eq!(r.read_u64().unwrap(), u64::MAX);
        assert_eq!(r.read_short_string().unwrap(), "jazz");
        assert_eq!(r.remaining(), 32 - 20);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buf = [0u8; 4];
        ByteWriter::new(&mut buf).write_i32(0x04030201);
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_read_past_end_is_corruption() {
        let buf = [1u8, 2];
        let mut r = ByteReader::new(&buf);
        assert!(matches!(r.read_i32(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_empty_short_string() {
        let buf = [0u8];
        assert_eq!(ByteReader::new(&buf).read_short_string().unwrap(), "");
    }

    #[test]
    #[should_panic(expected = "buffer too small")]
    fn test_write_past_end_panics() {
        let mut buf = [0u8; 2];
        ByteWriter::new(&mut buf).write_u32(1);
    }
}
