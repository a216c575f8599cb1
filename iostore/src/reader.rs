//! Primitive little-endian reader over an in-memory buffer

use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{ReadBytesExt, LE};

use crate::error::Error;

/// A cursor over a byte slice with the small set of ergonomic reads the TOC parser
/// and directory-index reader need.
///
/// Grounded on this workspace's convention of extending `Read`/`Read + Seek` with a
/// small ergonomic trait (`unreal_helpers::UnrealReadExt`) rather than a full archive
/// abstraction; this type plays the same role for the fixed-width little-endian
/// primitives the TOC format uses.
#[derive(Debug, Clone)]
pub struct ByteReader<'data> {
    cursor: Cursor<&'data [u8]>,
}

impl<'data> ByteReader<'data> {
    /// Wrap a byte slice for sequential little-endian reads
    pub fn new(data: &'data [u8]) -> Self {
        ByteReader {
            cursor: Cursor::new(data),
        }
    }

    /// Current read position, in bytes from the start of the buffer
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Number of bytes left to read
    pub fn remaining(&self) -> u64 {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position())
    }

    /// Move the cursor to an absolute byte offset
    pub fn seek(&mut self, absolute: u64) -> Result<(), Error> {
        self.cursor.seek(SeekFrom::Start(absolute))?;
        Ok(())
    }

    /// Skip forward by `count` bytes without reading them
    pub fn skip(&mut self, count: u64) -> Result<(), Error> {
        self.cursor.seek(SeekFrom::Current(count as i64))?;
        Ok(())
    }

    /// Read a single byte as `u8`
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.cursor.read_u8()?)
    }

    /// Read a little-endian `u16`
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(self.cursor.read_u16::<LE>()?)
    }

    /// Read a little-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(self.cursor.read_u32::<LE>()?)
    }

    /// Read a little-endian `u64`
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(self.cursor.read_u64::<LE>()?)
    }

    /// Read a single byte as `i8`
    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.cursor.read_i8()?)
    }

    /// Read a little-endian `i16`
    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(self.cursor.read_i16::<LE>()?)
    }

    /// Read a little-endian `i32`
    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(self.cursor.read_i32::<LE>()?)
    }

    /// Read `n` bytes into a freshly allocated buffer
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; n];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly enough bytes to fill `into`
    pub fn read_into(&mut self, into: &mut [u8]) -> Result<(), Error> {
        self.cursor.read_exact(into)?;
        Ok(())
    }

    /// Read a fixed-size array of bytes
    pub fn read_array_n<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut buf = [0u8; N];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read `count` elements of type `T`, invoking `elem_reader` for each
    pub fn read_array<T>(
        &mut self,
        count: usize,
        mut elem_reader: impl FnMut(&mut Self) -> Result<T, Error>,
    ) -> Result<Vec<T>, Error> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(elem_reader(self)?);
        }
        Ok(out)
    }
}

impl<'data> Read for ByteReader<'data> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl<'data> Seek for ByteReader<'data> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.cursor.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::ByteReader;

    #[test]
    fn reads_primitives_in_order() {
        let data = [0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB];
        let mut reader = ByteReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 0x0403);
        assert_eq!(reader.read_bytes(2).unwrap(), vec![0xAA, 0xBB]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn seek_is_absolute() {
        let data = [0u8, 1, 2, 3, 4];
        let mut reader = ByteReader::new(&data);
        reader.seek(3).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 3);
    }

    #[test]
    fn short_read_is_an_error() {
        let data = [0u8; 1];
        let mut reader = ByteReader::new(&data);
        assert!(reader.read_u32().is_err());
    }
}
