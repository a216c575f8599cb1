//! Extension for anything that implements Read to more easily read Unreal data formats.

use std::error::Error as StdError;
use std::io::{self, Read};
use std::mem::size_of;

use byteorder::{ReadBytesExt, LE};

use crate::error::FStringError;
use crate::guid::Guid;

/// Extension for anything that implements Read to more easily read Unreal data formats.
pub trait UnrealReadExt {
    /// Read string of format \<length i32\>\<string\>\<null\>
    fn read_fstring(&mut self) -> Result<Option<String>, FStringError>;
    /// Read u8 as bool
    fn read_bool(&mut self) -> io::Result<bool>;
    /// Read a 16-byte guid
    fn read_guid(&mut self) -> io::Result<Guid>;
    /// Read an array of type `T` prefixed by an `i32` element count, running the
    /// provided function for each element.
    fn read_array<T, E: StdError + From<io::Error>>(
        &mut self,
        count: i32,
        f: impl FnMut(&mut Self) -> Result<T, E>,
    ) -> Result<Vec<T>, E>
    where
        Self: Sized;
}

impl<R: Read> UnrealReadExt for R {
    fn read_fstring(&mut self) -> Result<Option<String>, FStringError> {
        let len = self.read_i32::<LE>()?;

        if len == i32::MIN || !(-131072..=131072).contains(&len) {
            return Err(FStringError::InvalidStringSize(len, size_of::<i32>() as u64));
        }

        if len == 0 {
            return Ok(None);
        }

        if len < 0 {
            let units = -len;
            let body_bytes = (units - 1) as usize * size_of::<u16>();

            let mut body = vec![0u8; body_bytes];
            self.read_exact(&mut body)?;

            let terminator = self.read_u16::<LE>()?;
            if terminator != 0 {
                return Err(FStringError::InvalidStringTerminator(
                    terminator,
                    (size_of::<i32>() + body_bytes + size_of::<u16>()) as u64,
                ));
            }

            let units = body
                .chunks_exact(2)
                .map(|e| u16::from_le_bytes([e[0], e[1]]))
                .collect::<Vec<_>>();

            String::from_utf16(&units).map(Some).map_err(Into::into)
        } else {
            let body_bytes = len as usize - 1;

            let mut body = vec![0u8; body_bytes];
            self.read_exact(&mut body)?;

            let terminator = self.read_u8()?;
            if terminator != 0 {
                return Err(FStringError::InvalidStringTerminator(
                    terminator as u16,
                    (size_of::<i32>() + body_bytes + 1) as u64,
                ));
            }

            String::from_utf8(body).map(Some).map_err(Into::into)
        }
    }

    fn read_bool(&mut self) -> io::Result<bool> {
        let res = self.read_u8()?;
        Ok(res > 0)
    }

    fn read_guid(&mut self) -> io::Result<Guid> {
        let mut value = [0u8; 16];
        self.read_exact(&mut value)?;
        Ok(Guid::new(value))
    }

    fn read_array<T, E: StdError + From<io::Error>>(
        &mut self,
        count: i32,
        mut f: impl FnMut(&mut Self) -> Result<T, E>,
    ) -> Result<Vec<T>, E>
    where
        Self: Sized,
    {
        let mut result = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            result.push(f(self)?);
        }
        Ok(result)
    }
}
