//! Compression codec registry
//!
//! Grounded on `unreal_asset_base::compression`'s `CompressionMethod` enum and
//! `decompress` dispatch function, extended with the Brotli, Zstd and Oodle entries
//! this container format also names in its method table.

use std::io::Read;

use flate2::bufread::{GzDecoder, ZlibDecoder};

use crate::error::Error;

/// A compression method named in a container's method-name table
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Stored uncompressed (implicit slot 0 of every method table)
    #[default]
    None,
    /// zlib (RFC 1950)
    Zlib,
    /// gzip (RFC 1952)
    Gzip,
    /// LZ4 block format
    Lz4,
    /// Oodle, a proprietary codec the engine links at runtime
    Oodle,
    /// Brotli
    Brotli,
    /// Zstandard
    Zstd,
    /// A method name this build does not recognize
    Unknown(Box<str>),
}

impl CompressionMethod {
    /// Resolve a method name from the TOC's method-name table to a codec entry
    pub fn new(name: &str) -> Self {
        match name {
            "None" => Self::None,
            "Zlib" => Self::Zlib,
            "Gzip" => Self::Gzip,
            "LZ4" => Self::Lz4,
            "Oodle" => Self::Oodle,
            "Brotli" => Self::Brotli,
            "Zstd" => Self::Zstd,
            _ => Self::Unknown(name.to_string().into_boxed_str()),
        }
    }

    /// The wire name this method was (or would be) read as
    pub fn name(&self) -> &str {
        match self {
            CompressionMethod::None => "None",
            CompressionMethod::Zlib => "Zlib",
            CompressionMethod::Gzip => "Gzip",
            CompressionMethod::Lz4 => "LZ4",
            CompressionMethod::Oodle => "Oodle",
            CompressionMethod::Brotli => "Brotli",
            CompressionMethod::Zstd => "Zstd",
            CompressionMethod::Unknown(name) => name,
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decompress `compressed` into `decompressed`, which must already be sized to the
/// expected uncompressed length.
pub fn decompress(
    method: &CompressionMethod,
    compressed: &[u8],
    decompressed: &mut [u8],
) -> Result<(), Error> {
    match method {
        CompressionMethod::None => {
            let len = decompressed.len();
            if compressed.len() < len {
                return Err(Error::DecompressFailed {
                    method: method.name().into(),
                    expected: len,
                    got: compressed.len(),
                });
            }
            decompressed.copy_from_slice(&compressed[..len]);
            Ok(())
        }
        CompressionMethod::Zlib => ZlibDecoder::new(compressed)
            .read_exact(decompressed)
            .map_err(|_| decompress_failed(method, decompressed.len())),
        CompressionMethod::Gzip => GzDecoder::new(compressed)
            .read_exact(decompressed)
            .map_err(|_| decompress_failed(method, decompressed.len())),
        CompressionMethod::Lz4 => lz4_flex::block::decompress_into(compressed, decompressed)
            .map(|_| ())
            .map_err(|_| decompress_failed(method, decompressed.len())),
        CompressionMethod::Brotli => {
            let mut output = Vec::with_capacity(decompressed.len());
            brotli::BrotliDecompress(&mut std::io::Cursor::new(compressed), &mut output)
                .map_err(|_| decompress_failed(method, decompressed.len()))?;
            if output.len() != decompressed.len() {
                return Err(decompress_failed_with(
                    method,
                    decompressed.len(),
                    output.len(),
                ));
            }
            decompressed.copy_from_slice(&output);
            Ok(())
        }
        CompressionMethod::Zstd => {
            let output = zstd::bulk::decompress(compressed, decompressed.len())
                .map_err(|_| decompress_failed(method, decompressed.len()))?;
            if output.len() != decompressed.len() {
                return Err(decompress_failed_with(
                    method,
                    decompressed.len(),
                    output.len(),
                ));
            }
            decompressed.copy_from_slice(&output);
            Ok(())
        }
        CompressionMethod::Oodle => decompress_oodle(compressed, decompressed),
        CompressionMethod::Unknown(name) => Err(Error::unsupported_codec(name.to_string())),
    }
}

fn decompress_failed(method: &CompressionMethod, expected: usize) -> Error {
    decompress_failed_with(method, expected, 0)
}

fn decompress_failed_with(method: &CompressionMethod, expected: usize, got: usize) -> Error {
    Error::DecompressFailed {
        method: method.name().into(),
        expected,
        got,
    }
}

#[cfg(feature = "oodle")]
fn decompress_oodle(compressed: &[u8], decompressed: &mut [u8]) -> Result<(), Error> {
    // SAFETY: `OodleLZ_Decompress` is provided by an externally linked `oo2core`
    // shared library the host application supplies; this crate only declares its
    // signature. Buffers are valid for the lengths passed (Rust slice invariants).
    extern "C" {
        fn OodleLZ_Decompress(
            src_buf: *const u8,
            src_len: i32,
            dst_buf: *mut u8,
            dst_size: i64,
            fuzz_safe: i32,
            check_crc: i32,
            verbosity: i32,
            dst_base: *mut u8,
            e: i64,
            cb: *const u8,
            cb_ctx: *const u8,
            scratch: *mut u8,
            scratch_size: i64,
            thread_phase: i32,
        ) -> i32;
    }

    let written = unsafe {
        OodleLZ_Decompress(
            compressed.as_ptr(),
            compressed.len() as i32,
            decompressed.as_mut_ptr(),
            decompressed.len() as i64,
            1,
            0,
            0,
            std::ptr::null_mut(),
            0,
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null_mut(),
            0,
            3,
        )
    };

    if written as usize != decompressed.len() {
        return Err(decompress_failed_with(
            &CompressionMethod::Oodle,
            decompressed.len(),
            written.max(0) as usize,
        ));
    }

    Ok(())
}

#[cfg(not(feature = "oodle"))]
fn decompress_oodle(_compressed: &[u8], _decompressed: &mut [u8]) -> Result<(), Error> {
    Err(Error::unsupported_codec("Oodle"))
}
