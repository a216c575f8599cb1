//! Error type for this crate

use std::io;

use thiserror::Error;
use unreal_helpers::{error::FStringError, Guid};

use crate::chunk_id::ChunkId;

/// Error type for IoStore container parsing and reading
#[derive(Error, Debug)]
pub enum Error {
    /// The `.utoc` sidecar is structurally invalid: bad magic, wrong `tocHeaderSize` or
    /// `tocCompressedBlockEntrySize`, or a version older than this crate's minimum
    #[error("Corrupt .utoc: {0}")]
    CorruptToc(Box<str>),
    /// `.utoc` version is newer than the highest version this crate knows how to parse
    #[error("Unsupported .utoc version: {0}")]
    UnsupportedVersion(u8),

    /// Container is `Encrypted` and the resolver has no key for `encryptionKeyGuid`
    #[error("No encryption key available for guid {0}")]
    MissingKey(Guid),
    /// `chunk_id` is not present in the TOC's chunk index
    #[error("Unknown chunk id: {0:?}")]
    UnknownChunk(ChunkId),

    /// Operation not supported in the current configuration (e.g. multi-partition in-memory mount)
    #[error("{0}")]
    Unsupported(Box<str>),
    /// Opening a partition or sidecar file failed
    #[error("Failed to open container file {path}: {source}")]
    ContainerOpenFailed {
        /// Path that failed to open
        path: Box<str>,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },
    /// A partition read returned fewer bytes than requested
    #[error("Short read from partition {partition}: expected {expected} bytes, got {got}")]
    ShortRead {
        /// Partition index read from
        partition: u64,
        /// Number of bytes requested
        expected: usize,
        /// Number of bytes actually read
        got: usize,
    },

    /// A compression codec reported failure
    #[error("Failed to decompress with method {method}: expected {expected} bytes, got {got}")]
    DecompressFailed {
        /// Compression method name
        method: Box<str>,
        /// Expected decompressed size
        expected: usize,
        /// Decompressed size actually produced, if known
        got: usize,
    },
    /// Decryption was attempted with a bad key length or unaligned buffer
    #[error("{0}")]
    DecryptFailed(Box<str>),
    /// Named compression method is not registered in this build
    #[error("Unsupported compression codec: {0}")]
    UnsupportedCodec(Box<str>),

    /// A caller-supplied cancellation token fired mid-read
    #[error("Read cancelled")]
    Cancelled,

    /// An `std::io::Error` occurred, most commonly an unexpected end of the TOC buffer
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An `FStringError` occurred while reading the directory index
    #[error(transparent)]
    FString(#[from] FStringError),
    /// A `TryFromPrimitiveError`-shaped enum conversion failed
    #[error("{0}")]
    InvalidEnumValue(Box<str>),
}

impl Error {
    /// Create an `Error::CorruptToc` with the given message
    pub fn corrupt_toc(msg: impl Into<String>) -> Self {
        Error::CorruptToc(msg.into().into_boxed_str())
    }

    /// Create an `Error::Unsupported` with the given message
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into().into_boxed_str())
    }

    /// Create an `Error::DecryptFailed` with the given message
    pub fn decrypt_failed(msg: impl Into<String>) -> Self {
        Error::DecryptFailed(msg.into().into_boxed_str())
    }

    /// Create an `Error::UnsupportedCodec` for the given method name
    pub fn unsupported_codec(method: impl Into<String>) -> Self {
        Error::UnsupportedCodec(method.into().into_boxed_str())
    }
}
