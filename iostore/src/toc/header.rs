//! TOC header

use unreal_helpers::{Guid, UnrealReadExt};

use crate::{error::Error, flags::ContainerFlags, reader::ByteReader};

/// Literal 16-byte magic every `.utoc` sidecar starts with
pub const TOC_MAGIC: [u8; 16] = *b"-==--==--==--==-";

/// Exact on-disk size of [`TocHeader`], including the magic
pub const TOC_HEADER_SIZE: u32 = 144;

/// Exact on-disk size of a compression block entry
pub const COMPRESSED_BLOCK_ENTRY_SIZE: u32 = 12;

/// `.utoc` format version. Only `DirectoryIndex` and `PartitionSize` are accepted by
/// `TocHeader::read`: anything older predates fields this parser relies on, and
/// `PerfectHash`/`PerfectHashWithOverflow` are recognized names but carry extra
/// `chunkPerfectHashSeeds`/`chunksWithoutPerfectHash` arrays this parser never reads,
/// so `read` rejects them rather than silently misparsing the tables that follow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TocVersion {
    /// Version field never set
    Invalid = 0,
    /// First shipped layout
    Initial = 1,
    /// Added the embedded directory index
    DirectoryIndex = 2,
    /// Added explicit `partitionCount`/`partitionSize` fields
    PartitionSize = 3,
    /// Added perfect-hash chunk lookup
    PerfectHash = 4,
    /// Added perfect-hash overflow handling
    PerfectHashWithOverflow = 5,
}

impl TryFrom<u8> for TocVersion {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(TocVersion::Invalid),
            1 => Ok(TocVersion::Initial),
            2 => Ok(TocVersion::DirectoryIndex),
            3 => Ok(TocVersion::PartitionSize),
            4 => Ok(TocVersion::PerfectHash),
            5 => Ok(TocVersion::PerfectHashWithOverflow),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }
}

/// Fixed 144-byte TOC header
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TocHeader {
    /// Parsed format version
    pub version: TocVersion,
    /// Size this header claims for itself; must equal [`TOC_HEADER_SIZE`]
    pub header_size: u32,
    /// Number of chunk-id/offset-length/meta entries
    pub entry_count: u32,
    /// Number of compression block entries
    pub compressed_block_entry_count: u32,
    /// Size of each compression block entry; must equal [`COMPRESSED_BLOCK_ENTRY_SIZE`]
    pub compressed_block_entry_size: u32,
    /// Number of named compression methods (not counting the implicit "None" slot)
    pub compression_method_name_count: u32,
    /// Fixed width of each compression method name slot
    pub compression_method_name_length: u32,
    /// Uncompressed size of a single compression block
    pub compression_block_size: u32,
    /// Size in bytes of the directory-index blob, 0 if absent
    pub directory_index_size: u32,
    /// Number of partition files backing this container
    pub partition_count: u32,
    /// Container identifier
    pub container_id: u64,
    /// Guid identifying which key decrypts this container, if encrypted
    pub encryption_key_guid: Guid,
    /// Container-level flags
    pub container_flags: ContainerFlags,
    /// Size in bytes of a single partition file
    pub partition_size: u64,
}

impl TocHeader {
    /// Parse the 144-byte header, including magic and size validation
    pub fn read(reader: &mut ByteReader) -> Result<Self, Error> {
        let magic = reader.read_array_n::<16>()?;
        if magic != TOC_MAGIC {
            return Err(Error::corrupt_toc(format!(
                "invalid .utoc magic, got: {magic:?}"
            )));
        }

        let version = TocVersion::try_from(reader.read_u8()?)?;
        if version < TocVersion::DirectoryIndex {
            return Err(Error::corrupt_toc(format!(
                "unsupported .utoc version {} (minimum supported is DirectoryIndex)",
                version as u8
            )));
        }
        if version > TocVersion::PartitionSize {
            return Err(Error::UnsupportedVersion(version as u8));
        }

        let mut reserved = [0u8; 3];
        reader.read_into(&mut reserved)?;

        let header_size = reader.read_u32()?;
        if header_size != TOC_HEADER_SIZE {
            return Err(Error::corrupt_toc(format!(
                "invalid .utoc header size, expected {TOC_HEADER_SIZE}, got {header_size}"
            )));
        }

        let entry_count = reader.read_u32()?;
        let compressed_block_entry_count = reader.read_u32()?;
        let compressed_block_entry_size = reader.read_u32()?;
        if compressed_block_entry_size != COMPRESSED_BLOCK_ENTRY_SIZE {
            return Err(Error::corrupt_toc(format!(
                "invalid compressed block entry size, expected {COMPRESSED_BLOCK_ENTRY_SIZE}, got {compressed_block_entry_size}"
            )));
        }

        let compression_method_name_count = reader.read_u32()?;
        let compression_method_name_length = reader.read_u32()?;
        let compression_block_size = reader.read_u32()?;
        let directory_index_size = reader.read_u32()?;
        let mut partition_count = reader.read_u32()?;

        let container_id = reader.read_u64()?;
        let encryption_key_guid = reader.read_guid()?;

        let container_flags = ContainerFlags::from_bits_retain(reader.read_u8()?);

        let mut reserved_0 = [0u8; 3];
        reader.read_into(&mut reserved_0)?;

        let _chunk_perfect_hash_seeds_count = reader.read_u32()?;
        let mut partition_size = reader.read_u64()?;
        let _chunks_without_perfect_hash_count = reader.read_u32()?;

        let mut reserved_1 = [0u8; 44];
        reader.read_into(&mut reserved_1)?;

        if version < TocVersion::PartitionSize {
            partition_count = 1;
            partition_size = 0x0FFF_FFFF_FFFF_FFFF;
        }

        Ok(TocHeader {
            version,
            header_size,
            entry_count,
            compressed_block_entry_count,
            compressed_block_entry_size,
            compression_method_name_count,
            compression_method_name_length,
            compression_block_size,
            directory_index_size,
            partition_count,
            container_id,
            encryption_key_guid,
            container_flags,
            partition_size,
        })
    }
}
