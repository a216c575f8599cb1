//! TOC (`.utoc`) parsing: header, chunk tables, compression blocks, directory index

pub mod header;
pub mod index;

use std::collections::HashMap;

use crate::{
    chunk_id::ChunkId,
    compression::CompressionMethod,
    encryption::{self, EncryptionKey, ENCRYPTION_ALIGN},
    error::Error,
    flags::{ContainerFlags, TocReadOptions},
    reader::ByteReader,
};

pub use header::{TocHeader, TocVersion};
pub use index::DirectoryIndex;

/// Decoded offset/length pair for one chunk, as stored in the 10-byte packed record
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OffsetAndLength {
    /// Offset of this chunk's data within the combined content stream
    pub offset: u64,
    /// Length of this chunk's data
    pub length: u64,
}

impl OffsetAndLength {
    /// Read the 10-byte packed record: two big-endian 40-bit fields
    pub fn read(reader: &mut ByteReader) -> Result<Self, Error> {
        let value = reader.read_array_n::<10>()?;

        let offset = (value[4] as u64)
            | ((value[3] as u64) << 8)
            | ((value[2] as u64) << 16)
            | ((value[1] as u64) << 24)
            | ((value[0] as u64) << 32);

        let length = (value[9] as u64)
            | ((value[8] as u64) << 8)
            | ((value[7] as u64) << 16)
            | ((value[6] as u64) << 24)
            | ((value[5] as u64) << 32);

        Ok(OffsetAndLength { offset, length })
    }
}

/// Decoded 12-byte compression block descriptor
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CompressedBlockEntry {
    /// Offset of this block within the combined content stream
    pub offset: u64,
    /// On-disk (compressed, pre-alignment) size
    pub compressed_size: u32,
    /// Size once decompressed
    pub uncompressed_size: u32,
    /// Index into the method table; 0 means "stored uncompressed"
    pub compression_method_index: u8,
}

impl CompressedBlockEntry {
    const OFFSET_MASK: u64 = (1u64 << 40) - 1;
    const SIZE_MASK: u32 = (1u32 << 24) - 1;

    /// Read the 12-byte bit-packed block descriptor.
    ///
    /// `compression_method_index` is the last byte of the record (`value[11]`); this
    /// matches this workspace's own `IoStoreTocCompressedBlockEntry::read`, which has
    /// been cross-checked against real `.utoc` fixtures.
    pub fn read(reader: &mut ByteReader) -> Result<Self, Error> {
        let value = reader.read_array_n::<12>()?;

        let offset = u64::from_le_bytes(value[..8].try_into().unwrap()) & Self::OFFSET_MASK;
        let compressed_size =
            (u32::from_le_bytes(value[4..8].try_into().unwrap()) >> 8) & Self::SIZE_MASK;
        let uncompressed_size = u32::from_le_bytes(value[8..12].try_into().unwrap()) & Self::SIZE_MASK;
        let compression_method_index = value[11];

        Ok(CompressedBlockEntry {
            offset,
            compressed_size,
            uncompressed_size,
            compression_method_index,
        })
    }
}

/// Per-entry metadata: chunk hash plus compressed/memory-mapped flags, read only when
/// `TocReadOptions::READ_TOC_META` is requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TocEntryMeta {
    /// Chunk hash, first 20 bytes significant
    pub chunk_hash: crate::chunk_id::ChunkHash,
    /// Entry flags
    pub flags: crate::flags::TocEntryMetaFlags,
}

impl TocEntryMeta {
    fn read(reader: &mut ByteReader) -> Result<Self, Error> {
        let chunk_hash = crate::chunk_id::ChunkHash::read(reader)?;
        let flags = crate::flags::TocEntryMetaFlags::from_bits_retain(reader.read_u8()?);
        Ok(TocEntryMeta { chunk_hash, flags })
    }
}

/// Fully parsed `.utoc` sidecar
#[derive(Debug, Clone)]
pub struct TocResource {
    /// Parsed header
    pub header: TocHeader,
    /// Chunk ids, parallel to `chunk_offsets_lengths`
    pub chunk_ids: Vec<ChunkId>,
    /// Offset/length per chunk, parallel to `chunk_ids`
    pub chunk_offsets_lengths: Vec<OffsetAndLength>,
    /// Compression block descriptors
    pub compression_blocks: Vec<CompressedBlockEntry>,
    /// Resolved compression methods; index 0 is always `None`
    pub compression_methods: Vec<CompressionMethod>,
    /// Raw (already-decrypted) directory-index bytes, present only if `Indexed` was set
    /// and `READ_DIRECTORY_INDEX` was requested. Parsed lazily, see `Container`.
    pub directory_index_blob: Option<Vec<u8>>,
    /// Per-entry chunk hash/flags, present only if `READ_TOC_META` was requested
    pub chunk_metas: Vec<TocEntryMeta>,
    /// `chunk_id -> index into chunk_ids/chunk_offsets_lengths/chunk_metas`.
    /// When two chunk ids collide, the later entry wins.
    chunk_index: HashMap<ChunkId, usize>,
}

impl TocResource {
    /// Parse a `.utoc` buffer.
    ///
    /// `encryption_key` must be supplied whenever the container is both `Encrypted`
    /// and `Indexed` with `READ_DIRECTORY_INDEX` requested, since the directory-index
    /// blob is encrypted the same way chunk data is.
    pub fn read(
        data: &[u8],
        options: TocReadOptions,
        encryption_key: Option<EncryptionKey>,
    ) -> Result<Self, Error> {
        let mut reader = ByteReader::new(data);

        let header = TocHeader::read(&mut reader)?;

        let chunk_ids = reader.read_array(header.entry_count as usize, |r| ChunkId::read(r))?;
        let chunk_offsets_lengths =
            reader.read_array(header.entry_count as usize, OffsetAndLength::read)?;

        let compression_blocks = reader.read_array(
            header.compressed_block_entry_count as usize,
            CompressedBlockEntry::read,
        )?;

        let mut compression_methods = vec![CompressionMethod::None];
        for _ in 0..header.compression_method_name_count {
            let mut name = reader.read_bytes(header.compression_method_name_length as usize)?;
            let nul_at = name.iter().position(|b| *b == 0).unwrap_or(name.len());
            name.truncate(nul_at);
            compression_methods.push(CompressionMethod::new(String::from_utf8_lossy(&name).as_ref()));
        }

        if header.container_flags.contains(ContainerFlags::SIGNED) {
            log::warn!("container {} is signed; block signatures are parsed but not verified", header.container_id);
            let hash_size = reader.read_u32()?;
            reader.skip(hash_size as u64 * 2)?;
            reader.skip(header.compressed_block_entry_count as u64 * 20)?;
        }

        // Only the raw (decrypted) bytes are captured here; parsing into a `DirectoryIndex`
        // happens lazily on first traversal (see `Container::directory_index`), so a caller
        // that mounts many containers and only reads a handful of files never pays to
        // walk the tree of the ones it doesn't.
        let directory_index_blob = if header.container_flags.contains(ContainerFlags::INDEXED)
            && header.directory_index_size > 0
        {
            if header.container_flags.contains(ContainerFlags::ENCRYPTED) {
                let Some(key) = encryption_key else {
                    return Err(Error::MissingKey(header.encryption_key_guid));
                };

                let mut blob = reader.read_bytes(header.directory_index_size as usize)?;
                debug_assert_eq!(blob.len() as u64 % ENCRYPTION_ALIGN, 0);

                let aes = encryption::cipher(&key);
                encryption::decrypt(&aes, &mut blob)?;

                if options.contains(TocReadOptions::READ_DIRECTORY_INDEX) {
                    Some(blob)
                } else {
                    None
                }
            } else if options.contains(TocReadOptions::READ_DIRECTORY_INDEX) {
                Some(reader.read_bytes(header.directory_index_size as usize)?)
            } else {
                reader.skip(header.directory_index_size as u64)?;
                None
            }
        } else {
            None
        };

        let chunk_metas = if options.contains(TocReadOptions::READ_TOC_META) {
            reader.read_array(header.entry_count as usize, TocEntryMeta::read)?
        } else {
            Vec::new()
        };

        let mut chunk_index = HashMap::with_capacity(chunk_ids.len());
        for (index, id) in chunk_ids.iter().enumerate() {
            chunk_index.insert(*id, index);
        }

        Ok(TocResource {
            header,
            chunk_ids,
            chunk_offsets_lengths,
            compression_blocks,
            compression_methods,
            directory_index_blob,
            chunk_metas,
            chunk_index,
        })
    }

    /// Look up a chunk id's position in the parallel entry arrays.
    ///
    /// Returns `None` when absent; a present entry at index 0 is distinguishable from
    /// "not found" since this is an `Option`, never a sentinel index.
    pub fn entry_index(&self, chunk_id: &ChunkId) -> Option<usize> {
        self.chunk_index.get(chunk_id).copied()
    }

    /// Look up a chunk's `(offset, length)` pair
    pub fn offset_and_length(&self, chunk_id: &ChunkId) -> Option<OffsetAndLength> {
        self.entry_index(chunk_id)
            .map(|index| self.chunk_offsets_lengths[index])
    }

    /// Resolve a block's compression method; index 0 is always `None`
    pub fn compression_method(&self, block: &CompressedBlockEntry) -> &CompressionMethod {
        &self.compression_methods[block.compression_method_index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_length_round_trips_big_endian_40_bit_fields() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x00]); // offset = 0x0100
        buf.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x07]); // length = 7
        let mut reader = ByteReader::new(&buf);
        let decoded = OffsetAndLength::read(&mut reader).unwrap();
        assert_eq!(decoded.offset, 0x100);
        assert_eq!(decoded.length, 7);
    }

    #[test]
    fn compressed_block_entry_uses_last_byte_for_method_index() {
        let mut value = [0u8; 12];
        value[11] = 3;
        value[8] = 0xC8; // uncompressed_size low byte = 200
        let mut reader = ByteReader::new(&value);
        let entry = CompressedBlockEntry::read(&mut reader).unwrap();
        assert_eq!(entry.compression_method_index, 3);
        assert_eq!(entry.uncompressed_size, 200);
    }

    #[test]
    fn zero_index_chunk_is_found_not_missing() {
        let id = ChunkId::new(1, 0, 2);

        let mut toc = toc_stub();
        toc.chunk_ids.push(id);
        toc.chunk_offsets_lengths.push(OffsetAndLength {
            offset: 0,
            length: 0,
        });
        toc.chunk_index.insert(id, 0usize);

        assert_eq!(toc.entry_index(&id), Some(0));
        assert_eq!(
            toc.entry_index(&ChunkId::new(0xDEAD, 0, 0)),
            None,
            "absent chunk id must not be confused with index 0"
        );
    }

    fn toc_stub() -> TocResource {
        TocResource {
            header: TocHeader {
                version: TocVersion::DirectoryIndex,
                header_size: header::TOC_HEADER_SIZE,
                entry_count: 0,
                compressed_block_entry_count: 0,
                compressed_block_entry_size: header::COMPRESSED_BLOCK_ENTRY_SIZE,
                compression_method_name_count: 0,
                compression_method_name_length: 32,
                compression_block_size: 0x10000,
                directory_index_size: 0,
                partition_count: 1,
                container_id: 0,
                encryption_key_guid: unreal_helpers::Guid::new([0u8; 16]),
                container_flags: ContainerFlags::NONE,
                partition_size: 0x0FFF_FFFF_FFFF_FFFF,
            },
            chunk_ids: Vec::new(),
            chunk_offsets_lengths: Vec::new(),
            compression_blocks: Vec::new(),
            compression_methods: vec![CompressionMethod::None],
            directory_index_blob: None,
            chunk_metas: Vec::new(),
            chunk_index: HashMap::new(),
        }
    }
}
