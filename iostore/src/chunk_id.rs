//! Chunk identifiers and type tags

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, BE, LE};

use crate::error::Error;

/// 96-bit chunk identifier: a 64-bit id, a 16-bit index, one padding byte, and an
/// 8-bit type tag. Equality and hashing are bytewise, matching how the TOC uses it as
/// a hash-map key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChunkId {
    /// Owning id, interpretation depends on `chunk_type`
    pub chunk_id: u64,
    /// Sub-index within the owning id
    pub chunk_index: u16,
    /// Raw type tag, see [`ChunkType`] for the known values
    pub chunk_type: u8,
}

impl ChunkId {
    /// Build a chunk id from its parts
    pub fn new(chunk_id: u64, chunk_index: u16, chunk_type: u8) -> Self {
        ChunkId {
            chunk_id,
            chunk_index,
            chunk_type,
        }
    }

    /// Read a 12-byte chunk id: little-endian id, big-endian index, a padding byte, then the type tag
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let chunk_id = reader.read_u64::<LE>()?;
        let chunk_index = reader.read_u16::<BE>()?;
        let _padding = reader.read_u8()?;
        let chunk_type = reader.read_u8()?;

        Ok(ChunkId {
            chunk_id,
            chunk_index,
            chunk_type,
        })
    }

    /// Write a chunk id back out in its 12-byte wire form
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_u64::<LE>(self.chunk_id)?;
        writer.write_u16::<BE>(self.chunk_index)?;
        writer.write_u8(0)?;
        writer.write_u8(self.chunk_type)?;
        Ok(())
    }

    /// Symbolic name for this chunk's type tag, if recognized under either numbering
    pub fn chunk_type(&self) -> ChunkType {
        ChunkType::from(self.chunk_type)
    }
}

/// Symbolic chunk type, covering both the legacy (pre-UE5) and version-5 numbering.
/// The core treats the wire byte as opaque for indexing; this enum exists only so
/// callers can get a name instead of a bare `u8`. An unrecognized byte is not an
/// error: it surfaces as `Unknown`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// Invalid/unset chunk (legacy and v5 both use tag 0)
    Invalid,
    /// Install manifest (legacy numbering)
    InstallManifest,
    /// Export bundle data
    ExportBundleData,
    /// Bulk data
    BulkData,
    /// Optional bulk data
    OptionalBulkData,
    /// Memory mapped bulk data
    MemoryMappedBulkData,
    /// Loader global metadata (legacy numbering)
    LoaderGlobalMeta,
    /// Loader initial load metadata (legacy numbering)
    LoaderInitialLoadMeta,
    /// Loader global names (legacy numbering)
    LoaderGlobalNames,
    /// Loader global name hashes (legacy numbering)
    LoaderGlobalNameHashes,
    /// Container header
    ContainerHeader,
    /// Script objects (v5 numbering)
    ScriptObjects,
    /// External file (v5 numbering)
    ExternalFile,
    /// Shader code library (v5 numbering)
    ShaderCodeLibrary,
    /// Shader code (v5 numbering)
    ShaderCode,
    /// Package store entry (v5 numbering)
    PackageStoreEntry,
    /// Derived data (v5 numbering)
    DerivedData,
    /// Editor derived data (v5 numbering)
    EditorDerivedData,
    /// Tag not recognized under either numbering
    Unknown(u8),
}

impl From<u8> for ChunkType {
    fn from(value: u8) -> Self {
        match value {
            0 => ChunkType::Invalid,
            1 => ChunkType::InstallManifest,
            2 => ChunkType::ExportBundleData,
            3 => ChunkType::BulkData,
            4 => ChunkType::OptionalBulkData,
            5 => ChunkType::MemoryMappedBulkData,
            6 => ChunkType::LoaderGlobalMeta,
            7 => ChunkType::LoaderInitialLoadMeta,
            8 => ChunkType::LoaderGlobalNames,
            9 => ChunkType::LoaderGlobalNameHashes,
            10 => ChunkType::ContainerHeader,
            _ => ChunkType::Unknown(value),
        }
    }
}

impl ChunkType {
    /// Reinterpret the same raw byte under the version-5 chunk type numbering
    pub fn from_v5(value: u8) -> ChunkType {
        match value {
            0 => ChunkType::Invalid,
            1 => ChunkType::ExportBundleData,
            2 => ChunkType::BulkData,
            3 => ChunkType::OptionalBulkData,
            4 => ChunkType::MemoryMappedBulkData,
            5 => ChunkType::ScriptObjects,
            6 => ChunkType::ContainerHeader,
            7 => ChunkType::ExternalFile,
            8 => ChunkType::ShaderCodeLibrary,
            9 => ChunkType::ShaderCode,
            10 => ChunkType::PackageStoreEntry,
            11 => ChunkType::DerivedData,
            12 => ChunkType::EditorDerivedData,
            _ => ChunkType::Unknown(value),
        }
    }
}

/// 32-byte chunk hash stored in the optional per-entry meta table
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChunkHash {
    /// Raw hash bytes; only the first 20 are meaningful (SHA-1)
    pub value: [u8; 32],
}

impl ChunkHash {
    /// Read the 32-byte hash
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let mut value = [0u8; 32];
        reader.read_exact(&mut value)?;
        Ok(ChunkHash { value })
    }

    /// Write the 32-byte hash back out
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_all(&self.value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{ChunkId, ChunkType};

    #[test]
    fn round_trips_through_the_wire_form() {
        let id = ChunkId::new(0x1122_3344_5566_7788, 0x0102, 2);
        let mut buf = Vec::new();
        id.write(&mut buf).unwrap();
        assert_eq!(buf.len(), 12);

        let read_back = ChunkId::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(read_back, id);
    }

    #[test]
    fn index_is_big_endian_on_the_wire() {
        let id = ChunkId::new(0, 0x0102, 0);
        let mut buf = Vec::new();
        id.write(&mut buf).unwrap();
        assert_eq!(&buf[8..10], &[0x01, 0x02]);
    }

    #[test]
    fn unknown_tag_is_not_an_error() {
        assert_eq!(ChunkType::from(200), ChunkType::Unknown(200));
    }
}
