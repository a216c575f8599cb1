//! Container and entry flag sets

use bitflags::bitflags;

bitflags! {
    /// Container-level flags read from the TOC header
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ContainerFlags: u8 {
        /// No flags set
        const NONE = 0x0;
        /// Chunk data is stored compressed
        const COMPRESSED = 1 << 0;
        /// Chunk data and the directory index are AES-encrypted
        const ENCRYPTED = 1 << 1;
        /// Compression blocks carry a SHA-1 signature (parsed, never verified here)
        const SIGNED = 1 << 2;
        /// A directory index blob follows the compression method table
        const INDEXED = 1 << 3;
    }

    /// Per-entry metadata flags, read only when `TocReadOptions::READ_TOC_META` is set
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct TocEntryMetaFlags: u8 {
        /// No flags set
        const NONE = 0x0;
        /// Entry data is stored compressed
        const COMPRESSED = 1 << 0;
        /// Entry may be memory-mapped by the engine
        const MEMORY_MAPPED = 1 << 1;
    }

    /// Caller-selected optional TOC sections, so a `list_files`-only caller can skip
    /// retaining the chunk-meta table and a `read`-only caller can skip the directory
    /// index blob.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct TocReadOptions: u8 {
        /// No optional sections requested
        const NONE = 0x0;
        /// Capture the directory-index blob for later traversal
        const READ_DIRECTORY_INDEX = 1 << 0;
        /// Read the per-entry chunk-hash/flags table
        const READ_TOC_META = 1 << 1;
    }
}
