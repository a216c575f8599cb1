//! Container mount: opens a `.utoc`/`.ucas` set and exposes the public read surface

use std::{
    io::{Cursor, Read, Seek},
    sync::{Arc, Mutex, OnceLock},
};

use unreal_helpers::Guid;

use crate::{
    cas::{CancellationToken, ChunkReader},
    chunk_id::ChunkId,
    error::Error,
    flags::{ContainerFlags, TocReadOptions},
    keys::KeyResolver,
    providers::{file::FileProvider, memory::MemoryProvider, IoStoreProvider},
    reader::ByteReader,
    toc::{DirectoryIndex, OffsetAndLength, TocResource},
};

/// Lifecycle state of a [`Container`]. `mount`/`mount_from_memory` always return a
/// `Mounted` instance; `Unmounted` exists only as a marker for callers building their
/// own state machines around this type. `close` moves a container to `Closed`,
/// releasing its file handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerState {
    /// Not yet mounted
    Unmounted,
    /// TOC loaded, partition handles open
    Mounted,
    /// File handles released; reads are no longer possible
    Closed,
}

/// A mounted IoStore container: TOC tables plus the partition files backing them.
///
/// `read` takes no global lock; concurrent calls each allocate their own scratch
/// buffers. On platforms where a file handle has a shared cursor (this crate opens one
/// `File` per partition via `FileProvider`), concurrent calls against the *same*
/// partition still serialize on that cursor — an accepted limitation, not a
/// correctness issue, since each call seeks before it reads.
pub struct Container<R, P>
where
    R: Read + Seek,
    P: IoStoreProvider<R>,
{
    toc: Arc<TocResource>,
    reader: ChunkReader<R, P>,
    directory_index: OnceLock<DirectoryIndex>,
    raw_directory_index_blob: Mutex<Option<Vec<u8>>>,
    state: ContainerState,
}

impl<R, P> Container<R, P>
where
    R: Read + Seek,
    P: IoStoreProvider<R>,
{
    fn from_parts(
        toc: TocResource,
        provider: P,
        base_name: String,
        encryption_key: Option<[u8; 32]>,
    ) -> Result<Self, Error> {
        let raw_blob = toc.directory_index_blob.clone();
        let toc = Arc::new(toc);

        let reader = ChunkReader::new(Arc::clone(&toc), provider, base_name, encryption_key)?;

        Ok(Container {
            toc,
            reader,
            directory_index: OnceLock::new(),
            raw_directory_index_blob: Mutex::new(raw_blob),
            state: ContainerState::Mounted,
        })
    }

    /// Container identifier, read directly from the header
    pub fn container_id(&self) -> u64 {
        self.toc.header.container_id
    }

    /// Container-level flags (`Compressed`/`Encrypted`/`Signed`/`Indexed`)
    pub fn container_flags(&self) -> ContainerFlags {
        self.toc.header.container_flags
    }

    /// Guid identifying which key decrypts this container, if any
    pub fn encryption_key_guid(&self) -> Guid {
        self.toc.header.encryption_key_guid
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// `(offset, length)` for `chunk_id`, if present in the TOC
    pub fn offset_and_length(&self, chunk_id: &ChunkId) -> Option<OffsetAndLength> {
        self.toc.offset_and_length(chunk_id)
    }

    /// Read the full decompressed, decrypted byte range for `chunk_id`
    pub fn read(&self, chunk_id: &ChunkId) -> Result<Vec<u8>, Error> {
        self.reader.read(chunk_id)
    }

    /// Read `chunk_id`, checking `token` between blocks so a caller can abort a large read
    pub fn read_cancellable(
        &self,
        chunk_id: &ChunkId,
        token: &dyn CancellationToken,
    ) -> Result<Vec<u8>, Error> {
        self.reader.read_cancellable(chunk_id, token)
    }

    /// `(path, chunk_table_index)` for every file reachable from the directory index
    /// root. Parses the directory index on first call (see [`Container::directory_index`])
    /// and returns an empty list for containers mounted without `Indexed`/`READ_DIRECTORY_INDEX`.
    pub fn list_files(&self) -> Result<Vec<(String, u32)>, Error> {
        match self.directory_index()? {
            Some(index) => Ok(index.list_files()),
            None => Ok(Vec::new()),
        }
    }

    /// Lazily parse and cache the directory index.
    ///
    /// Uses a one-shot initializer: the first call from any thread pays the parse
    /// cost, every later call (from any thread) observes the already-built tree. The
    /// raw blob is released once parsed.
    pub fn directory_index(&self) -> Result<Option<&DirectoryIndex>, Error> {
        if let Some(index) = self.directory_index.get() {
            return Ok(Some(index));
        }

        let mut guard = self
            .raw_directory_index_blob
            .lock()
            .expect("directory index blob mutex poisoned");

        if let Some(index) = self.directory_index.get() {
            return Ok(Some(index));
        }

        let Some(blob) = guard.take() else {
            return Ok(None);
        };
        drop(guard);

        let parsed = DirectoryIndex::read(&mut ByteReader::new(&blob))?;
        let _ = self.directory_index.set(parsed);
        Ok(self.directory_index.get())
    }

    /// Release partition file handles. Further reads will fail once the underlying
    /// handles are dropped by the platform.
    pub fn close(&mut self) {
        self.state = ContainerState::Closed;
    }
}

/// Mount a container backed by files in a folder on disk.
///
/// `base_path` is the container's base name without extension (e.g. `"Game/Content"`
/// for `Game/Content.utoc`); `keys` resolves the decryption key if `Encrypted` is set.
pub fn mount(
    base_path: &str,
    keys: &dyn KeyResolver,
    options: TocReadOptions,
) -> Result<Container<std::fs::File, FileProvider>, Error> {
    let (folder, base_name) = split_base_path(base_path);
    let provider = FileProvider::new(folder);

    let utoc_path = format!("{base_path}.utoc");
    let mut utoc_file =
        std::fs::File::open(&utoc_path).map_err(|source| Error::ContainerOpenFailed {
            path: utoc_path.clone().into_boxed_str(),
            source,
        })?;

    let mut utoc_bytes = Vec::new();
    utoc_file
        .read_to_end(&mut utoc_bytes)
        .map_err(|source| Error::ContainerOpenFailed {
            path: utoc_path.into_boxed_str(),
            source,
        })?;

    // The header alone tells us whether the container is encrypted; peek it before
    // asking the resolver for a key so an unencrypted container never requires one.
    let peeked_flags = peek_container_flags(&utoc_bytes)?;
    let peeked_guid = peek_encryption_key_guid(&utoc_bytes)?;

    let encryption_key = if peeked_flags.contains(ContainerFlags::ENCRYPTED) {
        let key = keys.lookup(&peeked_guid).ok_or_else(|| {
            log::error!("no key registered for container encryption guid {peeked_guid}");
            Error::MissingKey(peeked_guid)
        })?;
        Some(key)
    } else {
        None
    };

    let toc = TocResource::read(&utoc_bytes, options, encryption_key)?;

    for partition in 1..toc.header.partition_count {
        let path = format!("{base_path}_s{partition}.ucas");
        std::fs::File::open(&path).map_err(|source| {
            log::error!("failed to open partition file {path}: {source}");
            Error::ContainerOpenFailed {
                path: path.into_boxed_str(),
                source,
            }
        })?;
    }
    let primary = format!("{base_path}.ucas");
    std::fs::File::open(&primary).map_err(|source| {
        log::error!("failed to open partition file {primary}: {source}");
        Error::ContainerOpenFailed {
            path: primary.into_boxed_str(),
            source,
        }
    })?;

    Container::from_parts(toc, provider, base_name, encryption_key)
}

/// Mount a container entirely from in-memory byte slices. Only a single partition is
/// supported through this entry point; a multi-partition container fails with
/// `Error::Unsupported`.
pub fn mount_from_memory<'data>(
    utoc_bytes: &'data [u8],
    ucas_bytes: &'data [u8],
    keys: &dyn KeyResolver,
    options: TocReadOptions,
) -> Result<Container<Cursor<&'data [u8]>, MemoryProvider<'data>>, Error> {
    let peeked_flags = peek_container_flags(utoc_bytes)?;
    let peeked_guid = peek_encryption_key_guid(utoc_bytes)?;

    let encryption_key = if peeked_flags.contains(ContainerFlags::ENCRYPTED) {
        let key = keys.lookup(&peeked_guid).ok_or_else(|| {
            log::error!("no key registered for container encryption guid {peeked_guid}");
            Error::MissingKey(peeked_guid)
        })?;
        Some(key)
    } else {
        None
    };

    let toc = TocResource::read(utoc_bytes, options, encryption_key)?;
    if toc.header.partition_count > 1 {
        log::error!("mount_from_memory cannot open a {}-partition container", toc.header.partition_count);
        return Err(Error::unsupported(
            "mount_from_memory only supports a single partition",
        ));
    }

    let mut provider = MemoryProvider::new();
    provider.add_mapping("container.ucas", ucas_bytes);

    Container::from_parts(toc, provider, "container".to_owned(), encryption_key)
}

fn split_base_path(base_path: &str) -> (std::path::PathBuf, String) {
    let path = std::path::Path::new(base_path);
    let folder = path.parent().map(|p| p.to_path_buf()).unwrap_or_default();
    let base_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (folder, base_name)
}

/// `containerFlags` lives at a fixed byte offset inside the header; peeking it does
/// not require knowing the encryption key (flags are never themselves encrypted).
fn peek_container_flags(utoc_bytes: &[u8]) -> Result<ContainerFlags, Error> {
    // magic(16) + version(1) + reserved(3) + header_size(4) + entry_count(4)
    // + compressed_block_entry_count(4) + compressed_block_entry_size(4)
    // + compression_method_name_count(4) + compression_method_name_length(4)
    // + compression_block_size(4) + directory_index_size(4) + partition_count(4)
    // + container_id(8) + encryption_key_guid(16) = 80; flags is the next byte.
    const FLAGS_OFFSET: usize = 80;
    utoc_bytes
        .get(FLAGS_OFFSET)
        .map(|b| ContainerFlags::from_bits_retain(*b))
        .ok_or_else(|| {
            Error::corrupt_toc(format!(
                "invalid .utoc header size, expected at least {} bytes, got {}",
                crate::toc::header::TOC_HEADER_SIZE,
                utoc_bytes.len()
            ))
        })
}

fn peek_encryption_key_guid(utoc_bytes: &[u8]) -> Result<Guid, Error> {
    const GUID_OFFSET: usize = 64;
    let bytes: [u8; 16] = utoc_bytes
        .get(GUID_OFFSET..GUID_OFFSET + 16)
        .ok_or_else(|| {
            Error::corrupt_toc(format!(
                "invalid .utoc header size, expected at least {} bytes, got {}",
                crate::toc::header::TOC_HEADER_SIZE,
                utoc_bytes.len()
            ))
        })?
        .try_into()
        .expect("slice of length 16");
    Ok(Guid::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_offset_matches_header_layout() {
        let mut bytes = vec![0u8; 80];
        bytes.push(0b0000_1010); // Encrypted and Indexed bits set, Compressed not set
        let flags = peek_container_flags(&bytes).unwrap();
        assert!(flags.contains(ContainerFlags::ENCRYPTED));
        assert!(flags.contains(ContainerFlags::INDEXED));
        assert!(!flags.contains(ContainerFlags::COMPRESSED));
    }

    #[test]
    fn guid_offset_matches_header_layout() {
        let mut bytes = vec![0u8; 64];
        let guid_bytes: [u8; 16] = core::array::from_fn(|i| i as u8 + 1);
        bytes.extend_from_slice(&guid_bytes);
        let guid = peek_encryption_key_guid(&bytes).unwrap();
        assert_eq!(guid, Guid::new(guid_bytes));
    }
}
