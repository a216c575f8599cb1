//! Chunk reader: resolves a chunk id to a byte range and streams it out block by block

use std::{
    io::{Read, Seek, SeekFrom},
    sync::Arc,
};

use aes::Aes256;

use crate::{
    align,
    chunk_id::ChunkId,
    compression,
    encryption::{self, EncryptionKey, ENCRYPTION_ALIGN},
    error::Error,
    flags::ContainerFlags,
    providers::IoStoreProvider,
    toc::TocResource,
};

/// Lets a caller abort a multi-block read between blocks. Implemented by anything the
/// caller wants, e.g. an `AtomicBool` flag or a channel receiver.
pub trait CancellationToken {
    /// Returns true once the in-flight read should stop
    fn is_cancelled(&self) -> bool;
}

/// A token that never cancels, for callers that don't need the hook
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Reads chunk bytes out of a mounted container's partition files
pub struct ChunkReader<R, P>
where
    R: Read + Seek,
    P: IoStoreProvider<R>,
{
    toc: Arc<TocResource>,
    provider: P,
    base_name: String,
    aes: Option<Aes256>,
    _marker: std::marker::PhantomData<R>,
}

impl<R, P> ChunkReader<R, P>
where
    R: Read + Seek,
    P: IoStoreProvider<R>,
{
    /// Build a reader over an already-parsed TOC.
    ///
    /// `base_name` is the container's base file name without extension, e.g. `"Pak"`
    /// for `Pak.utoc`/`Pak.ucas`; partition `i` is opened as `"{base_name}.ucas"` when
    /// `i == 0` and `"{base_name}_s{i}.ucas"` otherwise.
    pub fn new(
        toc: Arc<TocResource>,
        provider: P,
        base_name: impl Into<String>,
        encryption_key: Option<EncryptionKey>,
    ) -> Result<Self, Error> {
        if toc.header.container_flags.contains(ContainerFlags::ENCRYPTED) && encryption_key.is_none() {
            return Err(Error::MissingKey(toc.header.encryption_key_guid));
        }

        Ok(ChunkReader {
            toc,
            provider,
            base_name: base_name.into(),
            aes: encryption_key.map(|key| encryption::cipher(&key)),
            _marker: std::marker::PhantomData,
        })
    }

    /// Read the full byte range for `chunk_id`
    pub fn read(&self, chunk_id: &ChunkId) -> Result<Vec<u8>, Error> {
        self.read_cancellable(chunk_id, &NeverCancelled)
    }

    /// Read the full byte range for `chunk_id`, checking `token` between blocks
    pub fn read_cancellable(
        &self,
        chunk_id: &ChunkId,
        token: &dyn CancellationToken,
    ) -> Result<Vec<u8>, Error> {
        let offset_and_length = self
            .toc
            .offset_and_length(chunk_id)
            .ok_or(Error::UnknownChunk(*chunk_id))?;

        let mut dst = vec![0u8; offset_and_length.length as usize];
        self.read_into(offset_and_length.offset, &mut dst, token)?;
        Ok(dst)
    }

    /// Read `dst.len()` bytes starting at logical offset `offset` into the combined
    /// content stream, decrypting and decompressing each compression block on the way.
    pub fn read_into(
        &self,
        offset: u64,
        dst: &mut [u8],
        token: &dyn CancellationToken,
    ) -> Result<(), Error> {
        let block_size = self.toc.header.compression_block_size as u64;

        let first_block = offset / block_size;
        let last_block_end = align::align(offset + dst.len() as u64, block_size);
        let last_block = if last_block_end == 0 {
            0
        } else {
            (last_block_end - 1) / block_size
        };

        let mut offset_in_block = offset % block_size;
        let mut remaining = dst.len();
        let mut dst_cursor = 0usize;

        for block_index in first_block..=last_block {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let block = &self.toc.compression_blocks[block_index as usize];

            let partition_size = self.toc.header.partition_size;
            let partition_index = block.offset / partition_size;
            let partition_offset = block.offset % partition_size;

            let raw_size = align::align(block.compressed_size as u64, ENCRYPTION_ALIGN) as usize;

            let mut raw = vec![0u8; raw_size];
            let mut handle = self.open_partition(partition_index)?;
            handle.seek(SeekFrom::Start(partition_offset))?;
            handle.read_exact(&mut raw).map_err(|_| Error::ShortRead {
                partition: partition_index,
                expected: raw_size,
                got: 0,
            })?;

            if let Some(aes) = &self.aes {
                encryption::decrypt(aes, &mut raw)?;
            }

            let source: Vec<u8> = if block.compression_method_index == 0 {
                raw
            } else {
                let method = self.toc.compression_method(block);
                let mut decompressed = vec![0u8; block.uncompressed_size as usize];
                compression::decompress(method, &raw, &mut decompressed)?;
                decompressed
            };

            let copy_len = remaining.min((block_size - offset_in_block) as usize);
            let start = offset_in_block as usize;
            dst[dst_cursor..dst_cursor + copy_len]
                .copy_from_slice(&source[start..start + copy_len]);

            offset_in_block = 0;
            remaining -= copy_len;
            dst_cursor += copy_len;

            if remaining == 0 {
                break;
            }
        }

        Ok(())
    }

    fn open_partition(&self, partition_index: u64) -> Result<R, Error> {
        let file_name = if partition_index == 0 {
            format!("{}.ucas", self.base_name)
        } else {
            format!("{}_s{}.ucas", self.base_name, partition_index)
        };
        self.provider.create_reader_for_file(&file_name)
    }
}
