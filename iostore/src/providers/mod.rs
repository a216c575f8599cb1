//! Partition file access, abstracted so a mount can be backed by real files or by
//! in-memory byte slices (mirrors this workspace's existing `.ucas` provider abstraction).

use std::io::{Read, Seek};

use crate::error::Error;

pub mod file;
pub mod memory;

/// Opens a readable, seekable handle for a named partition file
pub trait IoStoreProvider<R: Read + Seek> {
    /// Open the partition or sidecar file named `file_name` (e.g. `"Pak.ucas"`, `"Pak_s1.ucas"`)
    fn create_reader_for_file(&self, file_name: &str) -> Result<R, Error>;
}
