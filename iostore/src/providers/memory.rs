//! In-memory provider: lets tests mount a container entirely from byte slices

use std::{collections::HashMap, io::Cursor};

use crate::error::Error;

use super::IoStoreProvider;

/// Opens partition/sidecar "files" backed by borrowed byte slices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryProvider<'data> {
    mappings: HashMap<String, &'data [u8]>,
}

impl<'data> MemoryProvider<'data> {
    /// Start with no file mappings
    pub fn new() -> Self {
        MemoryProvider {
            mappings: HashMap::new(),
        }
    }

    /// Register (or replace) the bytes backing `name`
    pub fn add_mapping(&mut self, name: &str, data: &'data [u8]) {
        self.mappings.insert(name.to_owned(), data);
    }
}

impl<'data> IoStoreProvider<Cursor<&'data [u8]>> for MemoryProvider<'data> {
    fn create_reader_for_file(&self, file_name: &str) -> Result<Cursor<&'data [u8]>, Error> {
        self.mappings
            .get(file_name)
            .map(|data| Cursor::new(*data))
            .ok_or_else(|| Error::unsupported(format!("no in-memory mapping for {file_name}")))
    }
}
