//! Directory-index tree: mount point, directory/file entry arrays, and string pool

use unreal_helpers::UnrealReadExt;

use crate::{error::Error, reader::ByteReader};

/// Sentinel marking "no entry" in the directory/file entry cross-reference fields
pub const INVALID_INDEX: u32 = u32::MAX;

/// Index of the root directory entry
pub const ROOT_INDEX: u32 = 0;

/// One node in the directory tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryEntry {
    /// Index into the string pool for this directory's own name
    pub name: u32,
    /// First child directory, or [`INVALID_INDEX`]
    pub first_child_entry: u32,
    /// Next sibling directory under the same parent, or [`INVALID_INDEX`]
    pub next_sibling_entry: u32,
    /// First file entry directly under this directory, or [`INVALID_INDEX`]
    pub first_file_entry: u32,
}

impl DirectoryEntry {
    /// Read one 16-byte directory entry
    pub fn read(reader: &mut ByteReader) -> Result<Self, Error> {
        Ok(DirectoryEntry {
            name: reader.read_u32()?,
            first_child_entry: reader.read_u32()?,
            next_sibling_entry: reader.read_u32()?,
            first_file_entry: reader.read_u32()?,
        })
    }
}

/// One file leaf in the directory tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    /// Index into the string pool for this file's name
    pub name: u32,
    /// Next file entry under the same directory, or [`INVALID_INDEX`]
    pub next_file_entry: u32,
    /// Index into the TOC's chunk-id/offset-length arrays
    pub user_data: u32,
}

impl FileEntry {
    /// Read one 12-byte file entry
    pub fn read(reader: &mut ByteReader) -> Result<Self, Error> {
        Ok(FileEntry {
            name: reader.read_u32()?,
            next_file_entry: reader.read_u32()?,
            user_data: reader.read_u32()?,
        })
    }
}

/// Parsed directory-index blob
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryIndex {
    /// Mount point string prefixed to every emitted path, e.g. `"/Game/"`
    pub mount_point: Option<String>,
    /// All directory nodes, root first
    pub directory_entries: Vec<DirectoryEntry>,
    /// All file leaves
    pub file_entries: Vec<FileEntry>,
    /// Interned names referenced by `name` fields above
    pub string_table: Vec<Option<String>>,
}

impl DirectoryIndex {
    /// Parse a directory index from an already-decrypted blob
    pub fn read(reader: &mut ByteReader) -> Result<Self, Error> {
        let mount_point = reader.read_fstring()?;

        let directory_entries_count = reader.read_i32()?;
        let directory_entries = reader.read_array(directory_entries_count.max(0) as usize, |r| {
            DirectoryEntry::read(r)
        })?;

        let file_entries_count = reader.read_i32()?;
        let file_entries =
            reader.read_array(file_entries_count.max(0) as usize, |r| FileEntry::read(r))?;

        let string_table_count = reader.read_i32()?;
        let string_table = reader.read_array(string_table_count.max(0) as usize, |r| {
            Ok(r.read_fstring()?)
        })?;

        Ok(DirectoryIndex {
            mount_point,
            directory_entries,
            file_entries,
            string_table,
        })
    }

    fn name_at(&self, index: u32) -> &str {
        self.string_table
            .get(index as usize)
            .and_then(|s| s.as_deref())
            .unwrap_or("")
    }

    /// Walk the tree depth-first starting at `start_dir`, calling `visit(chunk_table_index, path)`
    /// for every file entry reached. `prefix` is prepended to every emitted path (the
    /// mount point is not automatically included; callers that want it pass it as the
    /// initial prefix). Stops early if `visit` returns `false`.
    pub fn iterate(
        &self,
        start_dir: u32,
        prefix: &str,
        mut visit: impl FnMut(u32, &str) -> bool,
    ) {
        self.iterate_impl(start_dir, prefix, &mut visit);
    }

    fn iterate_impl(&self, dir_index: u32, path: &str, visit: &mut impl FnMut(u32, &str) -> bool) -> bool {
        let Some(dir) = self.directory_entries.get(dir_index as usize) else {
            return true;
        };

        let mut file = dir.first_file_entry;
        while file != INVALID_INDEX {
            let Some(file_entry) = self.file_entries.get(file as usize) else {
                break;
            };

            let full_path = join_path(path, self.name_at(file_entry.name));
            if !visit(file_entry.user_data, &full_path) {
                return false;
            }

            file = file_entry.next_file_entry;
        }

        let mut child = dir.first_child_entry;
        while child != INVALID_INDEX {
            let Some(child_entry) = self.directory_entries.get(child as usize) else {
                break;
            };

            let child_path = join_path(path, self.name_at(child_entry.name));
            if !self.iterate_impl(child, &child_path, visit) {
                return false;
            }

            child = child_entry.next_sibling_entry;
        }

        true
    }

    /// Collect every `(path, chunk_table_index)` pair reachable from the root,
    /// prefixed with the mount point.
    pub fn list_files(&self) -> Vec<(String, u32)> {
        let mount_point = self.mount_point.as_deref().unwrap_or("");
        let mut out = Vec::new();
        self.iterate(ROOT_INDEX, mount_point, |chunk_index, path| {
            out.push((path.to_owned(), chunk_index));
            true
        });
        out
    }
}

/// Join two path components, accepting either `/` or `\` as a pre-existing separator
/// and canonicalizing to exactly one `/` between them.
fn join_path(base: &str, name: &str) -> String {
    let base = base.trim_end_matches(['/', '\\']);
    if base.is_empty() {
        name.to_owned()
    } else {
        format!("{base}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DirectoryIndex {
        // root (0) -> dir "Content" (1) -> files "A.uasset" (0), "B.uasset" (1)
        DirectoryIndex {
            mount_point: Some("/Game/".to_owned()),
            directory_entries: vec![
                DirectoryEntry {
                    name: INVALID_INDEX,
                    first_child_entry: 1,
                    next_sibling_entry: INVALID_INDEX,
                    first_file_entry: INVALID_INDEX,
                },
                DirectoryEntry {
                    name: 0,
                    first_child_entry: INVALID_INDEX,
                    next_sibling_entry: INVALID_INDEX,
                    first_file_entry: 0,
                },
            ],
            file_entries: vec![
                FileEntry {
                    name: 1,
                    next_file_entry: 1,
                    user_data: 0,
                },
                FileEntry {
                    name: 2,
                    next_file_entry: INVALID_INDEX,
                    user_data: 1,
                },
            ],
            string_table: vec![
                Some("Content".to_owned()),
                Some("A.uasset".to_owned()),
                Some("B.uasset".to_owned()),
            ],
        }
    }

    #[test]
    fn lists_every_file_depth_first() {
        let index = sample();
        let files = index.list_files();
        assert_eq!(
            files,
            vec![
                ("/Game/Content/A.uasset".to_owned(), 0),
                ("/Game/Content/B.uasset".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn iteration_can_be_stopped_early() {
        let index = sample();
        let mut seen = Vec::new();
        index.iterate(ROOT_INDEX, "", |chunk_index, _path| {
            seen.push(chunk_index);
            false
        });
        assert_eq!(seen, vec![0]);
    }
}
