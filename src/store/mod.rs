#![forbid(unsafe_code)]

//! Append-only line stores addressed by byte offset.
//!
//! Every appended line is terminated with `\n`; the returned [`Locator`] is the
//! offset of its first byte and stays valid for the life of the store.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::types::{GisError, Locator, Result};

/// Capability the coordinator needs from the external record store.
pub trait RecordStore {
    /// Appends `line` and returns where it starts.
    fn append(&mut self, line: &str) -> Result<Locator>;

    /// Reads back the line starting at `locator`, without its terminator.
    fn read(&mut self, locator: Locator) -> Result<String>;

    /// Total bytes written so far.
    fn len(&self) -> u64;

    /// Returns `true` before anything is appended.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File-backed store. Opening truncates the file, since indexes are rebuilt
/// from scratch on every run.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: File,
    end: u64,
}

impl FileStore {
    /// Creates or truncates the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self { path, file, end: 0 })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for FileStore {
    fn append(&mut self, line: &str) -> Result<Locator> {
        let offset = self.end;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.end += line.len() as u64 + 1;
        trace!(offset, bytes = line.len(), "store.file.append");
        Ok(Locator(offset))
    }

    fn read(&mut self, locator: Locator) -> Result<String> {
        if locator.0 >= self.end {
            return Err(GisError::InvalidArgument(format!(
                "locator {locator} is past the end of {}",
                self.path.display()
            )));
        }
        self.file.seek(SeekFrom::Start(locator.0))?;
        let mut reader = BufReader::new(&mut self.file);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        trim_newline(&mut line);
        Ok(line)
    }

    fn len(&self) -> u64 {
        self.end
    }
}

/// In-memory store with the same offset semantics as [`FileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Vec<u8>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn append(&mut self, line: &str) -> Result<Locator> {
        let offset = self.bytes.len() as u64;
        self.bytes.extend_from_slice(line.as_bytes());
        self.bytes.push(b'\n');
        Ok(Locator(offset))
    }

    fn read(&mut self, locator: Locator) -> Result<String> {
        let start = usize::try_from(locator.0)
            .ok()
            .filter(|start| *start < self.bytes.len())
            .ok_or_else(|| {
                GisError::InvalidArgument(format!("locator {locator} is out of range"))
            })?;
        let tail = &self.bytes[start..];
        let end = tail.iter().position(|b| *b == b'\n').unwrap_or(tail.len());
        String::from_utf8(tail[..end].to_vec())
            .map_err(|_| GisError::InvalidRecord(format!("line at {locator} is not UTF-8")))
    }

    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn trim_newline(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise(store: &mut dyn RecordStore) {
        let a = store.append("first|line").unwrap();
        let b = store.append("second|line|longer").unwrap();
        let c = store.append("").unwrap();
        assert_eq!(a, Locator(0));
        assert_eq!(b, Locator(11));
        assert_eq!(c, Locator(30));
        assert_eq!(store.read(b).unwrap(), "second|line|longer");
        assert_eq!(store.read(a).unwrap(), "first|line");
        assert_eq!(store.read(c).unwrap(), "");
        assert_eq!(store.len(), 31);
        assert!(store.read(Locator(31)).is_err());
    }

    #[test]
    fn memory_store_offsets() {
        exercise(&mut MemoryStore::new());
    }

    #[test]
    fn file_store_offsets_and_truncation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.txt");
        std::fs::write(&path, "stale contents\n").unwrap();
        let mut store = FileStore::create(&path).unwrap();
        assert!(store.is_empty());
        exercise(&mut store);
        // appends after reads still land at the end
        let d = store.append("tail").unwrap();
        assert_eq!(d, Locator(31));
        assert_eq!(store.read(d).unwrap(), "tail");
        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.starts_with("first|line\n"));
    }
}
