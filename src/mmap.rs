//! Zero-copy file access via memory mapping.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};

use crate::error::{Error, Result};

/// A read-only view of a file's contents.
pub struct ReadMap {
    path: PathBuf,
    mmap: Mmap,
}

impl ReadMap {
    /// Opens `path` for reading. Fails with `EmptyFile` on a zero-length file, matching
    /// the reference trainer's refusal to map an empty corpus.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;
        let len = file.metadata().map_err(|e| Error::io(&path, e))?.len();
        if len == 0 {
            return Err(Error::EmptyFile { path });
        }
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(&path, e))?;
        Ok(ReadMap { path, mmap })
    }

    pub fn data(&self) -> &[u8] {
        &self.mmap[..]
    }

    pub fn size(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A writable view of a freshly created (or truncated) file.
pub struct WriteMap {
    path: PathBuf,
    mmap: MmapMut,
}

impl WriteMap {
    /// Creates (or truncates) `path` to `size` bytes and maps it read-write.
    pub fn create(path: impl AsRef<Path>, size: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;
        file.set_len(size).map_err(|e| Error::io(&path, e))?;
        let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|e| Error::io(&path, e))?;
        Ok(WriteMap { path, mmap })
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.mmap[..]
    }

    pub fn size(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes dirty pages back to the underlying file. Callers that write
    /// through `data_mut()` and need the bytes durable before returning
    /// should call this explicitly; it does not happen implicitly on drop.
    pub fn flush(&self) -> Result<()> {
        self.mmap.flush().map_err(|e| Error::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::File::create(&path).unwrap();
        let err = ReadMap::open(&path).unwrap_err();
        assert!(matches!(err, Error::EmptyFile { .. }));
    }

    #[test]
    fn round_trip_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        {
            let mut w = WriteMap::create(&path, 4).unwrap();
            w.data_mut().copy_from_slice(b"abcd");
        }
        let r = ReadMap::open(&path).unwrap();
        assert_eq!(r.data(), b"abcd");
    }

    #[test]
    fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            f.write_all(b"0123456789").unwrap();
        }
        let w = WriteMap::create(&path, 3).unwrap();
        assert_eq!(w.size(), 3);
    }
}
