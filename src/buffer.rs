// File-to-memory loading.
// The buffer is sized from the real file length, not a fixed constant,
// and allocation failure is reported instead of aborting.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::LoadError;

/// An owned byte region holding a file's contents.
///
/// The occupied length never exceeds the capacity, and the capacity is
/// reserved to the file's length at load time. Memory is released by Drop.
#[derive(Debug)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// Read the entire file at `path` into a newly allocated buffer.
    ///
    /// The file is opened before anything is allocated, so a missing or
    /// unreadable path fails without touching the allocator. The file
    /// handle is closed on every path, including errors.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let size = file
            .metadata()
            .map_err(|source| LoadError::Metadata {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let oom = || LoadError::OutOfMemory {
            path: path.to_path_buf(),
            bytes: size,
        };
        let capacity = usize::try_from(size).map_err(|_| oom())?;

        let mut data = Vec::new();
        data.try_reserve_exact(capacity).map_err(|_| oom())?;

        file.read_to_end(&mut data).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self { data })
    }

    /// Number of bytes actually read.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Allocated capacity in bytes. Always at least `len()`.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, handing its bytes to the caller.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_full_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.bin");
        let contents: Vec<u8> = (0..=255u8).cycle().take(4096 + 17).collect();
        File::create(&path)
            .unwrap()
            .write_all(&contents)
            .unwrap();

        let buffer = Buffer::from_file(&path).unwrap();
        assert_eq!(buffer.len(), contents.len());
        assert!(buffer.capacity() >= contents.len());
        assert_eq!(buffer.as_slice(), contents.as_slice());
    }

    #[test]
    fn empty_file_reads_zero_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        File::create(&path).unwrap();

        let buffer = Buffer::from_file(&path).unwrap();
        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn missing_path_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.ogg");

        let err = Buffer::from_file(&path).unwrap_err();
        match err {
            LoadError::Open { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Open error, got {other:?}"),
        }
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.bin");
        File::create(&path).unwrap().write_all(b"abc").unwrap();

        let buffer = Buffer::from_file(&path).unwrap();
        assert!(buffer.len() <= buffer.capacity());
        assert_eq!(buffer.into_bytes(), b"abc");
    }
}
