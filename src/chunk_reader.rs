//! C1 — sequential typed reads of a fixed record count at a time from one file.
//!
//! Size-alignment is checked at open, reads return a short (possibly empty) chunk on EOF, and a
//! sticky `completed` flag is set once EOF has been observed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use crate::error::ErrorKind;
use crate::record::Record;

/// Reads a binary run/input file in chunks of up to `chunk_len` records of type `T`.
pub(crate) struct ChunkReader<T: Record> {
    path: PathBuf,
    reader: BufReader<File>,
    chunk_len: usize,
    completed: bool,
    _marker: PhantomData<T>,
}

impl<T: Record> ChunkReader<T> {
    /// Opens `path` for sequential typed reads of `chunk_len` records at a time.
    ///
    /// Fails with [`ErrorKind::OpenFailed`] if the file cannot be opened, and with
    /// [`ErrorKind::CorruptSize`] if its size is not a multiple of `T::WIDTH`.
    pub(crate) fn open(path: &Path, chunk_len: usize) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| anyhow!("path: {}", path.display()))
            .with_context(|| ErrorKind::OpenFailed)?;
        let size = file
            .metadata()
            .with_context(|| anyhow!("path: {}", path.display()))
            .with_context(|| ErrorKind::OpenFailed)?
            .len() as usize;

        if size % T::WIDTH != 0 {
            return Err(anyhow!(
                "path: {}, size {} is not a multiple of record width {}",
                path.display(),
                size,
                T::WIDTH
            )
            .context(ErrorKind::CorruptSize));
        }

        Ok(ChunkReader {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            chunk_len,
            completed: false,
            _marker: PhantomData,
        })
    }

    /// Reads up to `chunk_len` records. Returns fewer (possibly zero) on EOF and sets
    /// [`Self::completed`]; further calls after completion return an empty vec without reading.
    pub(crate) fn next_chunk(&mut self) -> anyhow::Result<Vec<T>> {
        if self.completed {
            return Ok(Vec::new());
        }

        let mut bytes = vec![0u8; self.chunk_len * T::WIDTH];
        let mut read_total = 0usize;
        loop {
            let n = self
                .reader
                .read(&mut bytes[read_total..])
                .with_context(|| anyhow!("path: {}", self.path.display()))
                .with_context(|| ErrorKind::IoError)?;
            if n == 0 {
                self.completed = true;
                break;
            }
            read_total += n;
            if read_total == bytes.len() {
                break;
            }
        }

        let records_read = read_total / T::WIDTH;
        let mut records = Vec::with_capacity(records_read);
        for i in 0..records_read {
            records.push(T::load_from_bytes(&bytes[i * T::WIDTH..(i + 1) * T::WIDTH]));
        }
        Ok(records)
    }

    /// True once EOF has been observed; every `next_chunk` call after this returns empty.
    pub(crate) fn completed(&self) -> bool {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_u64s(path: &Path, values: &[u64]) {
        let mut file = File::create(path).unwrap();
        for v in values {
            file.write_all(&v.to_ne_bytes()).unwrap();
        }
    }

    #[test]
    fn reads_exact_chunks_then_short_chunk_then_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.bin");
        write_u64s(&path, &[1, 2, 3, 4, 5]);

        let mut reader = ChunkReader::<u64>::open(&path, 2).unwrap();
        assert_eq!(reader.next_chunk().unwrap(), vec![1, 2]);
        assert!(!reader.completed());
        assert_eq!(reader.next_chunk().unwrap(), vec![3, 4]);
        assert!(!reader.completed());
        assert_eq!(reader.next_chunk().unwrap(), vec![5]);
        assert!(reader.completed());
        assert_eq!(reader.next_chunk().unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn empty_file_completes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        File::create(&path).unwrap();

        let mut reader = ChunkReader::<u64>::open(&path, 4).unwrap();
        assert_eq!(reader.next_chunk().unwrap(), Vec::<u64>::new());
        assert!(reader.completed());
    }

    #[test]
    fn corrupt_size_is_rejected_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, [0u8; 5]).unwrap();

        let err = ChunkReader::<u64>::open(&path, 4).unwrap_err();
        assert_eq!(err.downcast_ref::<ErrorKind>(), Some(&ErrorKind::CorruptSize));
    }

    #[test]
    fn missing_file_is_open_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        let err = ChunkReader::<u64>::open(&path, 4).unwrap_err();
        assert_eq!(err.downcast_ref::<ErrorKind>(), Some(&ErrorKind::OpenFailed));
    }
}
