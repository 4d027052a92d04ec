//! C3 — sequential, append-only typed writes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

use anyhow::{anyhow, Context};

use crate::error::ErrorKind;
use crate::record::Record;

/// Buffered, append-only writer for one run file.
pub(crate) struct RecordWriter<T: Record> {
    writer: BufWriter<File>,
    _marker: PhantomData<T>,
}

impl<T: Record> RecordWriter<T> {
    /// Creates (truncating if present) `path` for binary output.
    pub(crate) fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| anyhow!("path: {}", path.display()))
            .with_context(|| ErrorKind::OpenFailed)?;
        Ok(RecordWriter {
            writer: BufWriter::new(file),
            _marker: PhantomData,
        })
    }

    /// Writes `records` sequentially, `T::WIDTH` bytes each.
    pub(crate) fn write(&mut self, records: &[T]) -> anyhow::Result<()> {
        let mut scratch = vec![0u8; T::WIDTH];
        for record in records {
            record.store_to_bytes(&mut scratch);
            self.writer
                .write_all(&scratch)
                .with_context(|| ErrorKind::IoError)?;
        }
        Ok(())
    }

    /// Flushes and closes the underlying file handle.
    pub(crate) fn close(mut self) -> anyhow::Result<()> {
        self.writer.flush().with_context(|| ErrorKind::IoError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_reader::ChunkReader;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.bin");

        let mut writer = RecordWriter::<u64>::create(&path).unwrap();
        writer.write(&[1u64, 2, 3]).unwrap();
        writer.write(&[4u64, 5]).unwrap();
        writer.close().unwrap();

        let mut reader = ChunkReader::<u64>::open(&path, 10).unwrap();
        assert_eq!(reader.next_chunk().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.bin");

        let mut w0 = RecordWriter::<u64>::create(&path).unwrap();
        w0.write(&[1u64, 2, 3]).unwrap();
        w0.close().unwrap();

        let mut w1 = RecordWriter::<u64>::create(&path).unwrap();
        w1.write(&[9u64]).unwrap();
        w1.close().unwrap();

        let mut reader = ChunkReader::<u64>::open(&path, 10).unwrap();
        assert_eq!(reader.next_chunk().unwrap(), vec![9]);
    }
}
