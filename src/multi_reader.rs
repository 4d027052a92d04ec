//! C2 — a bundle of up to K chunk readers indexed `0..K`, for the merge stage.
//!
//! A fixed-size vector of readers opened against a subset of paths, with per-slot delegation.

use std::path::Path;

use anyhow::anyhow;

use crate::chunk_reader::ChunkReader;
use crate::record::Record;

/// Holds up to `k` [`ChunkReader`]s, only `count <= k` of which are open at a time.
pub(crate) struct MultiReader<T: Record> {
    readers: Vec<Option<ChunkReader<T>>>,
    chunk_len: usize,
}

impl<T: Record> MultiReader<T> {
    /// Preallocates `k` reader slots, all closed, each reading `chunk_len` records at a time.
    pub(crate) fn new(k: usize, chunk_len: usize) -> Self {
        let mut readers = Vec::with_capacity(k);
        readers.resize_with(k, || None);
        MultiReader { readers, chunk_len }
    }

    /// Opens the first `count` (`<= k`) slots against `files[0..count]`.
    pub(crate) fn open(&mut self, files: &[impl AsRef<Path>], count: usize) -> anyhow::Result<()> {
        if count > self.readers.len() {
            return Err(anyhow!(
                "requested {count} simultaneous readers but only {} slots exist",
                self.readers.len()
            ));
        }
        for (slot, file) in files.iter().take(count).enumerate() {
            self.readers[slot] = Some(ChunkReader::open(file.as_ref(), self.chunk_len)?);
        }
        Ok(())
    }

    /// Reads the next chunk from reader slot `i`.
    pub(crate) fn next_chunk(&mut self, i: usize) -> anyhow::Result<Vec<T>> {
        self.readers[i]
            .as_mut()
            .expect("reader slot not open")
            .next_chunk()
    }

    /// Closes all open readers, dropping their file handles.
    pub(crate) fn close(&mut self) {
        for slot in self.readers.iter_mut() {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_u64s(path: &Path, values: &[u64]) {
        let mut file = File::create(path).unwrap();
        for v in values {
            file.write_all(&v.to_ne_bytes()).unwrap();
        }
    }

    #[test]
    fn opens_only_requested_count_and_delegates_by_slot() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        write_u64s(&a, &[1, 2]);
        write_u64s(&b, &[3, 4]);

        let mut reader = MultiReader::<u64>::new(4, 10);
        reader.open(&[a, b], 2).unwrap();

        assert_eq!(reader.next_chunk(0).unwrap(), vec![1, 2]);
        assert_eq!(reader.next_chunk(1).unwrap(), vec![3, 4]);
        reader.close();
    }
}
