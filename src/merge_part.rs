//! C6 — per-input state during one K-way merge: current buffer, cursor, source slot index.

use anyhow::anyhow;

use crate::error::ErrorKind;
use crate::record::Record;

/// One input's cursor state within a single K-way merge iteration.
pub(crate) struct MergePart<T: Record> {
    data: Vec<T>,
    cursor: usize,
    file_index: usize,
}

impl<T: Record> MergePart<T> {
    /// Creates an empty part bound to merge-local input slot `file_index`.
    pub(crate) fn new(file_index: usize) -> Self {
        MergePart {
            data: Vec::new(),
            cursor: 0,
            file_index,
        }
    }

    /// Installs a fresh buffer and resets the cursor to the front.
    pub(crate) fn update_data(&mut self, data: Vec<T>) {
        self.data = data;
        self.cursor = 0;
    }

    /// Returns the current front without advancing. Fails if the buffer is empty.
    pub(crate) fn peek(&self) -> anyhow::Result<&T> {
        self.data
            .get(self.cursor)
            .ok_or_else(|| anyhow!("part is empty").context(ErrorKind::IoError))
    }

    /// Returns the current front and advances the cursor.
    pub(crate) fn take(&mut self) -> anyhow::Result<&T> {
        if self.cursor >= self.data.len() {
            return Err(anyhow!("part is empty").context(ErrorKind::IoError));
        }
        let item = &self.data[self.cursor];
        self.cursor += 1;
        Ok(item)
    }

    /// True once the cursor has consumed the whole buffer.
    pub(crate) fn finished(&self) -> bool {
        self.cursor == self.data.len()
    }

    /// The merge-local input slot (0..K) this part reads from.
    pub(crate) fn file_index(&self) -> usize {
        self.file_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_then_take_advances_cursor() {
        let mut part = MergePart::<u64>::new(2);
        part.update_data(vec![10, 20, 30]);
        assert_eq!(*part.peek().unwrap(), 10);
        assert_eq!(*part.take().unwrap(), 10);
        assert_eq!(*part.peek().unwrap(), 20);
        assert!(!part.finished());
        part.take().unwrap();
        part.take().unwrap();
        assert!(part.finished());
    }

    #[test]
    fn peek_on_empty_part_fails() {
        let part = MergePart::<u64>::new(0);
        assert!(part.peek().is_err());
    }

    #[test]
    fn file_index_is_preserved_across_refills() {
        let mut part = MergePart::<u64>::new(3);
        part.update_data(vec![1]);
        part.take().unwrap();
        assert!(part.finished());
        part.update_data(vec![2, 3]);
        assert_eq!(part.file_index(), 3);
        assert!(!part.finished());
    }
}
