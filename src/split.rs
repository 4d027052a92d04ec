//! C5 — drives the chunk reader and worker pool to produce the initial run set.
//!
//! Each iteration waits for a vacant worker, reaps finished tasks to surface failures early,
//! pulls the next chunk, and submits a sort-and-write task for it. On EOF, waits out the
//! remaining outstanding tasks.

use std::path::Path;

use anyhow::anyhow;

use crate::chunk_reader::ChunkReader;
use crate::error::ErrorKind;
use crate::record::Record;
use crate::record_writer::RecordWriter;
use crate::work_folder;
use crate::worker_pool::{JobHandle, WorkerPool};

/// Splits `input_path` into sorted run files `_temp_1`..`_temp_<total>` inside `work_dir`,
/// sorting each memory-sized chunk with up to `threads` workers in parallel. Returns `total`,
/// the number of runs produced.
pub(crate) fn split<T: Record>(
    input_path: &Path,
    work_dir: &Path,
    avail_mem: usize,
    threads: usize,
) -> anyhow::Result<usize> {
    let threads = threads.max(1);
    let chunk_len = avail_mem / (threads * T::WIDTH);
    if chunk_len == 0 {
        return Err(anyhow!(
            "avail_mem {avail_mem} cannot hold even one record per worker ({threads} workers, {} bytes/record)",
            T::WIDTH
        )
        .context(ErrorKind::InsufficientMemory));
    }

    let mut reader = ChunkReader::<T>::open(input_path, chunk_len)?;
    let pool = WorkerPool::new(threads);

    let mut total = 0usize;
    let mut outstanding: Vec<JobHandle> = Vec::new();

    loop {
        pool.wait_for_first_vacant(threads);
        reap_finished(&mut outstanding)?;

        let chunk = reader.next_chunk()?;
        if chunk.is_empty() {
            break;
        }

        total += 1;
        let run_path = work_folder::run_path(work_dir, total);
        log::info!("submitting chunk of {} record(s) as run {total}", chunk.len());
        outstanding.push(pool.submit(move || sort_and_write(chunk, &run_path)));
    }

    for handle in outstanding {
        handle.join()?;
    }

    Ok(total)
}

fn sort_and_write<T: Record>(mut chunk: Vec<T>, run_path: &Path) -> anyhow::Result<()> {
    chunk.sort_unstable();
    let mut writer = RecordWriter::<T>::create(run_path)?;
    writer.write(&chunk)?;
    writer.close()
}

fn reap_finished(outstanding: &mut Vec<JobHandle>) -> anyhow::Result<()> {
    let mut still_running = Vec::with_capacity(outstanding.len());
    for handle in outstanding.drain(..) {
        match handle.try_join() {
            Some(result) => result?,
            None => still_running.push(handle),
        }
    }
    *outstanding = still_running;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_reader::ChunkReader as Reader;
    use std::fs::File;
    use std::io::Write;

    fn write_u64s(path: &Path, values: &[u64]) {
        let mut file = File::create(path).unwrap();
        for v in values {
            file.write_all(&v.to_ne_bytes()).unwrap();
        }
    }

    #[test]
    fn produces_numbered_sorted_runs_covering_all_records() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        write_u64s(&input, &[5, 1, 4, 2, 3, 9, 8, 7, 6, 0]);

        // 2 records/chunk * 2 workers -> force multiple runs
        let total = split::<u64>(&input, dir.path(), 2 * 8 * 2, 2).unwrap();
        assert!(total >= 2);

        let mut all = Vec::new();
        for i in 1..=total {
            let run_path = work_folder::run_path(dir.path(), i);
            let mut reader = Reader::<u64>::open(&run_path, 100).unwrap();
            let chunk = reader.next_chunk().unwrap();
            assert!(chunk.windows(2).all(|w| w[0] <= w[1]), "run {i} not sorted");
            all.extend(chunk);
        }
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn empty_input_produces_zero_runs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        File::create(&input).unwrap();

        let total = split::<u64>(&input, dir.path(), 1000, 2).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn insufficient_memory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        write_u64s(&input, &[1]);

        let err = split::<u64>(&input, dir.path(), 1, 4).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ErrorKind>(),
            Some(&ErrorKind::InsufficientMemory)
        );
    }
}
