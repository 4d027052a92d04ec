//! C7 — the file-system-mediated work queue plus the per-worker K-way merge loop.
//!
//! A shared `files_num` counter and `io_mutex` gate claim/publish critical sections; between them
//! each worker merges its claimed runs lock-free. A worker must not claim when `files_num <= 1` —
//! implemented here as a precondition on claiming — to avoid a degenerate self-merge once the run
//! set has converged to a single survivor.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};

use crate::error::ErrorKind;
use crate::merge_part::MergePart;
use crate::multi_reader::MultiReader;
use crate::record::Record;
use crate::record_writer::RecordWriter;
use crate::work_folder;
use crate::worker_pool::WorkerPool;

/// Shared run counter + the mutex that serializes every claim/publish critical section.
struct RunQueue {
    files_num: Mutex<usize>,
}

/// Repeatedly K-way-merges disjoint subsets of the run set (fan-in `k`) using `threads` workers
/// until exactly one run remains. `total_runs` is the run count the split stage produced.
pub(crate) fn merge<T: Record>(
    work_dir: &Path,
    total_runs: usize,
    k: usize,
    avail_mem: usize,
    threads: usize,
) -> anyhow::Result<()> {
    let threads = threads.max(1);

    if total_runs <= 1 {
        // Nothing to merge: zero or one run is already the final answer.
        return Ok(());
    }

    let buffer_len = avail_mem / (k * threads * T::WIDTH);
    if buffer_len == 0 {
        return Err(anyhow!(
            "avail_mem {avail_mem} cannot provide one record of buffer per worker per input (k={k}, threads={threads}, record width={})",
            T::WIDTH
        )
        .context(ErrorKind::InsufficientMemory));
    }

    let queue = Arc::new(RunQueue {
        files_num: Mutex::new(total_runs),
    });

    let pool = WorkerPool::new(threads);
    let mut handles = Vec::with_capacity(threads);
    for _ in 0..threads {
        let queue = Arc::clone(&queue);
        let work_dir = work_dir.to_path_buf();
        handles.push(pool.submit(move || worker_loop::<T>(&queue, &work_dir, k, buffer_len)));
    }

    for handle in handles {
        handle.join()?;
    }

    Ok(())
}

fn worker_loop<T: Record>(
    queue: &RunQueue,
    work_dir: &Path,
    k: usize,
    buffer_len: usize,
) -> anyhow::Result<()> {
    let tag = work_folder::thread_tag();
    let input_stash: Vec<PathBuf> = (0..k)
        .map(|slot| work_folder::input_stash_path(work_dir, &tag, slot))
        .collect();
    let output_stash = work_folder::output_stash_path(work_dir, &tag);

    loop {
        let claimed = claim(queue, work_dir, &input_stash, k)?;
        let Some(claimed) = claimed else {
            log::info!("thread {tag}: no runs left to claim, exiting");
            return Ok(());
        };

        log::info!("thread {tag}: start merging {claimed} run(s)");
        merge_claimed::<T>(&input_stash[..claimed], &output_stash, buffer_len)?;
        log::info!("thread {tag}: finished merging {claimed} run(s)");

        let done = publish(queue, work_dir, &input_stash[..claimed], &output_stash)?;
        if done {
            log::info!("thread {tag}: run set converged to a single survivor");
            return Ok(());
        }
    }
}

/// Claims up to `k` runs under `io_mutex`, renaming them into this worker's private input stash.
/// Returns `None` (without claiming anything) once `files_num <= 1`, preventing a degenerate
/// self-merge once the run set has converged to a single survivor.
fn claim(
    queue: &RunQueue,
    work_dir: &Path,
    input_stash: &[PathBuf],
    k: usize,
) -> anyhow::Result<Option<usize>> {
    let mut files_num = queue.files_num.lock().unwrap();
    if *files_num <= 1 {
        return Ok(None);
    }

    let claimed = k.min(*files_num);
    *files_num -= claimed;
    let first = *files_num + 1;

    for (offset, stash_path) in input_stash.iter().take(claimed).enumerate() {
        let run_path = work_folder::run_path(work_dir, first + offset);
        std::fs::rename(&run_path, stash_path).with_context(|| ErrorKind::IoError)?;
    }

    Ok(Some(claimed))
}

fn merge_claimed<T: Record>(
    input_stash: &[PathBuf],
    output_stash: &Path,
    buffer_len: usize,
) -> anyhow::Result<()> {
    let claimed = input_stash.len();
    let mut writer = RecordWriter::<T>::create(output_stash)?;
    let mut reader = MultiReader::<T>::new(claimed, buffer_len);
    reader.open(input_stash, claimed)?;

    let mut parts: Vec<MergePart<T>> = (0..claimed).map(MergePart::new).collect();
    for part in parts.iter_mut() {
        let chunk = reader.next_chunk(part.file_index())?;
        part.update_data(chunk);
    }

    let mut out_buffer: Vec<T> = Vec::with_capacity(buffer_len);
    loop {
        let min_slot = parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.finished())
            .min_by(|(_, a), (_, b)| a.peek().unwrap().cmp(b.peek().unwrap()))
            .map(|(i, _)| i);

        let Some(min_slot) = min_slot else { break };

        let part = &mut parts[min_slot];
        let value = {
            let item = part.take()?;
            clone_record(item)
        };
        out_buffer.push(value);

        if part.finished() {
            let chunk = reader.next_chunk(part.file_index())?;
            part.update_data(chunk);
        }

        if out_buffer.len() >= buffer_len {
            writer.write(&out_buffer)?;
            out_buffer.clear();
        }
    }

    if !out_buffer.is_empty() {
        writer.write(&out_buffer)?;
    }

    writer.close()?;
    reader.close();
    Ok(())
}

/// `T: Record` doesn't itself require `Clone`; records are moved out of a `MergePart`'s buffer by
/// round-tripping through their byte representation instead, which costs one extra (de)serialize
/// per record but keeps the public `Record` trait minimal.
fn clone_record<T: Record>(item: &T) -> T {
    let mut bytes = vec![0u8; T::WIDTH];
    item.store_to_bytes(&mut bytes);
    T::load_from_bytes(&bytes)
}

/// Publishes the merged output under `io_mutex`: removes the consumed input stash files,
/// re-enters the output run into the queue under the next run index, and reports whether the
/// queue has converged to a single surviving run.
fn publish(
    queue: &RunQueue,
    work_dir: &Path,
    input_stash: &[PathBuf],
    output_stash: &Path,
) -> anyhow::Result<bool> {
    let mut files_num = queue.files_num.lock().unwrap();

    for stash_path in input_stash {
        std::fs::remove_file(stash_path).with_context(|| ErrorKind::IoError)?;
    }

    *files_num += 1;
    let next_run_path = work_folder::run_path(work_dir, *files_num);
    std::fs::rename(output_stash, &next_run_path).with_context(|| ErrorKind::IoError)?;

    Ok(*files_num == 1)
}
