//! C8 — parameter validation, memory budgeting, staging of split then merge, final rename.
//!
//! Raises the process `NOFILE` soft limit for the duration of the sort (claim/publish can hold
//! `K * W` files open at once) and restores it afterward regardless of outcome.

use std::cmp::max;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use rlimit::Resource;

use crate::error::ErrorKind;
use crate::merge;
use crate::record::Record;
use crate::split;
use crate::work_folder;

/// Sorts the fixed-width binary records of type `T` in `in_path`, writing the ascending result
/// to `out_path`.
///
/// `avail_mem` is the memory budget in bytes, `merge_at_once` is the merge fan-in `K`, and
/// `threads_num` is the worker count (`0` coerces to `1`).
///
/// # Errors
/// Returns an [`anyhow::Error`] tagged with an [`ErrorKind`] (downcastable via
/// `err.downcast_ref::<ErrorKind>()`): `InvalidArgument`, `InsufficientMemory`, `CorruptSize`,
/// `OpenFailed`, `IoError`.
pub fn external_sort<T: Record>(
    in_path: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
    avail_mem: usize,
    merge_at_once: usize,
    threads_num: usize,
) -> anyhow::Result<()> {
    let in_path = in_path.as_ref();
    let out_path = out_path.as_ref();

    validate::<T>(in_path, out_path, avail_mem, merge_at_once)?;
    let threads_num = threads_num.max(1);

    let work_dir = work_folder::derive(out_path);
    let (soft, hard) = get_nofile_rlimit()?;
    log::info!("current rlimit NOFILE, soft: {soft}, hard: {hard}");
    let wanted = max(((merge_at_once + 2) * threads_num + 256) as u64, soft);
    set_nofile_rlimit(wanted, hard)?;
    log::info!("set new rlimit NOFILE, soft: {wanted}, hard: {hard}");

    let result = run_pipeline::<T>(in_path, out_path, &work_dir, avail_mem, merge_at_once, threads_num);

    set_nofile_rlimit(soft, hard)?;
    log::info!("restored rlimit NOFILE, soft: {soft}, hard: {hard}");
    result
}

fn run_pipeline<T: Record>(
    in_path: &Path,
    out_path: &Path,
    work_dir: &Path,
    avail_mem: usize,
    merge_at_once: usize,
    threads_num: usize,
) -> anyhow::Result<()> {
    log::info!("starting split stage for {}", in_path.display());
    let total_runs = split::split::<T>(in_path, work_dir, avail_mem, threads_num)?;
    log::info!("split stage produced {total_runs} run(s)");

    if total_runs == 0 {
        // Empty input: there's nothing to merge and no `_temp_1` to rename. Produce an empty
        // output file directly so the contract ("output exists") still holds.
        crate::record_writer::RecordWriter::<T>::create(out_path)?.close()?;
        return Ok(());
    }

    log::info!("starting merge stage");
    merge::merge::<T>(work_dir, total_runs, merge_at_once, avail_mem, threads_num)?;
    log::info!("merge stage converged to a single run");

    let final_run = work_folder::run_path(work_dir, 1);
    std::fs::rename(&final_run, out_path)
        .with_context(|| anyhow!("rename {} to {}", final_run.display(), out_path.display()))
        .with_context(|| ErrorKind::IoError)?;
    Ok(())
}

fn validate<T: Record>(
    in_path: &Path,
    out_path: &Path,
    avail_mem: usize,
    merge_at_once: usize,
) -> anyhow::Result<()> {
    if avail_mem < 3 * T::WIDTH {
        return Err(anyhow!(
            "avail_mem {avail_mem} is below the minimum of 3 * sizeof(T) = {}",
            3 * T::WIDTH
        )
        .context(ErrorKind::InvalidArgument));
    }
    if merge_at_once < 2 {
        return Err(anyhow!("merge_at_once must be at least 2, got {merge_at_once}")
            .context(ErrorKind::InvalidArgument));
    }
    if in_path.as_os_str().is_empty() || out_path.as_os_str().is_empty() {
        return Err(anyhow!("input and output paths must not be empty").context(ErrorKind::InvalidArgument));
    }
    Ok(())
}

fn get_nofile_rlimit() -> anyhow::Result<(u64, u64)> {
    rlimit::getrlimit(Resource::NOFILE).with_context(|| "getrlimit(NOFILE)")
}

fn set_nofile_rlimit(soft: u64, hard: u64) -> anyhow::Result<()> {
    rlimit::setrlimit(Resource::NOFILE, soft, hard)
        .with_context(|| anyhow!("setrlimit(NOFILE, soft={soft}, hard={hard})"))
}

/// Chainable builder over [`external_sort`]'s four parameters.
pub struct Sort<T: Record> {
    in_path: PathBuf,
    out_path: PathBuf,
    avail_mem: usize,
    merge_at_once: usize,
    threads: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Record> Sort<T> {
    /// Creates a sort definition with the library defaults: all available CPU cores minus one
    /// worker thread (at least one), merge fan-in `16`, and a 64 MiB memory budget.
    pub fn new(in_path: impl Into<PathBuf>, out_path: impl Into<PathBuf>) -> Self {
        Sort {
            in_path: in_path.into(),
            out_path: out_path.into(),
            avail_mem: 64 * 1024 * 1024,
            merge_at_once: 16,
            threads: num_cpus::get().saturating_sub(1).max(1),
            _marker: std::marker::PhantomData,
        }
    }

    /// Sets the memory budget in bytes.
    pub fn with_avail_mem(mut self, avail_mem: usize) -> Self {
        self.avail_mem = avail_mem;
        self
    }

    /// Sets the merge fan-in `K` (must end up `>= 2`).
    pub fn with_merge_at_once(mut self, merge_at_once: usize) -> Self {
        self.merge_at_once = merge_at_once;
        self
    }

    /// Sets the worker count (`0` coerces to `1`).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Runs the sort with the configured parameters.
    pub fn sort(&self) -> anyhow::Result<()> {
        external_sort::<T>(
            &self.in_path,
            &self.out_path,
            self.avail_mem,
            self.merge_at_once,
            self.threads,
        )
    }
}
