//! Sorts a binary file of fixed-size records too large to fit in memory.
//!
//! The input is a contiguous sequence of fixed-size records of a single type `T`; the output is
//! the same multiset of records re-ordered ascending under `T`'s total order, written to a
//! separate file. The operator supplies a memory budget (bytes), a merge fan-in `K`, and a
//! worker count `W`.
//!
//! The implementation is a two-stage split → merge pipeline executed by a bounded worker pool
//! that cooperates through the file system as its shared work queue:
//!
//! 1. A split stage reads the input in memory-sized chunks, sorts each chunk in RAM, and flushes
//!    it as a numbered temporary run. Workers run in parallel; backpressure limits RAM use.
//! 2. A merge stage repeatedly selects up to `K` existing runs, performs a `K`-way merge into a
//!    new run, and appends the result back to the run set. Multiple workers merge disjoint
//!    `K`-subsets concurrently. The process terminates when exactly one run remains.
//!
//! The motivation for writing this crate was sorting files of fixed-width records — sensor
//! samples, index entries, fixed-width database rows — too large to sort by loading the whole
//! file into memory, while still taking advantage of multiple CPU cores.
//!
//! # Examples
//! ```
//! use std::path::PathBuf;
//! use binary_external_sort::sort::Sort;
//!
//! fn sort_u64_file(input: PathBuf, output: PathBuf) -> Result<(), anyhow::Error> {
//!     // Sort a file of packed little/native-endian u64 records using 2 worker threads,
//!     // merging up to 4 runs at a time, with a 1 MiB memory budget.
//!     Sort::<u64>::new(input, output)
//!         .with_avail_mem(1_000_000)
//!         .with_merge_at_once(4)
//!         .with_threads(2)
//!         .sort()
//! }
//! ```

pub(crate) mod chunk_reader;
pub(crate) mod merge;
pub(crate) mod merge_part;
pub(crate) mod multi_reader;
pub(crate) mod record_writer;
pub(crate) mod split;
pub(crate) mod work_folder;
pub(crate) mod worker_pool;

pub mod error;
pub mod record;
pub mod sort;

pub use record::Record;
pub use sort::{external_sort, Sort};
