//! Work-folder path derivation and temporary-file naming.
//!
//! Platform path-separator handling is delegated entirely to `std::path::Path`/`PathBuf`.

use std::path::{Path, PathBuf};

/// Directory all temporary files for one sort live in: the parent directory of the output path.
pub(crate) fn derive(out_path: &Path) -> PathBuf {
    match out_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Path of the run file `_temp_<index>` within `folder`.
pub(crate) fn run_path(folder: &Path, index: usize) -> PathBuf {
    folder.join(format!("_temp_{index}"))
}

/// Path of a worker's j-th private input stash slot.
pub(crate) fn input_stash_path(folder: &Path, worker_tag: &str, slot: usize) -> PathBuf {
    folder.join(format!("{worker_tag}_thread_temp_{slot}"))
}

/// Path of a worker's private output stash.
pub(crate) fn output_stash_path(folder: &Path, worker_tag: &str) -> PathBuf {
    folder.join(format!("temp_out_{worker_tag}"))
}

/// A filesystem-safe tag identifying the calling OS thread, used to build private stash names.
///
/// Relies on `std::thread::ThreadId`'s uniqueness among live threads: a worker pool must not
/// recycle a `ThreadId` to a second logical worker while the first is still alive, which holds
/// here since the pool's own threads live for its entire lifetime.
pub(crate) fn thread_tag() -> String {
    format!("{:?}", std::thread::current().id())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
