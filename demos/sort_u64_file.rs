use std::path::{Path, PathBuf};

use anyhow::Error;
use binary_external_sort::Sort;

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn sort_defaults(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    Sort::<u64>::new(input_path.to_path_buf(), output_path.to_path_buf()).sort()
}

fn sort_tuned(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    Sort::<u64>::new(input_path.to_path_buf(), output_path.to_path_buf())
        .with_avail_mem(16 * 1024 * 1024)
        .with_merge_at_once(8)
        .with_threads(4)
        .sort()
}

// cargo run -r --example sort_u64_file
pub fn main() -> Result<(), Error> {
    let input_path = PathBuf::from("./tests/fixtures/random-u64.bin");
    let defaults_path = PathBuf::from("./target/demo-defaults.bin");
    let tuned_path = PathBuf::from("./target/demo-tuned.bin");

    sort_defaults(&input_path, &defaults_path)?;
    sort_tuned(&input_path, &tuned_path)?;

    Ok(())
}
