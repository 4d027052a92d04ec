use std::fs;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use data_encoding::HEXLOWER;

pub fn setup() {
    let results_dir_path = PathBuf::from_str("./target/test-results/").unwrap();
    if !results_dir_path.exists() {
        fs::create_dir_all(&results_dir_path)
            .unwrap_or_else(|_| panic!("Failed to create results directory: {:?}", results_dir_path));
    }
}

#[allow(dead_code)]
pub fn temp_file_name(dir: &str) -> PathBuf {
    let mut result = PathBuf::from(dir);
    let name = HEXLOWER.encode(&rand::random::<[u8; 16]>());
    result.push(name);
    result
}

/// Creates and returns a fresh subdirectory under `./target/test-results/`. The work folder is
/// derived from an output path's parent directory, so tests that run concurrently in the same
/// process must not share a directory — each gets its own to avoid `_temp_<N>` collisions.
#[allow(dead_code)]
pub fn unique_test_dir() -> PathBuf {
    let dir = temp_file_name("./target/test-results/");
    fs::create_dir_all(&dir).unwrap_or_else(|_| panic!("Failed to create test dir: {:?}", dir));
    dir
}

#[allow(dead_code)]
pub fn write_u64_file(path: &PathBuf, values: &[u64]) {
    let mut writer = File::create(path).unwrap();
    for v in values {
        writer.write_all(&v.to_ne_bytes()).unwrap();
    }
}

#[allow(dead_code)]
pub fn read_u64_file(path: &PathBuf) -> Vec<u64> {
    let mut bytes = Vec::new();
    File::open(path).unwrap().read_to_end(&mut bytes).unwrap();
    bytes
        .chunks_exact(8)
        .map(|c| u64::from_ne_bytes(c.try_into().unwrap()))
        .collect()
}

#[allow(dead_code)]
pub fn leftover_temp_files(dir: &PathBuf) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("_temp_") || name.contains("_thread_temp_") || name.starts_with("temp_out_"))
        .collect()
}
