#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use papi::genomics::{AlignedRead, ReadPileup};

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("PAPI_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set PAPI_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// `copies` identical ungapped reads of `sequence` starting at `pos`.
pub fn stacked_reads(contig: &str, pos: u32, sequence: &[u8], copies: usize) -> Vec<AlignedRead> {
    (0..copies)
        .map(|_| AlignedRead::ungapped(contig, pos, sequence))
        .collect()
}

/// In-memory source with the given references and reads.
pub fn pileup_source(references: &[(&str, u32)], reads: Vec<AlignedRead>) -> ReadPileup {
    let references = references
        .iter()
        .map(|(name, length)| (name.to_string(), *length))
        .collect();
    ReadPileup::new(references, reads)
}

/// Scratch path under the system temp dir, unique per process and tag.
pub fn scratch_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("papi-{}-{tag}", std::process::id()))
}
