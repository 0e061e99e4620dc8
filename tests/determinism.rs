use std::collections::HashSet;

#[path = "common/mod.rs"]
mod common;
use common::{pileup_source, stacked_reads};

use blake3::hash;
use papi::genomics::{AlignedRead, Contig};
use papi::{Profiler, ProfilerConfig};

fn mixed_reads() -> Vec<AlignedRead> {
    let mut reads = stacked_reads("chrA", 0, b"ACGTACGTTTGACCAGTA", 5);
    reads.extend(stacked_reads("chrA", 4, b"ACGGACGTTT", 3));
    reads.extend(stacked_reads("chrA", 30, b"NNGGCCAT", 4));
    reads.extend(stacked_reads("chrB", 2, b"TTTTGGGGAAAACCCC", 6));
    reads.extend(stacked_reads("chrB", 10, b"GGAACTCC", 6));
    reads
}

#[test]
fn profiler_output_is_deterministic() {
    let source = pileup_source(&[("chrA", 48), ("chrB", 40), ("chrC", 44)], mixed_reads());
    let config = ProfilerConfig::default()
        .with_min_contig_length(10)
        .with_min_mean_coverage(1.0)
        .with_window_size(7)
        .with_threads(4);

    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let profiler = Profiler::new(config.clone(), source.clone()).expect("profiler initialises");
        let run = profiler.run(&source).expect("profiling succeeds");
        let json = serde_json::to_string(&run.profiles).expect("profiles serialize");
        fingerprints.insert(hash(json.as_bytes()));
    }

    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}

#[test]
fn representative_sequence_is_deterministic() {
    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let mut source = pileup_source(&[("chrA", 48)], mixed_reads());
        let mut contig = Contig::with_windows("chrA", 48, 5).expect("valid window");
        contig.analyze_coverage(&mut source).expect("coverage");
        contig.analyze_auxiliary(&mut source).expect("consensus");
        let sequence = contig.representative_sequence().expect("all splits analyzed");
        fingerprints.insert(hash(sequence.as_bytes()));
    }

    assert_eq!(fingerprints.len(), 1, "representative sequences diverged across runs");
}
