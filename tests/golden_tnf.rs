#[path = "common/mod.rs"]
mod common;
use common::{assert_snapshot, pileup_source, stacked_reads};

use papi::{report, Profiler, ProfilerConfig};

fn profiled() -> (Profiler<papi::genomics::ReadPileup>, papi::ProfileRun) {
    let mut reads = stacked_reads("alpha", 0, b"ACGTACGTACGT", 3);
    reads.extend(stacked_reads("beta", 0, b"GGGGCCCC", 2));
    let source = pileup_source(&[("beta", 8), ("alpha", 12)], reads);

    let config = ProfilerConfig::default()
        .with_min_contig_length(5)
        .with_min_mean_coverage(1.0)
        .with_window_size(5)
        .with_k(2)
        .with_threads(2);
    let profiler = Profiler::new(config, source.clone()).expect("profiler initialises");
    let run = profiler.run(&source).expect("profiling succeeds");
    (profiler, run)
}

#[test]
fn tnf_matrix_matches_golden() {
    let (profiler, run) = profiled();
    let actual = report::render_tnf_matrix(profiler.kmer_table(), &run.profiles)
        .expect("matrix rendering should succeed");
    assert_snapshot("tnf/two_contigs_k2.txt", &actual);
}

#[test]
fn metadata_matches_golden() {
    let (_, run) = profiled();
    let actual = report::render_metadata(&run.profiles).expect("metadata rendering should succeed");
    assert_snapshot("tnf/two_contigs_metadata.txt", &actual);
}
