//! End-to-end profiling over in-memory pileups

#[path = "common/mod.rs"]
mod common;
use common::{pileup_source, stacked_reads};

use papi::{ContigFilter, DropReason, ProfileError, Profiler, ProfilerConfig};

fn lenient_config() -> ProfilerConfig {
    ProfilerConfig::default()
        .with_min_contig_length(1000)
        .with_min_mean_coverage(0.001)
        .with_window_size(1000)
        .with_threads(3)
}

fn five_contigs() -> papi::genomics::ReadPileup {
    let references = [
        ("c1", 100),
        ("c2", 200),
        ("c3", 5000),
        ("c4", 10000),
        ("c5", 50),
    ];
    let mut reads = Vec::new();
    for (name, _) in references {
        reads.extend(stacked_reads(name, 10, b"ACGTTGCAACGTTGCA", 2));
    }
    pileup_source(&references, reads)
}

#[test]
fn test_length_filter_keeps_long_contigs() {
    let source = five_contigs();
    let profiler = Profiler::new(lenient_config(), source.clone()).expect("valid config");
    let run = profiler.run(&source).expect("run succeeds");

    assert_eq!(run.summary.contigs_in_source, 5);
    assert_eq!(run.summary.contigs_after_length_filter, 2);
    assert_eq!(run.summary.filtered().count(), 3);
    assert_eq!(run.profiles.len(), 2);

    let mut filtered: Vec<&str> = run.summary.filtered().map(|d| d.name.as_str()).collect();
    filtered.sort_unstable();
    assert_eq!(filtered, vec!["c1", "c2", "c5"]);
    assert!(run.summary.dropped.iter().all(|d| matches!(
        d.reason,
        DropReason::Filtered {
            filter: ContigFilter::MinLength,
            ..
        }
    )));

    let ordered: Vec<&str> = run
        .profiles
        .ordered_by_length()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(ordered, vec!["c4", "c3"]);
}

#[test]
fn test_profiles_carry_expected_features() {
    let source = five_contigs();
    let profiler = Profiler::new(lenient_config(), source.clone()).expect("valid config");
    let run = profiler.run(&source).expect("run succeeds");

    let profile = run.profiles.get("c3").expect("c3 survives");
    assert_eq!(profile.length, 5000);
    assert_eq!(profile.explicit_length, 16);
    // first window averages depth 2 over its covered positions, weighted 1000/5000
    assert!((profile.mean_coverage - 0.4).abs() < 1e-12);
    assert_eq!(profile.std_coverage, 0.0);
    assert_eq!(profile.average_entropy, 0.0);
    assert_eq!(profile.composition.n, 5000 - 16);
    assert_eq!(profile.composition.gc_content, 0.5);
    assert_eq!(profile.kmer_frequencies.len(), 256);
    assert_eq!(profile.kmer_frequencies.total(), 13);
}

#[test]
fn test_all_contigs_too_short() {
    let source = five_contigs();
    let config = lenient_config().with_min_contig_length(20_000);
    let profiler = Profiler::new(config, source.clone()).expect("valid config");

    match profiler.run(&source) {
        Err(ProfileError::NoSurvivingContigs { filter, threshold }) => {
            assert_eq!(filter, ContigFilter::MinLength);
            assert_eq!(threshold, "20000");
        }
        other => panic!("expected NoSurvivingContigs, got {other:?}"),
    }
}

#[test]
fn test_all_contigs_too_thin() {
    let source = five_contigs();
    let config = lenient_config().with_min_mean_coverage(5.0);
    let profiler = Profiler::new(config, source.clone()).expect("valid config");

    assert!(matches!(
        profiler.run(&source),
        Err(ProfileError::NoSurvivingContigs {
            filter: ContigFilter::MinCoverage,
            ..
        })
    ));
}

#[test]
fn test_coverage_filter_is_inclusive() {
    let references = [("deep", 1000), ("shallow", 1000)];
    let mut reads = stacked_reads("deep", 0, &[b'A'; 100], 10);
    reads.extend(stacked_reads("shallow", 0, &[b'A'; 100], 9));
    let source = pileup_source(&references, reads);

    // one window per contig, so the means are exactly 10.0 and 9.0
    let config = lenient_config().with_min_mean_coverage(10.0);
    let profiler = Profiler::new(config, source.clone()).expect("valid config");
    let run = profiler.run(&source).expect("run succeeds");

    assert_eq!(run.summary.contigs_after_coverage_filter, 1);
    assert!(run.profiles.get("deep").is_some());
    assert!(run.profiles.get("shallow").is_none());
}

#[test]
fn test_selection_restricts_contigs() {
    let source = five_contigs();
    let config = lenient_config()
        .with_contigs_of_interest(vec!["c3".to_string(), "unknown".to_string()]);
    let profiler = Profiler::new(config, source.clone()).expect("valid config");
    let run = profiler.run(&source).expect("run succeeds");

    assert_eq!(run.summary.contigs_selected, 1);
    assert_eq!(run.profiles.len(), 1);
    assert!(run.profiles.get("c3").is_some());
}
