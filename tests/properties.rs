//! Invariants of the per-contig stages under random pileups

use std::sync::Arc;

use papi::genomics::{AlignedRead, Contig, KmerTable, KmerVectorizer, ReadPileup};
use proptest::prelude::*;

fn read_strategy(length: u32) -> impl Strategy<Value = AlignedRead> {
    (
        0..length,
        proptest::collection::vec(prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T'), Just(b'N')], 1..40),
    )
        .prop_map(|(pos, sequence)| AlignedRead::ungapped("ctg", pos, &sequence))
}

fn contig_strategy() -> impl Strategy<Value = (u32, u32, Vec<AlignedRead>)> {
    (20u32..300, 1u32..64).prop_flat_map(|(length, window)| {
        (
            Just(length),
            Just(window),
            proptest::collection::vec(read_strategy(length), 0..30),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn split_and_contig_invariants_hold((length, window, reads) in contig_strategy()) {
        let mut source = ReadPileup::new(vec![("ctg".to_string(), length)], reads);
        let vectorizer = KmerVectorizer::new(Arc::new(KmerTable::new(4).unwrap()));

        let mut contig = Contig::with_windows("ctg", length, window).unwrap();
        contig.analyze_coverage(&mut source).unwrap();
        contig.analyze_auxiliary(&mut source).unwrap();
        contig.analyze_composition(&vectorizer).unwrap();

        prop_assert_eq!(contig.splits.iter().map(|s| s.len()).sum::<u32>(), length);
        for split in &contig.splits {
            prop_assert!(split.explicit_length <= split.len());
            let consensus = split.consensus.as_ref().unwrap();
            prop_assert_eq!(consensus.representative.len(), split.len() as usize);
            let composition = split.composition.unwrap();
            prop_assert_eq!(composition.len(), split.len() as u64);
        }

        let representative = contig.representative_sequence().unwrap();
        prop_assert_eq!(representative.len(), length as usize);

        let profile = contig.to_profile().unwrap();
        prop_assert_eq!(profile.composition.len(), length as u64);
        prop_assert!((0.0..=1.0).contains(&profile.composition.gc_content));
        prop_assert!(profile.average_normalized_entropy <= profile.average_entropy + 1e-12);
        prop_assert!(profile.mean_coverage >= 0.0);
    }
}
