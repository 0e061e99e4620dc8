//! Per-column entropy and consensus calling.
//!
//! Every covered position gets a histogram over `A`, `C`, `G`, `T` and a
//! fifth bucket for any other symbol. From the histogram we derive:
//!
//! * the Shannon entropy in bits over all non-empty buckets,
//! * a normalized entropy, scaled by `depth / max_depth` of the enclosing
//!   window so that shallow, noisy columns weigh less than deep ones,
//! * the consensus base, the most frequent of `A`, `C`, `G`, `T` with ties
//!   resolved in that order, or [`UNKNOWN_BASE`] when no canonical base was
//!   seen.
//!
//! Window aggregates divide by the full window length, so uncovered positions
//! dilute the averages.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::genomics::statistics::shannon_entropy;
use crate::genomics::{base_index, Coverage, PileupColumn, SourceError, CANONICAL_BASES, UNKNOWN_BASE};

const NOISE_BUCKET: usize = 4;

/// Entropy profile of a single pileup column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEntropy {
    /// 0-based reference position.
    pub position: u32,
    /// Observed counts `[A, C, G, T, other]`.
    pub histogram: [u32; 5],
    /// Shannon entropy in bits.
    pub entropy: f64,
    /// Entropy scaled by the column's depth relative to the window maximum.
    pub normalized_entropy: f64,
    /// Most supported canonical base.
    pub consensus: u8,
}

impl ColumnEntropy {
    /// Profile `column` against a window whose deepest column is `max_depth`.
    pub fn from_column(column: &PileupColumn, max_depth: u32) -> Self {
        let mut histogram = [0u32; 5];
        for aligned in &column.bases {
            let bucket = base_index(aligned.base).unwrap_or(NOISE_BUCKET);
            histogram[bucket] += 1;
        }

        let entropy = shannon_entropy(&histogram);

        Self {
            position: column.position,
            histogram,
            entropy,
            normalized_entropy: entropy * depth_weight(column.depth, max_depth),
            consensus: consensus_base(&histogram),
        }
    }
}

/// Depth weight in `[0, 1]`; zero when either depth is zero.
pub fn depth_weight(depth: u32, max_depth: u32) -> f64 {
    if depth == 0 || max_depth == 0 {
        return 0.0;
    }
    (depth as f64 / max_depth as f64).min(1.0)
}

fn consensus_base(histogram: &[u32; 5]) -> u8 {
    let mut best: Option<(usize, u32)> = None;
    for (idx, &count) in histogram[..NOISE_BUCKET].iter().enumerate() {
        // strict comparison keeps the earliest base on ties
        if count > 0 && best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((idx, count));
        }
    }
    best.map_or(UNKNOWN_BASE, |(idx, _)| CANONICAL_BASES[idx])
}

/// Consensus and entropy summary of one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    /// Representative sequence, one base per window position.
    pub representative: String,
    /// Sum of column entropies divided by the window length.
    pub average_entropy: f64,
    /// Sum of normalized column entropies divided by the window length.
    pub average_normalized_entropy: f64,
}

impl Consensus {
    /// Build the consensus for `region` from its pileup columns.
    ///
    /// `coverage` must be the window's coverage result; its maximum depth
    /// drives entropy normalization.
    pub fn from_columns<I>(
        region: &Range<u32>,
        coverage: &Coverage,
        columns: I,
    ) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = Result<PileupColumn, SourceError>>,
    {
        let window_len = region.len();
        let mut representative = vec![UNKNOWN_BASE; window_len];
        let mut entropy_sum = 0.0;
        let mut normalized_sum = 0.0;

        for column in columns {
            let column = column?;
            if !region.contains(&column.position) || column.depth == 0 {
                continue;
            }
            let profile = ColumnEntropy::from_column(&column, coverage.max);
            entropy_sum += profile.entropy;
            normalized_sum += profile.normalized_entropy;
            representative[(column.position - region.start) as usize] = profile.consensus;
        }

        let (average_entropy, average_normalized_entropy) = if window_len == 0 {
            (0.0, 0.0)
        } else {
            (
                entropy_sum / window_len as f64,
                normalized_sum / window_len as f64,
            )
        };

        Ok(Self {
            // only ASCII bases are ever written
            representative: String::from_utf8_lossy(&representative).into_owned(),
            average_entropy,
            average_normalized_entropy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::AlignedBase;
    use test_case::test_case;

    fn column(position: u32, bases: &[u8]) -> PileupColumn {
        PileupColumn {
            position,
            depth: bases.len() as u32,
            bases: bases
                .iter()
                .enumerate()
                .map(|(i, &base)| AlignedBase {
                    base,
                    read_offset: i as u32,
                })
                .collect(),
        }
    }

    #[test_case(b"A", 0.0 ; "single read")]
    #[test_case(b"GGGGGGGG", 0.0 ; "deterministic deep column")]
    #[test_case(b"AC", 1.0 ; "two equal bases")]
    #[test_case(b"ACGT", 2.0 ; "uniform support")]
    #[test_case(b"AN", 1.0 ; "noise counts as its own symbol")]
    fn column_entropy(bases: &[u8], expected: f64) {
        let profile = ColumnEntropy::from_column(&column(0, bases), bases.len() as u32);
        assert!((profile.entropy - expected).abs() < 1e-12);
    }

    #[test_case(b"CA", b'A' ; "alphabetical tie break")]
    #[test_case(b"TTG", b'T' ; "majority wins")]
    #[test_case(b"GTTG", b'G' ; "tie between g and t")]
    #[test_case(b"NN", b'N' ; "only noise")]
    #[test_case(b"acc", b'C' ; "lowercase bases count")]
    fn consensus(bases: &[u8], expected: u8) {
        let profile = ColumnEntropy::from_column(&column(0, bases), 4);
        assert_eq!(profile.consensus, expected);
    }

    #[test]
    fn normalized_entropy_scales_with_depth() {
        let shallow = ColumnEntropy::from_column(&column(0, b"AC"), 8);
        assert!((shallow.normalized_entropy - 0.25).abs() < 1e-12);

        let deepest = ColumnEntropy::from_column(&column(0, b"ACGT"), 4);
        assert_eq!(deepest.normalized_entropy, deepest.entropy);

        assert_eq!(depth_weight(0, 10), 0.0);
        assert_eq!(depth_weight(3, 0), 0.0);
        assert_eq!(depth_weight(12, 10), 1.0);
    }

    #[test_case(b"A", 8, 0.0 ; "single read in a deep window")]
    #[test_case(b"GGGGGGGG", 8, 0.0 ; "deterministic column at window max")]
    #[test_case(b"ACGT", 4, 2.0 ; "uniform column at window max")]
    #[test_case(b"ACGT", 2, 2.0 ; "weight is capped at one")]
    #[test_case(b"ACGT", 16, 0.5 ; "quarter of window max")]
    #[test_case(b"AC", 0, 0.0 ; "window without depth")]
    fn normalized_entropy_boundaries(bases: &[u8], max_depth: u32, expected: f64) {
        let profile = ColumnEntropy::from_column(&column(0, bases), max_depth);
        assert!((profile.normalized_entropy - expected).abs() < 1e-12);
        assert!(profile.normalized_entropy <= profile.entropy);
    }

    #[test]
    fn deletion_only_column_has_no_entropy() {
        // three reads span the position, none of them with a base there
        let deletions = PileupColumn {
            position: 0,
            depth: 3,
            bases: Vec::new(),
        };
        let profile = ColumnEntropy::from_column(&deletions, 3);
        assert_eq!(profile.histogram, [0; 5]);
        assert_eq!(profile.entropy, 0.0);
        assert_eq!(profile.normalized_entropy, 0.0);
        assert_eq!(profile.consensus, UNKNOWN_BASE);

        let columns = vec![Ok(column(0, b"CC")), Ok(PileupColumn { position: 1, ..deletions })];
        let consensus =
            Consensus::from_columns(&(0..2), &Coverage::from_depths(vec![2, 3]), columns).unwrap();
        assert_eq!(consensus.representative, "CN");
        assert_eq!(consensus.average_entropy, 0.0);
        assert_eq!(consensus.average_normalized_entropy, 0.0);
    }

    #[test]
    fn window_without_max_depth_has_no_normalized_entropy() {
        let columns = vec![Ok(column(1, b"AC"))];
        let consensus = Consensus::from_columns(&(0..4), &Coverage::default(), columns).unwrap();

        assert_eq!(consensus.representative, "NANN");
        assert!((consensus.average_entropy - 0.25).abs() < 1e-12);
        assert_eq!(consensus.average_normalized_entropy, 0.0);
    }

    #[test]
    fn window_consensus_pads_uncovered_positions() {
        let columns = vec![
            Ok(column(9, b"TT")),
            Ok(column(10, b"AC")),
            Ok(column(12, b"GG")),
            Ok(column(14, b"CC")),
        ];
        let coverage = Coverage::from_depths(vec![2, 2]);
        let consensus = Consensus::from_columns(&(10..14), &coverage, columns).unwrap();

        assert_eq!(consensus.representative, "ANGN");
        assert!((consensus.average_entropy - 0.25).abs() < 1e-12);
        assert!((consensus.average_normalized_entropy - 0.25).abs() < 1e-12);
    }

    #[test]
    fn empty_window_is_all_unknown() {
        let consensus = Consensus::from_columns(
            &(0..5),
            &Coverage::default(),
            Vec::<Result<PileupColumn, SourceError>>::new(),
        )
        .unwrap();
        assert_eq!(consensus.representative, "NNNNN");
        assert_eq!(consensus.average_entropy, 0.0);
        assert_eq!(consensus.average_normalized_entropy, 0.0);
    }
}
