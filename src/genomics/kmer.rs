//! Dense k-mer frequency vectors (tetranucleotide frequencies for `k = 4`).
//!
//! The enumeration of all `4^k` k-mers lives in an immutable [`KmerTable`]
//! that is built once and shared, so vectors computed by different workers
//! are comparable column by column.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::genomics::CANONICAL_BASES;

/// Default k-mer length (tetranucleotides).
pub const DEFAULT_K: usize = 4;

/// Largest supported k-mer length; `4^12` entries is already 16M counters.
pub const MAX_K: usize = 12;

/// Errors raised when constructing a k-mer table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KmerError {
    /// k outside `1..=MAX_K`.
    #[error("k-mer length must be between 1 and {max}, got {k}")]
    InvalidLength {
        /// Requested length.
        k: usize,
        /// Largest accepted length.
        max: usize,
    },
}

fn base_code(base: u8) -> Option<usize> {
    match base {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Lexicographically ordered enumeration of every k-mer over `ACGT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerTable {
    k: usize,
    kmers: Vec<String>,
}

impl KmerTable {
    /// Enumerate all k-mers of length `k`.
    pub fn new(k: usize) -> Result<Self, KmerError> {
        if k == 0 || k > MAX_K {
            return Err(KmerError::InvalidLength { k, max: MAX_K });
        }
        let size = 1usize << (2 * k);
        let kmers = (0..size)
            .map(|index| {
                (0..k)
                    .rev()
                    .map(|shift| CANONICAL_BASES[(index >> (2 * shift)) & 0b11] as char)
                    .collect()
            })
            .collect();
        Ok(Self { k, kmers })
    }

    /// k-mer length.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of k-mers (`4^k`).
    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    /// Always false; a table holds at least four k-mers.
    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    /// k-mer labels in column order.
    pub fn kmers(&self) -> &[String] {
        &self.kmers
    }

    /// Column index of `kmer`, if it is a canonical k-mer of the right length.
    pub fn index_of(&self, kmer: &[u8]) -> Option<usize> {
        if kmer.len() != self.k {
            return None;
        }
        kmer.iter()
            .try_fold(0usize, |index, &base| Some((index << 2) | base_code(base)?))
    }
}

/// Dense k-mer counts, one entry per [`KmerTable`] column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KmerVector {
    counts: Vec<u32>,
}

impl KmerVector {
    /// Counts in table column order.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&count| count as u64).sum()
    }

    /// Count stored at `index`.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.counts.get(index).copied()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the vector has no columns.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Sliding-window k-mer counter over an injected [`KmerTable`].
#[derive(Debug, Clone)]
pub struct KmerVectorizer {
    table: Arc<KmerTable>,
}

impl KmerVectorizer {
    /// Create a vectorizer that counts into `table`'s columns.
    pub fn new(table: Arc<KmerTable>) -> Self {
        Self { table }
    }

    /// Shared k-mer table.
    pub fn table(&self) -> &Arc<KmerTable> {
        &self.table
    }

    /// Count every k-length window made only of `A`, `C`, `G`, `T`.
    ///
    /// Windows touching any other symbol are skipped. When no window
    /// qualifies the result is the all-ones vector instead of all zeros, so
    /// norm-based distances stay defined.
    pub fn vectorize(&self, sequence: &[u8]) -> KmerVector {
        let k = self.table.k();
        let mask = self.table.len() - 1;
        let mut counts = vec![0u32; self.table.len()];
        let mut index = 0usize;
        let mut run = 0usize;
        let mut counted = 0usize;

        for &base in sequence {
            match base_code(base) {
                Some(code) => {
                    index = ((index << 2) | code) & mask;
                    run += 1;
                    if run >= k {
                        counts[index] += 1;
                        counted += 1;
                    }
                }
                None => run = 0,
            }
        }

        if counted == 0 {
            counts.fill(1);
        }
        KmerVector { counts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vectorizer(k: usize) -> KmerVectorizer {
        KmerVectorizer::new(Arc::new(KmerTable::new(k).expect("valid k")))
    }

    #[test]
    fn table_is_lexicographic() {
        let table = KmerTable::new(2).unwrap();
        assert_eq!(table.len(), 16);
        assert_eq!(table.kmers()[0], "AA");
        assert_eq!(table.kmers()[1], "AC");
        assert_eq!(table.kmers()[15], "TT");

        let mut sorted = table.kmers().to_vec();
        sorted.sort();
        assert_eq!(sorted, table.kmers());
        assert_eq!(table.index_of(b"GT"), Some(11));
        assert_eq!(table.index_of(b"GN"), None);
    }

    #[test]
    fn invalid_k_is_rejected() {
        assert_eq!(
            KmerTable::new(0),
            Err(KmerError::InvalidLength { k: 0, max: MAX_K })
        );
        assert!(KmerTable::new(MAX_K + 1).is_err());
    }

    #[test]
    fn windows_with_unknown_bases_are_skipped() {
        let vectorizer = vectorizer(DEFAULT_K);
        let vector = vectorizer.vectorize(b"ACGTANCGTAC");
        let table = vectorizer.table();

        // ACGT, CGTA | CGTA, GTAC
        assert_eq!(vector.total(), 4);
        assert_eq!(vector.get(table.index_of(b"ACGT").unwrap()), Some(1));
        assert_eq!(vector.get(table.index_of(b"CGTA").unwrap()), Some(2));
        assert_eq!(vector.get(table.index_of(b"GTAC").unwrap()), Some(1));
    }

    #[test]
    fn all_unknown_sequence_yields_uniform_vector() {
        let vector = vectorizer(DEFAULT_K).vectorize(b"NNNNNNNNNNNN");
        assert_eq!(vector.len(), 256);
        assert!(vector.counts().iter().all(|&count| count == 1));

        let short = vectorizer(DEFAULT_K).vectorize(b"ACG");
        assert!(short.counts().iter().all(|&count| count == 1));
    }

    proptest! {
        #[test]
        fn total_matches_number_of_canonical_windows(sequence in proptest::collection::vec(prop_oneof![
            Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T'), Just(b'N')
        ], 0..200)) {
            let vector = vectorizer(DEFAULT_K).vectorize(&sequence);
            let windows = sequence
                .windows(DEFAULT_K)
                .filter(|window| window.iter().all(|&base| base != b'N'))
                .count();
            if windows == 0 {
                prop_assert!(vector.counts().iter().all(|&count| count == 1));
            } else {
                prop_assert_eq!(vector.total(), windows as u64);
            }
        }
    }
}
