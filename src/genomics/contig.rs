use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::genomics::{
    ColumnSource, Composition, Consensus, Coverage, KmerVector, KmerVectorizer, SourceError,
};

/// Failure while profiling a single contig. The contig is dropped, the run
/// continues.
#[derive(Debug, Error)]
pub enum ContigError {
    /// Reading pileup columns failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A stage ran before the stage it depends on.
    #[error("split {split} has no {missing} result yet")]
    MissingStage {
        /// Offending split.
        split: String,
        /// Stage whose output is required.
        missing: &'static str,
    },

    /// The worker could not open its own column source.
    #[error("column source unavailable: {0}")]
    SourceUnavailable(String),

    /// Windows cannot be empty.
    #[error("window size must be > 0")]
    InvalidWindowSize,
}

/// A window of a contig, the unit of statistical computation.
#[derive(Debug, Clone)]
pub struct Split {
    /// `<parent>_split_<order>_<start>_<end>`.
    pub name: String,
    /// Name of the contig the split belongs to.
    pub parent: Arc<str>,
    /// 0-based position of the split within its contig.
    pub order: usize,
    /// Inclusive start.
    pub start: u32,
    /// Exclusive end.
    pub end: u32,
    /// Positions with non-zero coverage.
    pub explicit_length: u32,
    /// Depth statistics.
    pub coverage: Option<Coverage>,
    /// Entropy averages and representative sequence.
    pub consensus: Option<Consensus>,
    /// Base composition of the representative sequence.
    pub composition: Option<Composition>,
}

impl Split {
    /// Create the `order`-th split of `parent` spanning `[start, end)`.
    pub fn new(parent: Arc<str>, order: usize, start: u32, end: u32) -> Self {
        Self {
            name: format!("{parent}_split_{order:04}_{start}_{end}"),
            parent,
            order,
            start,
            end,
            explicit_length: 0,
            coverage: None,
            consensus: None,
            composition: None,
        }
    }

    /// Half-open interval on the parent contig.
    pub fn region(&self) -> Range<u32> {
        self.start..self.end
    }

    /// `end - start`.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the split spans no positions.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Compute depth statistics and record the explicit length.
    pub fn analyze_coverage<S: ColumnSource>(&mut self, source: &mut S) -> Result<&Coverage, ContigError> {
        let region = self.region();
        let columns = source.pileup(&self.parent, Some(region.clone()))?;
        let coverage = Coverage::from_columns(&region, columns)?;
        self.explicit_length = coverage.explicit_length;
        Ok(self.coverage.insert(coverage))
    }

    /// Compute entropy averages and the representative sequence.
    pub fn analyze_consensus<S: ColumnSource>(&mut self, source: &mut S) -> Result<&Consensus, ContigError> {
        let coverage = self.coverage.ok_or_else(|| self.missing("coverage"))?;
        let region = self.region();
        let columns = source.pileup(&self.parent, Some(region.clone()))?;
        let consensus = Consensus::from_columns(&region, &coverage, columns)?;
        Ok(self.consensus.insert(consensus))
    }

    /// Count bases of the representative sequence.
    pub fn analyze_composition(&mut self) -> Result<&Composition, ContigError> {
        let consensus = self.consensus.as_ref().ok_or_else(|| self.missing("consensus"))?;
        let composition = Composition::from_sequence(consensus.representative.as_bytes());
        Ok(self.composition.insert(composition))
    }

    /// Mean covered depth, `0.0` before coverage is computed.
    pub fn mean_coverage(&self) -> f64 {
        self.coverage.map_or(0.0, |coverage| coverage.mean)
    }

    fn missing(&self, stage: &'static str) -> ContigError {
        ContigError::MissingStage {
            split: self.name.clone(),
            missing: stage,
        }
    }
}

/// A reference sequence and its ordered splits.
#[derive(Debug, Clone)]
pub struct Contig {
    /// Reference name.
    pub name: Arc<str>,
    /// Reference length.
    pub length: u32,
    /// Windows tiling `[0, length)`.
    pub splits: Vec<Split>,
    /// Length-weighted mean of split coverages.
    pub mean_coverage: f64,
    /// Composition of the full representative sequence.
    pub composition: Option<Composition>,
    /// k-mer frequencies of the full representative sequence.
    pub kmer_vector: Option<KmerVector>,
}

impl Contig {
    /// Contig without splits.
    pub fn new(name: impl Into<Arc<str>>, length: u32) -> Self {
        Self {
            name: name.into(),
            length,
            splits: Vec::new(),
            mean_coverage: 0.0,
            composition: None,
            kmer_vector: None,
        }
    }

    /// Contig tiled with windows of `window_size`.
    pub fn with_windows(
        name: impl Into<Arc<str>>,
        length: u32,
        window_size: u32,
    ) -> Result<Self, ContigError> {
        let mut contig = Self::new(name, length);
        contig.split(window_size)?;
        Ok(contig)
    }

    /// Replace the splits with contiguous windows of `window_size`; the last
    /// one may be shorter.
    pub fn split(&mut self, window_size: u32) -> Result<(), ContigError> {
        if window_size == 0 {
            return Err(ContigError::InvalidWindowSize);
        }
        self.splits = (0..self.length)
            .step_by(window_size as usize)
            .enumerate()
            .map(|(order, start)| {
                let end = start.saturating_add(window_size).min(self.length);
                Split::new(Arc::clone(&self.name), order, start, end)
            })
            .collect();
        Ok(())
    }

    /// Essential stage: coverage of every split, then the contig mean.
    pub fn analyze_coverage<S: ColumnSource>(&mut self, source: &mut S) -> Result<(), ContigError> {
        for split in &mut self.splits {
            debug!(split = %split.name, "coverage");
            split.analyze_coverage(source)?;
        }
        self.mean_coverage = self.compute_mean_coverage();
        Ok(())
    }

    /// Auxiliary stage: entropy and representative sequence of every split.
    pub fn analyze_auxiliary<S: ColumnSource>(&mut self, source: &mut S) -> Result<(), ContigError> {
        for split in &mut self.splits {
            debug!(split = %split.name, "auxiliary");
            split.analyze_consensus(source)?;
        }
        Ok(())
    }

    /// Composition stage: per-split and contig composition plus k-mer vector.
    pub fn analyze_composition(&mut self, vectorizer: &KmerVectorizer) -> Result<(), ContigError> {
        for split in &mut self.splits {
            split.analyze_composition()?;
        }
        let representative = self.representative_sequence()?;
        self.composition = Some(Composition::from_sequence(representative.as_bytes()));
        self.kmer_vector = Some(vectorizer.vectorize(representative.as_bytes()));
        Ok(())
    }

    /// `Σ(split mean × split length) / contig length`.
    pub fn compute_mean_coverage(&self) -> f64 {
        if self.length == 0 {
            return 0.0;
        }
        self.splits
            .iter()
            .map(|split| split.mean_coverage() * split.len() as f64)
            .sum::<f64>()
            / self.length as f64
    }

    /// Population std of every covered depth sample across all splits,
    /// pooled from the per-split statistics.
    ///
    /// Each split contributes its own variance plus the squared offset of its
    /// mean from the pooled mean.
    pub fn std_coverage(&self) -> f64 {
        let covered: Vec<(f64, Coverage)> = self
            .splits
            .iter()
            .filter_map(|split| split.coverage)
            .filter(|coverage| coverage.explicit_length > 0)
            .map(|coverage| (coverage.explicit_length as f64, coverage))
            .collect();
        let n: f64 = covered.iter().map(|(count, _)| count).sum();
        if n == 0.0 {
            return 0.0;
        }
        let mean = covered
            .iter()
            .map(|(count, coverage)| count * coverage.mean)
            .sum::<f64>()
            / n;
        let variance = covered
            .iter()
            .map(|(count, coverage)| {
                let offset = coverage.mean - mean;
                count * (coverage.std * coverage.std + offset * offset)
            })
            .sum::<f64>()
            / n;
        variance.sqrt()
    }

    /// Positions with non-zero coverage across the contig.
    pub fn explicit_length(&self) -> u64 {
        self.splits.iter().map(|split| split.explicit_length as u64).sum()
    }

    /// Concatenated split representatives in split order.
    pub fn representative_sequence(&self) -> Result<String, ContigError> {
        let mut sequence = String::with_capacity(self.length as usize);
        for split in &self.splits {
            let consensus = split.consensus.as_ref().ok_or_else(|| split.missing("consensus"))?;
            sequence.push_str(&consensus.representative);
        }
        Ok(sequence)
    }

    /// Length-weighted average of split entropies: `(raw, normalized)`.
    pub fn average_entropies(&self) -> (f64, f64) {
        if self.length == 0 {
            return (0.0, 0.0);
        }
        let (raw, normalized) = self
            .splits
            .iter()
            .filter_map(|split| split.consensus.as_ref().map(|c| (split.len() as f64, c)))
            .fold((0.0, 0.0), |(raw, normalized), (len, consensus)| {
                (
                    raw + consensus.average_entropy * len,
                    normalized + consensus.average_normalized_entropy * len,
                )
            });
        (raw / self.length as f64, normalized / self.length as f64)
    }

    /// Feature record of a fully profiled contig.
    pub fn to_profile(&self) -> Result<ContigProfile, ContigError> {
        let composition = self.composition.ok_or_else(|| ContigError::MissingStage {
            split: self.name.to_string(),
            missing: "composition",
        })?;
        let kmer_frequencies = self.kmer_vector.clone().ok_or_else(|| ContigError::MissingStage {
            split: self.name.to_string(),
            missing: "k-mer",
        })?;
        let (average_entropy, average_normalized_entropy) = self.average_entropies();

        Ok(ContigProfile {
            length: self.length,
            mean_coverage: self.mean_coverage,
            std_coverage: self.std_coverage(),
            explicit_length: self.explicit_length(),
            average_entropy,
            average_normalized_entropy,
            composition,
            kmer_frequencies,
        })
    }
}

/// Per-contig features consumed by report writers and binning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContigProfile {
    /// Contig length.
    pub length: u32,
    /// Length-weighted mean coverage.
    pub mean_coverage: f64,
    /// Pooled std of covered depths.
    pub std_coverage: f64,
    /// Covered positions.
    pub explicit_length: u64,
    /// Average column entropy over the contig length.
    pub average_entropy: f64,
    /// Average normalized column entropy over the contig length.
    pub average_normalized_entropy: f64,
    /// Base counts and GC content.
    #[serde(flatten)]
    pub composition: Composition,
    /// Dense k-mer counts.
    #[serde(rename = "kmer_frequency_vector")]
    pub kmer_frequencies: KmerVector,
}
