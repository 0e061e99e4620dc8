//! Results owned by the coordinator: profiles and the run summary.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::genomics::ContigProfile;

/// Filter checkpoints a contig can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContigFilter {
    /// Not part of the contigs of interest.
    Selection,
    /// Shorter than the minimum contig length.
    MinLength,
    /// Mean coverage below the minimum.
    MinCoverage,
}

impl fmt::Display for ContigFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContigFilter::Selection => write!(f, "contig selection"),
            ContigFilter::MinLength => write!(f, "minimum contig length"),
            ContigFilter::MinCoverage => write!(f, "minimum mean coverage"),
        }
    }
}

/// Per-contig profiling stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Coverage of every split.
    Essential,
    /// Entropy and representative sequence of every split.
    Auxiliary,
    /// Composition and k-mer frequencies.
    Composition,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Essential => write!(f, "essential"),
            Stage::Auxiliary => write!(f, "auxiliary"),
            Stage::Composition => write!(f, "composition"),
        }
    }
}

/// Why a contig left the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropReason {
    /// Failed a filter checkpoint.
    Filtered {
        /// Checkpoint that rejected the contig.
        filter: ContigFilter,
        /// Value that was compared against the threshold.
        value: f64,
    },
    /// Computing one of its stages failed.
    Failed {
        /// Stage that failed.
        stage: Stage,
        /// Error message.
        reason: String,
    },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Filtered { filter, value } => write!(f, "{filter} ({value})"),
            DropReason::Failed { stage, reason } => write!(f, "{stage} stage failed: {reason}"),
        }
    }
}

/// A contig removed from the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedContig {
    /// Contig name.
    pub name: String,
    /// Cause.
    pub reason: DropReason,
}

/// Counts collected while profiling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Mapped reads in the whole source.
    pub mapped_reads: u64,
    /// References in the catalog.
    pub contigs_in_source: usize,
    /// Contigs left after applying the selection.
    pub contigs_selected: usize,
    /// Contigs left after the length filter.
    pub contigs_after_length_filter: usize,
    /// Contigs left after the coverage filter.
    pub contigs_after_coverage_filter: usize,
    /// Contigs with a complete profile.
    pub contigs_profiled: usize,
    /// Every contig removed after selection, in the order it was dropped.
    pub dropped: Vec<DroppedContig>,
}

impl RunSummary {
    /// Contigs removed by a filter checkpoint.
    pub fn filtered(&self) -> impl Iterator<Item = &DroppedContig> {
        self.dropped
            .iter()
            .filter(|dropped| matches!(dropped.reason, DropReason::Filtered { .. }))
    }

    /// Contigs removed because a stage failed.
    pub fn failed(&self) -> impl Iterator<Item = &DroppedContig> {
        self.dropped
            .iter()
            .filter(|dropped| matches!(dropped.reason, DropReason::Failed { .. }))
    }
}

/// Contig name to finished profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProfileStore {
    profiles: BTreeMap<String, ContigProfile>,
}

impl ProfileStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the profile of `name`.
    pub fn insert(&mut self, name: impl Into<String>, profile: ContigProfile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Profile of `name`.
    pub fn get(&self, name: &str) -> Option<&ContigProfile> {
        self.profiles.get(name)
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no contig was profiled.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles sorted by descending contig length, ties by name.
    pub fn ordered_by_length(&self) -> Vec<(&str, &ContigProfile)> {
        let mut ordered: Vec<(&str, &ContigProfile)> = self
            .profiles
            .iter()
            .map(|(name, profile)| (name.as_str(), profile))
            .collect();
        ordered.sort_by(|a, b| b.1.length.cmp(&a.1.length).then_with(|| a.0.cmp(b.0)));
        ordered
    }
}
