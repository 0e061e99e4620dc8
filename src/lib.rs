//! # Contig coverage and composition profiling
//!
//! This library turns read pileups over assembled contigs into per-contig
//! feature records for metagenomic binning.
//!
//! ## Pipeline
//!
//! 1. **Windows**: every contig is tiled into fixed-size splits
//! 2. **Essential stage**: depth statistics per split, length-weighted mean per contig
//! 3. **Filters**: minimum contig length and minimum mean coverage
//! 4. **Auxiliary stage**: column entropy and an entropy-voted representative sequence
//! 5. **Composition stage**: base counts, GC content and a dense k-mer frequency vector
//!
//! ## Usage Example
//!
//! ```ignore
//! use papi::{Profiler, ProfilerConfig};
//! use papi::genomics::bam::{BamSource, BamSourceFactory};
//!
//! let catalog = BamSource::open("sample.bam")?;
//! let profiler = Profiler::new(ProfilerConfig::default(), BamSourceFactory::new("sample.bam"))?;
//! let run = profiler.run(&catalog)?;
//! for (name, profile) in run.profiles.ordered_by_length() {
//!     println!("{name}\t{:.4}", profile.mean_coverage);
//! }
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod genomics; // Column sources and per-contig statistics
pub mod profiler; // Stage orchestration over a worker pool
pub mod report;   // Text and JSON output tables
/// Python bindings for the composition and k-mer primitives.
#[cfg(feature = "python-bindings")]
pub mod python_bindings;

pub use genomics::{
    Composition, Contig, ContigError, ContigProfile, Coverage, KmerTable, KmerVector,
    KmerVectorizer, SourceError,
};
pub use profiler::{
    ContigFilter, DropReason, DroppedContig, ProfileRun, ProfileStore, Profiler,
    ProfilerConfig, RunSummary, Stage,
};

use thiserror::Error;

/// Errors that abort a profiling run.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Invalid run parameters
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The alignment source is missing, unreadable or not indexed
    #[error("Alignment source unavailable: {0}")]
    SourceAccess(#[from] SourceError),

    /// A filter left nothing to profile
    #[error("No contigs left after the {filter} filter (threshold {threshold})")]
    NoSurvivingContigs {
        /// Filter that removed the last contig
        filter: ContigFilter,
        /// Threshold that filter applied
        threshold: String,
    },
}
