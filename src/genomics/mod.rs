//! Coverage, consensus and composition profiling of aligned reads.
//!
//! The types here operate on an abstract [`ColumnSource`]; the htslib-backed
//! source lives in [`bam`], an in-memory one in [`ReadPileup`].

pub mod bam;
mod composition;
mod contig;
mod coverage;
mod entropy;
mod kmer;
mod pileup;
pub(crate) mod statistics;
mod types;

pub use composition::Composition;
pub use contig::{Contig, ContigError, ContigProfile, Split};
pub use coverage::Coverage;
pub use entropy::{depth_weight, ColumnEntropy, Consensus};
pub use kmer::{KmerError, KmerTable, KmerVector, KmerVectorizer, DEFAULT_K, MAX_K};
pub use pileup::{
    AlignedBase, ColumnSource, Columns, PileupColumn, ReadPileup, ReferenceCatalog,
    SourceError, SourceFactory,
};
pub use types::{AlignedRead, CigarOp, CigarOpKind};

/// Canonical bases in column order.
pub const CANONICAL_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Placeholder for positions without a consensus call.
pub const UNKNOWN_BASE: u8 = b'N';

pub(crate) fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}
