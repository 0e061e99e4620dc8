use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use thiserror::Error;

use crate::genomics::AlignedRead;

/// Errors raised by column sources and reference catalogs.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The alignment source does not exist or cannot be opened.
    #[error("cannot open alignment source '{path}': {reason}")]
    Open {
        /// Location of the source.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// The source lacks the index required for range queries.
    #[error("alignment source '{path}' is not indexed: {reason}")]
    NotIndexed {
        /// Location of the source.
        path: String,
        /// Underlying failure reported by the reader.
        reason: String,
    },

    /// The requested contig is not part of the catalog.
    #[error("unknown contig '{0}'")]
    UnknownContig(String),

    /// Reading pileup data failed part way through.
    #[error("failed to read pileup for '{contig}': {reason}")]
    Read {
        /// Contig being read.
        contig: String,
        /// Underlying failure.
        reason: String,
    },
}

/// One base contributed by a read to a pileup column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedBase {
    /// Base call, uppercase ASCII.
    pub base: u8,
    /// Offset of the base inside its originating read.
    pub read_offset: u32,
}

/// All reads covering a single reference position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PileupColumn {
    /// 0-based reference position.
    pub position: u32,
    /// Number of reads spanning the position, deletions included.
    pub depth: u32,
    /// Bases aligned at the position (reads in a deletion contribute none).
    pub bases: Vec<AlignedBase>,
}

impl PileupColumn {
    /// Empty column at `position`.
    pub fn new(position: u32) -> Self {
        Self {
            position,
            depth: 0,
            bases: Vec::new(),
        }
    }

    pub(crate) fn observe(&mut self, base: Option<AlignedBase>) {
        self.depth += 1;
        if let Some(base) = base {
            self.bases.push(base);
        }
    }
}

/// Stream of pileup columns in increasing position order.
pub type Columns<'a> = Box<dyn Iterator<Item = Result<PileupColumn, SourceError>> + 'a>;

/// Range-queryable source of pileup columns.
///
/// Implementations may yield columns outside the requested half-open range;
/// consumers are responsible for clipping.
pub trait ColumnSource {
    /// Pileup columns for `contig`, optionally restricted to `region`.
    fn pileup<'a>(
        &'a mut self,
        contig: &str,
        region: Option<Range<u32>>,
    ) -> Result<Columns<'a>, SourceError>;
}

/// Ordered list of references available in an alignment source.
pub trait ReferenceCatalog {
    /// `(name, length)` pairs in source order.
    fn references(&self) -> Vec<(String, u32)>;

    /// Number of mapped reads in the whole source.
    fn mapped_read_count(&self) -> Result<u64, SourceError>;
}

/// Opens one column source per worker thread.
pub trait SourceFactory: Sync {
    /// Source type produced by this factory.
    type Source: ColumnSource + Send;

    /// Open a fresh, independent source handle.
    fn open(&self) -> Result<Self::Source, SourceError>;
}

/// In-memory column source assembled from aligned reads.
///
/// Like an indexed BAM it over-delivers: every position of every read that
/// overlaps the requested region is reported.
#[derive(Debug, Clone)]
pub struct ReadPileup {
    references: Arc<[(String, u32)]>,
    reads: Arc<BTreeMap<String, Vec<AlignedRead>>>,
}

impl ReadPileup {
    /// Build a source for `references` from the supplied reads.
    ///
    /// Reads whose contig is not listed are ignored.
    pub fn new(references: Vec<(String, u32)>, reads: Vec<AlignedRead>) -> Self {
        let mut by_contig: BTreeMap<String, Vec<AlignedRead>> = references
            .iter()
            .map(|(name, _)| (name.clone(), Vec::new()))
            .collect();
        for read in reads {
            if let Some(bucket) = by_contig.get_mut(read.chrom.as_ref()) {
                bucket.push(read);
            }
        }
        for bucket in by_contig.values_mut() {
            bucket.sort_by_key(|read| read.pos);
        }

        Self {
            references: Arc::from(references.into_boxed_slice()),
            reads: Arc::new(by_contig),
        }
    }

    fn build_columns(&self, reads: &[AlignedRead], region: Option<&Range<u32>>) -> Vec<PileupColumn> {
        let mut columns: BTreeMap<u32, PileupColumn> = BTreeMap::new();

        for read in reads {
            if let Some(region) = region {
                if read.end() <= region.start || read.pos >= region.end {
                    continue;
                }
            }

            for (ref_pos, offset) in read.aligned_pairs() {
                let base = offset.and_then(|offset| {
                    read.base_at(offset).map(|base| AlignedBase {
                        base,
                        read_offset: offset as u32,
                    })
                });
                columns
                    .entry(ref_pos)
                    .or_insert_with(|| PileupColumn::new(ref_pos))
                    .observe(base);
            }
        }

        columns.into_values().collect()
    }
}

impl ColumnSource for ReadPileup {
    fn pileup<'a>(
        &'a mut self,
        contig: &str,
        region: Option<Range<u32>>,
    ) -> Result<Columns<'a>, SourceError> {
        let reads = self
            .reads
            .get(contig)
            .ok_or_else(|| SourceError::UnknownContig(contig.to_string()))?;
        let columns = self.build_columns(reads, region.as_ref());
        Ok(Box::new(columns.into_iter().map(Ok)))
    }
}

impl ReferenceCatalog for ReadPileup {
    fn references(&self) -> Vec<(String, u32)> {
        self.references.to_vec()
    }

    fn mapped_read_count(&self) -> Result<u64, SourceError> {
        Ok(self.reads.values().map(|reads| reads.len() as u64).sum())
    }
}

impl SourceFactory for ReadPileup {
    type Source = ReadPileup;

    fn open(&self) -> Result<Self::Source, SourceError> {
        Ok(self.clone())
    }
}
