//! Indexed BAM files as column sources, via `rust-htslib`.

use std::ops::Range;
use std::path::{Path, PathBuf};

use rust_htslib::bam::{self, header::Header, header::HeaderRecord, Read, Writer};

use crate::genomics::{
    AlignedBase, ColumnSource, Columns, PileupColumn, ReferenceCatalog, SourceError,
    SourceFactory,
};

/// Default cap on reads per pileup column (htslib's own default is 8000).
pub const DEFAULT_MAX_DEPTH: u32 = 100_000;

/// Indexed BAM reader exposing pileup columns.
pub struct BamSource {
    path: PathBuf,
    reader: bam::IndexedReader,
    references: Vec<(String, u32)>,
    mapped: u64,
    max_depth: u32,
}

impl std::fmt::Debug for BamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BamSource")
            .field("path", &self.path)
            .field("references", &self.references.len())
            .field("mapped", &self.mapped)
            .finish()
    }
}

impl BamSource {
    /// Open `path`, which must be a readable BAM file with a `.bai` index.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        // a plain reader tells an unreadable file apart from a missing index
        bam::Reader::from_path(path).map_err(|err| SourceError::Open {
            path: display.clone(),
            reason: err.to_string(),
        })?;
        let mut reader =
            bam::IndexedReader::from_path(path).map_err(|err| SourceError::NotIndexed {
                path: display.clone(),
                reason: err.to_string(),
            })?;

        let header = reader.header().clone();
        let references = header
            .target_names()
            .into_iter()
            .enumerate()
            .map(|(tid, name)| {
                let length = header.target_len(tid as u32).unwrap_or(0) as u32;
                (String::from_utf8_lossy(name).into_owned(), length)
            })
            .collect();

        let mapped = reader
            .index_stats()
            .map_err(|err| SourceError::NotIndexed {
                path: display.clone(),
                reason: err.to_string(),
            })?
            .iter()
            .map(|&(_, _, mapped, _)| mapped)
            .sum();

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            references,
            mapped,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Override the per-column read cap.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Location of the BAM file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ColumnSource for BamSource {
    fn pileup<'a>(
        &'a mut self,
        contig: &str,
        region: Option<Range<u32>>,
    ) -> Result<Columns<'a>, SourceError> {
        let tid = self
            .reader
            .header()
            .tid(contig.as_bytes())
            .ok_or_else(|| SourceError::UnknownContig(contig.to_string()))?;
        let region = match region {
            Some(region) => region,
            None => {
                let length = self.reader.header().target_len(tid).unwrap_or(0) as u32;
                0..length
            }
        };

        let contig = contig.to_string();
        self.reader
            .fetch((tid, region.start as i64, region.end as i64))
            .map_err(|err| SourceError::Read {
                contig: contig.clone(),
                reason: err.to_string(),
            })?;

        let mut pileups = self.reader.pileup();
        pileups.set_max_depth(self.max_depth);

        Ok(Box::new(pileups.map(move |pileup| {
            let pileup = pileup.map_err(|err| SourceError::Read {
                contig: contig.clone(),
                reason: err.to_string(),
            })?;
            let mut column = PileupColumn::new(pileup.pos());
            for alignment in pileup.alignments() {
                let base = alignment.qpos().map(|qpos| AlignedBase {
                    base: alignment.record().seq()[qpos],
                    read_offset: qpos as u32,
                });
                column.observe(base);
            }
            Ok(column)
        })))
    }
}

impl ReferenceCatalog for BamSource {
    fn references(&self) -> Vec<(String, u32)> {
        self.references.clone()
    }

    fn mapped_read_count(&self) -> Result<u64, SourceError> {
        Ok(self.mapped)
    }
}

/// Opens an independent [`BamSource`] per worker.
#[derive(Debug, Clone)]
pub struct BamSourceFactory {
    path: PathBuf,
    max_depth: u32,
}

impl BamSourceFactory {
    /// Factory for the BAM file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the per-column read cap of opened sources.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl SourceFactory for BamSourceFactory {
    type Source = BamSource;

    fn open(&self) -> Result<Self::Source, SourceError> {
        Ok(BamSource::open(&self.path)?.with_max_depth(self.max_depth))
    }
}

/// Create a BAM writer whose header lists `references` in order.
///
/// The caller writes coordinate-sorted records and indexes the file after the
/// writer is dropped.
pub fn create_bam_writer<P: AsRef<Path>>(
    output_path: P,
    references: &[(String, u32)],
) -> anyhow::Result<Writer> {
    let mut header = Header::new();

    let mut hd = HeaderRecord::new(b"HD");
    hd.push_tag(b"VN", &"1.6");
    hd.push_tag(b"SO", &"coordinate");
    header.push_record(&hd);

    for (name, length) in references {
        let mut sq = HeaderRecord::new(b"SQ");
        sq.push_tag(b"SN", name);
        sq.push_tag(b"LN", &(*length as i64));
        header.push_record(&sq);
    }

    let writer = bam::Writer::from_path(output_path, &header, bam::Format::Bam)?;
    Ok(writer)
}
