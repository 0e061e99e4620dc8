use std::sync::Arc;

/// Simple CIGAR operation kinds describing how a read aligns to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOpKind {
    /// Consuming match/mismatch.
    Match,
    /// Insertion relative to the reference.
    Insertion,
    /// Deletion relative to the reference.
    Deletion,
    /// Soft clipping (sequence present in read only).
    SoftClip,
    /// Hard clipping (trimmed sequence not present in read).
    HardClip,
}

impl CigarOpKind {
    fn consumes_reference(self) -> bool {
        matches!(self, CigarOpKind::Match | CigarOpKind::Deletion)
    }

    fn consumes_read(self) -> bool {
        matches!(
            self,
            CigarOpKind::Match | CigarOpKind::Insertion | CigarOpKind::SoftClip
        )
    }
}

/// CIGAR operation with length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    /// Operation kind.
    pub kind: CigarOpKind,
    /// Number of bases affected by the operation.
    pub len: u32,
}

impl CigarOp {
    /// Construct a new CIGAR operation.
    pub fn new(kind: CigarOpKind, len: u32) -> Self {
        Self { kind, len }
    }
}

/// Aligned read with the sequence needed to build pileup columns.
#[derive(Debug, Clone)]
pub struct AlignedRead {
    /// Reference contig name.
    pub chrom: Arc<str>,
    /// 0-based leftmost reference coordinate.
    pub pos: u32,
    /// CIGAR describing the alignment.
    pub cigar: Vec<CigarOp>,
    /// Read sequence stored as uppercase ASCII.
    pub sequence: Arc<[u8]>,
}

impl AlignedRead {
    /// Construct a new aligned read wrapper.
    pub fn new(
        chrom: impl Into<Arc<str>>,
        pos: u32,
        cigar: Vec<CigarOp>,
        sequence: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
            cigar,
            sequence: sequence.into(),
        }
    }

    /// Ungapped read: a single match operation spanning the whole sequence.
    pub fn ungapped(chrom: impl Into<Arc<str>>, pos: u32, sequence: &[u8]) -> Self {
        let cigar = vec![CigarOp::new(CigarOpKind::Match, sequence.len() as u32)];
        Self::new(chrom, pos, cigar, sequence.to_ascii_uppercase())
    }

    /// Read length inferred from the sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the read carries no bases.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Number of reference bases spanned by the alignment.
    pub fn reference_span(&self) -> u32 {
        self.cigar
            .iter()
            .filter(|op| op.kind.consumes_reference())
            .map(|op| op.len)
            .sum()
    }

    /// End position (half-open) on the reference.
    pub fn end(&self) -> u32 {
        self.pos + self.reference_span()
    }

    /// Base at the provided read offset.
    pub fn base_at(&self, offset: usize) -> Option<u8> {
        self.sequence.get(offset).copied()
    }

    /// Walk the CIGAR and report every reference position the read spans,
    /// paired with the read offset aligned there (`None` inside deletions).
    pub fn aligned_pairs(&self) -> Vec<(u32, Option<usize>)> {
        let mut pairs = Vec::with_capacity(self.reference_span() as usize);
        let mut ref_pos = self.pos;
        let mut read_offset = 0usize;

        for op in &self.cigar {
            let len = op.len as usize;
            match (op.kind.consumes_reference(), op.kind.consumes_read()) {
                (true, true) => {
                    for i in 0..len {
                        pairs.push((ref_pos + i as u32, Some(read_offset + i)));
                    }
                }
                (true, false) => {
                    for i in 0..len {
                        pairs.push((ref_pos + i as u32, None));
                    }
                }
                _ => {}
            }
            if op.kind.consumes_reference() {
                ref_pos += op.len;
            }
            if op.kind.consumes_read() {
                read_offset += len;
            }
        }

        pairs
    }
}
