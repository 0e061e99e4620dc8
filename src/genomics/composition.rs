use serde::{Deserialize, Serialize};

/// Nucleotide counts and GC fraction of a representative sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Number of `A` bases.
    #[serde(rename = "A")]
    pub a: u64,
    /// Number of `T` bases.
    #[serde(rename = "T")]
    pub t: u64,
    /// Number of `C` bases.
    #[serde(rename = "C")]
    pub c: u64,
    /// Number of `G` bases.
    #[serde(rename = "G")]
    pub g: u64,
    /// Everything that is not `A`, `T`, `C` or `G`.
    #[serde(rename = "N")]
    pub n: u64,
    /// `(G + C) / (length - N)`, or `0.0` for a sequence without informative bases.
    #[serde(rename = "GC_content")]
    pub gc_content: f64,
}

impl Composition {
    /// Count bases of `sequence`. Only uppercase `A`, `T`, `C`, `G` are informative.
    pub fn from_sequence(sequence: &[u8]) -> Self {
        let mut composition = Self::default();
        for &base in sequence {
            match base {
                b'A' => composition.a += 1,
                b'T' => composition.t += 1,
                b'C' => composition.c += 1,
                b'G' => composition.g += 1,
                _ => {}
            }
        }

        let raw_length = sequence.len() as u64;
        composition.n = raw_length - composition.informative();

        let informative = raw_length - composition.n;
        composition.gc_content = if informative == 0 {
            0.0
        } else {
            (composition.g + composition.c) as f64 / informative as f64
        };
        composition
    }

    /// Number of `A`, `T`, `C` and `G` bases.
    pub fn informative(&self) -> u64 {
        self.a + self.t + self.c + self.g
    }

    /// Total sequence length the counts were taken from.
    pub fn len(&self) -> u64 {
        self.informative() + self.n
    }

    /// Whether the counts describe an empty sequence.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
