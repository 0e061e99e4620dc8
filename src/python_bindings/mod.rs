//! Python bindings that expose the profiler via PyO3.
use std::sync::Arc;

use pyo3::{exceptions::PyRuntimeError, exceptions::PyValueError, prelude::*, types::PyModule};

use crate::genomics::{AlignedRead, Composition, KmerTable, KmerVectorizer, ReadPileup};
use crate::{Profiler, ProfilerConfig};

/// Python-facing profiler over in-memory ungapped reads.
#[pyclass]
#[derive(Debug)]
pub struct PyProfiler {
    config: ProfilerConfig,
}

#[pymethods]
impl PyProfiler {
    #[new]
    #[pyo3(signature = (min_contig_length=10_000, min_mean_coverage=10.0, window_size=20_000, k=4, threads=4))]
    /// Create a profiler with the given thresholds.
    pub fn new(
        min_contig_length: u32,
        min_mean_coverage: f64,
        window_size: u32,
        k: usize,
        threads: usize,
    ) -> PyResult<Self> {
        let config = ProfilerConfig::default()
            .with_min_contig_length(min_contig_length)
            .with_min_mean_coverage(min_mean_coverage)
            .with_window_size(window_size)
            .with_k(k)
            .with_threads(threads);
        config
            .validate()
            .map_err(|err| PyValueError::new_err(err.to_string()))?;
        Ok(Self { config })
    }

    /// Profile contigs from reads.
    ///
    /// Args:
    ///     references: List of `(name, length)` tuples.
    ///     reads: List of `(contig, position, sequence)` tuples.
    ///
    /// Returns:
    ///     JSON object mapping contig names to their profiles.
    pub fn profile(
        &self,
        references: Vec<(String, u32)>,
        reads: Vec<(String, u32, String)>,
    ) -> PyResult<String> {
        let source = build_source(references, reads);
        let profiler = Profiler::new(self.config.clone(), source.clone())
            .map_err(|err| PyValueError::new_err(err.to_string()))?;
        let run = profiler
            .run(&source)
            .map_err(|err| PyRuntimeError::new_err(err.to_string()))?;
        serde_json::to_string(&run.profiles).map_err(|err| PyRuntimeError::new_err(err.to_string()))
    }
}

fn build_source(references: Vec<(String, u32)>, reads: Vec<(String, u32, String)>) -> ReadPileup {
    let aligned_reads = reads
        .into_iter()
        .filter_map(|(contig, pos, seq)| {
            let sequence = seq.trim();
            if sequence.is_empty() {
                return None;
            }
            Some(AlignedRead::ungapped(contig.as_str(), pos, sequence.as_bytes()))
        })
        .collect();
    ReadPileup::new(references, aligned_reads)
}

/// `(A, T, C, G, N, GC content)` of a sequence.
#[pyfunction]
pub fn composition(sequence: &str) -> (u64, u64, u64, u64, u64, f64) {
    let composition = Composition::from_sequence(sequence.as_bytes());
    (
        composition.a,
        composition.t,
        composition.c,
        composition.g,
        composition.n,
        composition.gc_content,
    )
}

/// k-mer labels and counts of a sequence, in lexicographic order.
#[pyfunction]
#[pyo3(signature = (sequence, k=4))]
pub fn kmer_frequencies(sequence: &str, k: usize) -> PyResult<(Vec<String>, Vec<u32>)> {
    let table = KmerTable::new(k).map_err(|err| PyValueError::new_err(err.to_string()))?;
    let vectorizer = KmerVectorizer::new(Arc::new(table));
    let vector = vectorizer.vectorize(sequence.as_bytes());
    Ok((vectorizer.table().kmers().to_vec(), vector.counts().to_vec()))
}

/// Create Python module.
#[pymodule]
pub fn papi_py(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyProfiler>()?;
    m.add_function(wrap_pyfunction!(composition, m)?)?;
    m.add_function(wrap_pyfunction!(kmer_frequencies, m)?)?;
    Ok(())
}
