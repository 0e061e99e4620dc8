//! Run parameters for the profiler.

use std::path::Path;

use crate::genomics::{DEFAULT_K, MAX_K};
use crate::ProfileError;

/// Parameters consumed by [`crate::Profiler`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilerConfig {
    /// Contigs shorter than this are dropped after the essential stage.
    pub min_contig_length: u32,
    /// Contigs whose mean coverage is below this are dropped.
    pub min_mean_coverage: f64,
    /// Split size in bases.
    pub window_size: u32,
    /// k-mer length for frequency vectors.
    pub k: usize,
    /// Worker threads (`0` lets rayon decide).
    pub threads: usize,
    /// Restrict profiling to these contigs.
    pub contigs_of_interest: Option<Vec<String>>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            min_contig_length: 10_000,
            min_mean_coverage: 10.0,
            window_size: 20_000,
            k: DEFAULT_K,
            threads: 4,
            contigs_of_interest: None,
        }
    }
}

impl ProfilerConfig {
    /// Set the minimum contig length.
    pub fn with_min_contig_length(mut self, min_contig_length: u32) -> Self {
        self.min_contig_length = min_contig_length;
        self
    }

    /// Set the minimum mean coverage.
    pub fn with_min_mean_coverage(mut self, min_mean_coverage: f64) -> Self {
        self.min_mean_coverage = min_mean_coverage;
        self
    }

    /// Set the split size.
    pub fn with_window_size(mut self, window_size: u32) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the k-mer length.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Only profile the named contigs.
    pub fn with_contigs_of_interest(mut self, contigs: Vec<String>) -> Self {
        self.contigs_of_interest = Some(contigs);
        self
    }

    /// Reject parameters that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.min_contig_length == 0 {
            return Err(ProfileError::Configuration(
                "minimum contig length must be 1 or larger".to_string(),
            ));
        }
        if !(self.min_mean_coverage > 0.0) || !self.min_mean_coverage.is_finite() {
            return Err(ProfileError::Configuration(format!(
                "minimum mean coverage must be a positive number, got {}",
                self.min_mean_coverage
            )));
        }
        if self.window_size == 0 {
            return Err(ProfileError::Configuration(
                "window size must be 1 or larger".to_string(),
            ));
        }
        if self.k == 0 || self.k > MAX_K {
            return Err(ProfileError::Configuration(format!(
                "k-mer length must be between 1 and {MAX_K}, got {}",
                self.k
            )));
        }
        if let Some(contigs) = &self.contigs_of_interest {
            if contigs.is_empty() {
                return Err(ProfileError::Configuration(
                    "contig selection is empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Parse a contig selection: a file with one name per line (`#` starts a
/// comment line), or a comma separated list of names.
pub fn parse_contig_selection(value: &str) -> Result<Vec<String>, ProfileError> {
    let path = Path::new(value);
    let names: Vec<String> = if path.is_file() {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            ProfileError::Configuration(format!(
                "cannot read contig list '{}': {err}",
                path.display()
            ))
        })?;
        contents
            .lines()
            .filter(|line| !line.starts_with('#'))
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    };
    Ok(names)
}
