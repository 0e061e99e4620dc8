use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::genomics::statistics::{mean, median, std_dev};
use crate::genomics::{PileupColumn, SourceError};

/// Depth statistics for one window.
///
/// Only covered positions contribute samples, so `mean` is the mean depth of
/// the covered part of the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    /// Smallest observed depth.
    pub min: u32,
    /// Largest observed depth.
    pub max: u32,
    /// Mean observed depth.
    pub mean: f64,
    /// Median observed depth.
    pub median: f64,
    /// Population standard deviation of the observed depths.
    pub std: f64,
    /// Number of positions with non-zero depth.
    pub explicit_length: u32,
}

impl Coverage {
    /// Aggregate the depth of every column inside `region`.
    ///
    /// Columns outside the half-open region are ignored. An uncovered window
    /// yields all-zero statistics.
    pub fn from_columns<I>(region: &Range<u32>, columns: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = Result<PileupColumn, SourceError>>,
    {
        let mut depths = Vec::with_capacity(region.len());
        for column in columns {
            let column = column?;
            if !region.contains(&column.position) || column.depth == 0 {
                continue;
            }
            depths.push(column.depth);
        }
        Ok(Self::from_depths(depths))
    }

    /// Statistics over raw depth samples.
    pub fn from_depths(mut depths: Vec<u32>) -> Self {
        if depths.is_empty() {
            return Self::default();
        }
        Self {
            min: depths.iter().copied().min().unwrap_or(0),
            max: depths.iter().copied().max().unwrap_or(0),
            mean: mean(&depths),
            std: std_dev(&depths),
            median: median(&mut depths),
            explicit_length: depths.len() as u32,
        }
    }
}
