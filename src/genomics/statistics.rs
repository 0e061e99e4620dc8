//! Small numeric helpers shared by the coverage and entropy engines.

/// Arithmetic mean; `0.0` for an empty sample.
pub fn mean(samples: &[u32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64
}

/// Median of the samples, averaging the two middle values for even sizes.
///
/// Sorts `samples` in place.
pub fn median(samples: &mut [u32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_unstable();
    let mid = samples.len() / 2;
    if samples.len() % 2 == 0 {
        (samples[mid - 1] as f64 + samples[mid] as f64) / 2.0
    } else {
        samples[mid] as f64
    }
}

/// Population standard deviation (divides by `n`).
pub fn std_dev(samples: &[u32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mu = mean(samples);
    let variance = samples
        .iter()
        .map(|&s| {
            let d = s as f64 - mu;
            d * d
        })
        .sum::<f64>()
        / samples.len() as f64;
    variance.sqrt()
}

/// Shannon entropy in bits of the distribution described by `counts`.
///
/// Empty buckets are skipped; a single non-empty bucket yields `0.0`.
pub fn shannon_entropy(counts: &[u32]) -> f64 {
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let entropy = counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum::<f64>();
    // -0.0 for the single-bucket case
    entropy.max(0.0)
}
