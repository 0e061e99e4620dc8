//! Output tables for profiled contigs.
//!
//! Every table lists contigs by descending length. Text tables are tab
//! separated with a header row; the JSON metadata is an array of rows whose
//! first row is the header with an empty leading cell.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use tracing::info;

use crate::genomics::KmerTable;
use crate::profiler::{ProfileStore, RunSummary};

/// File name of the k-mer frequency matrix.
pub const TNF_MATRIX_FILE: &str = "TETRANUCLEOTIDE-FREQ-MATRIX.txt";
/// File name of the tab separated metadata table.
pub const METADATA_TXT_FILE: &str = "METADATA.txt";
/// File name of the JSON metadata table.
pub const METADATA_JSON_FILE: &str = "METADATA.json";
/// File name of the run summary.
pub const RUN_SUMMARY_FILE: &str = "RUNINFO.json";

const METADATA_FIELDS: [&str; 4] = ["length", "mean_coverage", "std_coverage", "GC_content"];

/// Write the k-mer frequency matrix: a `contigs` column followed by one
/// column per k-mer of `table`.
pub fn write_tnf_matrix<W: Write>(
    writer: &mut W,
    table: &KmerTable,
    profiles: &ProfileStore,
) -> Result<()> {
    writeln!(writer, "contigs\t{}", table.kmers().join("\t"))?;

    for (name, profile) in profiles.ordered_by_length() {
        let counts = profile.kmer_frequencies.counts();
        if counts.len() != table.len() {
            return Err(anyhow!(
                "contig {name} has {} k-mer columns, expected {}",
                counts.len(),
                table.len()
            ));
        }
        let row: Vec<String> = counts.iter().map(u32::to_string).collect();
        writeln!(writer, "{name}\t{}", row.join("\t"))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the metadata table: length, mean and std coverage, GC content.
pub fn write_metadata<W: Write>(writer: &mut W, profiles: &ProfileStore) -> Result<()> {
    writeln!(writer, "contigs\t{}", METADATA_FIELDS.join("\t"))?;

    for (name, profile) in profiles.ordered_by_length() {
        writeln!(
            writer,
            "{name}\t{length:.4}\t{mean:.4}\t{std:.4}\t{gc:.4}",
            length = profile.length as f64,
            mean = profile.mean_coverage,
            std = profile.std_coverage,
            gc = profile.composition.gc_content,
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Metadata as JSON rows; cells are the same strings as the text table.
pub fn metadata_json(profiles: &ProfileStore) -> Value {
    let mut header = vec![String::new()];
    header.extend(METADATA_FIELDS.iter().map(|field| field.to_string()));

    let mut rows = vec![json!(header)];
    for (name, profile) in profiles.ordered_by_length() {
        rows.push(json!([
            name,
            format!("{:.4}", profile.length as f64),
            format!("{:.4}", profile.mean_coverage),
            format!("{:.4}", profile.std_coverage),
            format!("{:.4}", profile.composition.gc_content),
        ]));
    }
    Value::Array(rows)
}

/// Render the k-mer matrix into a string (useful for tests and snapshots).
pub fn render_tnf_matrix(table: &KmerTable, profiles: &ProfileStore) -> Result<String> {
    let mut buffer = Vec::new();
    write_tnf_matrix(&mut buffer, table, profiles)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered TNF matrix is not valid UTF-8"))
}

/// Render the metadata table into a string.
pub fn render_metadata(profiles: &ProfileStore) -> Result<String> {
    let mut buffer = Vec::new();
    write_metadata(&mut buffer, profiles)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered metadata is not valid UTF-8"))
}

/// Paths written by [`write_reports`].
#[derive(Debug, Clone)]
pub struct ReportPaths {
    /// k-mer frequency matrix.
    pub tnf_matrix: PathBuf,
    /// Tab separated metadata.
    pub metadata_txt: PathBuf,
    /// JSON metadata.
    pub metadata_json: PathBuf,
}

/// Default output directory for `input`: `<input>-PaPi-OUTPUT`.
pub fn default_output_dir(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push("-PaPi-OUTPUT");
    PathBuf::from(name)
}

/// Create `dir` if needed and write every report into it.
pub fn write_reports(dir: &Path, table: &KmerTable, profiles: &ProfileStore) -> Result<ReportPaths> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let paths = ReportPaths {
        tnf_matrix: dir.join(TNF_MATRIX_FILE),
        metadata_txt: dir.join(METADATA_TXT_FILE),
        metadata_json: dir.join(METADATA_JSON_FILE),
    };

    let mut file = fs::File::create(&paths.tnf_matrix)
        .with_context(|| format!("failed to create {}", paths.tnf_matrix.display()))?;
    write_tnf_matrix(&mut file, table, profiles)?;

    let mut file = fs::File::create(&paths.metadata_txt)
        .with_context(|| format!("failed to create {}", paths.metadata_txt.display()))?;
    write_metadata(&mut file, profiles)?;

    let json = serde_json::to_string_pretty(&metadata_json(profiles))?;
    fs::write(&paths.metadata_json, json)
        .with_context(|| format!("failed to write {}", paths.metadata_json.display()))?;

    info!(dir = %dir.display(), contigs = profiles.len(), "reports written");
    Ok(paths)
}

/// Write the run summary as JSON into `dir`.
pub fn write_run_summary(dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
    let path = dir.join(RUN_SUMMARY_FILE);
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
