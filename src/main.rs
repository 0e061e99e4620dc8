use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use papi::genomics::bam::{BamSource, BamSourceFactory, DEFAULT_MAX_DEPTH};
use papi::genomics::{ReferenceCatalog, DEFAULT_K};
use papi::profiler::parse_contig_selection;
use papi::{report, Profiler, ProfilerConfig};

#[derive(Parser, Debug)]
#[command(name = "papi", version, about = "Contig coverage, entropy and composition profiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Profile the contigs of an indexed BAM file.
    Profile(ProfileArgs),
    /// Print the contigs of an indexed BAM file with their lengths.
    ListContigs {
        /// Sorted and indexed BAM file.
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ProfileArgs {
    /// Sorted and indexed BAM file.
    input: PathBuf,
    /// Output directory (default: `<input>-PaPi-OUTPUT`).
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Contigs shorter than this are skipped.
    #[arg(long, default_value_t = 10_000)]
    min_contig_length: u32,
    /// Contigs with a lower mean coverage are skipped.
    #[arg(long, default_value_t = 10.0)]
    min_mean_coverage: f64,
    /// Split size in bases.
    #[arg(long, default_value_t = 20_000)]
    window_size: u32,
    /// k-mer length for the frequency matrix.
    #[arg(short, long, default_value_t = DEFAULT_K)]
    k: usize,
    /// Worker threads (0 uses every core).
    #[arg(short, long, default_value_t = 4)]
    threads: usize,
    /// Comma separated contig names, or a file with one name per line.
    #[arg(long)]
    contigs_of_interest: Option<String>,
    /// Cap on reads per pileup column.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile(args) => run_profile(args)?,
        Commands::ListContigs { input } => run_list_contigs(input)?,
    }

    Ok(())
}

fn run_list_contigs(input: PathBuf) -> Result<()> {
    let source = BamSource::open(&input)
        .with_context(|| format!("failed to open {}", input.display()))?;
    for (name, length) in source.references() {
        println!("{name}\t{length}");
    }
    Ok(())
}

fn run_profile(args: ProfileArgs) -> Result<()> {
    let mut config = ProfilerConfig::default()
        .with_min_contig_length(args.min_contig_length)
        .with_min_mean_coverage(args.min_mean_coverage)
        .with_window_size(args.window_size)
        .with_k(args.k)
        .with_threads(args.threads);
    if let Some(selection) = &args.contigs_of_interest {
        config = config.with_contigs_of_interest(parse_contig_selection(selection)?);
    }

    let catalog = BamSource::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let factory = BamSourceFactory::new(&args.input).with_max_depth(args.max_depth);
    let profiler = Profiler::new(config, factory)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| report::default_output_dir(&args.input));
    info!(input = %args.input.display(), output = %output.display(), "profiling");

    let run = profiler
        .run(&catalog)
        .with_context(|| format!("profiling {} failed", args.input.display()))?;

    let paths = report::write_reports(&output, profiler.kmer_table(), &run.profiles)?;
    report::write_run_summary(&output, &run.summary)?;

    println!(
        "{} of {} contigs profiled, {} dropped",
        run.summary.contigs_profiled,
        run.summary.contigs_in_source,
        run.summary.dropped.len()
    );
    println!("TNF matrix: {}", paths.tnf_matrix.display());
    println!("Metadata:   {}", paths.metadata_txt.display());

    Ok(())
}
