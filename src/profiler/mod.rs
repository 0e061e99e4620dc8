//! Runs the per-contig stages across a worker pool.
//!
//! Each pool thread owns one column source for the whole run and sends
//! finished contigs back over a channel; the calling thread is the only one touching the run summary and
//! the profile store. Stages run strictly in order for every contig:
//! essential (coverage), the filter checkpoints, auxiliary (entropy and
//! representative sequence), then composition and k-mer frequencies.

mod config;
mod store;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::unbounded;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::genomics::{
    Contig, ContigError, ContigProfile, KmerTable, KmerVectorizer, ReferenceCatalog,
    SourceFactory,
};
use crate::ProfileError;

pub use config::{parse_contig_selection, ProfilerConfig};
pub use store::{ContigFilter, DropReason, DroppedContig, ProfileStore, RunSummary, Stage};

type Outcome<T> = Result<T, (String, ContigError)>;

/// One lazily opened source per pool thread, indexed by thread.
type WorkerSources<S> = [Mutex<Option<S>>];

/// Output of a complete run.
#[derive(Debug, Clone)]
pub struct ProfileRun {
    /// Counts and dropped contigs.
    pub summary: RunSummary,
    /// Profiles of the surviving contigs.
    pub profiles: ProfileStore,
}

/// Contig profiler over sources opened by `F`.
pub struct Profiler<F: SourceFactory> {
    config: ProfilerConfig,
    factory: F,
    vectorizer: KmerVectorizer,
    pool: ThreadPool,
}

impl<F: SourceFactory> std::fmt::Debug for Profiler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profiler")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl<F: SourceFactory> Profiler<F> {
    /// Validate `config`, build the k-mer table and the worker pool.
    pub fn new(config: ProfilerConfig, factory: F) -> Result<Self, ProfileError> {
        config.validate()?;
        let table = KmerTable::new(config.k)
            .map_err(|err| ProfileError::Configuration(err.to_string()))?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|err| {
                ProfileError::Configuration(format!("failed to initialize rayon thread pool: {err}"))
            })?;

        Ok(Self {
            config,
            factory,
            vectorizer: KmerVectorizer::new(Arc::new(table)),
            pool,
        })
    }

    /// Parameters of this profiler.
    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Shared k-mer table used for every contig.
    pub fn kmer_table(&self) -> &Arc<KmerTable> {
        self.vectorizer.table()
    }

    /// Profile every contig of `catalog` that passes selection and filters.
    pub fn run<C: ReferenceCatalog + ?Sized>(&self, catalog: &C) -> Result<ProfileRun, ProfileError> {
        let mapped_reads = catalog.mapped_read_count()?;
        let references = catalog.references();
        info!(
            mapped_reads,
            contigs = references.len(),
            "alignment source opened"
        );

        let mut summary = RunSummary {
            mapped_reads,
            contigs_in_source: references.len(),
            ..RunSummary::default()
        };

        let selected = self.select(references)?;
        summary.contigs_selected = selected.len();

        // length needs no pileup data, so short contigs never reach a worker
        let mut long_enough = Vec::with_capacity(selected.len());
        for (name, length) in selected {
            if length >= self.config.min_contig_length {
                let contig = Contig::with_windows(name, length, self.config.window_size)
                    .map_err(|err| ProfileError::Configuration(err.to_string()))?;
                long_enough.push(contig);
            } else {
                Self::record(
                    &mut summary,
                    DroppedContig {
                        name,
                        reason: DropReason::Filtered {
                            filter: ContigFilter::MinLength,
                            value: length as f64,
                        },
                    },
                );
            }
        }
        summary.contigs_after_length_filter = long_enough.len();
        info!(
            survivors = long_enough.len(),
            min_contig_length = self.config.min_contig_length,
            "length filter applied"
        );
        if long_enough.is_empty() {
            return Err(ProfileError::NoSurvivingContigs {
                filter: ContigFilter::MinLength,
                threshold: self.config.min_contig_length.to_string(),
            });
        }

        let sources: Vec<Mutex<Option<F::Source>>> = (0..self.pool.current_num_threads())
            .map(|_| Mutex::new(None))
            .collect();

        let covered = self.run_stage(
            Stage::Essential,
            &sources,
            long_enough,
            &mut summary,
            |source, contig| contig.analyze_coverage(source),
        );

        let mut well_covered = Vec::with_capacity(covered.len());
        for contig in covered {
            if contig.mean_coverage >= self.config.min_mean_coverage {
                well_covered.push(contig);
            } else {
                Self::record(
                    &mut summary,
                    DroppedContig {
                        name: contig.name.to_string(),
                        reason: DropReason::Filtered {
                            filter: ContigFilter::MinCoverage,
                            value: contig.mean_coverage,
                        },
                    },
                );
            }
        }
        summary.contigs_after_coverage_filter = well_covered.len();
        info!(
            survivors = well_covered.len(),
            min_mean_coverage = self.config.min_mean_coverage,
            "coverage filter applied"
        );
        if well_covered.is_empty() {
            return Err(ProfileError::NoSurvivingContigs {
                filter: ContigFilter::MinCoverage,
                threshold: self.config.min_mean_coverage.to_string(),
            });
        }

        let analyzed = self.run_stage(
            Stage::Auxiliary,
            &sources,
            well_covered,
            &mut summary,
            |source, contig| contig.analyze_auxiliary(source),
        );
        drop(sources);

        let profiles = self.run_composition(analyzed, &mut summary);
        summary.contigs_profiled = profiles.len();
        info!(
            profiled = profiles.len(),
            dropped = summary.dropped.len(),
            "profiling finished"
        );
        if profiles.is_empty() {
            warn!("every contig that passed the filters failed a later stage");
        }

        Ok(ProfileRun { summary, profiles })
    }

    fn select(&self, references: Vec<(String, u32)>) -> Result<Vec<(String, u32)>, ProfileError> {
        let Some(wanted) = &self.config.contigs_of_interest else {
            return Ok(references);
        };

        let wanted: HashSet<&str> = wanted.iter().map(String::as_str).collect();
        let known: HashSet<&str> = references.iter().map(|(name, _)| name.as_str()).collect();
        let mut unknown: Vec<&str> = wanted
            .iter()
            .copied()
            .filter(|name| !known.contains(name))
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            warn!(unknown = ?unknown, "selected contigs missing from the alignment source are ignored");
        }

        let selected: Vec<(String, u32)> = references
            .into_iter()
            .filter(|(name, _)| wanted.contains(name.as_str()))
            .collect();
        info!(selected = selected.len(), requested = wanted.len(), "contig selection applied");
        if selected.is_empty() {
            return Err(ProfileError::NoSurvivingContigs {
                filter: ContigFilter::Selection,
                threshold: format!("{} requested contigs", wanted.len()),
            });
        }
        Ok(selected)
    }

    /// Run a source-backed stage over `contigs`, returning the ones that
    /// completed it.
    fn run_stage<W>(
        &self,
        stage: Stage,
        sources: &WorkerSources<F::Source>,
        contigs: Vec<Contig>,
        summary: &mut RunSummary,
        work: W,
    ) -> Vec<Contig>
    where
        W: Fn(&mut F::Source, &mut Contig) -> Result<(), ContigError> + Sync + Send,
    {
        info!(%stage, contigs = contigs.len(), "stage started");
        let outcomes = self.dispatch(contigs, |mut contig| {
            let result = self.with_worker_source(sources, |source| work(source, &mut contig));
            match result {
                Ok(()) => Ok(contig),
                Err(err) => Err((contig.name.to_string(), err)),
            }
        });
        self.collect(stage, outcomes, summary)
    }

    fn run_composition(&self, contigs: Vec<Contig>, summary: &mut RunSummary) -> ProfileStore {
        info!(stage = %Stage::Composition, contigs = contigs.len(), "stage started");
        let outcomes = self.dispatch(contigs, |mut contig| {
            contig
                .analyze_composition(&self.vectorizer)
                .and_then(|()| contig.to_profile())
                .map(|profile| (contig.name.to_string(), profile))
                .map_err(|err| (contig.name.to_string(), err))
        });

        let mut store = ProfileStore::new();
        for (name, profile) in self.collect::<(String, ContigProfile)>(Stage::Composition, outcomes, summary) {
            store.insert(name, profile);
        }
        store
    }

    /// Fan `contigs` out over the pool and gather every outcome.
    fn dispatch<T, Op>(&self, contigs: Vec<Contig>, op: Op) -> Vec<Outcome<T>>
    where
        T: Send,
        Op: Fn(Contig) -> Outcome<T> + Sync + Send,
    {
        let (sender, receiver) = unbounded::<Outcome<T>>();
        self.pool.install(|| {
            contigs.into_par_iter().for_each(|contig| {
                if sender.send(op(contig)).is_err() {
                    warn!("profile coordinator stopped receiving results");
                }
            })
        });
        drop(sender);
        receiver.into_iter().collect()
    }

    /// Run `work` against the calling pool thread's source, opening it on
    /// first use.
    fn with_worker_source<R>(
        &self,
        sources: &WorkerSources<F::Source>,
        work: impl FnOnce(&mut F::Source) -> Result<R, ContigError>,
    ) -> Result<R, ContigError> {
        let worker = rayon::current_thread_index().unwrap_or(0);
        let slot = sources.get(worker).ok_or_else(|| {
            ContigError::SourceUnavailable(format!("no source slot for worker {worker}"))
        })?;
        // only this thread ever locks its slot
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            let source = self
                .factory
                .open()
                .map_err(|err| ContigError::SourceUnavailable(err.to_string()))?;
            debug!(worker, "worker opened column source");
            *guard = Some(source);
        }
        match guard.as_mut() {
            Some(source) => work(source),
            None => Err(ContigError::SourceUnavailable(
                "worker source slot is empty".to_string(),
            )),
        }
    }

    fn collect<T>(&self, stage: Stage, outcomes: Vec<Outcome<T>>, summary: &mut RunSummary) -> Vec<T> {
        let mut done = Vec::with_capacity(outcomes.len());
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(value) => done.push(value),
                Err((name, err)) => failed.push(DroppedContig {
                    name,
                    reason: DropReason::Failed {
                        stage,
                        reason: err.to_string(),
                    },
                }),
            }
        }
        failed.sort_by(|a, b| a.name.cmp(&b.name));
        for dropped in failed {
            Self::record(summary, dropped);
        }
        info!(%stage, completed = done.len(), "stage finished");
        done
    }

    fn record(summary: &mut RunSummary, dropped: DroppedContig) {
        match &dropped.reason {
            DropReason::Filtered { .. } => {
                debug!(contig = %dropped.name, reason = %dropped.reason, "contig filtered")
            }
            DropReason::Failed { .. } => {
                warn!(contig = %dropped.name, reason = %dropped.reason, "contig dropped")
            }
        }
        summary.dropped.push(dropped);
    }
}
