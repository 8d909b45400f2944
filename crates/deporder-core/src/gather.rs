//! Concurrent relation discovery.
//!
//! # Overview
//!
//! Reading and pattern-matching sources is the slow part of a run; mutating
//! the graph is cheap. [`gather`] therefore fans the reads out over a pool of
//! scoped worker threads and funnels everything they learn back through one
//! bounded channel to a single merge point, which is the only code that
//! touches the [`DepGraph`].
//!
//! ```text
//!  worker 0 ─┐
//!  worker 1 ─┼─ Signal ─▶ bounded channel ─▶ merge point (&mut DepGraph)
//!  worker N ─┘
//! ```
//!
//! ## Failure Policy
//!
//! A source that cannot be stat'ed or read produces a `Failed` signal; its
//! siblings keep going. The merge point drains until every worker has
//! hung up, so the pool always reaches quiescence. The first failure is
//! kept in the [`GatherReport`], and whatever the other sources contributed
//! stays in the graph.

use std::fs::{self, File};
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::ScanConfig;
use crate::error::SourceError;
use crate::extract::RelationExtractor;
use crate::graph::DepGraph;
use crate::relation::{Node, Relation};
use crate::source::Source;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherOptions {
    /// Upper bound on worker threads. Never more than the number of sources.
    pub jobs: NonZeroUsize,
    /// Signals buffered between workers and the merge point before workers
    /// block.
    pub channel_capacity: usize,
}

impl GatherOptions {
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        let mut options = Self {
            channel_capacity: config.channel_capacity,
            ..Self::default()
        };
        if let Some(jobs) = config.jobs.and_then(NonZeroUsize::new) {
            options.jobs = jobs;
        }
        options
    }
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            jobs: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            channel_capacity: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Signals and report
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Signal {
    Modified(DateTime<Utc>),
    Relation { name: Node, relation: Relation },
    Free(Node),
    Failed(SourceError),
}

/// What the merge point saw.
#[derive(Debug, Default)]
pub struct GatherReport {
    /// Newest modification time across all sources that could be stat'ed.
    pub latest_modified: Option<DateTime<Utc>>,
    /// Sources handed to the pool.
    pub sources: usize,
    /// Relations applied to the graph.
    pub relations: usize,
    /// Sources that declared no relations.
    pub free: usize,
    /// Sources that failed.
    pub failures: usize,
    pub first_error: Option<SourceError>,
}

impl GatherReport {
    fn merge(&mut self, signal: Signal, graph: &mut DepGraph) {
        match signal {
            Signal::Modified(modified) => {
                self.latest_modified = self.latest_modified.max(Some(modified));
            }
            Signal::Relation { name, relation } => {
                trace!(%name, %relation, "merge relation");
                graph.declare_relation(&name, &relation);
                self.relations += 1;
            }
            Signal::Free(name) => {
                trace!(%name, "merge free");
                graph.declare_free(name);
                self.free += 1;
            }
            Signal::Failed(err) => {
                self.failures += 1;
                if self.first_error.is_none() {
                    self.first_error = Some(err);
                }
            }
        }
    }

    /// The latest modification time, or the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`SourceError`] any worker hit.
    pub fn into_result(self) -> Result<Option<DateTime<Utc>>, SourceError> {
        match self.first_error {
            Some(err) => Err(err),
            None => Ok(self.latest_modified),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Scan `sources` concurrently and apply what they declare to `graph`.
///
/// Returns once every source has been processed and every signal merged.
/// The graph keeps the contributions of successful sources even when the
/// report carries an error.
#[instrument(skip_all, fields(sources = sources.len()))]
pub fn gather(
    sources: &[Source],
    extractor: &dyn RelationExtractor,
    graph: &mut DepGraph,
    options: &GatherOptions,
) -> GatherReport {
    let mut report = GatherReport {
        sources: sources.len(),
        ..GatherReport::default()
    };
    if sources.is_empty() {
        return report;
    }

    let jobs = options.jobs.get().min(sources.len());
    let cursor = AtomicUsize::new(0);
    let (tx, rx) = crossbeam_channel::bounded::<Signal>(options.channel_capacity);

    thread::scope(|scope| {
        for worker in 0..jobs {
            let tx = tx.clone();
            let cursor = &cursor;
            scope.spawn(move || {
                while let Some(source) = sources.get(cursor.fetch_add(1, Ordering::Relaxed)) {
                    trace!(worker, name = %source.name, "scan");
                    if let Err(err) = scan_source(source, extractor, &tx) {
                        warn!(
                            worker,
                            name = %source.name,
                            path = %err.path().display(),
                            code = %err.code(),
                            error = %err,
                            "source failed"
                        );
                        emit(&tx, Signal::Failed(err));
                    }
                }
            });
        }
        drop(tx);

        for signal in rx {
            report.merge(signal, graph);
        }
    });

    info!(
        jobs,
        relations = report.relations,
        free = report.free,
        failures = report.failures,
        "gather complete"
    );
    debug!(
        ready = graph.ready_len(),
        free = graph.free_len(),
        edges = graph.edge_count(),
        "graph after gather"
    );
    report
}

/// Stat, read and extract one source, emitting its signals as it goes.
fn scan_source(
    source: &Source,
    extractor: &dyn RelationExtractor,
    tx: &Sender<Signal>,
) -> Result<(), SourceError> {
    let modified = fs::metadata(&source.path)
        .and_then(|meta| meta.modified())
        .map_err(|err| SourceError::Stat {
            path: source.path.clone(),
            source: err,
        })?;
    emit(tx, Signal::Modified(DateTime::<Utc>::from(modified)));

    let read_err = |err| SourceError::Read {
        path: source.path.clone(),
        source: err,
    };
    let file = File::open(&source.path).map_err(read_err)?;
    let relations = extractor
        .extract(&mut BufReader::new(file))
        .map_err(read_err)?;

    if relations.is_empty() {
        emit(tx, Signal::Free(source.name.clone()));
        return Ok(());
    }
    for relation in relations {
        emit(
            tx,
            Signal::Relation {
                name: source.name.clone(),
                relation,
            },
        );
    }
    Ok(())
}

fn emit(tx: &Sender<Signal>, signal: Signal) {
    // Only fails if the merge point is gone, which means the scope is
    // already unwinding.
    if tx.send(signal).is_err() {
        trace!("merge point closed; signal dropped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
