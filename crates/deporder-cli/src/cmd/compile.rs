//! `deporder compile`: concatenate sources in dependency order.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use deporder_core::config::RenderStyle;
use deporder_core::{CycleReport, DepGraph, Node, OrderError};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use super::{Scan, scan};
use crate::render::{Compiler, RenderError};

/// Arguments for `deporder compile`.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Directory to scan for sources.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Write here instead of stdout. Skipped when already newer than every
    /// source.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Wrap each fragment in a shell `time` block.
    #[arg(long)]
    pub timed: bool,

    /// Worker threads used to scan sources.
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Execute `deporder compile`.
#[instrument(skip_all, fields(root = %args.root.display()))]
pub fn run_compile(args: &CompileArgs) -> anyhow::Result<()> {
    let Scan {
        root,
        config,
        mut graph,
        report,
        paths,
    } = scan(&args.root, args.jobs)?;
    let latest = report.into_result().map_err(OrderError::from)?;

    let style = if args.timed {
        RenderStyle::Timed
    } else {
        config.render.style
    };

    let written = if let Some(out) = &args.out {
        if is_up_to_date(out, latest)? {
            info!(out = %out.display(), "output newer than every source; nothing to do");
            return Ok(());
        }
        compile_to(out, style, &mut graph, &paths)?
    } else {
        let stdout = io::stdout();
        let mut compiler = Compiler::new(style, stdout.lock());
        emit(&mut compiler, &mut graph, &paths)?;
        let written = compiler.written();
        compiler.finish()?;
        written
    };

    info!(root = %root.display(), written, "compile complete");
    Ok(())
}

/// Render into a temp file beside `out` and move it over `out` only once
/// every fragment is written. A failed run leaves `out` untouched.
fn compile_to(
    out: &Path,
    style: RenderStyle,
    graph: &mut DepGraph,
    paths: &HashMap<Node, PathBuf>,
) -> anyhow::Result<usize> {
    let dir = out
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staged = NamedTempFile::new_in(dir)
        .map_err(RenderError::Write)
        .with_context(|| format!("cannot stage output in {}", dir.display()))?;
    if let Ok(meta) = fs::metadata(out) {
        staged
            .as_file()
            .set_permissions(meta.permissions())
            .map_err(RenderError::Write)
            .with_context(|| format!("cannot copy permissions of {}", out.display()))?;
    }

    let mut compiler = Compiler::new(style, BufWriter::new(staged));
    emit(&mut compiler, graph, paths)?;
    let written = compiler.written();

    let staged = compiler
        .finish()?
        .into_inner()
        .map_err(|err| RenderError::Write(err.into_error()))?;
    staged
        .persist(out)
        .map_err(|err| RenderError::Write(err.error))
        .with_context(|| format!("cannot replace {}", out.display()))?;
    Ok(written)
}

/// Drain `graph`, writing each node that has a backing file.
///
/// Names that only appear as relation targets are ordered like any other
/// node but produce no fragment.
fn emit<W: Write>(
    compiler: &mut Compiler<W>,
    graph: &mut DepGraph,
    paths: &HashMap<Node, PathBuf>,
) -> anyhow::Result<()> {
    for node in graph.by_ref() {
        let Some(path) = paths.get(&node) else {
            debug!(%node, "no source file; skipping");
            continue;
        };
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(%node, path = %path.display(), "source vanished; skipping");
                continue;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("cannot open {}", path.display()));
            }
        };
        compiler
            .fragment(node.as_str(), path, &mut file)
            .with_context(|| format!("cannot render {node}"))?;
    }

    if let Some(report) = CycleReport::from_graph(graph) {
        return Err(OrderError::Cycle(report).into());
    }
    Ok(())
}

/// True if `out` exists and was modified after `latest`. With no sources
/// there is nothing newer than an existing output.
fn is_up_to_date(out: &Path, latest: Option<DateTime<Utc>>) -> anyhow::Result<bool> {
    let modified = match fs::metadata(out).and_then(|meta| meta.modified()) {
        Ok(modified) => DateTime::<Utc>::from(modified),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => {
            return Err(err).with_context(|| format!("cannot stat {}", out.display()));
        }
    };
    Ok(latest.is_none_or(|latest| modified > latest))
}
