//! `deporder cycles`: list ordering cycles and the nodes stuck behind them.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use deporder_core::{CycleReport, Node, OrderError};
use serde::Serialize;

use super::scan;
use crate::output::{OutputMode, render};

/// Arguments for `deporder cycles`.
#[derive(Args, Debug)]
pub struct CyclesArgs {
    /// Directory to scan for sources.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Worker threads used to scan sources.
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    cycles: Vec<Vec<Node>>,
    blocked: Vec<Node>,
    edges: Vec<(Node, Node)>,
}

impl From<Option<CycleReport>> for CyclesOutput {
    fn from(report: Option<CycleReport>) -> Self {
        match report {
            Some(report) => Self {
                blocked: report.blocked(),
                cycles: report.cycles,
                edges: report.edges,
            },
            None => Self {
                cycles: Vec::new(),
                blocked: Vec::new(),
                edges: Vec::new(),
            },
        }
    }
}

/// Execute `deporder cycles`.
pub fn run_cycles(args: &CyclesArgs, output: OutputMode) -> anyhow::Result<()> {
    let mut scanned = scan(&args.root, args.jobs)?;
    scanned.report.into_result().map_err(OrderError::from)?;

    scanned.graph.by_ref().for_each(drop);
    let payload = CyclesOutput::from(CycleReport::from_graph(&scanned.graph));

    render(output, &payload, render_cycles_human)
}

fn render_cycles_human(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.cycles.is_empty() {
        writeln!(w, "No dependency cycles found.")?;
        return Ok(());
    }

    writeln!(w, "Dependency cycles ({})", payload.cycles.len())?;
    for (idx, cycle) in payload.cycles.iter().enumerate() {
        writeln!(w, "\nCycle {}:", idx + 1)?;
        for node in cycle {
            writeln!(w, "  - {node}")?;
        }
    }

    if !payload.blocked.is_empty() {
        writeln!(w, "\nBlocked behind a cycle:")?;
        for node in &payload.blocked {
            writeln!(w, "  - {node}")?;
        }
    }

    writeln!(w, "\nResidual edges:")?;
    for (a, b) in &payload.edges {
        writeln!(w, "  {a} -> {b}")?;
    }
    Ok(())
}
