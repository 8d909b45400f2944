//! `deporder order`: print the computed order without rendering.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use deporder_core::{Node, OrderError};
use serde::Serialize;

use super::scan;
use crate::output::{OutputMode, render};

/// Arguments for `deporder order`.
#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Directory to scan for sources.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Only list names that have a backing source file.
    #[arg(long)]
    pub sources_only: bool,

    /// Worker threads used to scan sources.
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Debug, Serialize)]
struct OrderOutput {
    order: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest_modified: Option<DateTime<Utc>>,
}

/// Execute `deporder order`.
pub fn run_order(args: &OrderArgs, output: OutputMode) -> anyhow::Result<()> {
    let scanned = scan(&args.root, args.jobs)?;
    let latest_modified = scanned.report.into_result().map_err(OrderError::from)?;

    let mut order = scanned.graph.into_order()?;
    if args.sources_only {
        order.retain(|node| scanned.paths.contains_key(node));
    }

    let payload = OrderOutput {
        order,
        latest_modified,
    };
    render(output, &payload, render_order_human)
}

fn render_order_human(payload: &OrderOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for node in &payload.order {
        writeln!(w, "{node}")?;
    }
    Ok(())
}
