pub mod compile;
pub mod cycles;
pub mod order;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use deporder_core::config::{ProjectConfig, load_project_config};
use deporder_core::{
    DepGraph, GatherOptions, GatherReport, HeaderExtractor, Node, Source, discover_sources, gather,
};
use tracing::{instrument, warn};

/// Everything learned from one pass over a root directory.
pub struct Scan {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub graph: DepGraph,
    pub report: GatherReport,
    /// Where each named source lives. Names only ever seen as a relation
    /// target have no entry.
    pub paths: HashMap<Node, PathBuf>,
}

/// Load config, discover sources under `root`, and gather their relations.
///
/// Per-source failures are left in `Scan::report`; only failures that
/// prevent the scan from starting are returned as errors.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn scan(root: &Path, jobs: Option<usize>) -> anyhow::Result<Scan> {
    let root = std::path::absolute(root)
        .with_context(|| format!("cannot resolve {}", root.display()))?;
    let config = load_project_config(&root)?;

    let mut scan_config = config.scan.clone();
    if jobs.is_some() {
        scan_config.jobs = jobs;
    }

    let sources = discover_sources(&root, &scan_config)?;
    let extractor = HeaderExtractor::new(&scan_config.marker)
        .with_context(|| format!("invalid declaration marker {:?}", scan_config.marker))?;

    let mut graph = DepGraph::new();
    let report = gather(
        &sources,
        &extractor,
        &mut graph,
        &GatherOptions::from_config(&scan_config),
    );

    Ok(Scan {
        paths: index_paths(sources),
        root,
        config,
        graph,
        report,
    })
}

fn index_paths(sources: Vec<Source>) -> HashMap<Node, PathBuf> {
    let mut paths = HashMap::with_capacity(sources.len());
    for source in sources {
        if let Some(previous) = paths.insert(source.name.clone(), source.path) {
            warn!(
                name = %source.name,
                shadowed = %previous.display(),
                "duplicate source name; last path wins"
            );
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scan_collects_graph_and_paths() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("a"), "# before: ghost\n").expect("write");
        std::fs::write(dir.path().join("b"), "").expect("write");

        let scanned = scan(dir.path(), Some(2)).expect("scan");
        assert_eq!(scanned.report.sources, 2);
        assert!(scanned.paths.contains_key("a"));
        assert!(!scanned.paths.contains_key("ghost"));

        let order: Vec<String> = scanned.graph.map(Node::into_string).collect();
        assert_eq!(order, ["a", "ghost", "b"]);
    }

    #[test]
    fn duplicate_names_keep_last_path() {
        let paths = index_paths(vec![
            Source::new("x", "/one/x"),
            Source::new("x", "/two/x"),
        ]);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths.get("x"), Some(&PathBuf::from("/two/x")));
    }
}
