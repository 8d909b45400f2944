//! Source discovery.
//!
//! Every regular file under the root is a source, named by its base name.
//! Files whose name begins with the skip prefix (`.` by default) are left
//! out; directories are always descended into.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::config::ScanConfig;
use crate::error::SourceError;
use crate::relation::Node;

/// One named input whose header declares its ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: Node,
    pub path: PathBuf,
}

impl Source {
    #[must_use]
    pub fn new(name: impl Into<Node>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Walk `root` and collect its sources, sorted by path.
///
/// # Errors
///
/// Returns [`SourceError::Walk`] if `root` or any directory below it cannot
/// be listed.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn discover_sources(root: &Path, config: &ScanConfig) -> Result<Vec<Source>, SourceError> {
    let mut sources = Vec::new();
    walk(root, config, &mut sources)?;
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(count = sources.len(), "discovered sources");
    Ok(sources)
}

fn walk(dir: &Path, config: &ScanConfig, sources: &mut Vec<Source>) -> Result<(), SourceError> {
    let walk_err = |source| SourceError::Walk {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(walk_err)? {
        let entry = entry.map_err(walk_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|source| SourceError::Stat {
            path: path.clone(),
            source,
        })?;

        if file_type.is_dir() {
            walk(&path, config, sources)?;
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !config.skip_prefix.is_empty() && name.starts_with(&config.skip_prefix) {
            debug!(%name, "skipping reserved source");
            continue;
        }
        sources.push(Source::new(name, path));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(sources: &[Source]) -> Vec<&str> {
        sources.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn lists_files_recursively_by_base_name() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("b"), "").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("nested").join("a"), "").expect("write");

        let sources = discover_sources(dir.path(), &ScanConfig::default()).expect("walk");
        assert_eq!(names(&sources), ["b", "a"]);
        assert_eq!(sources[1].path, dir.path().join("nested").join("a"));
    }

    #[test]
    fn skips_reserved_prefix() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(".hidden"), "").expect("write");
        fs::write(dir.path().join("_draft"), "").expect("write");
        fs::write(dir.path().join("kept"), "").expect("write");

        let sources = discover_sources(dir.path(), &ScanConfig::default()).expect("walk");
        assert_eq!(names(&sources), ["_draft", "kept"]);

        let config = ScanConfig {
            skip_prefix: "_".to_string(),
            ..ScanConfig::default()
        };
        let sources = discover_sources(dir.path(), &config).expect("walk");
        assert_eq!(names(&sources), [".hidden", "kept"]);
    }

    #[test]
    fn missing_root_is_a_walk_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = discover_sources(&dir.path().join("nope"), &ScanConfig::default())
            .expect_err("missing root");
        assert!(matches!(err, SourceError::Walk { .. }));
    }
}
