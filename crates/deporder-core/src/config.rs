use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// File name looked up at the scan root.
pub const CONFIG_FILE: &str = ".deporder.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Comment leader in front of `before:` / `after:` declarations.
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Files whose base name starts with this are not sources.
    #[serde(default = "default_skip_prefix")]
    pub skip_prefix: String,
    /// Worker threads; `None` means available parallelism.
    #[serde(default)]
    pub jobs: Option<usize>,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            skip_prefix: default_skip_prefix(),
            jobs: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    #[default]
    Plain,
    Timed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub style: RenderStyle,
}

fn default_marker() -> String {
    "#".to_string()
}

fn default_skip_prefix() -> String {
    ".".to_string()
}

const fn default_channel_capacity() -> usize {
    10
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{code}: failed to read {}: {source}", .path.display(), code = ErrorCode::ConfigParseError)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{code}: failed to parse {}: {source}", .path.display(), code = ErrorCode::ConfigParseError)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigParseError
    }
}

/// Load `.deporder.toml` from `root`, or defaults when it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_project_config(root: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    toml::from_str::<ProjectConfig>(&content).map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let config = load_project_config(dir.path()).expect("defaults");
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.scan.marker, "#");
        assert_eq!(config.scan.skip_prefix, ".");
        assert_eq!(config.scan.channel_capacity, 10);
        assert_eq!(config.render.style, RenderStyle::Plain);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[scan]\nmarker = \"//\"\njobs = 2\n\n[render]\nstyle = \"timed\"\n",
        )
        .expect("write config");

        let config = load_project_config(dir.path()).expect("parse");
        assert_eq!(config.scan.marker, "//");
        assert_eq!(config.scan.jobs, Some(2));
        assert_eq!(config.scan.skip_prefix, ".");
        assert_eq!(config.render.style, RenderStyle::Timed);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "[scan\n").expect("write config");

        let err = load_project_config(dir.path()).expect_err("bad toml");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("E1002"));
    }
}
