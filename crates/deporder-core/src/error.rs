use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::graph::cycles::CycleReport;

/// Machine-readable error codes for script-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SourceWalkFailed,
    SourceReadFailed,
    SourceStatFailed,
    CycleDetected,
    RenderFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::SourceWalkFailed => "E3001",
            Self::SourceReadFailed => "E3002",
            Self::SourceStatFailed => "E3003",
            Self::CycleDetected => "E2003",
            Self::RenderFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::SourceWalkFailed => "Source directory could not be walked",
            Self::SourceReadFailed => "Source could not be read",
            Self::SourceStatFailed => "Source metadata unavailable",
            Self::CycleDetected => "Ordering constraints form a cycle",
            Self::RenderFailed => "Output write failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .deporder.toml and retry."),
            Self::SourceWalkFailed => Some("Check that the root exists and is readable."),
            Self::SourceReadFailed | Self::SourceStatFailed => {
                Some("Check file permissions, or rename the file with a leading '.' to skip it.")
            }
            Self::CycleDetected => {
                Some("Remove or adjust a `before:`/`after:` declaration to break the loop.")
            }
            Self::RenderFailed => Some("Check disk space and write permissions."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A failure to enumerate, open, stat, or read one source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{code}: cannot walk {}: {source}", .path.display(), code = ErrorCode::SourceWalkFailed)]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{code}: cannot stat {}: {source}", .path.display(), code = ErrorCode::SourceStatFailed)]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{code}: cannot read {}: {source}", .path.display(), code = ErrorCode::SourceReadFailed)]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Walk { .. } => ErrorCode::SourceWalkFailed,
            Self::Stat { .. } => ErrorCode::SourceStatFailed,
            Self::Read { .. } => ErrorCode::SourceReadFailed,
        }
    }

    /// Path of the source that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Walk { path, .. } | Self::Stat { path, .. } | Self::Read { path, .. } => path,
        }
    }
}

/// Terminal failures of a full ordering run.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{code}: {0}", code = ErrorCode::CycleDetected)]
    Cycle(CycleReport),
}

impl OrderError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Source(err) => err.code(),
            Self::Cycle(_) => ErrorCode::CycleDetected,
        }
    }
}
