use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure while loading env files into a store.
///
/// Messages carry paths, keys and line numbers but never values read from a
/// file.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {} at line {line}: {source}", input_name(.path.as_deref()))]
    Scan {
        path: Option<PathBuf>,
        line: u32,
        #[source]
        source: ScanError,
    },

    #[error("failed to set `{key}`: {kind}")]
    Write { key: String, kind: WriteErrorKind },
}

/// Why the line reader stopped.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("line is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
}

/// Why an environment store refused a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorKind {
    EmptyKey,
    KeyContainsEquals,
    ContainsNul,
}

impl Display for WriteErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "key is empty"),
            Self::KeyContainsEquals => write!(f, "key contains `=`"),
            Self::ContainsNul => write!(f, "key or value contains a NUL byte"),
        }
    }
}

/// A required variable is unset.
///
/// This is deliberately not convertible into [`Error`]: it is meant to be
/// handled once, at start-up, usually through [`MissingVar::exit`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} environment variable is not set")]
#[must_use]
pub struct MissingVar {
    pub name: String,
}

impl MissingVar {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }

    /// Print the diagnostic to stderr and terminate the process with status 1.
    pub fn exit(self) -> ! {
        eprintln!("{self}");
        std::process::exit(1)
    }
}

fn input_name(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string())
        .unwrap_or_else(|| "input".to_owned())
}
