//! Diagnostic events emitted while loading files and resolving variables.
//!
//! Loaders and accessors never log directly. They hand an [`Event`] to the
//! [`Diagnostics`] sink they were built with: [`TracingDiagnostics`] forwards
//! to `tracing`, [`RecordingDiagnostics`] keeps events for inspection.
//!
//! Events carry keys, paths, line numbers and parsed typed values. Raw string
//! values read from a file are never included.

use std::fmt::{self, Debug, Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Level;

/// A typed value attached to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => write!(f, "{value:?}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// Why an accessor returned its fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Unset,
    Invalid,
}

impl Display for FallbackReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    FileLoaded {
        path: PathBuf,
        loaded: usize,
    },
    /// An optional file did not exist.
    FileMissing {
        path: PathBuf,
    },
    MalformedLine {
        path: Option<PathBuf>,
        line: u32,
    },
    ExistingKept {
        key: String,
    },
    /// `parsed` is set for typed lookups only.
    ValueFound {
        key: String,
        parsed: Option<Value>,
    },
    FallbackUsed {
        key: String,
        fallback: Value,
        reason: FallbackReason,
    },
    RequiredMissing {
        key: String,
    },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Self::FileLoaded { .. } | Self::FileMissing { .. } | Self::ValueFound { .. } => {
                Level::INFO
            }
            Self::FallbackUsed { reason, .. } => match reason {
                FallbackReason::Unset => Level::INFO,
                FallbackReason::Invalid => Level::WARN,
            },
            Self::MalformedLine { .. } => Level::WARN,
            Self::ExistingKept { .. } => Level::DEBUG,
            Self::RequiredMissing { .. } => Level::ERROR,
        }
    }
}

/// Sink for [`Event`]s.
pub trait Diagnostics: Debug + Send + Sync {
    fn emit(&self, event: &Event);
}

impl<D: Diagnostics + ?Sized> Diagnostics for Arc<D> {
    fn emit(&self, event: &Event) {
        (**self).emit(event);
    }
}

/// Forwards events to the active `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

// `tracing` needs a constant level per call site, so each level gets its own
// expansion of the field layout.
macro_rules! trace_event {
    ($level:expr, $event:expr) => {
        match $event {
            Event::FileLoaded { path, loaded } => {
                tracing::event!($level, path = %path.display(), loaded, "loaded env file")
            }
            Event::FileMissing { path } => {
                tracing::event!($level, path = %path.display(), "optional env file not found")
            }
            Event::MalformedLine {
                path: Some(path),
                line,
            } => tracing::event!(
                $level,
                path = %path.display(),
                line,
                "skipping line without `=`"
            ),
            Event::MalformedLine { path: None, line } => {
                tracing::event!($level, line, "skipping line without `=`")
            }
            Event::ExistingKept { key } => {
                tracing::event!($level, key = %key, "keeping existing value")
            }
            Event::ValueFound {
                key,
                parsed: Some(value),
            } => tracing::event!($level, key = %key, value = %value, "variable found"),
            Event::ValueFound { key, parsed: None } => {
                tracing::event!($level, key = %key, "variable found")
            }
            Event::FallbackUsed {
                key,
                fallback,
                reason,
            } => tracing::event!(
                $level,
                key = %key,
                fallback = %fallback,
                reason = %reason,
                "using fallback"
            ),
            Event::RequiredMissing { key } => {
                tracing::event!($level, key = %key, "required variable is not set")
            }
        }
    };
}

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, event: &Event) {
        let level = event.level();
        if level == Level::ERROR {
            trace_event!(Level::ERROR, event);
        } else if level == Level::WARN {
            trace_event!(Level::WARN, event);
        } else if level == Level::INFO {
            trace_event!(Level::INFO, event);
        } else if level == Level::DEBUG {
            trace_event!(Level::DEBUG, event);
        } else {
            trace_event!(Level::TRACE, event);
        }
    }
}

/// Keeps every emitted event in order.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<Event>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, event: &Event) {
        self.lock().push(event.clone());
    }
}
