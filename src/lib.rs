//! Load `.env` files and read typed configuration values with fallbacks.
//!
//! [`Config`] owns an [`EnvStore`] and offers `must_get`, `get`, `get_int` and
//! `get_bool`. In-memory stores are the safe default and keep tests isolated
//! from each other.
//!
//! Stores backed by the process environment, and the convenience loaders
//! (`dotenv`, `from_path`), are `unsafe`, because callers must guarantee no
//! concurrent process-environment access.
//!
//! ```no_run
//! use envkit::{Config, EnvStore};
//!
//! let mut config = Config::new(EnvStore::snapshot_process());
//! config.load(".env")?;
//!
//! let port = config.get_int("PORT", 8080);
//! let debug = config.get_bool("DEBUG", false);
//! let database_url = config.must_get("DATABASE_URL").unwrap_or_else(|err| err.exit());
//! # let _ = (port, debug, database_url);
//! # Ok::<(), envkit::Error>(())
//! ```

mod config;
mod diagnostics;
mod env;
mod error;
mod loader;
mod model;
mod parser;
mod value;

pub use config::Config;
pub use diagnostics::{
    Diagnostics, Event, FallbackReason, RecordingDiagnostics, TracingDiagnostics, Value,
};
pub use env::EnvStore;
pub use error::{Error, MissingVar, ScanError, WriteErrorKind};
pub use loader::{EnvLoader, dotenv, from_path};
pub use model::{Entry, Line, LoadReport};
pub use parser::{MAX_LINE_LEN, parse_reader, parse_str};
pub use value::{parse_bool, parse_int, parse_int_or};
