use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::{Diagnostics, Event, TracingDiagnostics};
use crate::env::EnvStore;
use crate::error::Error;
use crate::model::{Line, LoadReport};
use crate::parser::Scanner;

const DEFAULT_FILE: &str = ".env";

/// Load `.env` from the current working directory into the process
/// environment.
///
/// # Safety
///
/// See [`EnvStore::process`].
pub unsafe fn dotenv() -> Result<LoadReport, Error> {
    unsafe { from_path(DEFAULT_FILE) }
}

/// Load an env file into the process environment.
///
/// # Safety
///
/// See [`EnvStore::process`].
pub unsafe fn from_path(path: impl AsRef<Path>) -> Result<LoadReport, Error> {
    let mut target = unsafe { EnvStore::process() };
    EnvLoader::new().path(path).load(&mut target)
}

/// Builder-style env file loader.
///
/// Files are read in order and written into the target store line by line.
/// A failure stops the load; entries written before it stay in the store.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    paths: Vec<PathBuf>,
    required: bool,
    override_existing: bool,
    diagnostics: Arc<dyn Diagnostics>,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.paths
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    /// When `false`, files that do not exist are skipped.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// When `false`, keys already present in the target before the load keep
    /// their value.
    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn load(&self, target: &mut EnvStore) -> Result<LoadReport, Error> {
        let mut report = LoadReport::default();
        let mut written = HashSet::new();

        for path in self.effective_paths() {
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(err) if !self.required && err.kind() == ErrorKind::NotFound => {
                    self.diagnostics.emit(&Event::FileMissing { path });
                    continue;
                }
                Err(source) => return Err(Error::Io { path, source }),
            };
            report.files_read += 1;

            let loaded = self.load_file(file, &path, target, &mut written, &mut report)?;
            self.diagnostics.emit(&Event::FileLoaded { path, loaded });
        }

        Ok(report)
    }

    fn load_file(
        &self,
        file: File,
        path: &Path,
        target: &mut EnvStore,
        written: &mut HashSet<String>,
        report: &mut LoadReport,
    ) -> Result<usize, Error> {
        let mut loaded = 0usize;

        for line in Scanner::new(BufReader::new(file), Some(path)) {
            let entry = match line? {
                Line::Entry(entry) => entry,
                Line::Malformed { line } => {
                    report.malformed_lines += 1;
                    self.diagnostics.emit(&Event::MalformedLine {
                        path: Some(path.to_path_buf()),
                        line,
                    });
                    continue;
                }
                Line::Blank | Line::Comment => continue,
            };

            if !self.override_existing
                && !written.contains(&entry.key)
                && target.contains_key(&entry.key)
            {
                report.skipped_existing += 1;
                self.diagnostics.emit(&Event::ExistingKept { key: entry.key });
                continue;
            }

            target
                .set_var(&entry.key, &entry.value)
                .map_err(|kind| Error::Write {
                    key: entry.key.clone(),
                    kind,
                })?;
            written.insert(entry.key);
            report.loaded += 1;
            loaded += 1;
        }

        Ok(loaded)
    }

    fn effective_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(DEFAULT_FILE)]
        } else {
            self.paths.clone()
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            required: true,
            override_existing: true,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }
}
