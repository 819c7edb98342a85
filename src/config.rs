use std::path::Path;
use std::sync::Arc;

use crate::diagnostics::{Diagnostics, Event, FallbackReason, TracingDiagnostics, Value};
use crate::env::EnvStore;
use crate::error::{Error, MissingVar};
use crate::loader::EnvLoader;
use crate::model::LoadReport;
use crate::value::{parse_bool, parse_int};

/// Typed, fallback-aware access to an [`EnvStore`].
///
/// Build one at start-up, load files into it and pass it by reference to
/// whatever needs configuration.
#[derive(Debug, Clone)]
pub struct Config {
    store: EnvStore,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Default for Config {
    fn default() -> Self {
        Self::memory()
    }
}

impl Config {
    pub fn new(store: EnvStore) -> Self {
        Self {
            store,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// A configuration over an empty in-memory store.
    pub fn memory() -> Self {
        Self::new(EnvStore::memory())
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn store(&self) -> &EnvStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EnvStore {
        &mut self.store
    }

    pub fn into_store(self) -> EnvStore {
        self.store
    }

    /// Load one env file into the store, overwriting existing keys.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, Error> {
        let loader = EnvLoader::new().path(path);
        self.load_with(loader)
    }

    /// Run a configured loader against the store using this config's
    /// diagnostics sink.
    pub fn load_with(&mut self, loader: EnvLoader) -> Result<LoadReport, Error> {
        loader
            .diagnostics(self.diagnostics.clone())
            .load(&mut self.store)
    }

    /// Value of a variable that must be set. An empty value counts as set.
    pub fn must_get(&self, key: &str) -> Result<String, MissingVar> {
        match self.store.get_var(key) {
            Some(value) => Ok(value),
            None => {
                self.diagnostics.emit(&Event::RequiredMissing {
                    key: key.to_owned(),
                });
                Err(MissingVar::new(key))
            }
        }
    }

    /// Raw value of `key`, or `fallback` when unset.
    pub fn get(&self, key: &str, fallback: &str) -> String {
        match self.store.get_var(key) {
            Some(value) => {
                self.found(key, None);
                value
            }
            None => {
                self.fallback(key, Value::Str(fallback.to_owned()), FallbackReason::Unset);
                fallback.to_owned()
            }
        }
    }

    pub fn get_int(&self, key: &str, fallback: i64) -> i64 {
        self.get_parsed(key, fallback, parse_int, Value::Int)
    }

    pub fn get_bool(&self, key: &str, fallback: bool) -> bool {
        self.get_parsed(key, fallback, parse_bool, Value::Bool)
    }

    fn get_parsed<T: Copy>(
        &self,
        key: &str,
        fallback: T,
        parse: impl Fn(&str) -> Option<T>,
        to_value: impl Fn(T) -> Value,
    ) -> T {
        let Some(raw) = self.store.get_var(key) else {
            self.fallback(key, to_value(fallback), FallbackReason::Unset);
            return fallback;
        };

        match parse(&raw) {
            Some(parsed) => {
                self.found(key, Some(to_value(parsed)));
                parsed
            }
            None => {
                self.fallback(key, to_value(fallback), FallbackReason::Invalid);
                fallback
            }
        }
    }

    fn found(&self, key: &str, parsed: Option<Value>) {
        self.diagnostics.emit(&Event::ValueFound {
            key: key.to_owned(),
            parsed,
        });
    }

    fn fallback(&self, key: &str, fallback: Value, reason: FallbackReason) {
        self.diagnostics.emit(&Event::FallbackUsed {
            key: key.to_owned(),
            fallback,
            reason,
        });
    }
}
