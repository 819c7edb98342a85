use std::collections::BTreeMap;

use crate::error::WriteErrorKind;

/// Destination of loaded variables and source for the typed accessors.
///
/// A store either writes through to the process environment or keeps its own
/// map. Both backings refuse the same keys and values, so a file that loads
/// into one loads into the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvStore {
    kind: EnvStoreKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EnvStoreKind {
    Process,
    Memory(BTreeMap<String, String>),
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl EnvStore {
    /// Store that reads and writes the variables of the running process.
    ///
    /// # Safety
    ///
    /// Loading into this store calls [`std::env::set_var`]. While a load runs,
    /// no other thread may touch the process environment.
    pub unsafe fn process() -> Self {
        Self {
            kind: EnvStoreKind::Process,
        }
    }

    /// Create an empty in-memory store.
    pub fn memory() -> Self {
        Self::from_memory(BTreeMap::new())
    }

    /// Create an in-memory store seeded from an existing map.
    pub fn from_memory(map: BTreeMap<String, String>) -> Self {
        Self {
            kind: EnvStoreKind::Memory(map),
        }
    }

    /// Create an in-memory copy of the current process environment.
    ///
    /// Names or values that are not valid Unicode are converted lossily.
    pub fn snapshot_process() -> Self {
        let map = std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Self::from_memory(map)
    }

    pub fn is_process(&self) -> bool {
        matches!(self.kind, EnvStoreKind::Process)
    }

    pub fn as_memory(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            EnvStoreKind::Memory(map) => Some(map),
            EnvStoreKind::Process => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match &self.kind {
            EnvStoreKind::Process => is_valid_key(key) && std::env::var_os(key).is_some(),
            EnvStoreKind::Memory(map) => map.contains_key(key),
        }
    }

    /// Look up `key`. A variable set to the empty string is `Some("")`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        match &self.kind {
            EnvStoreKind::Process => {
                if !is_valid_key(key) {
                    return None;
                }
                std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
            }
            EnvStoreKind::Memory(map) => map.get(key).cloned(),
        }
    }

    /// Set `key` to `value`, replacing any existing value.
    ///
    /// Both backings reject keys and values the process environment cannot
    /// represent.
    pub fn set_var(&mut self, key: &str, value: &str) -> Result<(), WriteErrorKind> {
        validate_write(key, value)?;
        match &mut self.kind {
            EnvStoreKind::Process => unsafe { std::env::set_var(key, value) },
            EnvStoreKind::Memory(map) => {
                map.insert(key.to_owned(), value.to_owned());
            }
        }
        Ok(())
    }

}

fn validate_write(key: &str, value: &str) -> Result<(), WriteErrorKind> {
    if key.is_empty() {
        return Err(WriteErrorKind::EmptyKey);
    }
    if key.contains('=') {
        return Err(WriteErrorKind::KeyContainsEquals);
    }
    if key.contains('\0') || value.contains('\0') {
        return Err(WriteErrorKind::ContainsNul);
    }
    Ok(())
}

// `std::env` panics on these keys instead of reporting them as unset.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('=') && !key.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_values() {
        let mut store = EnvStore::memory();
        store.set_var("A", "1").expect("write should succeed");
        store.set_var("EMPTY", "").expect("write should succeed");

        assert_eq!(store.get_var("A").as_deref(), Some("1"));
        assert_eq!(store.get_var("EMPTY").as_deref(), Some(""));
        assert!(store.contains_key("EMPTY"));
        assert_eq!(store.get_var("MISSING"), None);
    }

    #[test]
    fn later_write_overwrites() {
        let mut store = EnvStore::memory();
        store.set_var("A", "1").expect("write should succeed");
        store.set_var("A", "2").expect("write should succeed");

        assert_eq!(store.get_var("A").as_deref(), Some("2"));
    }

    #[test]
    fn rejects_keys_the_environment_cannot_hold() {
        let mut store = EnvStore::memory();

        assert_eq!(store.set_var("", "v"), Err(WriteErrorKind::EmptyKey));
        assert_eq!(
            store.set_var("A=B", "v"),
            Err(WriteErrorKind::KeyContainsEquals)
        );
        assert_eq!(store.set_var("A\0", "v"), Err(WriteErrorKind::ContainsNul));
        assert_eq!(store.set_var("A", "v\0"), Err(WriteErrorKind::ContainsNul));
        assert_eq!(store.as_memory().map(BTreeMap::len), Some(0));
    }

    #[test]
    fn default_store_is_isolated_memory() {
        let store = EnvStore::default();
        assert!(!store.is_process());
        assert!(store.as_memory().is_some());
    }
}
