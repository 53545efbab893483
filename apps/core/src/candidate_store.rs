use std::collections::HashSet;

use crate::discovery::CandidateEnumerator;

/// Executable names eligible for launch, in discovery order.
///
/// The store owns every name. Lookups for duplicates go through a hash set so
/// loading a few thousand names stays linear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateStore {
    names: Vec<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl CandidateStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::new(),
            seen: HashSet::new(),
            capacity,
        }
    }

    /// Builds the store from an enumerator. Never fails: an enumerator error
    /// yields an empty store.
    pub fn load(source: &dyn CandidateEnumerator, capacity: usize) -> Self {
        let mut store = Self::with_capacity(capacity);
        match source.enumerate() {
            Ok(entries) => {
                for entry in entries {
                    if entry.is_executable {
                        store.insert(entry.name);
                    }
                }
                tracing::debug!(
                    provider = source.provider_name(),
                    candidates = store.len(),
                    "candidate store loaded"
                );
            }
            Err(error) => {
                tracing::warn!(
                    provider = source.provider_name(),
                    %error,
                    "candidate enumeration failed; continuing with no candidates"
                );
            }
        }
        store
    }

    pub fn from_names<I, S>(names: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::with_capacity(capacity);
        for name in names {
            store.insert(name.into());
        }
        store
    }

    /// Returns `false` when the name was a duplicate, empty, or the store is full.
    pub fn insert(&mut self, name: String) -> bool {
        if name.is_empty() || self.names.len() >= self.capacity {
            return false;
        }
        if self.seen.contains(&name) {
            return false;
        }
        self.seen.insert(name.clone());
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
