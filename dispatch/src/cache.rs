use std::collections::HashMap;
use std::hash::Hash;

/// Memoized handler resolutions, tagged with the hierarchy generation they were
/// computed against.
///
/// Entries computed under an older generation are never inserted; a newer
/// generation drops everything before inserting.
#[derive(Debug)]
pub(crate) struct ResolutionCache<K, V> {
    generation: u64,
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> ResolutionCache<K, V> {
    pub(crate) fn new() -> Self {
        Self { generation: 0, entries: HashMap::new() }
    }

    pub(crate) fn get(&self, key: &K, generation: u64) -> Option<&V> {
        if generation != self.generation {
            return None;
        }
        self.entries.get(key)
    }

    pub(crate) fn insert(&mut self, key: K, value: V, generation: u64) {
        if generation < self.generation {
            return;
        }
        if generation > self.generation {
            self.entries.clear();
            self.generation = generation;
        }
        self.entries.insert(key, value);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
