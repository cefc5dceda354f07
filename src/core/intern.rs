// Deduplicates repeated string values across the records of one table load.
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Interner {
    strings: HashSet<Arc<str>>,
    hits: usize,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared copy of `value`, storing it on first sight.
    pub fn get(&mut self, value: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(value) {
            self.hits += 1;
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(value);
        self.strings.insert(Arc::clone(&shared));
        shared
    }

    /// Replaces `slot` with the shared copy of its contents.
    pub fn intern(&mut self, slot: &mut Arc<str>) {
        let shared = self.get(slot);
        *slot = shared;
    }

    pub fn intern_opt(&mut self, slot: &mut Option<Arc<str>>) {
        if let Some(value) = slot {
            self.intern(value);
        }
    }

    /// Distinct strings held.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Lookups answered by an existing copy.
    pub fn hits(&self) -> usize {
        self.hits
    }
}
