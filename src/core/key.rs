//! Purpose: Describe how a record type is keyed, without runtime reflection.
//! Exports: `Key`, `Schema`.
//! Role: Key descriptors consumed uniformly by `Table` construction and typed lookups.
//! Invariants: A schema lists the primary key first, then secondary keys in declaration order.
//! Invariants: Keys without an explicit comparator use the key type's natural `Ord`.
use std::any::Any;
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// One sortable key of a record type: name, extractor, comparator and
/// uniqueness. Keys are plain values and can be declared as associated consts.
pub struct Key<R, K> {
    name: &'static str,
    extract: fn(&R) -> K,
    compare: Option<fn(&K, &K) -> Ordering>,
    unique: bool,
}

impl<R, K> Key<R, K> {
    pub const fn unique(name: &'static str, extract: fn(&R) -> K) -> Self {
        Self {
            name,
            extract,
            compare: None,
            unique: true,
        }
    }

    pub const fn non_unique(name: &'static str, extract: fn(&R) -> K) -> Self {
        Self {
            name,
            extract,
            compare: None,
            unique: false,
        }
    }

    /// Replaces the natural ordering, e.g. for case-insensitive string keys.
    pub const fn compare_with(self, compare: fn(&K, &K) -> Ordering) -> Self {
        Self {
            name: self.name,
            extract: self.extract,
            compare: Some(compare),
            unique: self.unique,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn extract(&self, row: &R) -> K {
        (self.extract)(row)
    }

    pub(crate) fn extractor(&self) -> fn(&R) -> K {
        self.extract
    }

    pub(crate) fn comparator(&self) -> Option<fn(&K, &K) -> Ordering> {
        self.compare
    }
}

impl<R, K: Ord> Key<R, K> {
    pub fn compare(&self, a: &K, b: &K) -> Ordering {
        match self.compare {
            Some(compare) => compare(a, b),
            None => a.cmp(b),
        }
    }

    pub fn compare_rows(&self, a: &R, b: &R) -> Ordering {
        self.compare(&(self.extract)(a), &(self.extract)(b))
    }

    /// Whether `other` extracts the same key as `self` from every row.
    /// Distinct fn pointers are checked row by row, since equal closures may
    /// be emitted more than once.
    pub(crate) fn agrees_with(&self, other: &Key<R, K>, rows: &[R]) -> bool {
        if std::ptr::fn_addr_eq(self.extract, other.extract) {
            return true;
        }
        rows.iter().all(|row| {
            self.compare(&(self.extract)(row), &(other.extract)(row)) == Ordering::Equal
        })
    }
}

impl<R, K> Clone for Key<R, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, K> Copy for Key<R, K> {}

impl<R, K> Debug for Key<R, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("unique", &self.unique)
            .field("custom_compare", &self.compare.is_some())
            .finish()
    }
}

/// Type-erased view of a `Key` used when the key type is not known statically.
pub(crate) trait KeyOrder<R>: Send + Sync {
    fn name(&self) -> &'static str;
    /// The concrete `Key<R, K>`, for recovering the key type.
    fn as_any(&self) -> &dyn Any;
    fn is_unique(&self) -> bool;
    fn sort(&self, rows: &mut [R]);
    /// Rows repeating the key of their predecessor in a view sorted by this key.
    fn duplicates(&self, sorted: &[R]) -> Vec<(usize, String)>;
}

impl<R, K> KeyOrder<R> for Key<R, K>
where
    R: 'static,
    K: Ord + Debug + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_unique(&self) -> bool {
        self.unique
    }

    fn sort(&self, rows: &mut [R]) {
        rows.sort_by(|a, b| self.compare_rows(a, b));
    }

    fn duplicates(&self, sorted: &[R]) -> Vec<(usize, String)> {
        let mut out = Vec::new();
        let mut previous: Option<K> = None;
        for (index, row) in sorted.iter().enumerate() {
            let key = (self.extract)(row);
            if let Some(prev) = &previous {
                if self.compare(prev, &key) == Ordering::Equal {
                    out.push((index, format!("{key:?}")));
                    continue;
                }
            }
            previous = Some(key);
        }
        out
    }
}

/// Ordered key list of a record type: the primary key, then secondary keys.
pub struct Schema<R> {
    keys: Vec<Arc<dyn KeyOrder<R>>>,
}

impl<R: 'static> Schema<R> {
    pub fn new<K>(primary: Key<R, K>) -> Self
    where
        K: Ord + Debug + 'static,
    {
        Self {
            keys: vec![Arc::new(primary)],
        }
    }

    /// Adds a secondary key; a name already present is ignored.
    pub fn with<K>(mut self, key: Key<R, K>) -> Self
    where
        K: Ord + Debug + 'static,
    {
        if self.position(key.name()).is_none() {
            self.keys.push(Arc::new(key));
        }
        self
    }
}

impl<R> Schema<R> {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn primary_name(&self) -> &'static str {
        self.keys[0].name()
    }

    pub fn key_names(&self) -> Vec<&'static str> {
        self.keys.iter().map(|key| key.name()).collect()
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.keys.iter().position(|key| key.name() == name)
    }

    pub(crate) fn keys(&self) -> &[Arc<dyn KeyOrder<R>>] {
        &self.keys
    }
}

impl<R> Clone for Schema<R> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<R> Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("keys", &self.key_names())
            .finish()
    }
}
