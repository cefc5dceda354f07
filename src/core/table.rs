//! Purpose: Own the sorted views of one record type and answer keyed lookups.
//! Exports: `Table`, `Index`.
//! Role: Read-only table built once from a record batch; queried through typed key indexes.
//! Invariants: View 0 is sorted by the primary key; each secondary view is a full, independently
//! stable-sorted copy of the same records.
//! Invariants: Uniqueness violations are recorded on the table, never raised during construction.
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::core::error::{Error, ErrorKind};
use crate::core::key::{Key, KeyOrder, Schema};
use crate::core::range::RangeView;
use crate::core::record::Record;
use crate::core::search;
use crate::core::validate::{Failure, FailureKind, record_value};

struct View<R> {
    key: Arc<dyn KeyOrder<R>>,
    rows: Vec<R>,
}

impl<R: Debug> Debug for View<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("key", &self.key.name())
            .field("rows", &self.rows)
            .finish()
    }
}

#[derive(Debug)]
pub struct Table<R> {
    views: Vec<View<R>>,
    violations: Vec<Failure>,
}

impl<R: Record> Table<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self::with_schema(rows, &R::schema())
    }

    pub fn with_schema(mut rows: Vec<R>, schema: &Schema<R>) -> Self {
        debug_assert_eq!(schema.primary_name(), R::primary_key().name());
        let keys = schema.keys();
        keys[0].sort(&mut rows);

        let mut views = Vec::with_capacity(keys.len());
        for key in &keys[1..] {
            let mut copy = rows.clone();
            key.sort(&mut copy);
            views.push(View {
                key: Arc::clone(key),
                rows: copy,
            });
        }
        views.insert(
            0,
            View {
                key: Arc::clone(&keys[0]),
                rows,
            },
        );

        let mut violations = Vec::new();
        for (key, view) in keys.iter().zip(&views) {
            if !key.is_unique() {
                continue;
            }
            for (index, value) in key.duplicates(&view.rows) {
                violations.push(Failure {
                    table: R::TABLE.to_string(),
                    kind: FailureKind::DuplicateUniqueKey,
                    message: format!("unique key `{}` has duplicate value {value}", key.name()),
                    record: record_value(&view.rows[index]),
                });
            }
        }

        Self { views, violations }
    }

    pub fn primary(&self) -> Index<'_, R, R::PrimaryKey> {
        Index {
            table: R::TABLE,
            rows: &self.views[0].rows,
            key: R::primary_key(),
        }
    }

    /// Lookup handle for a declared key. A key whose name, key type or extracted
    /// values differ from the declared one is a usage error.
    pub fn index<K>(&self, key: &Key<R, K>) -> Result<Index<'_, R, K>, Error>
    where
        K: Ord + Debug + 'static,
    {
        let usage = |message: String| {
            Error::new(ErrorKind::Usage)
                .with_message(message)
                .with_table(R::TABLE)
        };
        let view = self
            .views
            .iter()
            .find(|view| view.key.name() == key.name())
            .ok_or_else(|| usage(format!("key `{}` is not declared", key.name())))?;
        let declared = view
            .key
            .as_any()
            .downcast_ref::<Key<R, K>>()
            .ok_or_else(|| {
                usage(format!(
                    "key `{}` is declared with another key type",
                    key.name()
                ))
            })?;
        if !declared.agrees_with(key, &view.rows) {
            return Err(usage(format!(
                "key `{}` extracts different values than the declared key",
                key.name()
            )));
        }
        Ok(Index {
            table: R::TABLE,
            rows: &view.rows,
            key: *declared,
        })
    }

    /// Exact match on the primary key.
    pub fn find(&self, key: &R::PrimaryKey) -> Result<&R, Error> {
        self.primary().find_unique(key)
    }

    pub fn try_find(&self, key: &R::PrimaryKey) -> Option<&R> {
        self.primary().try_find(key)
    }
}

impl<R> Table<R> {
    pub fn len(&self) -> usize {
        self.views.first().map_or(0, |view| view.rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records in primary key order.
    pub fn rows(&self) -> &[R] {
        self.views
            .first()
            .map(|view| view.rows.as_slice())
            .unwrap_or_default()
    }

    pub fn all(&self) -> RangeView<'_, R> {
        RangeView::new(self.rows(), 0..self.len(), true)
    }

    pub fn all_reverse(&self) -> RangeView<'_, R> {
        RangeView::new(self.rows(), 0..self.len(), false)
    }

    pub fn key_names(&self) -> Vec<&'static str> {
        self.views.iter().map(|view| view.key.name()).collect()
    }

    /// Duplicate unique-key failures found while building the views.
    pub fn violations(&self) -> &[Failure] {
        &self.violations
    }
}

/// Typed lookups over one sorted view.
#[derive(Debug)]
pub struct Index<'a, R, K> {
    table: &'static str,
    rows: &'a [R],
    key: Key<R, K>,
}

impl<'a, R, K> Clone for Index<'a, R, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, R, K> Copy for Index<'a, R, K> {}

impl<'a, R, K> Index<'a, R, K>
where
    K: Ord + Debug,
{
    pub fn rows(&self) -> &'a [R] {
        self.rows
    }

    pub fn all(&self) -> RangeView<'a, R> {
        RangeView::new(self.rows, 0..self.rows.len(), true)
    }

    fn position(&self, key: &K) -> Option<usize> {
        let extract = self.key.extractor();
        match self.key.comparator() {
            None => search::find_first_ord(self.rows, key, extract),
            Some(compare) => search::find_first(self.rows, key, extract, compare),
        }
    }

    fn compare(&self, a: &K, b: &K) -> Ordering {
        self.key.compare(a, b)
    }

    pub fn find_unique(&self, key: &K) -> Result<&'a R, Error> {
        self.try_find(key).ok_or_else(|| {
            Error::new(ErrorKind::RecordNotFound)
                .with_message(format!("no record for key `{}`", self.key.name()))
                .with_table(self.table)
                .with_key(key)
        })
    }

    pub fn try_find(&self, key: &K) -> Option<&'a R> {
        self.position(key).map(|index| &self.rows[index])
    }

    /// Nearest record at/below (`select_lower`) or at/above `key`.
    pub fn find_unique_closest(&self, key: &K, select_lower: bool) -> Option<&'a R> {
        search::find_closest(
            self.rows,
            0..self.rows.len(),
            key,
            self.key.extractor(),
            |a, b| self.compare(a, b),
            select_lower,
        )
        .map(|index| &self.rows[index])
    }

    /// Records with `min <= key <= max`.
    pub fn find_unique_range(&self, min: &K, max: &K, ascending: bool) -> RangeView<'a, R> {
        if self.compare(min, max) == Ordering::Greater {
            return RangeView::empty();
        }
        let all = 0..self.rows.len();
        let extract = self.key.extractor();
        let compare = |a: &K, b: &K| self.compare(a, b);
        let lo = search::find_closest(self.rows, all.clone(), min, extract, compare, false);
        let hi = search::find_closest(self.rows, all, max, extract, compare, true);
        match (lo, hi) {
            (Some(lo), Some(hi)) => RangeView::inclusive(self.rows, lo, hi, ascending),
            _ => RangeView::empty(),
        }
    }

    /// All records sharing `key`, ascending.
    pub fn find_many(&self, key: &K) -> RangeView<'a, R> {
        let all = 0..self.rows.len();
        let extract = self.key.extractor();
        let compare = |a: &K, b: &K| self.compare(a, b);
        let Some(lo) = search::lower_bound(self.rows, all.clone(), key, extract, compare) else {
            return RangeView::empty();
        };
        let Some(hi) = search::upper_bound(self.rows, all, key, extract, compare) else {
            return RangeView::empty();
        };
        RangeView::inclusive(self.rows, lo, hi, true)
    }

    /// The group of equal keys nearest to `key` on the requested side.
    pub fn find_many_closest(&self, key: &K, select_lower: bool) -> RangeView<'a, R> {
        let closest = search::find_closest(
            self.rows,
            0..self.rows.len(),
            key,
            self.key.extractor(),
            |a, b| self.compare(a, b),
            select_lower,
        );
        match closest {
            Some(index) => self.find_many(&self.key.extract(&self.rows[index])),
            None => RangeView::empty(),
        }
    }

    /// Records with `min <= key <= max`; empty without searching when `min > max`.
    pub fn find_many_range(&self, min: &K, max: &K, ascending: bool) -> RangeView<'a, R> {
        if self.compare(min, max) == Ordering::Greater {
            return RangeView::empty();
        }
        let all = 0..self.rows.len();
        let extract = self.key.extractor();
        let compare = |a: &K, b: &K| self.compare(a, b);
        let lo = search::lower_bound_closest(self.rows, all.clone(), min, extract, compare);
        let hi = search::upper_bound_closest(self.rows, all, max, extract, compare);
        RangeView::new(self.rows, lo..hi, ascending)
    }
}

#[cfg(test)]
mod tests {
    use super::Table;
    use crate::core::error::ErrorKind;
    use crate::core::key::{Key, Schema};
    use crate::core::record::Record;
    use crate::core::validate::FailureKind;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
        name: String,
        kind: u8,
    }

    impl Item {
        const BY_KIND: Key<Item, u8> = Key::non_unique("kind", |item| item.kind);
        const BY_NAME: Key<Item, String> = Key::unique("name", |item| item.name.clone());
    }

    impl Record for Item {
        const TABLE: &'static str = "Item";
        type PrimaryKey = u32;

        fn primary_key() -> Key<Self, u32> {
            Key::unique("id", |item| item.id)
        }

        fn schema() -> Schema<Self> {
            Schema::new(Self::primary_key())
                .with(Self::BY_KIND)
                .with(Self::BY_NAME)
        }
    }

    fn item(id: u32, name: &str, kind: u8) -> Item {
        Item {
            id,
            name: name.to_string(),
            kind,
        }
    }

    fn ids<'a>(rows: impl IntoIterator<Item = &'a Item>) -> Vec<u32> {
        rows.into_iter().map(|item| item.id).collect()
    }

    fn sample() -> Table<Item> {
        Table::new(vec![
            item(1, "A", 2),
            item(3, "C", 1),
            item(2, "B", 2),
        ])
    }

    #[test]
    fn primary_view_is_sorted() {
        let table = sample();
        assert_eq!(ids(table.rows()), vec![1, 2, 3]);
        assert_eq!(ids(table.all_reverse()), vec![3, 2, 1]);
        assert_eq!(table.key_names(), vec!["id", "kind", "name"]);
        assert!(table.violations().is_empty());
    }

    #[test]
    fn unique_lookups_hit_and_miss() {
        let table = sample();
        assert_eq!(table.find(&2).expect("find").name, "B");
        assert!(table.try_find(&9).is_none());
        let err = table.find(&9).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::RecordNotFound);
        assert_eq!(err.table(), Some("Item"));
        assert_eq!(err.key(), Some("9"));
    }

    #[test]
    fn closest_and_ranges_on_primary() {
        let table = sample();
        let primary = table.primary();
        assert_eq!(primary.find_unique_closest(&5, true).map(|i| i.id), Some(3));
        assert_eq!(primary.find_unique_closest(&0, true), None);
        assert_eq!(primary.find_unique_closest(&0, false).map(|i| i.id), Some(1));
        assert_eq!(ids(primary.find_many_range(&1, &2, true)), vec![1, 2]);
        assert_eq!(ids(primary.find_unique_range(&2, &9, false)), vec![3, 2]);
        assert!(primary.find_many_range(&3, &1, true).is_empty());
        assert!(primary.find_unique_range(&3, &1, true).is_empty());
        assert!(primary.find_unique_range(&4, &9, true).is_empty());
    }

    #[test]
    fn secondary_views_are_independent_copies() {
        let table = sample();
        let by_kind = table.index(&Item::BY_KIND).expect("kind index");
        assert_eq!(by_kind.rows().len(), 3);
        assert_eq!(ids(by_kind.find_many(&2)), vec![1, 2]);
        assert!(by_kind.find_many(&7).is_empty());
        assert_eq!(ids(by_kind.find_many_closest(&5, true)), vec![1, 2]);
        assert_eq!(ids(by_kind.find_many_closest(&0, false)), vec![3]);
        assert!(by_kind.find_many_closest(&5, false).is_empty());

        let by_name = table.index(&Item::BY_NAME).expect("name index");
        assert_eq!(by_name.find_unique(&"C".to_string()).expect("C").id, 3);
        assert_eq!(ids(by_name.find_unique_range(&"A".into(), &"B".into(), true)), vec![1, 2]);
    }

    #[test]
    fn undeclared_key_is_usage_error() {
        let table = sample();
        let undeclared: Key<Item, u8> = Key::non_unique("other", |item| item.kind);
        let err = table.index(&undeclared).expect_err("undeclared");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn key_reusing_a_declared_name_must_match_it() {
        let table = sample();
        let other_extractor: Key<Item, u8> = Key::non_unique("kind", |item| item.id as u8);
        let err = table.index(&other_extractor).expect_err("different extractor");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.table(), Some("Item"));

        let other_type: Key<Item, u32> = Key::non_unique("kind", |item| u32::from(item.kind));
        let err = table.index(&other_type).expect_err("different key type");
        assert_eq!(err.kind(), ErrorKind::Usage);

        let same_values: Key<Item, u8> = Key::non_unique("kind", |item| item.kind);
        let index = table.index(&same_values).expect("equivalent key");
        assert_eq!(ids(index.find_many(&2)), vec![1, 2]);
    }

    #[test]
    fn duplicate_unique_key_is_recorded_once() {
        let table = Table::new(vec![item(7, "x", 0), item(7, "y", 0), item(8, "z", 0)]);
        let violations = table.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, FailureKind::DuplicateUniqueKey);
        assert_eq!(violations[0].table, "Item");
        assert_eq!(violations[0].record["name"], "y");
    }

    #[test]
    fn empty_table_answers_empty() {
        let table: Table<Item> = Table::new(Vec::new());
        assert!(table.is_empty());
        assert!(table.try_find(&1).is_none());
        assert!(table.primary().find_many(&1).is_empty());
        assert!(table.primary().find_many_range(&0, &9, true).is_empty());
        assert_eq!(table.primary().find_unique_closest(&1, true), None);
    }
}
