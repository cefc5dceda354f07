//! Purpose: Accumulate record-level and cross-table validation failures.
//! Exports: `ValidateResult`, `Failure`, `FailureKind`, `Validator`, `validate_records`.
//! Role: Validation engine run against a fully opened store before a build is accepted.
//! Invariants: Checks never short-circuit; every failure is collected in visit order.
//! Invariants: Uniqueness violations found at table construction are reported before record checks.
use std::cmp::Ordering;
use std::fmt::Debug;

use serde::Serialize;
use serde_json::Value;

use crate::core::key::Key;
use crate::core::record::Record;
use crate::core::store::Store;
use crate::core::table::Table;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum FailureKind {
    DuplicateUniqueKey,
    Record,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Failure {
    pub table: String,
    pub kind: FailureKind,
    pub message: String,
    pub record: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidateResult {
    failures: Vec<Failure>,
}

impl ValidateResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    pub fn add_failure<T: Serialize + Debug>(
        &mut self,
        table: &str,
        kind: FailureKind,
        message: impl Into<String>,
        record: &T,
    ) {
        self.push(Failure {
            table: table.to_string(),
            kind,
            message: message.into(),
            record: record_value(record),
        });
    }

    pub fn merge(&mut self, other: ValidateResult) {
        self.failures.extend(other.failures);
    }

    pub fn is_failed(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    /// One line per failure: `table kind: message, record = {...}`.
    pub fn format_failures(&self) -> String {
        self.failures
            .iter()
            .map(|failure| {
                format!(
                    "{} {:?}: {}, record = {}",
                    failure.table, failure.kind, failure.message, failure.record
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Offending records travel as JSON; types serde_json cannot express fall back to `Debug`.
pub(crate) fn record_value<T: Serialize + Debug>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or_else(|_| Value::String(format!("{record:?}")))
}

/// Context handed to `Record::validate` for one record.
pub struct Validator<'a, R: Record> {
    store: &'a Store,
    table: &'a Table<R>,
    record: &'a R,
    first: bool,
    result: &'a mut ValidateResult,
}

impl<'a, R: Record> Validator<'a, R> {
    pub fn store(&self) -> &'a Store {
        self.store
    }

    pub fn table(&self) -> &'a Table<R> {
        self.table
    }

    pub fn record(&self) -> &'a R {
        self.record
    }

    /// True while validating the first record of the table.
    pub fn is_first(&self) -> bool {
        self.first
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.result
            .add_failure(R::TABLE, FailureKind::Record, message, self.record);
    }

    pub fn ensure(&mut self, condition: bool, message: impl Into<String>) -> bool {
        if !condition {
            self.fail(message);
        }
        condition
    }

    /// Requires `value` to resolve through `key` in table `T`.
    pub fn reference<T, K>(&mut self, key: &Key<T, K>, value: &K) -> bool
    where
        T: Record,
        K: Ord + Debug + 'static,
    {
        let index = match self.store.table::<T>().and_then(|table| table.index(key)) {
            Ok(index) => index,
            Err(err) => {
                self.fail(format!(
                    "reference key {}.{} is not declared: {err}",
                    T::TABLE,
                    key.name()
                ));
                return false;
            }
        };
        let found = index.try_find(value).is_some();
        if !found {
            self.fail(format!(
                "reference to {}.{} not found, value = {value:?}",
                T::TABLE,
                key.name()
            ));
        }
        found
    }

    /// Runs a table-level check once, on the first record.
    pub fn once(&mut self, check: impl FnOnce(&mut Self)) {
        if self.first {
            check(self);
        }
    }

    /// Table-level uniqueness of a derived value; each repeated row is one failure.
    pub fn unique_by<K>(&mut self, name: &str, extract: impl Fn(&R) -> K)
    where
        K: Ord + Debug,
    {
        if !self.first {
            return;
        }
        let mut keyed: Vec<(K, &R)> = self
            .table
            .rows()
            .iter()
            .map(|row| (extract(row), row))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        for pair in keyed.windows(2) {
            if pair[0].0.cmp(&pair[1].0) == Ordering::Equal {
                self.result.add_failure(
                    R::TABLE,
                    FailureKind::Record,
                    format!("unique check `{name}` failed, value = {:?}", pair[1].0),
                    pair[1].1,
                );
            }
        }
    }
}

/// Runs `Record::validate` on every row in primary key order.
pub fn validate_records<R: Record>(store: &Store, table: &Table<R>, result: &mut ValidateResult) {
    for (index, record) in table.rows().iter().enumerate() {
        let mut validator = Validator {
            store,
            table,
            record,
            first: index == 0,
            result: &mut *result,
        };
        record.validate(&mut validator);
    }
}
