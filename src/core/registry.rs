//! Purpose: Map table names to the typed functions that load, append and validate them.
//! Exports: `Registry`, `TableEntry`.
//! Role: Replaces runtime type dispatch; the store and builder reach record types only through here.
//! Invariants: Table names are unique; registration order is load and validation order.
use std::any::Any;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::core::builder::DatabaseBuilder;
use crate::core::codec::Codec;
use crate::core::error::{Error, ErrorKind};
use crate::core::intern::Interner;
use crate::core::record::Record;
use crate::core::store::{Store, StoreOptions};
use crate::core::table::Table;
use crate::core::validate::{Failure, ValidateResult, validate_records};

/// Type-erased table held by a `Store`.
pub(crate) trait AnyTable: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn len(&self) -> usize;
    fn violations(&self) -> &[Failure];
    fn validate_records(&self, store: &Store, result: &mut ValidateResult);
}

impl<R: Record> AnyTable for Table<R> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn len(&self) -> usize {
        Table::len(self)
    }

    fn violations(&self) -> &[Failure] {
        Table::violations(self)
    }

    fn validate_records(&self, store: &Store, result: &mut ValidateResult) {
        validate_records(store, self, result);
    }
}

type LoadFn = fn(Option<&[u8]>, &StoreOptions) -> Result<Box<dyn AnyTable>, Error>;
type AppendFn = fn(&mut DatabaseBuilder, Vec<Value>) -> Result<(), Error>;

#[derive(Clone, Copy)]
pub struct TableEntry {
    name: &'static str,
    load: LoadFn,
    append: AppendFn,
}

impl TableEntry {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Decodes a segment (or nothing, for a table absent from the container) into a table.
    pub(crate) fn load(
        &self,
        segment: Option<&[u8]>,
        options: &StoreOptions,
    ) -> Result<Box<dyn AnyTable>, Error> {
        (self.load)(segment, options)
    }

    pub(crate) fn append(&self, builder: &mut DatabaseBuilder, rows: Vec<Value>) -> Result<(), Error> {
        (self.append)(builder, rows)
    }
}

impl fmt::Debug for TableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableEntry").field("name", &self.name).finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: Vec<TableEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R: Record>(&mut self) -> Result<&mut Self, Error> {
        if self.entry(R::TABLE).is_some() {
            return Err(Error::new(ErrorKind::DuplicateTable)
                .with_message("table already registered")
                .with_table(R::TABLE));
        }
        self.entries.push(TableEntry {
            name: R::TABLE,
            load: load_table::<R>,
            append: append_rows::<R>,
        });
        Ok(self)
    }

    /// Consuming form of `register` for one-expression setup.
    pub fn with<R: Record>(mut self) -> Result<Self, Error> {
        self.register::<R>()?;
        Ok(self)
    }

    pub fn entry(&self, name: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn load_table<R: Record>(
    segment: Option<&[u8]>,
    options: &StoreOptions,
) -> Result<Box<dyn AnyTable>, Error> {
    let mut rows = match segment {
        Some(bytes) => Codec::decode::<R>(bytes).map_err(|err| err.with_table(R::TABLE))?,
        None => Vec::new(),
    };
    if options.intern_strings() {
        let mut strings = Interner::new();
        for row in &mut rows {
            row.intern(&mut strings);
        }
        debug!(table = R::TABLE, distinct = strings.len(), shared = strings.hits(), "interned strings");
    }
    let table = Table::new(rows);
    debug!(table = R::TABLE, records = table.len(), "loaded table");
    Ok(Box::new(table))
}

fn append_rows<R: Record>(builder: &mut DatabaseBuilder, rows: Vec<Value>) -> Result<(), Error> {
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value::<R>(row).map_err(|err| {
                Error::new(ErrorKind::Codec)
                    .with_message(format!("row {index} does not match the record type"))
                    .with_table(R::TABLE)
                    .with_source(err)
            })
        })
        .collect::<Result<Vec<R>, Error>>()?;
    builder.append(records)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::core::error::ErrorKind;
    use crate::core::key::Key;
    use crate::core::record::Record;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Zone {
        id: u16,
    }

    impl Record for Zone {
        const TABLE: &'static str = "Zone";
        type PrimaryKey = u16;

        fn primary_key() -> Key<Self, u16> {
            Key::unique("id", |zone| zone.id)
        }
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Npc {
        id: u32,
    }

    impl Record for Npc {
        const TABLE: &'static str = "Npc";
        type PrimaryKey = u32;

        fn primary_key() -> Key<Self, u32> {
            Key::unique("id", |npc| npc.id)
        }
    }

    #[test]
    fn registration_order_is_kept() {
        let registry = Registry::new()
            .with::<Npc>()
            .and_then(|registry| registry.with::<Zone>())
            .expect("register");
        assert_eq!(registry.names(), vec!["Npc", "Zone"]);
        assert!(registry.entry("Zone").is_some());
        assert!(registry.entry("Quest").is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = Registry::new();
        registry.register::<Zone>().expect("first");
        let err = registry.register::<Zone>().expect_err("second");
        assert_eq!(err.kind(), ErrorKind::DuplicateTable);
        assert_eq!(err.table(), Some("Zone"));
        assert_eq!(registry.len(), 1);
    }
}
