//! Purpose: Open a container into typed, immutable tables and answer per-table queries.
//! Exports: `Store`, `StoreOptions`, `TableInfo`.
//! Role: Read side of the container; one `Store` per loaded snapshot, shared across readers.
//! Invariants: `open` either returns every registered table or fails; no partial store escapes.
//! Invariants: Header entries without a registered type are ignored; registered types absent
//! from the header load as empty tables.
use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::codec::Codec;
use crate::core::container::Container;
use crate::core::error::{Error, ErrorKind};
use crate::core::record::Record;
use crate::core::registry::{AnyTable, Registry, TableEntry};
use crate::core::table::Table;
use crate::core::validate::ValidateResult;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StoreOptions {
    intern_strings: bool,
    parallelism: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            intern_strings: true,
            parallelism: 1,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intern_strings(mut self, intern_strings: bool) -> Self {
        self.intern_strings = intern_strings;
        self
    }

    /// Worker count for per-table loading; values below 1 mean 1.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn intern_strings(&self) -> bool {
        self.intern_strings
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }
}

pub struct Store {
    names: Vec<&'static str>,
    tables: Vec<Box<dyn AnyTable>>,
    by_name: HashMap<&'static str, usize>,
}

impl Store {
    pub fn open(blob: &[u8], registry: &Registry, options: &StoreOptions) -> Result<Self, Error> {
        let container = Container::parse(blob)?;
        for entry in container.header().entries() {
            if registry.entry(&entry.name).is_none() {
                debug!(table = %entry.name, "skipping unregistered table");
            }
        }

        let load = |entry: &TableEntry| load_entry(&container, entry, options);
        let tables = if options.parallelism() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(options.parallelism())
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start load workers")
                        .with_source(err)
                })?;
            pool.install(|| {
                registry
                    .entries()
                    .par_iter()
                    .map(load)
                    .collect::<Result<Vec<_>, Error>>()
            })?
        } else {
            registry
                .entries()
                .iter()
                .map(load)
                .collect::<Result<Vec<_>, Error>>()?
        };

        let names = registry.names();
        let by_name = names
            .iter()
            .enumerate()
            .map(|(index, name)| (*name, index))
            .collect();
        info!(
            tables = tables.len(),
            bytes = blob.len(),
            parallelism = options.parallelism(),
            "opened store"
        );
        Ok(Self {
            names,
            tables,
            by_name,
        })
    }

    pub fn table<R: Record>(&self) -> Result<&Table<R>, Error> {
        let index = self.by_name.get(R::TABLE).ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("record type is not registered")
                .with_table(R::TABLE)
        })?;
        self.tables[*index]
            .as_any()
            .downcast_ref::<Table<R>>()
            .ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message("table is registered under a different record type")
                    .with_table(R::TABLE)
            })
    }

    /// Registered table names, in registration order.
    pub fn table_names(&self) -> &[&'static str] {
        &self.names
    }

    /// Record count of a registered table.
    pub fn table_len(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).map(|index| self.tables[*index].len())
    }

    /// Uniqueness violations of every table first, then record-level failures.
    pub fn validate(&self) -> ValidateResult {
        let mut result = ValidateResult::new();
        for table in &self.tables {
            for failure in table.violations() {
                result.push(failure.clone());
            }
        }
        for table in &self.tables {
            table.validate_records(self, &mut result);
        }
        info!(failures = result.len(), "validated store");
        result
    }

    /// Per-segment sizes straight from the header, without decoding any table.
    pub fn table_info(blob: &[u8], store_raw: bool) -> Result<Vec<TableInfo>, Error> {
        let container = Container::parse(blob)?;
        let infos = container
            .header()
            .entries()
            .iter()
            .map(|entry| {
                let segment = container.segment(&entry.name).unwrap_or_default();
                TableInfo {
                    name: entry.name.clone(),
                    size: entry.length,
                    compressed: Codec::is_compressed(segment),
                    raw: store_raw.then(|| segment.to_vec()),
                }
            })
            .collect();
        Ok(infos)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("tables", &self.names).finish()
    }
}

fn load_entry(
    container: &Container<'_>,
    entry: &TableEntry,
    options: &StoreOptions,
) -> Result<Box<dyn AnyTable>, Error> {
    let span = container
        .header()
        .get(entry.name())
        .map(|span| span.blob_range(container.data_offset()));
    let segment = container.segment(entry.name());
    entry.load(segment, options).map_err(|err| match span {
        Some(span) => err.with_range(span),
        None => err,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub size: u64,
    pub compressed: bool,
    #[serde(skip)]
    pub raw: Option<Vec<u8>>,
}

impl TableInfo {
    fn raw_bytes(&self) -> Result<&[u8], Error> {
        self.raw.as_deref().ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("raw bytes were not kept")
                .with_hint("Call Store::table_info with store_raw = true.")
                .with_table(&self.name)
        })
    }

    pub fn decode<R: Record>(&self) -> Result<Vec<R>, Error> {
        if self.name != R::TABLE {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("segment holds `{}`, not `{}`", self.name, R::TABLE))
                .with_table(&self.name));
        }
        Codec::decode(self.raw_bytes()?).map_err(|err| err.with_table(&self.name))
    }

    pub fn dump_json<R: Record>(&self) -> Result<String, Error> {
        let rows = self.decode::<R>()?;
        serde_json::to_string_pretty(&rows).map_err(|err| {
            Error::new(ErrorKind::Codec)
                .with_message("failed to render records as json")
                .with_table(&self.name)
                .with_source(err)
        })
    }
}
