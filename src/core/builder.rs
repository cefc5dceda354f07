//! Purpose: Accumulate one sorted, encoded segment per record type and emit a container.
//! Exports: `DatabaseBuilder`, `BuildOptions`.
//! Role: Write side of the container; single writer, single use per snapshot.
//! Invariants: A failed `append` leaves the builder exactly as it was.
//! Invariants: Segments land in append order; `build` is idempotent.
use std::io::Write;

use serde_json::Value;
use tracing::{debug, info};

use crate::core::codec::{Codec, Compression};
use crate::core::container::{Header, HeaderEntry};
use crate::core::error::{Error, ErrorKind};
use crate::core::record::Record;
use crate::core::registry::Registry;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BuildOptions {
    compression: Compression,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }
}

#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    codec: Codec,
    header: Header,
    data: Vec<u8>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            codec: Codec::new(options.compression()),
            ..Self::default()
        }
    }

    /// Adds the table `R::TABLE`, sorted by primary key. Empty input records nothing.
    pub fn append<R: Record>(&mut self, mut records: Vec<R>) -> Result<&mut Self, Error> {
        if self.header.contains(R::TABLE) {
            return Err(Error::new(ErrorKind::DuplicateTable)
                .with_message("table appended twice")
                .with_table(R::TABLE));
        }
        if records.is_empty() {
            debug!(table = R::TABLE, "skipping empty table");
            return Ok(self);
        }

        let key = R::primary_key();
        records.sort_by(|a, b| key.compare_rows(a, b));
        let segment = self
            .codec
            .encode(&records)
            .map_err(|err| err.with_table(R::TABLE))?;

        let offset = self.data.len() as u64;
        let length = segment.len() as u64;
        self.header.push(HeaderEntry {
            name: R::TABLE.to_string(),
            offset,
            length,
        })?;
        self.data.extend_from_slice(&segment);
        debug!(
            table = R::TABLE,
            records = records.len(),
            offset,
            length,
            "appended table"
        );
        Ok(self)
    }

    /// Appends JSON rows to a table known only by name.
    pub fn append_values(
        &mut self,
        registry: &Registry,
        table: &str,
        rows: Vec<Value>,
    ) -> Result<&mut Self, Error> {
        let entry = registry.entry(table).ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("table is not registered")
                .with_table(table)
        })?;
        entry.append(self, rows)?;
        Ok(self)
    }

    /// Names appended so far, in append order.
    pub fn tables(&self) -> Vec<&str> {
        self.header
            .entries()
            .iter()
            .map(|entry| entry.name.as_str())
            .collect()
    }

    pub fn build(&self) -> Result<Vec<u8>, Error> {
        let mut out = self.header.encode()?;
        out.extend_from_slice(&self.data);
        info!(
            tables = self.header.len(),
            bytes = out.len(),
            "built container"
        );
        Ok(out)
    }

    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<(), Error> {
        let bytes = self.build()?;
        sink.write_all(&bytes)
            .and_then(|_| sink.flush())
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to write container")
                    .with_source(err)
            })
    }
}
