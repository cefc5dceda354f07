//! Purpose: Encode and parse the container preamble and header map.
//! Exports: `Header`, `HeaderEntry`, `Container`, `PREAMBLE_LEN`.
//! Role: Single owner of the blob layout `[magic|version|header_len][header][data]`.
//! Invariants: Header entries keep append order; names are unique; offsets are relative to data.
//! Invariants: Byte ranges attached to errors are absolute blob offsets.
//! Invariants: `Container::parse` rejects any span outside the data segment before returning.
use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{CONTAINER_FORMAT_VERSION, container_version_error, is_supported};

const MAGIC: [u8; 4] = *b"MMDB";
pub const PREAMBLE_LEN: usize = 12;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub offset: u64,
    pub length: u64,
}

impl HeaderEntry {
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }

    /// The entry's span within the whole blob, given where the data segment starts.
    pub fn blob_range(&self, data_offset: usize) -> Range<u64> {
        let start = (data_offset as u64).saturating_add(self.offset);
        start..start.saturating_add(self.length)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Header {
    entries: Vec<HeaderEntry>,
    by_name: HashMap<String, usize>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&HeaderEntry> {
        self.by_name.get(name).map(|index| &self.entries[*index])
    }

    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: HeaderEntry) -> Result<(), Error> {
        if self.contains(&entry.name) {
            return Err(Error::new(ErrorKind::DuplicateTable)
                .with_message("table already present in header")
                .with_table(entry.name));
        }
        self.by_name.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Preamble plus encoded header map.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let body = postcard::to_allocvec(&self.entries).map_err(|err| {
            Error::new(ErrorKind::Codec)
                .with_message("failed to encode header")
                .with_source(err)
        })?;
        let body_len = u32::try_from(body.len()).map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("header exceeds u32 length")
        })?;
        let mut out = Vec::with_capacity(PREAMBLE_LEN + body.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&CONTAINER_FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&body_len.to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn from_entries(entries: Vec<HeaderEntry>) -> Result<Self, Error> {
        let mut header = Header::new();
        for entry in entries {
            header.push(entry).map_err(|err| {
                let table = err.table().unwrap_or_default().to_string();
                Error::new(ErrorKind::MalformedContainer)
                    .with_message("duplicate table name in header")
                    .with_table(table)
            })?;
        }
        Ok(header)
    }
}

/// A parsed blob: header map plus the borrowed data segment.
#[derive(Clone, Debug)]
pub struct Container<'a> {
    header: Header,
    data: &'a [u8],
    data_offset: usize,
}

impl<'a> Container<'a> {
    pub fn parse(blob: &'a [u8]) -> Result<Self, Error> {
        if blob.len() < PREAMBLE_LEN {
            return Err(Error::new(ErrorKind::MalformedContainer).with_message("blob too small"));
        }
        if blob[0..4] != MAGIC {
            return Err(Error::new(ErrorKind::MalformedContainer).with_message("bad magic"));
        }
        let version = read_u32(blob, 4);
        if !is_supported(version) {
            return Err(container_version_error(version));
        }
        let header_len = read_u32(blob, 8) as usize;
        let data_offset = PREAMBLE_LEN
            .checked_add(header_len)
            .filter(|end| *end <= blob.len())
            .ok_or_else(|| {
                Error::new(ErrorKind::MalformedContainer)
                    .with_message("header exceeds blob")
                    .with_range(PREAMBLE_LEN as u64..(PREAMBLE_LEN + header_len) as u64)
            })?;

        let entries: Vec<HeaderEntry> =
            postcard::from_bytes(&blob[PREAMBLE_LEN..data_offset]).map_err(|err| {
                Error::new(ErrorKind::MalformedContainer)
                    .with_message("header is not decodable")
                    .with_source(err)
            })?;
        let header = Header::from_entries(entries)?;
        let data = &blob[data_offset..];

        for entry in header.entries() {
            let in_bounds = entry.end().is_some_and(|end| end <= data.len() as u64);
            if !in_bounds {
                return Err(Error::new(ErrorKind::MalformedContainer)
                    .with_message("table span exceeds data segment")
                    .with_table(&entry.name)
                    .with_range(entry.blob_range(data_offset)));
            }
        }

        Ok(Self {
            header,
            data,
            data_offset,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Absolute offset of the data segment inside the blob.
    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    pub fn segment(&self, name: &str) -> Option<&'a [u8]> {
        let entry = self.header.get(name)?;
        let start = entry.offset as usize;
        let end = start + entry.length as usize;
        Some(&self.data[start..end])
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(read_4(buf, offset))
}

fn read_4(buf: &[u8], offset: usize) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&buf[offset..offset + 4]);
    out
}
