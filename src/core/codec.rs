//! Purpose: Encode and decode one table's record sequence as a self-tagged segment.
//! Exports: `Codec`, `Compression`.
//! Role: Record codec shared by the builder (encode) and the store (decode).
//! Invariants: Segment layout is `[tag u8][payload]`; tag 0 = postcard, tag 1 = zstd(postcard).
//! Invariants: Decoding is driven by the tag alone, so segments compress independently.
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::error::{Error, ErrorKind};

const TAG_RAW: u8 = 0;
const TAG_ZSTD: u8 = 1;
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    None,
    Zstd { level: i32 },
}

impl Default for Compression {
    fn default() -> Self {
        Compression::Zstd {
            level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Codec {
    compression: Compression,
}

impl Codec {
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn encode<R: Serialize>(&self, rows: &[R]) -> Result<Vec<u8>, Error> {
        let payload = postcard::to_allocvec(rows).map_err(|err| {
            Error::new(ErrorKind::Codec)
                .with_message("failed to encode records")
                .with_source(err)
        })?;
        match self.compression {
            Compression::None => {
                let mut out = Vec::with_capacity(payload.len() + 1);
                out.push(TAG_RAW);
                out.extend_from_slice(&payload);
                Ok(out)
            }
            Compression::Zstd { level } => {
                let compressed = zstd::encode_all(payload.as_slice(), level).map_err(|err| {
                    Error::new(ErrorKind::Codec)
                        .with_message("failed to compress records")
                        .with_source(err)
                })?;
                let mut out = Vec::with_capacity(compressed.len() + 1);
                out.push(TAG_ZSTD);
                out.extend_from_slice(&compressed);
                Ok(out)
            }
        }
    }

    pub fn decode<R: DeserializeOwned>(segment: &[u8]) -> Result<Vec<R>, Error> {
        let Some((&tag, body)) = segment.split_first() else {
            return Err(Error::new(ErrorKind::Codec).with_message("empty segment"));
        };
        match tag {
            TAG_RAW => decode_payload(body),
            TAG_ZSTD => {
                let payload = zstd::decode_all(body).map_err(|err| {
                    Error::new(ErrorKind::Codec)
                        .with_message("failed to decompress records")
                        .with_source(err)
                })?;
                decode_payload(&payload)
            }
            other => Err(Error::new(ErrorKind::Codec)
                .with_message(format!("unknown segment tag {other}"))),
        }
    }

    /// Whether a segment is stored compressed, without decoding it.
    pub fn is_compressed(segment: &[u8]) -> bool {
        segment.first() == Some(&TAG_ZSTD)
    }
}

fn decode_payload<R: DeserializeOwned>(payload: &[u8]) -> Result<Vec<R>, Error> {
    postcard::from_bytes(payload).map_err(|err| {
        Error::new(ErrorKind::Codec)
            .with_message("failed to decode records")
            .with_source(err)
    })
}
