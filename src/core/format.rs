//! Purpose: Decide which container layouts this reader accepts.
//! Exports: `CONTAINER_FORMAT_VERSION`, `SUPPORTED_CONTAINER_FORMAT_VERSIONS`, `is_supported`,
//! `container_version_error`.
//! Role: Consulted by `Container::parse` right after the magic check.
//! Invariants: Any change to the `MMDB` preamble or the postcard header entries bumps the version.
//! Invariants: Segment tags are part of the layout; adding a table type keeps the version.

use crate::core::error::{Error, ErrorKind};

/// Version written into the preamble of every container this crate builds.
pub const CONTAINER_FORMAT_VERSION: u32 = 1;
pub const SUPPORTED_CONTAINER_FORMAT_VERSIONS: &[u32] = &[CONTAINER_FORMAT_VERSION];

pub fn is_supported(version: u32) -> bool {
    SUPPORTED_CONTAINER_FORMAT_VERSIONS.contains(&version)
}

pub fn container_version_error(detected: u32) -> Error {
    let supported = SUPPORTED_CONTAINER_FORMAT_VERSIONS
        .iter()
        .map(|version| version.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let hint = if detected > CONTAINER_FORMAT_VERSION {
        "The container was built by a newer mastermem; open it with a matching reader."
    } else {
        "Rebuild the container from its source rows with `DatabaseBuilder`."
    };
    Error::new(ErrorKind::MalformedContainer)
        .with_message(format!(
            "unsupported container format version {detected} (supported: {supported})"
        ))
        .with_hint(hint)
}
