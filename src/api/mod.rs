//! Purpose: Define the public Rust API boundary for mastermem.
//! Exports: Record modeling, build, open, query, validation and publish types.
//! Role: Single import path for embedders; core modules stay reachable for tests and tooling.
//! Invariants: Additive-only surface.

mod publish;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::builder::{BuildOptions, DatabaseBuilder};
pub use crate::core::codec::{Codec, Compression};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::intern::Interner;
pub use crate::core::key::{Key, Schema};
pub use crate::core::notify::{Notifier, SnapshotReplaced};
pub use crate::core::range::{RangeIter, RangeView};
pub use crate::core::record::Record;
pub use crate::core::registry::Registry;
pub use crate::core::store::{Store, StoreOptions, TableInfo};
pub use crate::core::table::{Index, Table};
pub use crate::core::validate::{Failure, FailureKind, ValidateResult, Validator};
pub use publish::{PublishOptions, Published, Publisher};
