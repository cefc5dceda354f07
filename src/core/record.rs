// The trait a type implements to be stored as a table.
use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::intern::Interner;
use crate::core::key::{Key, Schema};
use crate::core::validate::Validator;

/// A fixed-shape record stored in one table.
///
/// `schema` must list `primary_key` first; the default does exactly that.
pub trait Record: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Table name written to the container header; unique per build.
    const TABLE: &'static str;

    type PrimaryKey: Ord + Debug + 'static;

    fn primary_key() -> Key<Self, Self::PrimaryKey>;

    fn schema() -> Schema<Self> {
        Schema::new(Self::primary_key())
    }

    /// Record-level and cross-table checks, run once per record.
    fn validate(&self, _validator: &mut Validator<'_, Self>) {}

    /// Swap string fields for shared copies when a store is opened with interning.
    fn intern(&mut self, _strings: &mut Interner) {}
}
