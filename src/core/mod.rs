// Core modules: search kernel, tables, container encoding, validation and errors.
pub mod builder;
pub mod codec;
pub mod container;
pub mod error;
pub mod format;
pub mod intern;
pub mod key;
pub mod notify;
pub mod range;
pub mod record;
pub mod registry;
pub mod search;
pub mod store;
pub mod table;
pub mod validate;
