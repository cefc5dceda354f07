//! Purpose: Library crate for building and reading read-only master data containers.
//! Exports: `api` (stable surface), `core` (storage, search, validation, errors), `ingest`.
//! Role: Embedded by import tooling and game/runtime code; backs the `mastermem` CLI.
//! Invariants: Tables are immutable after `Store::open`; a `Store` is `Send + Sync`.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod ingest;
