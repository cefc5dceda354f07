//! Purpose: Gate a candidate container behind validation before announcing it.
//! Exports: `Publisher`, `PublishOptions`, `Published`.
//! Role: The build -> open -> validate -> notify flow used by import tooling.
//! Invariants: A rejected build sends no notification and returns every failure.
use tracing::{info, warn};

use crate::core::builder::DatabaseBuilder;
use crate::core::error::{Error, ErrorKind};
use crate::core::notify::{Notifier, SnapshotReplaced};
use crate::core::registry::Registry;
use crate::core::store::{Store, StoreOptions};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PublishOptions {
    validate: bool,
    store: StoreOptions,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            validate: true,
            store: StoreOptions::default(),
        }
    }
}

impl PublishOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_store_options(mut self, store: StoreOptions) -> Self {
        self.store = store;
        self
    }

    pub fn validate(&self) -> bool {
        self.validate
    }

    pub fn store_options(&self) -> StoreOptions {
        self.store
    }
}

/// An accepted snapshot: the container bytes and the store opened over them.
#[derive(Debug)]
pub struct Published {
    pub blob: Vec<u8>,
    pub store: Store,
    pub event: SnapshotReplaced,
}

#[derive(Debug)]
pub struct Publisher<'a> {
    registry: &'a Registry,
    options: PublishOptions,
}

impl<'a> Publisher<'a> {
    pub fn new(registry: &'a Registry, options: PublishOptions) -> Self {
        Self { registry, options }
    }

    pub fn publish(
        &self,
        builder: &DatabaseBuilder,
        notifier: &Notifier,
    ) -> Result<Published, Error> {
        let blob = builder.build()?;
        let store = Store::open(&blob, self.registry, &self.options.store_options())?;

        if self.options.validate() {
            let result = store.validate();
            if result.is_failed() {
                warn!(failures = result.len(), "rejected build\n{}", result.format_failures());
                return Err(Error::new(ErrorKind::ValidationFailed)
                    .with_message("build did not pass validation")
                    .with_validation(result));
            }
        }

        let event = notifier.notify();
        info!(
            generation = event.generation,
            bytes = blob.len(),
            tables = store.table_names().len(),
            "published snapshot"
        );
        Ok(Published { blob, store, event })
    }
}
