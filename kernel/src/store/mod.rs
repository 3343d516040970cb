// Table Store
//
// Owns every table and its rollback snapshot. Each mutating operation runs
// against a working copy of the catalog that replaces the committed one
// only after the backend has accepted it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identifier;
use crate::outcome::{OpResult, Rejection, StoreError};

pub mod backend;

use backend::{BackendError, InMemoryBackend, StoreBackend};

/// One address stop. Identified by `(street, postcode)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub street: String,
    pub postcode: String,
}

impl Record {
    pub fn new(street: impl Into<String>, postcode: impl Into<String>) -> Self {
        Self {
            street: street.into(),
            postcode: postcode.into(),
        }
    }

    pub fn matches(&self, street: &str, postcode: &str) -> bool {
        self.street == street && self.postcode == postcode
    }
}

/// Records of a table as they were immediately before its latest mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: Vec<Record>,
}

/// A named, ordered collection of records. Order is the visiting order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub records: Vec<Record>,

    /// At most one generation of history.
    #[serde(default)]
    pub rollback: Option<Snapshot>,
}

impl Table {
    pub fn contains(&self, street: &str, postcode: &str) -> bool {
        self.records.iter().any(|r| r.matches(street, postcode))
    }
}

/// Every table, keyed by name.
pub type Catalog = BTreeMap<String, Table>;

/// Handle to the table catalog. Passed explicitly to every operation.
#[derive(Debug)]
pub struct TableStore<B: StoreBackend = InMemoryBackend> {
    backend: B,
    catalog: Catalog,
}

impl TableStore<InMemoryBackend> {
    /// Empty store without durability.
    pub fn in_memory() -> Self {
        Self {
            backend: InMemoryBackend::default(),
            catalog: Catalog::new(),
        }
    }
}

impl<B: StoreBackend> TableStore<B> {
    /// Open a store over `backend`, loading its committed catalog.
    pub fn open(backend: B) -> Result<Self, BackendError> {
        let catalog = backend.load()?;
        log::debug!("table store opened with {} table(s)", catalog.len());
        Ok(Self { backend, catalog })
    }

    /// Release the store, handing back its backend.
    pub fn close(self) -> B {
        self.backend
    }

    /// Create an empty table.
    pub fn create(&mut self, name: &str) -> OpResult {
        identifier::validate(name)?;

        self.transact(|catalog| {
            if catalog.contains_key(name) {
                return Err(Rejection::TableExists(name.to_string()));
            }
            catalog.insert(name.to_string(), Table::default());
            Ok(())
        })?;

        log::info!("created table {name}");
        Ok(format!("Table {name} created"))
    }

    /// Drop a table together with its snapshot in one commit.
    pub fn drop(&mut self, name: &str) -> OpResult {
        identifier::validate(name)?;

        self.transact(|catalog| {
            catalog
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| Rejection::TableMissing(name.to_string()))
        })?;

        log::info!("dropped table {name} and its rollback");
        Ok(format!("Table {name} and its rollback deleted"))
    }

    /// Current records of `name`, in stored order.
    pub fn list_all(&self, name: &str) -> Result<&[Record], Rejection> {
        identifier::validate(name)?;
        self.catalog
            .get(name)
            .map(|t| t.records.as_slice())
            .ok_or_else(|| Rejection::TableMissing(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.catalog.contains_key(name)
    }

    /// Snapshot currently held for `name`, if any.
    pub fn snapshot_of(&self, name: &str) -> Option<&Snapshot> {
        self.catalog.get(name).and_then(|t| t.rollback.as_ref())
    }

    /// Stored table names, each followed by its `_rb` name when a snapshot exists.
    pub fn catalog_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.catalog.len() * 2);
        for (name, table) in &self.catalog {
            names.push(name.clone());
            if table.rollback.is_some() {
                names.push(identifier::rollback_name(name));
            }
        }
        names
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Run `op` on a working copy and commit it only if `op` and the backend succeed.
    pub(crate) fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut Catalog) -> Result<T, Rejection>,
    ) -> Result<T, StoreError> {
        let mut working = self.catalog.clone();
        let value = op(&mut working)?;
        self.backend.commit(&working)?;
        self.catalog = working;
        Ok(value)
    }
}

/// Validated mutable lookup of an existing table inside a transaction.
pub(crate) fn existing<'a>(catalog: &'a mut Catalog, name: &str) -> Result<&'a mut Table, Rejection> {
    identifier::validate(name)?;
    catalog
        .get_mut(name)
        .ok_or_else(|| Rejection::TableMissing(name.to_string()))
}
