// Rollback Snapshots
//
// A table holds at most one snapshot: its records as they were right
// before the latest insert or delete. Taking a snapshot overwrites the
// previous one; rolling back restores it and discards it.

use crate::identifier;
use crate::outcome::{OpResult, Rejection};
use crate::store::backend::StoreBackend;
use crate::store::{self, Snapshot, Table, TableStore};

/// Overwrite `table`'s snapshot with its current records.
///
/// Must run inside the same transaction as the mutation it precedes.
pub(crate) fn capture(table: &mut Table) {
    table.rollback = Some(Snapshot {
        records: table.records.clone(),
    });
}

/// Restore `name` from its snapshot and delete the snapshot.
pub fn rollback<B: StoreBackend>(store: &mut TableStore<B>, name: &str) -> OpResult {
    identifier::validate(name)?;

    store.transact(|catalog| {
        let table = store::existing(catalog, name)?;
        let snapshot = table
            .rollback
            .take()
            .ok_or_else(|| Rejection::NoRollback(name.to_string()))?;
        table.records = snapshot.records;
        Ok(())
    })?;

    log::info!("rolled back table {name}");
    Ok(format!("Table {name} has been rolled back"))
}
