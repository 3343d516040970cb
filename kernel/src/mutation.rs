// Mutation Engine
//
// Validated insert and delete of a single record. Every check runs before
// anything is written, and the snapshot and the mutation are committed as
// one unit:
//
//   sanitize -> table lookup -> duplicate/existence check -> snapshot -> write

use crate::outcome::{OpResult, Rejection};
use crate::sanitize;
use crate::snapshot;
use crate::store::backend::StoreBackend;
use crate::store::{self, Record, TableStore};

/// Append `(street, postcode)` to the tail of `table`.
///
/// The new record lands last; the visiting order is corrected afterwards
/// by the reorder step.
pub fn insert<B: StoreBackend>(
    store: &mut TableStore<B>,
    table: &str,
    street: &str,
    postcode: &str,
) -> OpResult {
    if let Err(rejection) = sanitize::check(street, postcode) {
        log::warn!("insert into {table} rejected: {rejection}");
        return Err(rejection.into());
    }

    store.transact(|catalog| {
        let t = store::existing(catalog, table)?;
        if t.contains(street, postcode) {
            return Err(Rejection::DuplicateRecord);
        }

        snapshot::capture(t);
        t.records.push(Record::new(street, postcode));
        Ok(())
    })?;

    log::info!("inserted ({street}, {postcode}) into {table}");
    Ok(format!("Inserted values ({street}, {postcode}) into {table}"))
}

/// Remove every record equal to `(street, postcode)` from `table`.
pub fn delete<B: StoreBackend>(
    store: &mut TableStore<B>,
    table: &str,
    street: &str,
    postcode: &str,
) -> OpResult {
    if let Err(rejection) = sanitize::check(street, postcode) {
        log::warn!("delete from {table} rejected: {rejection}");
        return Err(rejection.into());
    }

    store.transact(|catalog| {
        let t = store::existing(catalog, table)?;
        if !t.contains(street, postcode) {
            return Err(Rejection::RecordMissing);
        }

        snapshot::capture(t);
        t.records.retain(|r| !r.matches(street, postcode));
        Ok(())
    })?;

    log::info!("deleted ({street}, {postcode}) from {table}");
    Ok(format!("Deleted values ({street}, {postcode}) from {table}"))
}
