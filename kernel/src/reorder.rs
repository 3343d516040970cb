// Reorder Applier
//
// Writes an externally computed visiting order back onto a table. The
// permutation is built from the optimizer's `original_index` values over
// the rows that were sent to it.

use crate::outcome::StoreError;
use crate::store::backend::StoreBackend;
use crate::store::{self, Record, TableStore};

/// The optimizer's answer is not a permutation of the rows it was given.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    #[error("optimizer returned {actual} locations for {expected} rows")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("original_index {index} out of range for {len} rows")]
    OutOfRange { index: usize, len: usize },

    #[error("original_index {0} returned more than once")]
    Repeated(usize),
}

/// Arrange `rows` so that position `i` holds `rows[original_indices[i]]`.
pub fn permute(rows: &[Record], original_indices: &[usize]) -> Result<Vec<Record>, ReorderError> {
    if rows.len() != original_indices.len() {
        return Err(ReorderError::LengthMismatch {
            expected: rows.len(),
            actual: original_indices.len(),
        });
    }

    let mut seen = vec![false; rows.len()];
    let mut ordered = Vec::with_capacity(rows.len());

    for &index in original_indices {
        let slot = seen.get_mut(index).ok_or(ReorderError::OutOfRange {
            index,
            len: rows.len(),
        })?;
        if *slot {
            return Err(ReorderError::Repeated(index));
        }
        *slot = true;
        ordered.push(rows[index].clone());
    }

    Ok(ordered)
}

/// Replace every record of `table` with `ordered`, in the given order.
///
/// Record contents are not re-validated and the snapshot is left as is.
pub fn apply_order<B: StoreBackend>(
    store: &mut TableStore<B>,
    table: &str,
    ordered: Vec<Record>,
) -> Result<(), StoreError> {
    let count = ordered.len();
    store.transact(move |catalog| {
        let t = store::existing(catalog, table)?;
        t.records = ordered;
        Ok(())
    })?;

    log::debug!("applied new order of {count} record(s) to {table}");
    Ok(())
}
