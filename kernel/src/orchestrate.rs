// Mutation + Re-sequencing Flow
//
// Boundary entry points used by the request layer. Insert and delete run
// as two phases:
//
//   1. commit the mutation and its snapshot
//   2. geocode every row, optimise the route, apply the new order
//
// A phase-2 failure never undoes phase 1. It is reported separately so
// the caller can retry it with `resequence`.

use crate::mutation;
use crate::outcome::{Response, StoreError};
use crate::reorder::{self, ReorderError};
use crate::route::{CollaboratorError, Coordinate, Geocoder, OptimisedLocation, RouteOptimizer};
use crate::snapshot;
use crate::store::backend::{BackendError, StoreBackend};
use crate::store::{Record, TableStore};

/// Why phase 2 stopped before a new order was stored.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("geocoding failed for input {index} ({query}): {source}")]
    Geocode {
        index: usize,
        query: String,
        #[source]
        source: CollaboratorError,
    },

    #[error("route optimization failed: {0}")]
    Optimise(#[source] CollaboratorError),

    #[error("optimizer result unusable: {0}")]
    Permutation(#[from] ReorderError),

    #[error("could not store new order: {0}")]
    Store(#[from] StoreError),
}

/// What happened in phase 2.
#[derive(Debug)]
pub enum ReorderStatus {
    /// New order stored over this many records.
    Applied(usize),

    /// Phase 1 was rejected, nothing to re-sequence.
    Skipped,

    Failed(FlowError),
}

/// Result of an insert or delete request.
#[derive(Debug)]
pub struct FlowOutcome {
    pub mutation: Response,
    pub reorder: ReorderStatus,
}

impl FlowOutcome {
    /// True when phase 1 committed but phase 2 did not.
    pub fn reorder_failed(&self) -> bool {
        matches!(self.reorder, ReorderStatus::Failed(_))
    }
}

pub fn create_table<B: StoreBackend>(
    store: &mut TableStore<B>,
    name: &str,
) -> Result<Response, BackendError> {
    Response::from_result(store.create(name))
}

/// Drop `name` and its rollback.
pub fn delete_table<B: StoreBackend>(
    store: &mut TableStore<B>,
    name: &str,
) -> Result<Response, BackendError> {
    Response::from_result(store.drop(name))
}

pub fn rollback_table<B: StoreBackend>(
    store: &mut TableStore<B>,
    name: &str,
) -> Result<Response, BackendError> {
    Response::from_result(snapshot::rollback(store, name))
}

/// Geocoding query sent for a record.
pub fn geocode_query(record: &Record) -> String {
    format!("{}, {}", record.street, record.postcode)
}

/// Drives mutations through the external collaborators.
pub struct Orchestrator<G, O> {
    geocoder: G,
    optimizer: O,
}

impl<G: Geocoder, O: RouteOptimizer> Orchestrator<G, O> {
    pub fn new(geocoder: G, optimizer: O) -> Self {
        Self {
            geocoder,
            optimizer,
        }
    }

    pub fn insert_value<B: StoreBackend>(
        &self,
        store: &mut TableStore<B>,
        table: &str,
        street: &str,
        postcode: &str,
    ) -> Result<FlowOutcome, BackendError> {
        let result = mutation::insert(store, table, street, postcode);
        self.follow_up(store, table, result)
    }

    pub fn delete_value<B: StoreBackend>(
        &self,
        store: &mut TableStore<B>,
        table: &str,
        street: &str,
        postcode: &str,
    ) -> Result<FlowOutcome, BackendError> {
        let result = mutation::delete(store, table, street, postcode);
        self.follow_up(store, table, result)
    }

    /// Phase 2 on its own: re-sequence `table` from its current rows.
    pub fn resequence<B: StoreBackend>(
        &self,
        store: &mut TableStore<B>,
        table: &str,
    ) -> Result<usize, FlowError> {
        let rows = store
            .list_all(table)
            .map_err(StoreError::from)?
            .to_vec();

        let ordered = if rows.is_empty() {
            rows
        } else {
            let queries: Vec<String> = rows.iter().map(geocode_query).collect();
            let locations = self.optimise_addresses(&queries)?;
            let indices: Vec<usize> = locations.iter().map(|l| l.original_index).collect();
            reorder::permute(&rows, &indices)?
        };

        let count = ordered.len();
        reorder::apply_order(store, table, ordered)?;
        log::info!("re-sequenced {table} over {count} record(s)");
        Ok(count)
    }

    /// Geocode `queries` in order and return them as an optimised route.
    ///
    /// Touches no table.
    pub fn optimise_addresses(&self, queries: &[String]) -> Result<Vec<OptimisedLocation>, FlowError> {
        let stops = self.geocode_all(queries)?;
        self.optimizer.optimise(&stops).map_err(FlowError::Optimise)
    }

    fn geocode_all(&self, queries: &[String]) -> Result<Vec<Coordinate>, FlowError> {
        queries
            .iter()
            .enumerate()
            .map(|(index, query)| {
                self.geocoder
                    .geocode(query)
                    .map_err(|source| FlowError::Geocode {
                        index,
                        query: query.clone(),
                        source,
                    })
            })
            .collect()
    }

    fn follow_up<B: StoreBackend>(
        &self,
        store: &mut TableStore<B>,
        table: &str,
        result: Result<String, StoreError>,
    ) -> Result<FlowOutcome, BackendError> {
        let mutation = Response::from_result(result)?;
        if !mutation.ok {
            return Ok(FlowOutcome {
                mutation,
                reorder: ReorderStatus::Skipped,
            });
        }

        let reorder = match self.resequence(store, table) {
            Ok(count) => ReorderStatus::Applied(count),
            Err(e) => {
                log::warn!("re-sequencing {table} failed, mutation kept: {e}");
                ReorderStatus::Failed(e)
            }
        };

        Ok(FlowOutcome { mutation, reorder })
    }
}
