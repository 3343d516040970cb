// Rounds Kernel
//
// Address tables with single-generation rollback, and the re-sequencing
// flow that writes an optimised visiting order back onto them.

pub mod adapters;
pub mod config;
pub mod identifier;
pub mod mutation;
pub mod orchestrate;
pub mod outcome;
pub mod reorder;
pub mod route;
pub mod sanitize;
pub mod snapshot;
pub mod store;

pub use outcome::{OpResult, Rejection, Response, StoreError};
pub use store::backend::{BackendError, InMemoryBackend, JsonFileBackend, StoreBackend};
pub use store::{Record, Snapshot, Table, TableStore};
