use std::fs;
use std::path::PathBuf;

use rounds_kernel::orchestrate::{self, Orchestrator, ReorderStatus};
use rounds_kernel::route::{CollaboratorError, Coordinate, Geocoder, OptimisedLocation, RouteOptimizer};
use rounds_kernel::{mutation, snapshot, JsonFileBackend, Record, TableStore};
use uuid::Uuid;

fn unique_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{prefix}-{}.json", Uuid::new_v4()))
}

fn rec(street: &str) -> Record {
    Record::new(street, "A01")
}

struct Origin;

impl Geocoder for Origin {
    fn geocode(&self, _query: &str) -> Result<Coordinate, CollaboratorError> {
        Ok(Coordinate { lat: 0.0, lon: 0.0 })
    }
}

/// Visits stops in reverse input order.
struct Reverse;

impl RouteOptimizer for Reverse {
    fn optimise(&self, stops: &[Coordinate]) -> Result<Vec<OptimisedLocation>, CollaboratorError> {
        Ok((0..stops.len())
            .rev()
            .map(|i| OptimisedLocation {
                lat: stops[i].lat,
                lon: stops[i].lon,
                original_index: i,
            })
            .collect())
    }
}

#[test]
fn mutations_survive_reopen() {
    let path = unique_path("rounds-reopen");

    {
        let mut store = TableStore::open(JsonFileBackend::new(&path)).unwrap();
        store.create("dummy").unwrap();
        mutation::insert(&mut store, "dummy", "2 House St", "A01").unwrap();
        mutation::insert(&mut store, "dummy", "3 House St", "A01").unwrap();
    }

    let mut store = TableStore::open(JsonFileBackend::new(&path)).unwrap();
    assert_eq!(store.catalog_names(), vec!["dummy", "dummy_rb"]);
    assert_eq!(
        store.list_all("dummy").unwrap(),
        &[rec("2 House St"), rec("3 House St")]
    );
    assert_eq!(
        store.snapshot_of("dummy").unwrap().records,
        vec![rec("2 House St")]
    );

    snapshot::rollback(&mut store, "dummy").unwrap();
    drop(store);

    let store = TableStore::open(JsonFileBackend::new(&path)).unwrap();
    assert_eq!(store.list_all("dummy").unwrap(), &[rec("2 House St")]);
    assert!(store.snapshot_of("dummy").is_none());

    fs::remove_file(path).unwrap();
}

#[test]
fn full_request_cycle() {
    let path = unique_path("rounds-cycle");
    let mut store = TableStore::open(JsonFileBackend::new(&path)).unwrap();
    let flow = Orchestrator::new(Origin, Reverse);

    assert!(orchestrate::create_table(&mut store, "dummy").unwrap().ok);
    for street in ["1 House St", "2 House St", "3 House St"] {
        let outcome = flow.insert_value(&mut store, "dummy", street, "A01").unwrap();
        assert!(outcome.mutation.ok);
        assert!(matches!(outcome.reorder, ReorderStatus::Applied(_)));
    }

    // Each insert appends then reverses the whole table.
    assert_eq!(
        store.list_all("dummy").unwrap(),
        &[rec("3 House St"), rec("1 House St"), rec("2 House St")]
    );
    // Snapshot is the state before the last insert, after the previous reorder.
    assert_eq!(
        store.snapshot_of("dummy").unwrap().records,
        vec![rec("2 House St"), rec("1 House St")]
    );

    let response = orchestrate::rollback_table(&mut store, "dummy").unwrap();
    assert_eq!(response.message, "Table dummy has been rolled back");
    assert_eq!(
        store.list_all("dummy").unwrap(),
        &[rec("2 House St"), rec("1 House St")]
    );
    assert_eq!(
        orchestrate::rollback_table(&mut store, "dummy").unwrap().message,
        "No rollback for dummy"
    );

    let response = orchestrate::delete_table(&mut store, "dummy").unwrap();
    assert_eq!(response.message, "Table dummy and its rollback deleted");

    let reopened = TableStore::open(JsonFileBackend::new(&path)).unwrap();
    assert!(reopened.catalog_names().is_empty());

    fs::remove_file(path).unwrap();
}

#[test]
fn rejections_write_nothing_to_disk() {
    let path = unique_path("rounds-reject");
    let mut store = TableStore::open(JsonFileBackend::new(&path)).unwrap();

    assert_eq!(
        store.create("foo_rb").unwrap_err().to_string(),
        "Cannot have _rb in table name"
    );
    assert_eq!(
        store.drop("blank").unwrap_err().to_string(),
        "Table blank does not exist"
    );
    assert!(!path.exists());
}
