// Table Store Storage Backend
//
// Defines the durability contract for the table catalog and the two
// backends shipped with the kernel.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Catalog;

/// Unrecoverable storage fault. Never produced for expected conditions.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt store document: {0}")]
    Corrupt(String),
}

/// Storage backend for the table catalog.
///
/// Properties required from implementations:
/// - `commit` replaces the whole persisted catalog or nothing
/// - `load` returns exactly the last committed catalog
pub trait StoreBackend: Send + Sync {
    /// Load the last committed catalog. A backend with no data yields an empty one.
    fn load(&self) -> Result<Catalog, BackendError>;

    /// Persist `catalog` as the new committed state.
    fn commit(&mut self, catalog: &Catalog) -> Result<(), BackendError>;
}

/// Volatile backend. Used for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    committed: Catalog,
}

impl StoreBackend for InMemoryBackend {
    fn load(&self) -> Result<Catalog, BackendError> {
        Ok(self.committed.clone())
    }

    fn commit(&mut self, catalog: &Catalog) -> Result<(), BackendError> {
        self.committed = catalog.clone();
        Ok(())
    }
}

const DOCUMENT_VERSION: u32 = 1;

/// On-disk layout of the catalog.
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    tables: Catalog,
}

/// Backend persisting the catalog as a single JSON document.
///
/// Commits write and fsync a temporary sibling, rename it over the target,
/// then fsync the parent directory.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }

    fn write_synced(tmp: &Path, body: &[u8]) -> io::Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp)?;
        f.write_all(body)?;
        f.sync_all()
    }

    fn io_err(&self, source: io::Error) -> BackendError {
        BackendError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StoreBackend for JsonFileBackend {
    fn load(&self) -> Result<Catalog, BackendError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no store at {}, starting empty", self.path.display());
                return Ok(Catalog::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };

        let doc: StoreDocument =
            serde_json::from_str(&data).map_err(|e| BackendError::Corrupt(e.to_string()))?;

        if doc.version != DOCUMENT_VERSION {
            return Err(BackendError::Corrupt(format!(
                "unsupported document version {}",
                doc.version
            )));
        }

        Ok(doc.tables)
    }

    fn commit(&mut self, catalog: &Catalog) -> Result<(), BackendError> {
        #[derive(Serialize)]
        struct DocumentRef<'a> {
            version: u32,
            tables: &'a Catalog,
        }

        let body = serde_json::to_vec_pretty(&DocumentRef {
            version: DOCUMENT_VERSION,
            tables: catalog,
        })
        .map_err(|e| BackendError::Corrupt(e.to_string()))?;

        let tmp = self.temp_path();
        if let Err(e) = Self::write_synced(&tmp, &body) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_err(e));
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_err(e));
        }
        if let Err(e) = fsync_dir(&self.path) {
            log::warn!("fsync of directory holding {} failed: {e}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(unix)]
fn fsync_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::File::open(parent)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Record, Snapshot, Table};

    fn unique_path(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{prefix}-{}.json", Uuid::new_v4()))
    }

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(
            "dummy".into(),
            Table {
                records: vec![Record::new("1 House St", "A01")],
                rollback: Some(Snapshot { records: vec![] }),
            },
        );
        catalog
    }

    #[test]
    fn missing_file_loads_empty() {
        let backend = JsonFileBackend::new(unique_path("rounds-missing"));
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn commit_then_load_returns_catalog() {
        let path = unique_path("rounds-commit");
        let mut backend = JsonFileBackend::new(&path);

        backend.commit(&sample_catalog()).unwrap();
        let loaded = JsonFileBackend::new(&path).load().unwrap();

        assert_eq!(loaded, sample_catalog());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn garbage_document_is_corrupt() {
        let path = unique_path("rounds-corrupt");
        fs::write(&path, b"not json").unwrap();

        let err = JsonFileBackend::new(&path).load().unwrap_err();
        assert!(matches!(err, BackendError::Corrupt(_)));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn commit_leaves_no_temp_files_behind() {
        let dir = std::env::temp_dir().join(format!("rounds-sync-{}", Uuid::new_v4()));
        fs::create_dir(&dir).unwrap();
        let path = dir.join("store.json");
        let mut backend = JsonFileBackend::new(&path);

        backend.commit(&sample_catalog()).unwrap();
        backend.commit(&Catalog::new()).unwrap();

        let names: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
        assert!(JsonFileBackend::new(&path).load().unwrap().is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn fsync_dir_accepts_bare_file_name() {
        assert!(fsync_dir(Path::new("store.json")).is_ok());
    }

    #[test]
    fn commit_into_missing_directory_fails() {
        let dir = std::env::temp_dir().join(format!("rounds-nodir-{}", Uuid::new_v4()));
        let mut backend = JsonFileBackend::new(dir.join("store.json"));

        let err = backend.commit(&sample_catalog()).unwrap_err();
        assert!(matches!(err, BackendError::Io { .. }));
    }
}
