// Operation Outcomes
//
// Every expected failure of the core is a `Rejection` whose display text
// is the exact message returned to callers. Storage faults are kept apart
// so they can surface as fatal errors instead of user-facing messages.

use serde::Serialize;

use crate::store::backend::BackendError;

/// Expected, user-facing failure of a core operation.
///
/// Rejections are always detected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Invalid table name. Please ensure only letters, numbers and underscores are used")]
    InvalidName,

    #[error("Cannot have _rb in table name")]
    ReservedMarker,

    #[error("Table {0} already exists")]
    TableExists(String),

    #[error("Table {0} does not exist")]
    TableMissing(String),

    #[error("No rollback for {0}")]
    NoRollback(String),

    #[error("Forbidden character {0} in input")]
    ForbiddenChar(char),

    #[error("Street and postcode already in database")]
    DuplicateRecord,

    #[error("Street and postcode not found in database")]
    RecordMissing,
}

/// Error returned by every store-facing operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("storage backend failure: {0}")]
    Backend(#[from] BackendError),
}

impl StoreError {
    /// The rejection behind this error, if it is not a storage fault.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            StoreError::Rejected(r) => Some(r),
            StoreError::Backend(_) => None,
        }
    }
}

/// Result of a core operation: the success message or why it failed.
pub type OpResult = Result<String, StoreError>;

/// Boundary response shape: `{ok, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub ok: bool,
    pub message: String,
}

impl Response {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn rejected(rejection: &Rejection) -> Self {
        Self {
            ok: false,
            message: rejection.to_string(),
        }
    }

    /// Fold a core result into a response.
    ///
    /// Rejections become `ok = false`; backend faults are passed through.
    pub fn from_result(result: OpResult) -> Result<Self, BackendError> {
        match result {
            Ok(message) => Ok(Self::success(message)),
            Err(StoreError::Rejected(r)) => Ok(Self::rejected(&r)),
            Err(StoreError::Backend(e)) => Err(e),
        }
    }
}
