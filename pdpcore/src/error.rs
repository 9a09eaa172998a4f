use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// The store could not be reached; the operation may be retried.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A configured constraint (e.g. uniqueness) rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[cfg(feature = "sqlx")]
    #[error(transparent)]
    Sqlx(sqlx::Error),
    /// Denotes custom application invariant; generally informative.
    #[error("application invariant violated: {0}")]
    AppInvariantViolation(String),
    #[error("unknown error")]
    Unknown,
}

impl BackendError {
    /// Whether the failure is a transient condition of the store rather
    /// than a logical error with the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

// Connection level failures are folded into `Unavailable` so callers
// never need to inspect the underlying driver error to decide on a retry.
#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for BackendError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable(e.to_string()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Self::ConstraintViolation(db.message().to_string())
            }
            sqlx::Error::Database(ref db) if sqlite_transient(&**db) => {
                Self::Unavailable(e.to_string())
            }
            e => Self::Sqlx(e),
        }
    }
}

// SQLITE_BUSY, SQLITE_LOCKED and SQLITE_CANTOPEN, including their
// extended codes.
#[cfg(feature = "sqlx")]
fn sqlite_transient(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.try_downcast_ref::<sqlx::sqlite::SqliteError>().is_some()
        && db.code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6 | 14))
}

#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("field `{0}` must be a non-empty string")]
    EmptyField(&'static str),
}
