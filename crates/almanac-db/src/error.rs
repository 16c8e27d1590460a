use thiserror::Error;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error(transparent)]
    CoreError(#[from] almanac_core::error::CoreError),
}

impl DbError {
    /// Returns whether this error is Diesel's "no rows" marker.
    ///
    /// Probing for an optional row (e.g. a recurrence that may not exist)
    /// treats this as absence, never as failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::DatabaseError(diesel::result::Error::NotFound))
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
