use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] almanac_db::error::DbError),

    #[error(transparent)]
    RfcError(#[from] almanac_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] almanac_core::error::CoreError),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid calendar object: {0}")]
    InvalidCalendarObject(String),

    #[error("Invalid address object: {0}")]
    InvalidAddressObject(String),

    #[error("Precondition failed: resource already exists")]
    PreconditionNoneMatchFailed,

    #[error("Precondition failed: entity tag mismatch")]
    PreconditionMatchFailed,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ServiceError {
    /// Returns whether this error is one of the conditional-write
    /// precondition failures.
    #[must_use]
    pub const fn is_precondition_failure(&self) -> bool {
        matches!(
            self,
            Self::PreconditionNoneMatchFailed | Self::PreconditionMatchFailed
        )
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
