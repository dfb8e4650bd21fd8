//! Error types for the dictionary core
//!
//! Validation findings are never errors: they are written into the report as
//! status codes. The types here cover the two genuinely fatal classes,
//! store failures and validator misconfiguration.

use thiserror::Error;

/// Failure reported by a dictionary store backend.
///
/// Any store failure aborts the whole `validate` call; the open report slot
/// is stamped with the `StoreFailure` status code before the error surfaces.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store operation timed out: {0}")]
    Timeout(String),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Timeout("connection pool".to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Contract violation at validator construction time.
///
/// These are programmer errors in the calling code; they are raised from
/// `ValidatorOptions::build` and never appear in a report.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no value to validate")]
    MissingValue,

    #[error("zipped validation requires a descriptor")]
    ZipWithoutDescriptor,

    #[error("zipped validation requires an array value")]
    ZipValueNotArray,

    #[error("without a descriptor the value must be an object or an array of objects")]
    ValueNotValidatable,
}

/// Fatal failure of a `validate` call.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("dictionary store failure: {0}")]
    Store(#[from] StoreError),
}
