pub mod phone;

use phoneservice_api::ApiError;
use phoneservice_storage::StorageError;

/// Converts a storage failure, logging the ones the client cannot fix.
pub(crate) fn storage_error(err: StorageError) -> ApiError {
    match &err {
        StorageError::InvalidQuery { .. } | StorageError::InvalidEntity { .. } => {
            tracing::debug!(error = %err, category = %err.category(), "Rejected request");
        }
        _ => {
            tracing::error!(error = %err, category = %err.category(), "Storage failure");
        }
    }
    ApiError::from(err)
}
