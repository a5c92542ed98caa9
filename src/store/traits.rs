//! store::traits
//!
//! Case store trait definition.
//!
//! # Design
//!
//! The `CaseStore` trait is async because every operation is network I/O.
//! All methods return `Result` so a failed call never corrupts local state:
//! callers keep whatever they last accepted.
//!
//! # Example
//!
//! ```ignore
//! use caseview::core::types::CaseId;
//! use caseview::store::{CaseStore, StoreError};
//!
//! async fn show(store: &dyn CaseStore) -> Result<(), StoreError> {
//!     let case = store.fetch_case(CaseId::new(1)).await?;
//!     println!("{} is locked by {:?}", case.name(), case.lock_holder());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::case::{AssuranceCase, CaseSummary};
use crate::core::types::CaseId;

/// Errors from case store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The requested case does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API rejected the request.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// The API answered with a success status other than the one the
    /// operation requires.
    #[error("unexpected status {status} (expected {expected})")]
    UnexpectedStatus {
        /// Status received
        status: u16,
        /// Status required
        expected: u16,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Interface to the external case store.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so fetches can run as separate
/// tasks while the viewer loop keeps going.
///
/// # Error Handling
///
/// - `NotFound`: the case was deleted or never existed
/// - `ApiError`: the store rejected the request (e.g. validation)
/// - `NetworkError`: connectivity; polling simply tries again next tick
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Get the store name (e.g. "http", "mock").
    fn name(&self) -> &'static str;

    /// Fetch the full nested case document.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the case doesn't exist
    /// - `InvalidResponse` if the document cannot be parsed
    async fn fetch_case(&self, id: CaseId) -> Result<AssuranceCase, StoreError>;

    /// Partially update a case, setting a single field.
    ///
    /// Used to write the lock holder field. Last write wins.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the case doesn't exist
    /// - `ApiError` if the store rejects the value
    async fn patch_case_field(
        &self,
        id: CaseId,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    /// Delete a case.
    ///
    /// Only a `204 No Content` answer counts as confirmed.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the case doesn't exist
    /// - `UnexpectedStatus` for any other success status
    async fn delete_case(&self, id: CaseId) -> Result<(), StoreError>;

    /// List all cases as `{id, name}` summaries.
    async fn list_cases(&self) -> Result<Vec<CaseSummary>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        assert_eq!(
            format!("{}", StoreError::NotFound("case 3".into())),
            "not found: case 3"
        );
        assert_eq!(
            format!(
                "{}",
                StoreError::ApiError {
                    status: 400,
                    message: "bad value".into()
                }
            ),
            "API error: 400 - bad value"
        );
        assert_eq!(
            format!(
                "{}",
                StoreError::UnexpectedStatus {
                    status: 200,
                    expected: 204
                }
            ),
            "unexpected status 200 (expected 204)"
        );
        assert_eq!(
            format!("{}", StoreError::NetworkError("connection refused".into())),
            "network error: connection refused"
        );
    }
}
