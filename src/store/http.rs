//! store::http
//!
//! Case store client for the REST backend.
//!
//! # Endpoints
//!
//! | Operation          | Request                         | Success |
//! |--------------------|---------------------------------|---------|
//! | `list_cases`       | `GET {base}/cases/`             | 200     |
//! | `fetch_case`       | `GET {base}/cases/{id}`         | 200     |
//! | `patch_case_field` | `PUT {base}/cases/{id}` (partial)| 200    |
//! | `delete_case`      | `DELETE {base}/cases/{id}`      | 204     |
//!
//! # Example
//!
//! ```ignore
//! use caseview::store::{CaseStore, HttpCaseStore};
//! use caseview::core::types::CaseId;
//!
//! let store = HttpCaseStore::new("http://localhost:8000/api");
//! let case = store.fetch_case(CaseId::new(1)).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::traits::{CaseStore, StoreError};
use crate::core::case::{AssuranceCase, CaseSummary};
use crate::core::types::CaseId;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "caseview";

/// HTTP implementation of [`CaseStore`].
#[derive(Debug, Clone)]
pub struct HttpCaseStore {
    /// HTTP client for making requests
    client: Client,
    /// API base URL without trailing slash
    base_url: String,
}

impl HttpCaseStore {
    /// Create a client for the API at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client whose requests give up after `timeout`.
    ///
    /// A request that times out fails with `StoreError::NetworkError`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NetworkError` if the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers
    }

    fn case_url(&self, id: CaseId) -> String {
        format!("{}/cases/{}", self.base_url, id)
    }

    /// Handle an API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        response: Response,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| StoreError::InvalidResponse(e.to_string()))
        } else {
            Self::handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        response: Response,
        status: StatusCode,
    ) -> Result<T, StoreError> {
        // Django REST framework answers validation errors with a JSON object of
        // field -> messages; anything else is reported as raw text.
        let message = match response.text().await {
            Ok(body) if !body.trim().is_empty() => body.trim().to_string(),
            _ => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            _ if status.is_server_error() => StoreError::ApiError {
                status: status.as_u16(),
                message: format!("server error: {}", message),
            },
            _ => StoreError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, StoreError> {
        request
            .headers(Self::headers())
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))
    }
}

#[async_trait]
impl CaseStore for HttpCaseStore {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_case(&self, id: CaseId) -> Result<AssuranceCase, StoreError> {
        let url = self.case_url(id);
        debug!(%url, "fetching case");
        let response = self.send(self.client.get(&url)).await?;
        Self::handle_response(response).await
    }

    async fn patch_case_field(
        &self,
        id: CaseId,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let url = self.case_url(id);
        debug!(%url, field, "patching case field");

        let mut body = serde_json::Map::new();
        body.insert(field.to_string(), value);

        let response = self.send(self.client.put(&url).json(&body)).await?;
        let status = response.status();
        if status.is_success() {
            // The updated case in the body is ignored; the next poll reads it.
            Ok(())
        } else {
            Self::handle_error_response(response, status).await
        }
    }

    async fn delete_case(&self, id: CaseId) -> Result<(), StoreError> {
        let url = self.case_url(id);
        debug!(%url, "deleting case");
        let response = self.send(self.client.delete(&url)).await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            Ok(())
        } else if status.is_success() {
            Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                expected: StatusCode::NO_CONTENT.as_u16(),
            })
        } else {
            Self::handle_error_response(response, status).await
        }
    }

    async fn list_cases(&self) -> Result<Vec<CaseSummary>, StoreError> {
        let url = format!("{}/cases/", self.base_url);
        debug!(%url, "listing cases");
        let response = self.send(self.client.get(&url)).await?;
        Self::handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let store = HttpCaseStore::new("http://localhost:8000/api/");
        assert_eq!(store.base_url(), "http://localhost:8000/api");
        assert_eq!(
            store.case_url(CaseId::new(7)),
            "http://localhost:8000/api/cases/7"
        );
    }
}
