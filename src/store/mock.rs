//! store::mock
//!
//! Mock case store for deterministic testing.
//!
//! # Design
//!
//! Cases live in memory behind a shared `Arc<Mutex<...>>`, so clones of one
//! mock observe the same store. This is how tests model several sessions
//! talking to one backend: each session gets a clone. Field patches follow
//! the real store's last-write-wins semantics. Failures can be injected per
//! operation and every call is recorded for verification.
//!
//! # Example
//!
//! ```
//! use caseview::core::case::AssuranceCase;
//! use caseview::core::types::CaseId;
//! use caseview::store::mock::MockCaseStore;
//! use caseview::store::CaseStore;
//!
//! # tokio_test::block_on(async {
//! let store = MockCaseStore::with_cases(vec![AssuranceCase::new(CaseId::new(1), "Case")]);
//!
//! store
//!     .patch_case_field(CaseId::new(1), "lock_uuid", serde_json::json!("s1"))
//!     .await
//!     .unwrap();
//!
//! let case = store.fetch_case(CaseId::new(1)).await.unwrap();
//! assert_eq!(case.lock_holder().unwrap().as_str(), "s1");
//! # });
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{CaseStore, StoreError};
use crate::core::case::{AssuranceCase, CaseSummary, LOCK_FIELD};
use crate::core::types::{CaseId, SessionToken};

/// Mock case store for testing.
#[derive(Debug, Clone, Default)]
pub struct MockCaseStore {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockCaseStoreInner>>,
}

#[derive(Debug, Default)]
struct MockCaseStoreInner {
    cases: BTreeMap<CaseId, AssuranceCase>,
    fail_on: Option<FailOn>,
    fetch_delays: VecDeque<Option<Duration>>,
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail fetch_case with the given error.
    FetchCase(StoreError),
    /// Fail patch_case_field with the given error.
    PatchCaseField(StoreError),
    /// Fail delete_case with the given error.
    DeleteCase(StoreError),
    /// Fail list_cases with the given error.
    ListCases(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    FetchCase { id: CaseId },
    PatchCaseField { id: CaseId, field: String, value: Value },
    DeleteCase { id: CaseId },
    ListCases,
}

#[derive(Clone, Copy)]
enum Op {
    Fetch,
    Patch,
    Delete,
    List,
}

impl MockCaseStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store holding the given cases.
    pub fn with_cases(cases: Vec<AssuranceCase>) -> Self {
        let store = Self::new();
        for case in cases {
            store.put_case(case);
        }
        store
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.set_fail_on(fail_on);
        self
    }

    /// Configure a failure on a shared handle.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = Some(fail_on);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Delay the next fetches, one entry per call in call order.
    ///
    /// Each fetch reads the case when it is called and answers after its
    /// delay, so a slow fetch returns the document as it was when it started.
    /// `None` entries answer at once; once the queue is empty, so do all later
    /// fetches. `Some(Duration::MAX)` never answers.
    pub fn set_fetch_delays(&self, delays: impl IntoIterator<Item = Option<Duration>>) {
        let mut inner = self.inner.lock().unwrap();
        inner.fetch_delays = delays.into_iter().collect();
    }

    /// Number of recorded fetch operations.
    pub fn fetch_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::FetchCase { .. }))
            .count()
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Number of recorded patch operations.
    pub fn patch_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::PatchCaseField { .. }))
            .count()
    }

    /// Insert or replace a case, as another client editing the document would.
    pub fn put_case(&self, case: AssuranceCase) {
        let mut inner = self.inner.lock().unwrap();
        inner.cases.insert(case.id(), case);
    }

    /// Get a case without recording an operation.
    pub fn case(&self, id: CaseId) -> Option<AssuranceCase> {
        let inner = self.inner.lock().unwrap();
        inner.cases.get(&id).cloned()
    }

    /// Current lock holder of a case, without recording an operation.
    pub fn lock_holder(&self, id: CaseId) -> Option<SessionToken> {
        self.case(id).and_then(|c| c.lock_holder().cloned())
    }

    /// Overwrite the lock holder directly, bypassing failure injection.
    pub fn set_lock_holder(&self, id: CaseId, holder: Option<SessionToken>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(case) = inner.cases.remove(&id) {
            inner.cases.insert(id, case.with_lock_holder(holder));
        }
    }

    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    fn check_fail(&self, op: Op) -> Result<(), StoreError> {
        let inner = self.inner.lock().unwrap();
        match (&inner.fail_on, op) {
            (Some(FailOn::FetchCase(e)), Op::Fetch)
            | (Some(FailOn::PatchCaseField(e)), Op::Patch)
            | (Some(FailOn::DeleteCase(e)), Op::Delete)
            | (Some(FailOn::ListCases(e)), Op::List) => Err(e.clone()),
            _ => Ok(()),
        }
    }
}

fn not_found(id: CaseId) -> StoreError {
    StoreError::NotFound(format!("case {}", id))
}

#[async_trait]
impl CaseStore for MockCaseStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_case(&self, id: CaseId) -> Result<AssuranceCase, StoreError> {
        self.record(MockOperation::FetchCase { id });
        self.check_fail(Op::Fetch)?;
        let result = self.case(id).ok_or_else(|| not_found(id));

        let delay = self.inner.lock().unwrap().fetch_delays.pop_front().flatten();
        match delay {
            Some(delay) if delay == Duration::MAX => std::future::pending::<()>().await,
            Some(delay) => tokio::time::sleep(delay).await,
            None => {}
        }
        result
    }

    async fn patch_case_field(
        &self,
        id: CaseId,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.record(MockOperation::PatchCaseField {
            id,
            field: field.to_string(),
            value: value.clone(),
        });
        self.check_fail(Op::Patch)?;

        let mut inner = self.inner.lock().unwrap();
        let case = inner.cases.get_mut(&id).ok_or_else(|| not_found(id))?;
        case.apply_patch(field, value)
            .map_err(|e| StoreError::ApiError {
                status: 400,
                message: e.to_string(),
            })
    }

    async fn delete_case(&self, id: CaseId) -> Result<(), StoreError> {
        self.record(MockOperation::DeleteCase { id });
        self.check_fail(Op::Delete)?;

        let mut inner = self.inner.lock().unwrap();
        inner.cases.remove(&id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    async fn list_cases(&self) -> Result<Vec<CaseSummary>, StoreError> {
        self.record(MockOperation::ListCases);
        self.check_fail(Op::List)?;

        let inner = self.inner.lock().unwrap();
        Ok(inner.cases.values().map(AssuranceCase::summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MockCaseStore {
        MockCaseStore::with_cases(vec![
            AssuranceCase::new(CaseId::new(1), "One"),
            AssuranceCase::new(CaseId::new(2), "Two"),
        ])
    }

    #[tokio::test]
    async fn fetch_missing_case_is_not_found() {
        let result = store().fetch_case(CaseId::new(9)).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn patch_is_last_write_wins() {
        let store = store();
        let id = CaseId::new(1);
        store.patch_case_field(id, LOCK_FIELD, json!("a")).await.unwrap();
        store.patch_case_field(id, LOCK_FIELD, json!("b")).await.unwrap();
        assert_eq!(store.lock_holder(id).unwrap().as_str(), "b");
        assert_eq!(store.patch_count(), 2);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let a = store();
        let b = a.clone();
        a.patch_case_field(CaseId::new(1), "name", json!("Renamed"))
            .await
            .unwrap();
        let case = b.fetch_case(CaseId::new(1)).await.unwrap();
        assert_eq!(case.name(), "Renamed");
    }

    #[tokio::test]
    async fn fail_on_only_affects_named_operation() {
        let store = store().fail_on(FailOn::PatchCaseField(StoreError::NetworkError(
            "down".into(),
        )));

        let patch = store
            .patch_case_field(CaseId::new(1), LOCK_FIELD, json!("x"))
            .await;
        assert!(matches!(patch, Err(StoreError::NetworkError(_))));
        assert!(store.lock_holder(CaseId::new(1)).is_none());
        assert!(store.fetch_case(CaseId::new(1)).await.is_ok());

        store.clear_fail_on();
        assert!(store
            .patch_case_field(CaseId::new(1), LOCK_FIELD, json!("x"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn delete_and_list() {
        let store = store();
        store.delete_case(CaseId::new(1)).await.unwrap();
        let cases = store.list_cases().await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "Two");
        assert!(store.delete_case(CaseId::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn delayed_fetch_returns_document_from_call_time() {
        let store = store();
        store.set_fetch_delays([Some(Duration::from_millis(50))]);

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_case(CaseId::new(1)).await })
        };
        tokio::task::yield_now().await;
        store
            .patch_case_field(CaseId::new(1), "name", json!("Renamed"))
            .await
            .unwrap();

        assert_eq!(slow.await.unwrap().unwrap().name(), "One");
        assert_eq!(store.fetch_case(CaseId::new(1)).await.unwrap().name(), "Renamed");
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn operations_recorded_in_order() {
        let store = store();
        let _ = store.fetch_case(CaseId::new(2)).await;
        let _ = store.list_cases().await;
        assert_eq!(
            store.operations(),
            vec![
                MockOperation::FetchCase { id: CaseId::new(2) },
                MockOperation::ListCases,
            ]
        );
    }
}
