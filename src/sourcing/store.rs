//! Document-store collaborator contract and its wire envelopes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::records::{
    Association, PaymentHistoryEntry, PaymentHistoryPatch, ProjectRecord, SimulationRecord,
};

/// Operations the engine needs from the document store
///
/// Implementations report failures as `StoreError`; they never panic on
/// missing documents.
#[async_trait]
pub trait FinanceStore: Send + Sync {
    /// The user's simulation for a project, if one exists
    async fn fetch_simulation_by_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> StoreResult<Option<SimulationRecord>>;

    async fn fetch_simulation_by_id(&self, id: &str) -> StoreResult<SimulationRecord>;

    async fn fetch_project_by_id(&self, id: &str) -> StoreResult<ProjectRecord>;

    /// The payment-tracking association between a user and a project
    async fn find_association(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> StoreResult<Option<Association>>;

    async fn list_payment_history(&self, association_id: &str) -> StoreResult<Vec<PaymentHistoryEntry>>;

    /// Store a new entry and return its id
    async fn create_payment_history_entry(
        &self,
        association_id: &str,
        entry: PaymentHistoryEntry,
    ) -> StoreResult<String>;

    async fn update_payment_history_entry(&self, id: &str, patch: PaymentHistoryPatch) -> StoreResult<()>;

    async fn delete_payment_history_entry(&self, id: &str) -> StoreResult<()>;
}

/// Read response as exchanged with remote collaborators
///
/// `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ReadResponse<T> {
    pub fn into_result(self) -> StoreResult<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(StoreError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

impl<T> From<StoreResult<T>> for ReadResponse<T> {
    fn from(result: StoreResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Write response: `{"success": true, "id"?: ...}` or `{"success": false, "error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteResponse {
    pub fn into_result(self) -> StoreResult<Option<String>> {
        if self.success {
            Ok(self.id)
        } else {
            Err(StoreError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

impl From<StoreResult<String>> for WriteResponse {
    fn from(result: StoreResult<String>) -> Self {
        match result {
            Ok(id) => Self { success: true, id: Some(id), error: None },
            Err(err) => Self { success: false, id: None, error: Some(err.to_string()) },
        }
    }
}

impl From<StoreResult<()>> for WriteResponse {
    fn from(result: StoreResult<()>) -> Self {
        match result {
            Ok(()) => Self { success: true, id: None, error: None },
            Err(err) => Self { success: false, id: None, error: Some(err.to_string()) },
        }
    }
}
