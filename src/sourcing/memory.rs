//! In-process `FinanceStore` backed by plain collections

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::FinanceStore;
use crate::error::{RecordError, StoreError, StoreResult};
use crate::records::{
    load_json, Association, PaymentHistoryEntry, PaymentHistoryPatch, ProjectRecord,
    SimulationRecord,
};

/// Contents of an in-memory store; also the JSON fixture format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub simulations: Vec<SimulationRecord>,
    pub projects: Vec<ProjectRecord>,
    pub associations: Vec<Association>,
    /// Association id → history entries
    pub payment_history: HashMap<String, Vec<PaymentHistoryEntry>>,
}

impl StoreSnapshot {
    pub fn with_simulation(mut self, simulation: SimulationRecord) -> Self {
        self.simulations.push(simulation);
        self
    }

    pub fn with_project(mut self, project: ProjectRecord) -> Self {
        self.projects.push(project);
        self
    }

    pub fn with_association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn with_history(mut self, association_id: impl Into<String>, entries: Vec<PaymentHistoryEntry>) -> Self {
        self.payment_history
            .entry(association_id.into())
            .or_default()
            .extend(entries);
        self
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<StoreSnapshot>,
}

impl InMemoryStore {
    pub fn new(snapshot: StoreSnapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
        }
    }

    /// Load a store from a JSON fixture file
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        let mut snapshots: Vec<StoreSnapshot> = load_json(path)?;
        Ok(Self::new(snapshots.pop().unwrap_or_default()))
    }
}

#[async_trait]
impl FinanceStore for InMemoryStore {
    async fn fetch_simulation_by_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> StoreResult<Option<SimulationRecord>> {
        let data = self.data.read().await;
        let mut matches = data.simulations.iter().filter(|s| s.matches(user_id, project_id));
        let first = matches.next().cloned();
        if matches.next().is_some() {
            warn!(
                "more than one simulation for user {} and project {}, using the first",
                user_id, project_id
            );
        }
        Ok(first)
    }

    async fn fetch_simulation_by_id(&self, id: &str) -> StoreResult<SimulationRecord> {
        let data = self.data.read().await;
        data.simulations
            .iter()
            .find(|s| s.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("simulation", id))
    }

    async fn fetch_project_by_id(&self, id: &str) -> StoreResult<ProjectRecord> {
        let data = self.data.read().await;
        data.projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("project", id))
    }

    async fn find_association(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> StoreResult<Option<Association>> {
        let data = self.data.read().await;
        Ok(data
            .associations
            .iter()
            .find(|a| a.user_id == user_id && a.project_id == project_id)
            .cloned())
    }

    async fn list_payment_history(&self, association_id: &str) -> StoreResult<Vec<PaymentHistoryEntry>> {
        let data = self.data.read().await;
        Ok(data
            .payment_history
            .get(association_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_payment_history_entry(
        &self,
        association_id: &str,
        mut entry: PaymentHistoryEntry,
    ) -> StoreResult<String> {
        let mut data = self.data.write().await;
        if !data.associations.iter().any(|a| a.id == association_id) {
            return Err(StoreError::not_found("association", association_id));
        }

        let id = Uuid::new_v4().to_string();
        entry.id = Some(id.clone());
        data.payment_history
            .entry(association_id.to_string())
            .or_default()
            .push(entry);
        Ok(id)
    }

    async fn update_payment_history_entry(&self, id: &str, patch: PaymentHistoryPatch) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let entry = data
            .payment_history
            .values_mut()
            .flat_map(|entries| entries.iter_mut())
            .find(|e| e.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::not_found("payment history entry", id))?;
        patch.apply_to(entry);
        Ok(())
    }

    async fn delete_payment_history_entry(&self, id: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        for entries in data.payment_history.values_mut() {
            if let Some(pos) = entries.iter().position(|e| e.id.as_deref() == Some(id)) {
                entries.remove(pos);
                return Ok(());
            }
        }
        Err(StoreError::not_found("payment history entry", id))
    }
}
