//! Selection-driven loading of a simulation and everything derived from it
//!
//! Every selection change bumps a generation counter and hands out a
//! [`FetchTicket`]. Fetch results are committed through [`SourcingAction`]s
//! and only land in state when their ticket's generation is still current,
//! so a slow fetch for an abandoned selection can never overwrite a newer one.

use log::{debug, info, warn};
use std::sync::Arc;

use super::cache::SimulationCache;
use super::store::FinanceStore;
use crate::error::{StoreError, StoreResult};
use crate::records::{
    Association, PaymentHistoryEntry, PaymentHistoryPatch, ProjectRecord, SimulationRecord,
};
use crate::tracker::{Fallbacks, PaymentTracker, TrackerReport};

/// The signed-in user, passed explicitly to whatever needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }

    pub fn select(&self, project_id: impl Into<String>) -> Selection {
        Selection::new(self.user_id.clone(), project_id)
    }
}

/// The user/project pair currently being viewed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub user_id: String,
    pub project_id: String,
    /// Direct simulation reference, tried when the pair lookup finds nothing
    pub simulation_id: Option<String>,
}

impl Selection {
    pub fn new(user_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            simulation_id: None,
        }
    }

    pub fn with_simulation_id(mut self, id: impl Into<String>) -> Self {
        self.simulation_id = Some(id.into());
        self
    }
}

/// Loaded documents and the report derived from them
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationView {
    pub selection: Selection,
    pub simulation: SimulationRecord,
    pub project: Option<ProjectRecord>,
    pub association: Option<Association>,
    pub history: Vec<PaymentHistoryEntry>,
    pub report: TrackerReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    NotFound,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourcingState {
    Idle,
    Loading { selection: Selection },
    Ready(Box<SimulationView>),
    NotFound { selection: Selection, message: String },
    Error { selection: Selection, message: String },
}

impl SourcingState {
    pub fn phase(&self) -> Phase {
        match self {
            SourcingState::Idle => Phase::Idle,
            SourcingState::Loading { .. } => Phase::Loading,
            SourcingState::Ready(_) => Phase::Ready,
            SourcingState::NotFound { .. } => Phase::NotFound,
            SourcingState::Error { .. } => Phase::Error,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            SourcingState::Idle => None,
            SourcingState::Loading { selection }
            | SourcingState::NotFound { selection, .. }
            | SourcingState::Error { selection, .. } => Some(selection),
            SourcingState::Ready(view) => Some(&view.selection),
        }
    }

    pub fn view(&self) -> Option<&SimulationView> {
        match self {
            SourcingState::Ready(view) => Some(view),
            _ => None,
        }
    }

    /// User-facing message for `NotFound` and `Error`
    pub fn message(&self) -> Option<&str> {
        match self {
            SourcingState::NotFound { message, .. } | SourcingState::Error { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }
}

/// Documents gathered for one selection
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocuments {
    pub simulation: SimulationRecord,
    pub project: Option<ProjectRecord>,
    pub association: Option<Association>,
    pub history: Vec<PaymentHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(Box<FetchedDocuments>),
    NotFound(String),
    Failed(String),
}

/// Issued on selection change; identifies which load a result belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub selection: Selection,
    /// Simulation found synchronously in the cache, if any
    pub cached: Option<SimulationRecord>,
}

/// Every way the coordinator's state can change
#[derive(Debug, Clone, PartialEq)]
pub enum SourcingAction {
    Select(Selection),
    Resolved { generation: u64, outcome: FetchOutcome },
    HistoryChanged { generation: u64, history: Vec<PaymentHistoryEntry> },
    Reset,
}

/// Result of dispatching an action
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A load started; run the fetch for this ticket
    Fetch(FetchTicket),
    Applied,
    /// The action belonged to a superseded generation and was dropped
    Stale,
}

pub struct SourcingCoordinator<S: FinanceStore> {
    store: Arc<S>,
    tracker: PaymentTracker,
    cache: SimulationCache,
    state: SourcingState,
    generation: u64,
}

impl<S: FinanceStore> SourcingCoordinator<S> {
    pub fn new(store: S, tracker: PaymentTracker) -> Self {
        Self::with_shared_store(Arc::new(store), tracker)
    }

    pub fn with_shared_store(store: Arc<S>, tracker: PaymentTracker) -> Self {
        Self {
            store,
            tracker,
            cache: SimulationCache::new(),
            state: SourcingState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &SourcingState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cache(&self) -> &SimulationCache {
        &self.cache
    }

    /// Seed the cache with simulations fetched elsewhere (e.g. a list screen)
    pub fn seed_cache<I: IntoIterator<Item = SimulationRecord>>(&mut self, simulations: I) {
        self.cache.extend_from_list(simulations);
    }

    /// Shared handle for running fetches outside the coordinator
    pub fn store_handle(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// The single mutation entry point
    pub fn dispatch(&mut self, action: SourcingAction) -> Dispatch {
        match action {
            SourcingAction::Select(selection) => {
                self.generation += 1;
                let cached = self
                    .cache
                    .get(&selection.user_id, &selection.project_id)
                    .or_else(|| {
                        selection
                            .simulation_id
                            .as_deref()
                            .and_then(|id| self.cache.get_by_id(id))
                    })
                    .cloned();
                info!(
                    "loading user {} project {} (generation {}, cached: {})",
                    selection.user_id,
                    selection.project_id,
                    self.generation,
                    cached.is_some()
                );
                self.state = SourcingState::Loading {
                    selection: selection.clone(),
                };
                Dispatch::Fetch(FetchTicket {
                    generation: self.generation,
                    selection,
                    cached,
                })
            }
            SourcingAction::Resolved { generation, outcome } => {
                if generation != self.generation {
                    warn!(
                        "discarding result of generation {} (current {})",
                        generation, self.generation
                    );
                    return Dispatch::Stale;
                }
                let Some(selection) = self.loading_selection() else {
                    return Dispatch::Stale;
                };
                self.state = self.settle(selection, outcome);
                info!("generation {} settled as {:?}", generation, self.state.phase());
                Dispatch::Applied
            }
            SourcingAction::HistoryChanged { generation, history } => {
                if generation != self.generation {
                    return Dispatch::Stale;
                }
                let SourcingState::Ready(view) = &mut self.state else {
                    return Dispatch::Stale;
                };
                view.report = self.tracker.report(
                    Some(&view.simulation),
                    view.project.as_ref(),
                    &history,
                    Fallbacks::default(),
                );
                view.history = history;
                Dispatch::Applied
            }
            SourcingAction::Reset => {
                self.generation += 1;
                self.state = SourcingState::Idle;
                Dispatch::Applied
            }
        }
    }

    /// Start loading a selection
    pub fn select(&mut self, selection: Selection) -> FetchTicket {
        match self.dispatch(SourcingAction::Select(selection.clone())) {
            Dispatch::Fetch(ticket) => ticket,
            // Select always starts a fetch
            _ => FetchTicket {
                generation: self.generation,
                selection,
                cached: None,
            },
        }
    }

    /// Commit a fetch result; false when the ticket was superseded
    pub fn resolve(&mut self, ticket: &FetchTicket, outcome: FetchOutcome) -> bool {
        let action = SourcingAction::Resolved {
            generation: ticket.generation,
            outcome,
        };
        self.dispatch(action) == Dispatch::Applied
    }

    /// Select, fetch and commit in one step
    pub async fn load(&mut self, selection: Selection) -> &SourcingState {
        let ticket = self.select(selection);
        let store = self.store_handle();
        let outcome = fetch_documents(store.as_ref(), &ticket).await;
        self.resolve(&ticket, outcome);
        &self.state
    }

    /// Record a new payment for the ready selection
    ///
    /// Once the store accepts a write its result is returned even if the
    /// view cannot be refreshed afterwards.
    pub async fn record_payment(&mut self, entry: PaymentHistoryEntry) -> StoreResult<String> {
        let association_id = self.ready_association_id()?;
        let id = self
            .store
            .create_payment_history_entry(&association_id, entry)
            .await?;
        self.refresh_history(&association_id).await;
        Ok(id)
    }

    /// Edit a recorded payment for the ready selection
    pub async fn amend_payment(&mut self, id: &str, patch: PaymentHistoryPatch) -> StoreResult<()> {
        let association_id = self.ready_association_id()?;
        self.store.update_payment_history_entry(id, patch).await?;
        self.refresh_history(&association_id).await;
        Ok(())
    }

    /// Delete a recorded payment for the ready selection
    pub async fn remove_payment(&mut self, id: &str) -> StoreResult<()> {
        let association_id = self.ready_association_id()?;
        self.store.delete_payment_history_entry(id).await?;
        self.refresh_history(&association_id).await;
        Ok(())
    }

    /// Reload history into the ready view; on failure the view is left as is
    async fn refresh_history(&mut self, association_id: &str) {
        let generation = self.generation;
        match self.store.list_payment_history(association_id).await {
            Ok(history) => {
                self.dispatch(SourcingAction::HistoryChanged { generation, history });
            }
            Err(err) => warn!(
                "payment saved but history for association {} could not be reloaded: {}",
                association_id, err
            ),
        }
    }

    fn ready_association_id(&self) -> StoreResult<String> {
        self.state
            .view()
            .and_then(|view| view.association.as_ref())
            .map(|association| association.id.clone())
            .ok_or_else(|| {
                StoreError::Rejected("no payment tracking is set up for the current selection".into())
            })
    }

    fn loading_selection(&self) -> Option<Selection> {
        match &self.state {
            SourcingState::Loading { selection } => Some(selection.clone()),
            _ => None,
        }
    }

    fn settle(&mut self, selection: Selection, outcome: FetchOutcome) -> SourcingState {
        match outcome {
            FetchOutcome::Found(docs) => {
                let FetchedDocuments {
                    simulation,
                    project,
                    association,
                    history,
                } = *docs;
                self.cache.upsert(simulation.clone());
                let report = self.tracker.report(
                    Some(&simulation),
                    project.as_ref(),
                    &history,
                    Fallbacks::default(),
                );
                SourcingState::Ready(Box::new(SimulationView {
                    selection,
                    simulation,
                    project,
                    association,
                    history,
                    report,
                }))
            }
            FetchOutcome::NotFound(message) => SourcingState::NotFound { selection, message },
            FetchOutcome::Failed(message) => SourcingState::Error { selection, message },
        }
    }
}

/// Gather the documents a ticket needs
///
/// Never fails: store errors become `NotFound` or `Failed` outcomes. A
/// missing project only drops the delivery date from the schedule.
pub async fn fetch_documents<S: FinanceStore + ?Sized>(store: &S, ticket: &FetchTicket) -> FetchOutcome {
    let selection = &ticket.selection;

    let simulation = match &ticket.cached {
        Some(simulation) => simulation.clone(),
        None => match fetch_simulation(store, selection).await {
            Ok(Some(simulation)) => simulation,
            Ok(None) => {
                return FetchOutcome::NotFound(
                    "No simulation is on record for this project yet.".to_string(),
                )
            }
            Err(err) if err.is_not_found() => {
                return FetchOutcome::NotFound(format!("Simulation unavailable: {}", err))
            }
            Err(err) => return FetchOutcome::Failed(format!("Could not load the simulation: {}", err)),
        },
    };

    let project = match store.fetch_project_by_id(&selection.project_id).await {
        Ok(project) => Some(project),
        Err(err) => {
            warn!("project {} unavailable, projecting without delivery date: {}", selection.project_id, err);
            None
        }
    };

    let association = match store
        .find_association(&selection.user_id, &selection.project_id)
        .await
    {
        Ok(association) => association,
        Err(err) => return FetchOutcome::Failed(format!("Could not load payment tracking: {}", err)),
    };

    let history = match &association {
        Some(association) => match store.list_payment_history(&association.id).await {
            Ok(history) => history,
            Err(err) => return FetchOutcome::Failed(format!("Could not load payment history: {}", err)),
        },
        None => Vec::new(),
    };

    debug!(
        "fetched generation {}: project {}, {} history entries",
        ticket.generation,
        project.is_some(),
        history.len()
    );

    FetchOutcome::Found(Box::new(FetchedDocuments {
        simulation,
        project,
        association,
        history,
    }))
}

/// Pair lookup first, then the direct reference if the selection has one
async fn fetch_simulation<S: FinanceStore + ?Sized>(
    store: &S,
    selection: &Selection,
) -> StoreResult<Option<SimulationRecord>> {
    if let Some(simulation) = store
        .fetch_simulation_by_project(&selection.user_id, &selection.project_id)
        .await?
    {
        return Ok(Some(simulation));
    }
    match &selection.simulation_id {
        Some(id) => store.fetch_simulation_by_id(id).await.map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::records::Calculation;
    use crate::sourcing::memory::{InMemoryStore, StoreSnapshot};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn tracker() -> PaymentTracker {
        PaymentTracker::new(
            EngineConfig::default().with_reference_date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()),
        )
    }

    fn simulation(id: &str, project_id: &str, monthly: f64) -> SimulationRecord {
        let mut sim = SimulationRecord::new("u1", project_id);
        sim.id = Some(id.to_string());
        sim.created_at = Some(json!("2025-01-15"));
        sim.credit_term = Some(json!(20));
        sim.calculation = Some(Calculation {
            monthly_payment: Some(json!(monthly)),
            total_payments: Some(json!(monthly * 240.0)),
            ..Default::default()
        });
        sim
    }

    fn seeded_store() -> InMemoryStore {
        InMemoryStore::new(
            StoreSnapshot::default()
                .with_simulation(simulation("s1", "p1", 1000.0))
                .with_project(
                    ProjectRecord::new("p1", "Torres")
                        .with_delivery_date(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()),
                )
                .with_association(Association::new("a1", "u1", "p1"))
                .with_history("a1", vec![PaymentHistoryEntry::labelled("feb 2025", 1000.0)]),
        )
    }

    #[tokio::test]
    async fn test_load_ready() {
        let mut coordinator = SourcingCoordinator::new(seeded_store(), tracker());
        assert_eq!(coordinator.state().phase(), Phase::Idle);

        let state = coordinator.load(Selection::new("u1", "p1")).await;
        assert_eq!(state.phase(), Phase::Ready);

        let view = state.view().unwrap();
        assert_eq!(view.simulation.id.as_deref(), Some("s1"));
        assert_eq!(view.history.len(), 1);
        // January 2025 through June 2026
        assert_eq!(view.report.schedule.len(), 18);
        assert_eq!(view.report.reconciliation.total_paid, 1000.0);
        assert_eq!(view.report.reconciliation.remaining_balance, 239_000.0);
        assert_eq!(coordinator.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_select_moves_to_loading() {
        let mut coordinator = SourcingCoordinator::new(seeded_store(), tracker());
        let ticket = coordinator.select(Selection::new("u1", "p1"));
        assert_eq!(ticket.generation, 1);
        assert!(ticket.cached.is_none());
        assert_eq!(coordinator.state().phase(), Phase::Loading);
        assert_eq!(coordinator.state().selection().unwrap().project_id, "p1");
    }

    #[tokio::test]
    async fn test_cache_hit_skips_simulation_fetch() {
        let store = InMemoryStore::new(StoreSnapshot::default());
        let mut coordinator = SourcingCoordinator::new(store, tracker());
        coordinator.seed_cache(vec![simulation("s7", "p7", 500.0)]);

        let ticket = coordinator.select(Selection::new("u1", "p7"));
        assert_eq!(ticket.cached.as_ref().and_then(|s| s.id.as_deref()), Some("s7"));

        let outcome = fetch_documents(coordinator.store_handle().as_ref(), &ticket).await;
        assert!(coordinator.resolve(&ticket, outcome));

        let view = coordinator.state().view().unwrap();
        assert!(view.project.is_none());
        assert!(view.association.is_none());
        assert_eq!(view.report.reconciliation.monthly_required, 500.0);
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut coordinator = SourcingCoordinator::new(seeded_store(), tracker());
        let state = coordinator.load(Selection::new("u1", "p404")).await;
        assert_eq!(state.phase(), Phase::NotFound);
        assert_eq!(state.message(), Some("No simulation is on record for this project yet."));
    }

    #[tokio::test]
    async fn test_falls_back_to_simulation_id() {
        let mut moved = simulation("s-legacy", "p-old", 800.0);
        moved.user_id = "someone-else".into();
        let store = InMemoryStore::new(StoreSnapshot::default().with_simulation(moved));
        let mut coordinator = SourcingCoordinator::new(store, tracker());

        let selection = Selection::new("u1", "p2").with_simulation_id("s-legacy");
        let state = coordinator.load(selection).await;
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.view().unwrap().simulation.id.as_deref(), Some("s-legacy"));

        let state = coordinator
            .load(Selection::new("u1", "p3").with_simulation_id("missing"))
            .await;
        assert_eq!(state.phase(), Phase::NotFound);
        assert!(state.message().unwrap().contains("missing"));
    }

    /// Store whose simulation lookups wait until the test releases them
    struct GatedStore {
        pending: Mutex<HashMap<String, oneshot::Receiver<StoreResult<Option<SimulationRecord>>>>>,
    }

    impl GatedStore {
        fn new(gates: Vec<(&str, oneshot::Receiver<StoreResult<Option<SimulationRecord>>>)>) -> Self {
            Self {
                pending: Mutex::new(gates.into_iter().map(|(k, rx)| (k.to_string(), rx)).collect()),
            }
        }
    }

    #[async_trait]
    impl FinanceStore for GatedStore {
        async fn fetch_simulation_by_project(
            &self,
            _user_id: &str,
            project_id: &str,
        ) -> StoreResult<Option<SimulationRecord>> {
            let gate = self.pending.lock().unwrap().remove(project_id);
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(StoreError::Unavailable("gate dropped".into()))),
                None => Ok(None),
            }
        }

        async fn fetch_simulation_by_id(&self, id: &str) -> StoreResult<SimulationRecord> {
            Err(StoreError::not_found("simulation", id))
        }

        async fn fetch_project_by_id(&self, id: &str) -> StoreResult<ProjectRecord> {
            Err(StoreError::not_found("project", id))
        }

        async fn find_association(&self, _: &str, _: &str) -> StoreResult<Option<Association>> {
            Ok(None)
        }

        async fn list_payment_history(&self, _: &str) -> StoreResult<Vec<PaymentHistoryEntry>> {
            Ok(Vec::new())
        }

        async fn create_payment_history_entry(&self, _: &str, _: PaymentHistoryEntry) -> StoreResult<String> {
            Err(StoreError::PermissionDenied("read-only".into()))
        }

        async fn update_payment_history_entry(&self, _: &str, _: PaymentHistoryPatch) -> StoreResult<()> {
            Err(StoreError::PermissionDenied("read-only".into()))
        }

        async fn delete_payment_history_entry(&self, _: &str) -> StoreResult<()> {
            Err(StoreError::PermissionDenied("read-only".into()))
        }
    }

    #[tokio::test]
    async fn test_stale_result_never_overwrites_newer_selection() {
        let (release_a, gate_a) = oneshot::channel();
        let (release_b, gate_b) = oneshot::channel();
        let store = GatedStore::new(vec![("pA", gate_a), ("pB", gate_b)]);
        let mut coordinator = SourcingCoordinator::new(store, tracker());

        let ticket_a = coordinator.select(Selection::new("u1", "pA"));
        let store = coordinator.store_handle();
        let fetch_a = tokio::spawn({
            let (store, ticket) = (Arc::clone(&store), ticket_a.clone());
            async move { fetch_documents(store.as_ref(), &ticket).await }
        });

        let ticket_b = coordinator.select(Selection::new("u1", "pB"));
        let fetch_b = tokio::spawn({
            let (store, ticket) = (Arc::clone(&store), ticket_b.clone());
            async move { fetch_documents(store.as_ref(), &ticket).await }
        });
        tokio::task::yield_now().await;

        // B resolves first and is committed
        release_b.send(Ok(Some(simulation("sB", "pB", 2000.0)))).unwrap();
        let outcome_b = fetch_b.await.unwrap();
        assert!(coordinator.resolve(&ticket_b, outcome_b));

        // A arrives late and must be dropped
        release_a.send(Ok(Some(simulation("sA", "pA", 1000.0)))).unwrap();
        let outcome_a = fetch_a.await.unwrap();
        assert!(!coordinator.resolve(&ticket_a, outcome_a));

        let view = coordinator.state().view().unwrap();
        assert_eq!(view.selection.project_id, "pB");
        assert_eq!(view.simulation.id.as_deref(), Some("sB"));
        assert!(coordinator.cache().get("u1", "pA").is_none());
    }

    #[tokio::test]
    async fn test_stale_result_while_still_loading() {
        let (release_a, gate_a) = oneshot::channel();
        let (_release_b, gate_b) = oneshot::channel();
        let store = GatedStore::new(vec![("pA", gate_a), ("pB", gate_b)]);
        let mut coordinator = SourcingCoordinator::new(store, tracker());

        let ticket_a = coordinator.select(Selection::new("u1", "pA"));
        let _ticket_b = coordinator.select(Selection::new("u1", "pB"));

        release_a.send(Ok(Some(simulation("sA", "pA", 1000.0)))).unwrap();
        let outcome_a = fetch_documents(coordinator.store_handle().as_ref(), &ticket_a).await;
        assert!(!coordinator.resolve(&ticket_a, outcome_a));

        assert_eq!(coordinator.state().phase(), Phase::Loading);
        assert_eq!(coordinator.state().selection().unwrap().project_id, "pB");
    }

    #[tokio::test]
    async fn test_store_failure_becomes_error_state() {
        let (release, gate) = oneshot::channel();
        let store = GatedStore::new(vec![("p1", gate)]);
        let mut coordinator = SourcingCoordinator::new(store, tracker());

        release.send(Err(StoreError::Unavailable("offline".into()))).unwrap();
        let state = coordinator.load(Selection::new("u1", "p1")).await;
        assert_eq!(state.phase(), Phase::Error);
        assert_eq!(
            state.message(),
            Some("Could not load the simulation: store unavailable: offline")
        );
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_fetch() {
        let mut coordinator = SourcingCoordinator::new(seeded_store(), tracker());
        let ticket = coordinator.select(Selection::new("u1", "p1"));
        coordinator.dispatch(SourcingAction::Reset);

        let outcome = fetch_documents(coordinator.store_handle().as_ref(), &ticket).await;
        assert!(!coordinator.resolve(&ticket, outcome));
        assert_eq!(coordinator.state(), &SourcingState::Idle);
    }

    #[tokio::test]
    async fn test_payment_crud_refreshes_report() {
        let mut coordinator = SourcingCoordinator::new(seeded_store(), tracker());
        coordinator.load(Selection::new("u1", "p1")).await;

        let id = coordinator
            .record_payment(PaymentHistoryEntry::labelled("ene 2025", 1500.0))
            .await
            .unwrap();
        let view = coordinator.state().view().unwrap();
        assert_eq!(view.history.len(), 2);
        assert_eq!(view.report.reconciliation.total_paid, 2500.0);
        assert_eq!(view.report.chart.rows()[0].label, "ene 2025");

        let patch = PaymentHistoryPatch {
            actual: Some(json!(1000)),
            ..Default::default()
        };
        coordinator.amend_payment(&id, patch).await.unwrap();
        assert_eq!(coordinator.state().view().unwrap().report.reconciliation.total_paid, 2000.0);

        coordinator.remove_payment(&id).await.unwrap();
        let view = coordinator.state().view().unwrap();
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.report.reconciliation.total_paid, 1000.0);
    }

    #[tokio::test]
    async fn test_payment_crud_requires_ready_association() {
        let mut coordinator = SourcingCoordinator::new(seeded_store(), tracker());
        let err = coordinator
            .record_payment(PaymentHistoryEntry::labelled("ene 2025", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));

        coordinator.load(Selection::new("u1", "p404")).await;
        assert!(coordinator.remove_payment("h1").await.is_err());
    }

    /// In-memory store whose history listing can be switched off
    struct FlakyHistoryStore {
        inner: InMemoryStore,
        listing_fails: AtomicBool,
    }

    #[async_trait]
    impl FinanceStore for FlakyHistoryStore {
        async fn fetch_simulation_by_project(
            &self,
            user_id: &str,
            project_id: &str,
        ) -> StoreResult<Option<SimulationRecord>> {
            self.inner.fetch_simulation_by_project(user_id, project_id).await
        }

        async fn fetch_simulation_by_id(&self, id: &str) -> StoreResult<SimulationRecord> {
            self.inner.fetch_simulation_by_id(id).await
        }

        async fn fetch_project_by_id(&self, id: &str) -> StoreResult<ProjectRecord> {
            self.inner.fetch_project_by_id(id).await
        }

        async fn find_association(&self, user_id: &str, project_id: &str) -> StoreResult<Option<Association>> {
            self.inner.find_association(user_id, project_id).await
        }

        async fn list_payment_history(&self, association_id: &str) -> StoreResult<Vec<PaymentHistoryEntry>> {
            if self.listing_fails.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("timeout".into()));
            }
            self.inner.list_payment_history(association_id).await
        }

        async fn create_payment_history_entry(
            &self,
            association_id: &str,
            entry: PaymentHistoryEntry,
        ) -> StoreResult<String> {
            self.inner.create_payment_history_entry(association_id, entry).await
        }

        async fn update_payment_history_entry(&self, id: &str, patch: PaymentHistoryPatch) -> StoreResult<()> {
            self.inner.update_payment_history_entry(id, patch).await
        }

        async fn delete_payment_history_entry(&self, id: &str) -> StoreResult<()> {
            self.inner.delete_payment_history_entry(id).await
        }
    }

    #[tokio::test]
    async fn test_write_succeeds_when_refresh_fails() {
        let store = Arc::new(FlakyHistoryStore {
            inner: seeded_store(),
            listing_fails: AtomicBool::new(false),
        });
        let mut coordinator = SourcingCoordinator::with_shared_store(Arc::clone(&store), tracker());
        coordinator.load(Selection::new("u1", "p1")).await;
        store.listing_fails.store(true, Ordering::SeqCst);

        let id = coordinator
            .record_payment(PaymentHistoryEntry::labelled("mar 2025", 1000.0))
            .await
            .unwrap();
        assert_eq!(store.inner.list_payment_history("a1").await.unwrap().len(), 2);
        let view = coordinator.state().view().unwrap();
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.report.reconciliation.total_paid, 1000.0);

        let patch = PaymentHistoryPatch {
            actual: Some(json!(400)),
            ..Default::default()
        };
        coordinator.amend_payment(&id, patch).await.unwrap();
        coordinator.remove_payment(&id).await.unwrap();
        assert_eq!(store.inner.list_payment_history("a1").await.unwrap().len(), 1);

        // A later successful write brings the view back in line
        store.listing_fails.store(false, Ordering::SeqCst);
        coordinator
            .record_payment(PaymentHistoryEntry::labelled("abr 2025", 500.0))
            .await
            .unwrap();
        assert_eq!(coordinator.state().view().unwrap().report.reconciliation.total_paid, 1500.0);
    }

    #[test]
    fn test_session_selection() {
        let session = Session::new("u1");
        let selection = session.select("p1");
        assert_eq!(selection, Selection::new("u1", "p1"));
    }
}
