//! Financing Tracker - projection and reconciliation engine for housing financing
//!
//! This library provides:
//! - Normalization of loosely-shaped simulation documents into one summary
//! - Month-by-month installment schedules anchored on delivery or credit term
//! - Reconciliation of payment history against expected totals
//! - Selection-driven async loading with stale-result protection

pub mod config;
pub mod error;
pub mod records;
pub mod projection;
pub mod sourcing;
pub mod tracker;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{ConfigError, RecordError, StoreError, StoreResult};
pub use records::{PaymentHistoryEntry, ProjectRecord, SimulationRecord};
pub use projection::{
    normalize, reconcile, ChartTable, Locale, PaymentSchedule, Reconciliation, ScheduleProjector,
    SimulationSummary,
};
pub use sourcing::{FinanceStore, InMemoryStore, SourcingCoordinator, SourcingState};
pub use tracker::{PaymentTracker, TrackerCase, TrackerReport};
