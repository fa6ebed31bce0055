//! Tracker runner composing the pure engine into one report
//!
//! Holds the configuration once and assembles summary, schedule,
//! reconciliation and chart for any number of simulations.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::projection::{
    normalize, reconcile, ChartTable, PaymentSchedule, Reconciliation, ReconciliationInput,
    ScheduleProjector, SimulationSummary,
};
use crate::records::{PaymentHistoryEntry, ProjectRecord, SimulationRecord};

/// Caller-supplied values used when no simulation is on record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fallbacks {
    pub monthly_payment: Option<f64>,
    pub remaining_months: Option<u32>,
}

/// Inputs for one tracked simulation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerCase {
    #[serde(default)]
    pub simulation: Option<SimulationRecord>,
    #[serde(default)]
    pub project: Option<ProjectRecord>,
    #[serde(default)]
    pub history: Vec<PaymentHistoryEntry>,
    #[serde(default)]
    pub fallbacks: Fallbacks,
}

/// Everything presentation needs for one simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerReport {
    pub simulation_id: Option<String>,
    pub summary: Option<SimulationSummary>,
    pub schedule: PaymentSchedule,
    pub reconciliation: Reconciliation,
    pub chart: ChartTable,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentTracker {
    projector: ScheduleProjector,
}

impl PaymentTracker {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            projector: ScheduleProjector::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.projector.config()
    }

    pub fn projector(&self) -> &ScheduleProjector {
        &self.projector
    }

    /// Build the report for one simulation
    ///
    /// The chart shows recorded history when there is any, otherwise the
    /// projected schedule.
    pub fn report(
        &self,
        simulation: Option<&SimulationRecord>,
        project: Option<&ProjectRecord>,
        history: &[PaymentHistoryEntry],
        fallbacks: Fallbacks,
    ) -> TrackerReport {
        let summary = normalize(simulation);
        let schedule = simulation
            .map(|sim| self.projector.project(sim, project))
            .unwrap_or_default();

        let reconciliation = reconcile(&ReconciliationInput {
            summary: summary.as_ref(),
            simulation,
            history,
            fallback_monthly_payment: fallbacks.monthly_payment,
            fallback_remaining_months: fallbacks.remaining_months,
        });

        let chart = if history.is_empty() {
            ChartTable::from_schedule(&schedule)
        } else {
            ChartTable::from_history(history, reconciliation.monthly_required, self.config().locale)
        };

        TrackerReport {
            simulation_id: simulation.and_then(|s| s.id.clone()),
            summary,
            schedule,
            reconciliation,
            chart,
        }
    }

    pub fn report_case(&self, case: &TrackerCase) -> TrackerReport {
        self.report(
            case.simulation.as_ref(),
            case.project.as_ref(),
            &case.history,
            case.fallbacks,
        )
    }

    /// Build reports for many cases in parallel, preserving input order
    pub fn report_batch(&self, cases: &[TrackerCase]) -> Vec<TrackerReport> {
        cases.par_iter().map(|case| self.report_case(case)).collect()
    }
}
