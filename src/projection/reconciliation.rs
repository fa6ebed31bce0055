//! Reconcile recorded payments against a simulation's expected totals

use log::debug;
use serde::{Deserialize, Serialize};

use super::periods::round_amount;
use super::summary::SimulationSummary;
use crate::records::coerce::finite_field;
use crate::records::{PaymentHistoryEntry, SimulationRecord};

/// Everything the calculator looks at
///
/// The fallbacks cover callers that have no simulation on record and
/// supply an installment and horizon of their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationInput<'a> {
    pub summary: Option<&'a SimulationSummary>,
    pub simulation: Option<&'a SimulationRecord>,
    pub history: &'a [PaymentHistoryEntry],
    pub fallback_monthly_payment: Option<f64>,
    pub fallback_remaining_months: Option<u32>,
}

impl<'a> ReconciliationInput<'a> {
    pub fn new(history: &'a [PaymentHistoryEntry]) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    pub fn with_simulation(mut self, simulation: &'a SimulationRecord, summary: &'a SimulationSummary) -> Self {
        self.simulation = Some(simulation);
        self.summary = Some(summary);
        self
    }

    pub fn with_fallbacks(mut self, monthly_payment: Option<f64>, remaining_months: Option<u32>) -> Self {
        self.fallback_monthly_payment = monthly_payment;
        self.fallback_remaining_months = remaining_months;
        self
    }
}

/// Aggregate paid/expected/outstanding figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    /// Whole-unit monthly installment
    pub monthly_required: f64,
    pub total_paid: f64,
    pub total_expected: f64,
    /// Never negative; overpayment clamps to zero
    pub remaining_balance: f64,
}

impl Reconciliation {
    /// Share of the expected total already paid, in [0, 1]
    pub fn progress(&self) -> f64 {
        if self.total_expected <= 0.0 {
            return 0.0;
        }
        (self.total_paid / self.total_expected).clamp(0.0, 1.0)
    }
}

/// Compute the reconciliation figures
pub fn reconcile(input: &ReconciliationInput<'_>) -> Reconciliation {
    let monthly_required = monthly_required(input);
    let total_paid: f64 = input.history.iter().map(PaymentHistoryEntry::paid_amount).sum();

    // Presence of a summary decides, even when its total is zero
    let total_expected = match input.summary {
        Some(summary) => summary.total_to_pay,
        None => {
            let months = input
                .simulation
                .and_then(months_from_simulation)
                .or(input.fallback_remaining_months.map(f64::from))
                .unwrap_or(input.history.len() as f64);
            monthly_required * months
        }
    };

    let remaining_balance = (total_expected - total_paid).max(0.0);
    debug!(
        "reconciled {} entries: paid {} of {} expected, {} outstanding",
        input.history.len(),
        total_paid,
        total_expected,
        remaining_balance
    );

    Reconciliation {
        monthly_required,
        total_paid,
        total_expected,
        remaining_balance,
    }
}

/// Summary installment when non-zero, otherwise the caller's fallback
fn monthly_required(input: &ReconciliationInput<'_>) -> f64 {
    let from_summary = input
        .summary
        .map(|s| s.monthly_payment)
        .filter(|payment| *payment != 0.0 && payment.is_finite());
    let payment = from_summary
        .or(input.fallback_monthly_payment.filter(|p| p.is_finite()))
        .unwrap_or(0.0);
    round_amount(payment) as f64
}

/// Horizon in months stated by the simulation itself
fn months_from_simulation(simulation: &SimulationRecord) -> Option<f64> {
    simulation
        .calc()
        .and_then(|c| finite_field(c.total_months.as_ref()))
        .or_else(|| simulation.credit_term_months().map(f64::from))
}
