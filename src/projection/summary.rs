//! Canonical summary of a simulation's terms
//!
//! Each summary field is resolved through an ordered list of accessors. The
//! first accessor whose field is present and parses to a finite number wins;
//! a present but unparseable field is skipped, not treated as zero. The order
//! reflects which app versions wrote which field and must not be shuffled.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::coerce::finite_field;
use crate::records::SimulationRecord;

/// Reads one candidate field from a simulation document
pub type Accessor = for<'a> fn(&'a SimulationRecord) -> Option<&'a Value>;

pub const PROJECT_VALUE: &[Accessor] = &[
    |s| s.project_value.as_ref(),
    |s| s.calc().and_then(|c| c.project_value.as_ref()),
];

pub const FINANCED_AMOUNT: &[Accessor] = &[
    |s| s.credit_amount.as_ref(),
    |s| s.calc().and_then(|c| c.credit_amount.as_ref()),
    |s| s.calc().and_then(|c| c.loan_amount.as_ref()),
];

pub const DOWN_PAYMENT_REQUIRED: &[Accessor] = &[
    |s| s.required_down_payment.as_ref(),
    |s| s.calc().and_then(|c| c.required_down_payment.as_ref()),
    |s| s.down_payment.as_ref(),
];

/// Declared total of available resources; only a non-zero value counts
pub const TOTAL_AVAILABLE: &[Accessor] = &[
    |s| s.total_available.as_ref(),
    |s| s.calc().and_then(|c| c.total_available.as_ref()),
];

pub const CESANTIAS: &[Accessor] = &[
    |s| s.cesantias_amount.as_ref(),
    |s| s.calc().and_then(|c| c.cesantias_amount.as_ref()),
];

pub const SAVINGS: &[Accessor] = &[
    |s| s.savings_amount.as_ref(),
    |s| s.calc().and_then(|c| c.savings_amount.as_ref()),
];

pub const SUBSIDY: &[Accessor] = &[
    |s| s.subsidy_amount.as_ref(),
    |s| s.calc().and_then(|c| c.subsidy_amount.as_ref()),
];

pub const PRIMA: &[Accessor] = &[
    |s| s.prima_amount.as_ref(),
    |s| s.calc().and_then(|c| c.prima_amount.as_ref()),
];

pub const TOTAL_INTERESTS: &[Accessor] = &[
    |s| s.total_interests.as_ref(),
    |s| s.calc().and_then(|c| c.total_interest.as_ref()),
    |s| s.total_interest.as_ref(),
];

pub const TOTAL_TO_PAY: &[Accessor] = &[
    |s| s.total_to_pay.as_ref(),
    |s| s.calc().and_then(|c| c.total_payments.as_ref()),
    |s| s.total_payments.as_ref(),
];

pub const MONTHLY_PAYMENT: &[Accessor] = &[
    |s| s.calc().and_then(|c| c.monthly_payment.as_ref()),
    |s| s.monthly_payment.as_ref(),
    |s| s.calc().and_then(|c| c.payment_per_month.as_ref()),
];

/// First finite number produced by the chain
pub fn resolve(simulation: &SimulationRecord, chain: &[Accessor]) -> Option<f64> {
    chain.iter().find_map(|get| finite_field(get(simulation)))
}

/// Normalized numeric view of a simulation, recomputed on every read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSummary {
    pub project_value: f64,
    pub financed_amount: f64,
    pub down_payment_required: f64,
    pub available_resources: f64,
    pub subsidy: f64,
    pub prima: f64,
    pub total_interests: f64,
    pub total_to_pay: f64,
    pub monthly_payment: f64,
    pub created_at: Option<Value>,
}

impl SimulationSummary {
    pub fn from_record(simulation: &SimulationRecord) -> Self {
        let field = |chain: &[Accessor]| resolve(simulation, chain).unwrap_or(0.0);

        Self {
            project_value: field(PROJECT_VALUE),
            financed_amount: field(FINANCED_AMOUNT),
            down_payment_required: field(DOWN_PAYMENT_REQUIRED),
            available_resources: available_resources(simulation),
            subsidy: field(SUBSIDY),
            prima: field(PRIMA),
            total_interests: field(TOTAL_INTERESTS),
            total_to_pay: field(TOTAL_TO_PAY),
            monthly_payment: field(MONTHLY_PAYMENT),
            created_at: simulation.created_at_raw().cloned(),
        }
    }
}

/// Summarize a simulation; `None` means no simulation is on record
pub fn normalize(simulation: Option<&SimulationRecord>) -> Option<SimulationSummary> {
    simulation.map(SimulationSummary::from_record)
}

/// Declared total if non-zero, otherwise the sum of its components
fn available_resources(simulation: &SimulationRecord) -> f64 {
    let declared = TOTAL_AVAILABLE
        .iter()
        .filter_map(|get| finite_field(get(simulation)))
        .find(|total| *total != 0.0);
    if let Some(total) = declared {
        return total;
    }

    let sum: f64 = [CESANTIAS, PRIMA, SAVINGS]
        .iter()
        .map(|chain| resolve(simulation, chain).unwrap_or(0.0))
        .sum();
    debug!(
        "simulation {:?}: no declared total available, summed components to {}",
        simulation.id, sum
    );
    sum
}
