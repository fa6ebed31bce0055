//! Saved financing simulations as stored by every app version

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::coerce::{finite_field, timestamp_date};

/// Nested `calculation` block of a simulation document
///
/// Every field is optional and kept as a raw JSON value; older writers
/// stored amounts as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_per_month: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_interest: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_payments: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_down_payment: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsidy_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prima_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_months: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_available: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cesantias_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_amount: Option<Value>,
}

/// A user's financing plan for one project
///
/// Top-level amount fields mirror the `calculation` block for documents
/// written before the block existed. Which one wins is decided by the
/// summary normalizer, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub project_id: String,

    /// Credit term in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_term: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(
        default,
        rename = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at_legacy: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation: Option<Calculation>,

    // Legacy top-level mirrors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_down_payment: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_available: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cesantias_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prima_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsidy_amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_interests: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_interest: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_to_pay: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_payments: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<Value>,
}

impl SimulationRecord {
    /// Create a bare simulation for a user/project pair
    pub fn new(user_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    pub fn calc(&self) -> Option<&Calculation> {
        self.calculation.as_ref()
    }

    /// Credit term in months, if the document carries a usable one
    ///
    /// The stored term is in years and may be fractional (2.5 years is 30
    /// months). Terms under one month count as missing.
    pub fn credit_term_months(&self) -> Option<u32> {
        finite_field(self.credit_term.as_ref())
            .map(|years| (years * 12.0).round())
            .filter(|months| *months >= 1.0 && *months <= f64::from(u32::MAX))
            .map(|months| months as u32)
    }

    /// Raw creation timestamp, preferring the current field name
    pub fn created_at_raw(&self) -> Option<&Value> {
        self.created_at.as_ref().or(self.created_at_legacy.as_ref())
    }

    /// Creation date, if any creation field parses
    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created_at_raw().and_then(timestamp_date)
    }

    /// Whether this record belongs to the given user/project pair
    pub fn matches(&self, user_id: &str, project_id: &str) -> bool {
        self.user_id == user_id && self.project_id == project_id
    }
}
