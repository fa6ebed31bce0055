//! Recorded payment events and partial updates to them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::coerce::{finite_field, timestamp_date};

/// One recorded payment for an association
///
/// Amount fields carry whatever the writer stored. The expected amount is
/// `required` or `expected`; the paid amount is the first of `actual`,
/// `amount`, `value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PaymentHistoryEntry {
    /// Entry for a payment made on a given date
    pub fn paid_on(date: NaiveDate, actual: f64) -> Self {
        Self {
            date: Some(Value::String(date.format("%Y-%m-%d").to_string())),
            actual: Some(Value::from(actual)),
            ..Default::default()
        }
    }

    /// Entry identified only by a "Month Year" label
    pub fn labelled(label: impl Into<String>, actual: f64) -> Self {
        Self {
            label: Some(label.into()),
            actual: Some(Value::from(actual)),
            ..Default::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Amount actually paid; zero when nothing usable is recorded
    ///
    /// The first present field decides: a non-numeric `actual` is not
    /// rescued by a numeric `amount`.
    pub fn paid_amount(&self) -> f64 {
        let first = self
            .actual
            .as_ref()
            .or(self.amount.as_ref())
            .or(self.value.as_ref());
        finite_field(first).unwrap_or(0.0)
    }

    /// Expected amount recorded on the entry itself
    pub fn required_amount(&self) -> Option<f64> {
        finite_field(self.required.as_ref().or(self.expected.as_ref()))
    }

    /// Date of the entry, if `date` parses
    pub fn dated_on(&self) -> Option<NaiveDate> {
        self.date.as_ref().and_then(timestamp_date)
    }
}

/// Partial update applied to an existing history entry
///
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PaymentHistoryPatch {
    /// Apply the patch to an entry in place
    pub fn apply_to(&self, entry: &mut PaymentHistoryEntry) {
        if let Some(date) = &self.date {
            entry.date = Some(date.clone());
        }
        if let Some(label) = &self.label {
            entry.label = Some(label.clone());
        }
        if let Some(required) = &self.required {
            entry.required = Some(required.clone());
        }
        if let Some(actual) = &self.actual {
            // A new actual supersedes the legacy amount fields
            entry.actual = Some(actual.clone());
            entry.amount = None;
            entry.value = None;
        }
        if let Some(notes) = &self.notes {
            entry.notes = Some(notes.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.label.is_none()
            && self.required.is_none()
            && self.actual.is_none()
            && self.notes.is_none()
    }
}
