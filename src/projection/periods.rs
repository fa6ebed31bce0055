//! Schedule output structures

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::Locale;

/// Round a currency amount to whole units
///
/// Halves round away from zero.
pub fn round_amount(amount: f64) -> i64 {
    if amount.is_finite() {
        amount.round() as i64
    } else {
        0
    }
}

/// One projected month of a payment schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPeriod {
    /// Localized short month name
    pub label: String,
    pub year: i32,
    /// Calendar month (1-12)
    pub month: u32,
    pub required: i64,
    /// Mirrors `required` until a real payment is reconciled against it
    pub actual: i64,
}

impl PaymentPeriod {
    /// A projected period for the month containing `date`
    pub fn projected(date: NaiveDate, amount: i64, locale: Locale) -> Self {
        Self {
            label: locale.short_month(date.month()).to_string(),
            year: date.year(),
            month: date.month(),
            required: amount,
            actual: amount,
        }
    }

    /// First day of the period's month
    pub fn date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// "Month Year" label used by charts
    pub fn display_label(&self) -> String {
        format!("{} {}", self.label, self.year)
    }
}

/// Where the schedule's date range came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSource {
    /// Creation month through the project's delivery month
    Delivery,
    /// Creation month plus the credit term
    CreditTerm,
    /// Stored dates were inconsistent; today plus the credit term
    Today,
}

/// Resolved date range of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAnchor {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub source: AnchorSource,
}

/// Ordered projected periods for one simulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub periods: Vec<PaymentPeriod>,

    /// `None` when the simulation had nothing to project
    pub anchor: Option<ScheduleAnchor>,
}

impl PaymentSchedule {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PaymentPeriod> {
        self.periods.iter()
    }

    pub fn first(&self) -> Option<&PaymentPeriod> {
        self.periods.first()
    }

    pub fn last(&self) -> Option<&PaymentPeriod> {
        self.periods.last()
    }

    /// Sum of required amounts across all periods
    pub fn total_required(&self) -> i64 {
        self.periods.iter().map(|p| p.required).sum()
    }
}

impl<'a> IntoIterator for &'a PaymentSchedule {
    type Item = &'a PaymentPeriod;
    type IntoIter = std::slice::Iter<'a, PaymentPeriod>;

    fn into_iter(self) -> Self::IntoIter {
        self.periods.iter()
    }
}
