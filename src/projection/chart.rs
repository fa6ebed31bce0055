//! Tabular payment chart consumed by presentation layers
//!
//! The table is a header row followed by one `[label, required, actual]`
//! row per period, ordered by the period's calendar date.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

use super::calendar::{parse_period_label, Locale};
use super::periods::{round_amount, PaymentSchedule};
use crate::error::RecordError;
use crate::records::PaymentHistoryEntry;

pub const CHART_HEADER: [&str; 3] = ["Period", "Required payment", "Actual payment"];

/// One chart row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartRow {
    pub label: String,
    pub required: i64,
    pub actual: i64,
    /// Date the row sorts by
    #[serde(skip)]
    pub period: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartTable {
    rows: Vec<ChartRow>,
}

impl ChartTable {
    /// Chart of recorded payments
    ///
    /// Entries without their own expected amount show `fallback_required`,
    /// normally the simulation's monthly installment.
    pub fn from_history(history: &[PaymentHistoryEntry], fallback_required: f64, locale: Locale) -> Self {
        let rows = history
            .iter()
            .map(|entry| {
                let period = resolve_period(entry, locale);
                let label = match (&entry.label, entry.dated_on()) {
                    (Some(label), _) => label.clone(),
                    (None, Some(date)) => locale.period_label(date),
                    (None, None) => String::new(),
                };
                ChartRow {
                    label,
                    required: round_amount(entry.required_amount().unwrap_or(fallback_required)),
                    actual: round_amount(entry.paid_amount()),
                    period,
                }
            })
            .collect();
        Self::sorted(rows)
    }

    /// Chart of a projected schedule, used before any payment is recorded
    pub fn from_schedule(schedule: &PaymentSchedule) -> Self {
        let rows = schedule
            .iter()
            .map(|p| ChartRow {
                label: p.display_label(),
                required: p.required,
                actual: p.actual,
                period: p.date(),
            })
            .collect();
        Self::sorted(rows)
    }

    fn sorted(mut rows: Vec<ChartRow>) -> Self {
        // Stable: rows sharing a month keep their recorded order
        rows.sort_by_key(|row| row.period);
        Self { rows }
    }

    pub fn rows(&self) -> &[ChartRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header plus data rows as JSON cells
    pub fn to_table(&self) -> Vec<Vec<Value>> {
        let header = CHART_HEADER.iter().map(|h| Value::from(*h)).collect();
        std::iter::once(header)
            .chain(self.rows.iter().map(|row| {
                vec![
                    Value::from(row.label.as_str()),
                    Value::from(row.required),
                    Value::from(row.actual),
                ]
            }))
            .collect()
    }

    /// Write the table, header included, as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), RecordError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(CHART_HEADER)?;
        for row in &self.rows {
            csv_writer.write_record([
                row.label.clone(),
                row.required.to_string(),
                row.actual.to_string(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Calendar month an entry belongs to
///
/// `date` wins when it parses; otherwise the label is parsed, which itself
/// defaults to January 1970.
fn resolve_period(entry: &PaymentHistoryEntry, locale: Locale) -> NaiveDate {
    entry.dated_on().unwrap_or_else(|| {
        entry
            .label
            .as_deref()
            .map(|label| parse_period_label(label, locale))
            .unwrap_or_default()
    })
}
