//! Pure projection and reconciliation engine
//!
//! Nothing in this module performs I/O or keeps state between calls:
//! - `summary`: canonical numbers from a loosely-shaped simulation
//! - `schedule`: month-by-month expected installments
//! - `reconciliation`: paid/expected/outstanding totals against history
//! - `chart`: the period table shown to users

mod calendar;
mod periods;
pub mod summary;
mod schedule;
mod reconciliation;
mod chart;

pub use calendar::{Locale, month_start, months_between, add_months, parse_period_label};
pub use periods::{PaymentPeriod, PaymentSchedule, ScheduleAnchor, AnchorSource, round_amount};
pub use summary::{SimulationSummary, normalize};
pub use schedule::ScheduleProjector;
pub use reconciliation::{Reconciliation, ReconciliationInput, reconcile};
pub use chart::{ChartTable, ChartRow, CHART_HEADER};
