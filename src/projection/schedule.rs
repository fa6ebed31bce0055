//! Monthly expected-payment schedule for a simulation

use chrono::NaiveDate;
use log::{debug, warn};

use super::calendar::{add_months, month_start, months_between};
use super::periods::{round_amount, AnchorSource, PaymentPeriod, PaymentSchedule, ScheduleAnchor};
use crate::config::EngineConfig;
use crate::records::coerce::finite_field;
use crate::records::{ProjectRecord, SimulationRecord};

/// Projects the fixed monthly installment over the simulation's date range
///
/// The range runs from the simulation's creation month to the project's
/// delivery month, or to creation plus the credit term when there is no
/// delivery date. Both ends are inclusive and the number of months is capped
/// at the credit term.
#[derive(Debug, Clone, Default)]
pub struct ScheduleProjector {
    config: EngineConfig,
}

impl ScheduleProjector {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the schedule; empty when the simulation has no calculation
    pub fn project(&self, simulation: &SimulationRecord, project: Option<&ProjectRecord>) -> PaymentSchedule {
        let Some(calculation) = simulation.calc() else {
            debug!("simulation {:?} has no calculation, nothing to project", simulation.id);
            return PaymentSchedule::empty();
        };

        let monthly_payment = finite_field(calculation.monthly_payment.as_ref()).unwrap_or(0.0);
        let amount = round_amount(monthly_payment);
        let term_months = simulation
            .credit_term_months()
            .unwrap_or_else(|| self.config.default_credit_term_years.saturating_mul(12));

        let anchor = self.resolve_anchor(simulation, project, term_months);
        let span = months_between(anchor.start, anchor.end).clamp(0, term_months as i64) as u32;

        debug!(
            "projecting {} periods of {} from {} ({:?})",
            span + 1,
            amount,
            anchor.start,
            anchor.source
        );

        let periods = (0..=span)
            .filter_map(|offset| add_months(anchor.start, offset))
            .map(|date| PaymentPeriod::projected(date, amount, self.config.locale))
            .collect();

        PaymentSchedule {
            periods,
            anchor: Some(anchor),
        }
    }

    /// Resolve start and end months, pivoting to today when they are inconsistent
    fn resolve_anchor(
        &self,
        simulation: &SimulationRecord,
        project: Option<&ProjectRecord>,
        term_months: u32,
    ) -> ScheduleAnchor {
        let today = month_start(self.config.today());
        let plus_term = |from: NaiveDate| add_months(from, term_months).unwrap_or(from);

        let start = simulation.created_on().map(month_start).unwrap_or(today);
        let (end, source) = match project.and_then(ProjectRecord::delivery_on) {
            Some(delivery) => (month_start(delivery), AnchorSource::Delivery),
            None => (plus_term(start), AnchorSource::CreditTerm),
        };

        if end > start {
            return ScheduleAnchor { start, end, source };
        }

        warn!(
            "simulation {:?}: schedule end {} not after start {}, projecting from {} instead",
            simulation.id, end, start, today
        );
        ScheduleAnchor {
            start: today,
            end: plus_term(today),
            source: AnchorSource::Today,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Locale;
    use crate::records::Calculation;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn projector() -> ScheduleProjector {
        ScheduleProjector::new(EngineConfig::default().with_reference_date(ymd(2026, 10, 19)))
    }

    fn simulation(created_at: Option<&str>, credit_term: Option<u32>, monthly: f64) -> SimulationRecord {
        let mut sim = SimulationRecord::new("u1", "p1");
        sim.created_at = created_at.map(|s| json!(s));
        sim.credit_term = credit_term.map(|t| json!(t));
        sim.calculation = Some(Calculation {
            monthly_payment: Some(json!(monthly)),
            ..Default::default()
        });
        sim
    }

    fn delivered(date: NaiveDate) -> ProjectRecord {
        ProjectRecord::new("p1", "Torres").with_delivery_date(date)
    }

    #[test]
    fn test_no_calculation_is_empty() {
        let mut sim = simulation(Some("2024-01-15"), Some(20), 1000.0);
        sim.calculation = None;
        let schedule = projector().project(&sim, Some(&delivered(ymd(2027, 1, 1))));
        assert!(schedule.is_empty());
        assert!(schedule.anchor.is_none());
    }

    #[test]
    fn test_credit_term_range_without_delivery() {
        let sim = simulation(Some("2024-01-15"), Some(20), 1_500_000.0);
        let schedule = projector().project(&sim, None);

        assert_eq!(schedule.len(), 241);
        let first = schedule.first().unwrap();
        assert_eq!((first.label.as_str(), first.year), ("ene", 2024));
        let last = schedule.last().unwrap();
        assert_eq!((last.label.as_str(), last.year), ("ene", 2044));
        assert_eq!(schedule.anchor.unwrap().source, AnchorSource::CreditTerm);
    }

    #[test]
    fn test_default_term_is_twenty_years() {
        let sim = simulation(Some("2024-01-15"), None, 1000.0);
        assert_eq!(projector().project(&sim, None).len(), 241);

        let mut zero_term = simulation(Some("2024-01-15"), None, 1000.0);
        zero_term.credit_term = Some(json!(0));
        assert_eq!(projector().project(&zero_term, None).len(), 241);
    }

    #[test]
    fn test_fractional_term_in_months() {
        let mut sim = simulation(Some("2024-01-15"), None, 1000.0);
        sim.credit_term = Some(json!(2.5));
        let schedule = projector().project(&sim, None);

        assert_eq!(schedule.len(), 31);
        assert_eq!(schedule.last().unwrap().date(), ymd(2026, 7, 1));
    }

    #[test]
    fn test_delivery_range() {
        let sim = simulation(Some("2024-01-15"), Some(20), 1000.0);
        let schedule = projector().project(&sim, Some(&delivered(ymd(2026, 8, 20))));

        // January 2024 through August 2026 inclusive
        assert_eq!(schedule.len(), 32);
        let last = schedule.last().unwrap();
        assert_eq!((last.label.as_str(), last.year, last.month), ("ago", 2026, 8));
        let anchor = schedule.anchor.unwrap();
        assert_eq!(anchor.start, ymd(2024, 1, 1));
        assert_eq!(anchor.end, ymd(2026, 8, 1));
        assert_eq!(anchor.source, AnchorSource::Delivery);
    }

    #[test]
    fn test_delivery_beyond_term_is_capped() {
        let sim = simulation(Some("2024-01-15"), Some(1), 1000.0);
        let schedule = projector().project(&sim, Some(&delivered(ymd(2030, 5, 1))));
        assert_eq!(schedule.len(), 13);
        assert_eq!(schedule.last().unwrap().date(), ymd(2025, 1, 1));
    }

    #[test]
    fn test_delivery_before_creation_pivots_to_today() {
        let sim = simulation(Some("2024-01-15"), Some(20), 1000.0);
        let schedule = projector().project(&sim, Some(&delivered(ymd(2023, 6, 1))));

        let anchor = schedule.anchor.unwrap();
        assert_eq!(anchor.source, AnchorSource::Today);
        assert_eq!(anchor.start, ymd(2026, 10, 1));
        assert_eq!(anchor.end, ymd(2046, 10, 1));
        assert_eq!(schedule.len(), 241);
        assert_eq!(schedule.first().unwrap().date(), ymd(2026, 10, 1));
    }

    #[test]
    fn test_delivery_in_creation_month_pivots_to_today() {
        let sim = simulation(Some("2024-01-15"), Some(5), 1000.0);
        let schedule = projector().project(&sim, Some(&delivered(ymd(2024, 1, 31))));
        assert_eq!(schedule.anchor.unwrap().source, AnchorSource::Today);
        assert_eq!(schedule.len(), 61);
    }

    #[test]
    fn test_missing_creation_date_starts_today() {
        let sim = simulation(None, Some(2), 1000.0);
        let schedule = projector().project(&sim, None);
        assert_eq!(schedule.first().unwrap().date(), ymd(2026, 10, 1));
        assert_eq!(schedule.len(), 25);
    }

    #[test]
    fn test_unparseable_delivery_falls_back_to_term() {
        let sim = simulation(Some("2024-01-15"), Some(3), 1000.0);
        let mut project = ProjectRecord::new("p1", "Torres");
        project.delivery_date = Some(json!("por definir"));
        let schedule = projector().project(&sim, Some(&project));
        assert_eq!(schedule.anchor.unwrap().source, AnchorSource::CreditTerm);
        assert_eq!(schedule.len(), 37);
    }

    #[test]
    fn test_amounts_are_rounded_consistently() {
        let sim = simulation(Some("2024-01-15"), Some(20), 1_234_567.6);
        let schedule = projector().project(&sim, None);
        assert!(schedule.iter().all(|p| p.required == 1_234_568 && p.actual == 1_234_568));
    }

    #[test]
    fn test_missing_monthly_payment_projects_zero() {
        let mut sim = simulation(Some("2024-01-15"), Some(1), 0.0);
        sim.calculation = Some(Calculation::default());
        let schedule = projector().project(&sim, None);
        assert_eq!(schedule.len(), 13);
        assert_eq!(schedule.total_required(), 0);
    }

    #[test]
    fn test_periods_are_consecutive_months() {
        let sim = simulation(Some("2024-11-03"), Some(1), 10.0);
        let schedule = projector().project(&sim, None);
        let dates: Vec<_> = schedule.iter().map(|p| p.date()).collect();
        assert!(dates.windows(2).all(|w| months_between(w[0], w[1]) == 1));
        assert_eq!(schedule.periods[2].label, "ene");
        assert_eq!(schedule.periods[2].year, 2025);
    }

    #[test]
    fn test_projection_is_repeatable() {
        let sim = simulation(Some("2024-01-15"), Some(20), 999.5);
        let project = delivered(ymd(2028, 3, 1));
        let p = projector();
        assert_eq!(p.project(&sim, Some(&project)), p.project(&sim, Some(&project)));
    }

    #[test]
    fn test_english_labels() {
        let p = ScheduleProjector::new(
            EngineConfig::default()
                .with_reference_date(ymd(2026, 10, 19))
                .with_locale(Locale::EnUs),
        );
        let sim = simulation(Some("2024-09-01"), Some(1), 10.0);
        let schedule = p.project(&sim, None);
        assert_eq!(schedule.first().unwrap().label, "Sep");
    }
}
