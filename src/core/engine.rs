//! Interface to the external KPI computation engine.
//!
//! The engine evaluates report templates against ledger data. Its internals
//! are out of scope: the declaration builders only need the rows it returns.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::error::EcdfError;
use super::types::{DateRange, KpiRow, TargetMoves};

/// What to compute: one report template over one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeRequest<'a> {
    /// Template identifier (e.g. `l10n_lu_mis_reports.mis_report_ca`).
    pub template: &'a str,
    pub period: DateRange,
    pub target_moves: TargetMoves,
}

/// A computation engine returning KPI rows in template order.
///
/// Implementations return [`EcdfError::TemplateNotFound`] when the template
/// cannot be resolved.
pub trait ComputationEngine {
    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Vec<KpiRow>, EcdfError>;
}

impl<E: ComputationEngine + ?Sized> ComputationEngine for &E {
    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Vec<KpiRow>, EcdfError> {
        (**self).compute(request)
    }
}

/// Engine backed by precomputed rows.
///
/// Rows are registered per template, optionally overridden for periods
/// starting at a given date (used for the previous fiscal year of annual
/// accounts).
#[derive(Debug, Clone, Default)]
pub struct InMemoryEngine {
    templates: HashMap<String, Vec<KpiRow>>,
    periods: HashMap<(String, NaiveDate), Vec<KpiRow>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rows of a template, used for any period.
    pub fn with_template(mut self, template: impl Into<String>, rows: Vec<KpiRow>) -> Self {
        self.templates.insert(template.into(), rows);
        self
    }

    /// Register rows for the period of `template` starting at `from`.
    pub fn with_period(
        mut self,
        template: impl Into<String>,
        from: NaiveDate,
        rows: Vec<KpiRow>,
    ) -> Self {
        let template = template.into();
        self.templates.entry(template.clone()).or_default();
        self.periods.insert((template, from), rows);
        self
    }
}

impl ComputationEngine for InMemoryEngine {
    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Vec<KpiRow>, EcdfError> {
        let key = (request.template.to_string(), request.period.from);
        if let Some(rows) = self.periods.get(&key) {
            return Ok(rows.clone());
        }
        self.templates
            .get(request.template)
            .cloned()
            .ok_or_else(|| EcdfError::template_not_found(request.template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(template: &str, from: NaiveDate) -> ComputeRequest<'_> {
        ComputeRequest {
            template,
            period: DateRange::new(from, date(2024, 12, 31)),
            target_moves: TargetMoves::Posted,
        }
    }

    #[test]
    fn unknown_template() {
        let engine = InMemoryEngine::new();
        let err = engine.compute(&request("missing", date(2024, 1, 1))).unwrap_err();
        assert!(matches!(err, EcdfError::TemplateNotFound(ref t) if t == &["missing"]));
    }

    #[test]
    fn period_override_wins() {
        let engine = InMemoryEngine::new()
            .with_template("t", vec![KpiRow::new("ecdf_101", "a", dec!(1))])
            .with_period("t", date(2023, 1, 1), vec![KpiRow::new("ecdf_101", "a", dec!(2))]);
        let current = engine.compute(&request("t", date(2024, 1, 1))).unwrap();
        let previous = engine.compute(&request("t", date(2023, 1, 1))).unwrap();
        assert_eq!(current[0].value.number(), Some(dec!(1)));
        assert_eq!(previous[0].value.number(), Some(dec!(2)));
    }
}
