//! Editable VAT return.
//!
//! A [`VatReport`] holds the lines of one monthly, quarterly or annual VAT
//! return. Automatic lines come from the computation engine (`ecdf_<code>`
//! rows) and are refreshed on demand; manual lines (`ext_<code>` rows or
//! lines added by the user) keep their values across refreshes.

use std::collections::BTreeMap;

use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::declaration::{DeclarationInput, build_declaration};
use crate::core::{
    ComputationEngine, ComputeRequest, DateRange, Declaration, DeclarationKind, EcdfError,
    KpiValue, Language, PeriodType, TargetMoves, VatRegime,
};

/// Configuration of a VAT return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VatReportConfig {
    /// Report name.
    pub name: String,
    pub language: Language,
    pub period_type: PeriodType,
    /// Fiscal year.
    pub year: i32,
    /// Month (1–12), quarter (1–4) or 1 for an annual return.
    pub period: u32,
    pub regime: VatRegime,
    pub target_moves: TargetMoves,
}

impl Default for VatReportConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            language: Language::default(),
            period_type: PeriodType::Month,
            year: Local::now().year(),
            period: 1,
            regime: VatRegime::Sales,
            target_moves: TargetMoves::Posted,
        }
    }
}

impl VatReportConfig {
    /// Identifier of the report template computing this return.
    pub fn template_id(&self) -> String {
        format!(
            "l10n_lu_ecdf.mis_report_{}_vat_{}",
            self.period_type.code(),
            self.year
        )
    }

    /// `TVA_DECM` for monthly returns, `TVA_DECA` otherwise.
    pub fn declaration_kind(&self) -> DeclarationKind {
        match self.period_type {
            PeriodType::Month => DeclarationKind::VatMonthly,
            PeriodType::Quarter | PeriodType::Year => DeclarationKind::VatAnnual,
        }
    }

    /// Dates covered by the return.
    pub fn date_range(&self) -> Result<DateRange, EcdfError> {
        let (first_month, last_month) = match (self.period_type, self.period) {
            (PeriodType::Month, m @ 1..=12) => (m, m),
            (PeriodType::Quarter, q @ 1..=4) => (q * 3 - 2, q * 3),
            (PeriodType::Year, 1) => (1, 12),
            (period_type, period) => {
                return Err(EcdfError::validation(
                    "period",
                    format!("period {period} is not valid for a {} return", period_type.code()),
                ));
            }
        };
        let invalid_year = || {
            EcdfError::validation("year", format!("year {} is out of range", self.year))
        };
        let from = NaiveDate::from_ymd_opt(self.year, first_month, 1).ok_or_else(invalid_year)?;
        let to = last_day_of_month(self.year, last_month).ok_or_else(invalid_year)?;
        Ok(DateRange::new(from, to))
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// One line of a VAT return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatLine {
    /// Three-digit form code.
    pub code: String,
    pub description: String,
    pub value: KpiValue,
    /// Computed by the engine; cannot be removed by the user.
    pub automatic: bool,
}

impl VatLine {
    pub fn automatic(
        code: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<KpiValue>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            value: value.into(),
            automatic: true,
        }
    }

    pub fn manual(
        code: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<KpiValue>,
    ) -> Self {
        Self {
            automatic: false,
            ..Self::automatic(code, description, value)
        }
    }
}

/// An editable VAT return.
#[derive(Debug, Clone)]
pub struct VatReport {
    config: VatReportConfig,
    lines: Vec<VatLine>,
    manual_inputs: BTreeMap<String, Decimal>,
}

impl VatReport {
    /// Create an empty report. The period is checked against the period type.
    pub fn new(config: VatReportConfig) -> Result<Self, EcdfError> {
        config.date_range()?;
        Ok(Self {
            config,
            lines: Vec::new(),
            manual_inputs: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &VatReportConfig {
        &self.config
    }

    pub fn lines(&self) -> &[VatLine] {
        &self.lines
    }

    /// Set the value used for the `ext_<code>` line on the next generation.
    pub fn set_manual_input(&mut self, code: impl Into<String>, value: Decimal) {
        self.manual_inputs.insert(code.into(), value);
    }

    /// Replace all lines with freshly computed ones.
    ///
    /// `ecdf_<code>` rows become automatic lines, `ext_<code>` rows become
    /// manual lines valued from the manual inputs (zero when not set).
    /// Previously added manual lines are lost.
    pub fn generate_lines(&mut self, engine: &impl ComputationEngine) -> Result<(), EcdfError> {
        let rows = self.compute(engine)?;
        let mut lines = Vec::new();
        for row in rows {
            if let Some(code) = line_code(&row.name, "ecdf_") {
                lines.push(VatLine::automatic(code, row.description, row.value));
            } else if let Some(code) = line_code(&row.name, "ext_") {
                let value = self.manual_inputs.get(code).copied().unwrap_or(Decimal::ZERO);
                lines.push(VatLine::manual(code, row.description, value));
            }
        }
        check_unique(&lines)?;
        info!(
            report = %self.config.name,
            lines = lines.len(),
            "VAT report lines generated"
        );
        self.lines = lines;
        Ok(())
    }

    /// Recompute automatic lines, keeping manual ones.
    ///
    /// Does nothing on a report without lines.
    pub fn refresh_lines(&mut self, engine: &impl ComputationEngine) -> Result<(), EcdfError> {
        if self.lines.is_empty() {
            return Ok(());
        }
        let rows = self.compute(engine)?;
        let mut lines: Vec<VatLine> = self.lines.iter().filter(|l| !l.automatic).cloned().collect();
        let kept = lines.len();
        for row in rows {
            if let Some(code) = line_code(&row.name, "ecdf_") {
                lines.push(VatLine::automatic(code, row.description, row.value));
            }
        }
        check_unique(&lines)?;
        debug!(
            report = %self.config.name,
            manual = kept,
            automatic = lines.len() - kept,
            "VAT report lines refreshed"
        );
        self.lines = lines;
        Ok(())
    }

    /// Add a user line. Codes must be unique within the report.
    pub fn add_manual_line(
        &mut self,
        code: impl Into<String>,
        description: impl Into<String>,
        value: Decimal,
    ) -> Result<(), EcdfError> {
        let line = VatLine::manual(code, description, value);
        if !is_code(&line.code) {
            return Err(EcdfError::validation(
                "code",
                format!("'{}' is not a 3-digit eCDF code", line.code),
            ));
        }
        if self.lines.iter().any(|l| l.code == line.code) {
            return Err(duplicates_error(&[line.code.as_str()]));
        }
        self.lines.push(line);
        Ok(())
    }

    /// Change the value of a manual line.
    pub fn set_line_value(&mut self, code: &str, value: Decimal) -> Result<(), EcdfError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.code == code)
            .ok_or_else(|| EcdfError::validation("code", format!("no line with code {code}")))?;
        if line.automatic {
            return Err(EcdfError::validation(
                "code",
                format!("line {code} is computed and cannot be edited"),
            ));
        }
        line.value = value.into();
        Ok(())
    }

    /// Remove a manual line. Automatic lines cannot be removed.
    pub fn remove_line(&mut self, code: &str) -> Result<VatLine, EcdfError> {
        let index = self
            .lines
            .iter()
            .position(|l| l.code == code)
            .ok_or_else(|| EcdfError::validation("code", format!("no line with code {code}")))?;
        if self.lines[index].automatic {
            return Err(EcdfError::validation(
                "code",
                "You cannot delete automatic lines.",
            ));
        }
        Ok(self.lines.remove(index))
    }

    /// Erase all lines.
    pub fn clear_lines(&mut self) {
        self.lines.clear();
    }

    /// Build the VAT declaration from the current lines.
    pub fn declaration(&self) -> Result<Declaration, EcdfError> {
        if self.lines.is_empty() {
            return Err(EcdfError::NoDeclarationLines(format!(
                "the VAT report '{}' has no line; generate the lines first",
                self.config.name
            )));
        }
        build_declaration(
            self.config.declaration_kind(),
            self.config.language,
            self.config.year,
            self.config.period,
            DeclarationInput::Vat {
                regime: self.config.regime,
                lines: &self.lines,
            },
        )
    }

    fn compute(
        &self,
        engine: &impl ComputationEngine,
    ) -> Result<Vec<crate::core::KpiRow>, EcdfError> {
        let template = self.config.template_id();
        engine.compute(&ComputeRequest {
            template: &template,
            period: self.config.date_range()?,
            target_moves: self.config.target_moves,
        })
    }
}

/// Three-digit code following `prefix` at the start of `name`.
fn line_code<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    let code = rest.get(..3)?;
    is_code(code).then_some(code)
}

fn is_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit())
}

fn check_unique(lines: &[VatLine]) -> Result<(), EcdfError> {
    let mut seen = std::collections::HashSet::new();
    let duplicates: Vec<&str> = lines
        .iter()
        .filter(|l| !seen.insert(l.code.as_str()))
        .map(|l| l.code.as_str())
        .collect();
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(duplicates_error(&duplicates))
    }
}

fn duplicates_error(codes: &[&str]) -> EcdfError {
    EcdfError::validation(
        "code",
        format!(
            "Some lines are not unique! Duplicated codes: {}",
            codes.join(", ")
        ),
    )
}
