//! Annual financial declarations: chart of accounts, balance sheet and
//! profit and loss, full or abridged.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::declaration::{AnnualHeader, DeclarationInput, build_declaration};
use crate::core::{
    ComputationEngine, ComputeRequest, DateRange, Declaration, DeclarationKind, EcdfError, KpiRow,
    Language, TargetMoves,
};

/// Report templates of the annual declarations.
pub const ANNUAL_TEMPLATES: &[(DeclarationKind, &str)] = &[
    (DeclarationKind::ChartOfAccounts, "l10n_lu_mis_reports.mis_report_ca"),
    (DeclarationKind::BalanceSheet, "l10n_lu_mis_reports.mis_report_bs_2016"),
    (DeclarationKind::BalanceSheetAbridged, "l10n_lu_mis_reports.mis_report_abr_bs"),
    (DeclarationKind::ProfitLoss, "l10n_lu_mis_reports.mis_report_pl_2016"),
    (DeclarationKind::ProfitLossAbridged, "l10n_lu_mis_reports.mis_report_abr_pl"),
];

/// Template computing the given annual declaration.
pub fn annual_template(kind: DeclarationKind) -> Option<&'static str> {
    ANNUAL_TEMPLATES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, template)| *template)
}

/// Full or abridged balance sheet and profit and loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportsType {
    #[default]
    Full,
    Abbreviated,
}

/// Configuration of an annual financial report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnualReportConfig {
    pub language: Language,
    /// First day of the fiscal year.
    pub date_from: NaiveDate,
    /// Last day of the fiscal year.
    pub date_to: NaiveDate,
    /// Include the profit and loss.
    pub with_pl: bool,
    /// Include the balance sheet.
    pub with_bs: bool,
    /// Include the chart of accounts.
    pub with_ac: bool,
    pub reports_type: ReportsType,
    /// Reported with the chart of accounts.
    pub remarks: Option<String>,
    pub target_moves: TargetMoves,
}

impl Default for AnnualReportConfig {
    fn default() -> Self {
        let year = Local::now().year();
        Self {
            language: Language::default(),
            date_from: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN),
            date_to: NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX),
            with_pl: true,
            with_bs: true,
            with_ac: true,
            reports_type: ReportsType::Full,
            remarks: None,
            target_moves: TargetMoves::Posted,
        }
    }
}

impl AnnualReportConfig {
    /// Declarations to produce, in filing order.
    pub fn selected_kinds(&self) -> Vec<DeclarationKind> {
        let full = self.reports_type == ReportsType::Full;
        let mut kinds = Vec::new();
        if self.with_ac {
            kinds.push(DeclarationKind::ChartOfAccounts);
        }
        if self.with_bs {
            kinds.push(if full {
                DeclarationKind::BalanceSheet
            } else {
                DeclarationKind::BalanceSheetAbridged
            });
        }
        if self.with_pl {
            kinds.push(if full {
                DeclarationKind::ProfitLoss
            } else {
                DeclarationKind::ProfitLossAbridged
            });
        }
        kinds
    }
}

/// An annual financial report over one fiscal year.
#[derive(Debug, Clone)]
pub struct AnnualReport {
    config: AnnualReportConfig,
}

impl AnnualReport {
    /// Fails when the fiscal year does not end after it starts.
    pub fn new(config: AnnualReportConfig) -> Result<Self, EcdfError> {
        if config.date_from >= config.date_to {
            return Err(EcdfError::validation(
                "date_to",
                "The fiscal year dates aren't valid. Please check the From and To.",
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnnualReportConfig {
        &self.config
    }

    pub fn period(&self) -> DateRange {
        DateRange::new(self.config.date_from, self.config.date_to)
    }

    /// The same dates one year earlier. February 29 becomes February 28.
    pub fn previous_period(&self) -> Result<DateRange, EcdfError> {
        Ok(DateRange::new(
            year_before(self.config.date_from)?,
            year_before(self.config.date_to)?,
        ))
    }

    /// Compute and build the selected declarations.
    ///
    /// Balance sheet and profit and loss also carry the previous fiscal
    /// year. Every unresolved template is reported in one
    /// [`EcdfError::TemplateNotFound`].
    pub fn declarations(
        &self,
        engine: &impl ComputationEngine,
        currency: &str,
    ) -> Result<Vec<Declaration>, EcdfError> {
        let kinds = self.config.selected_kinds();
        if kinds.is_empty() {
            return Err(EcdfError::NoDeclarationLines(
                "no report type selected".into(),
            ));
        }

        let header = AnnualHeader {
            period: self.period(),
            currency,
            remarks: self.config.remarks.as_deref(),
        };
        let year = self.config.date_from.year();
        let mut missing = Vec::new();
        let mut declarations = Vec::new();

        for kind in kinds {
            let Some(template) = annual_template(kind) else {
                missing.push(kind.code().to_string());
                continue;
            };
            let Some(current) = self.compute(engine, template, self.period(), &mut missing)? else {
                continue;
            };
            let declaration = if kind == DeclarationKind::ChartOfAccounts {
                build_declaration(
                    kind,
                    self.config.language,
                    year,
                    1,
                    DeclarationInput::ChartOfAccounts {
                        header,
                        rows: &current,
                    },
                )?
            } else {
                let previous_period = self.previous_period()?;
                let Some(previous) = self.compute(engine, template, previous_period, &mut missing)?
                else {
                    continue;
                };
                build_declaration(
                    kind,
                    self.config.language,
                    year,
                    1,
                    DeclarationInput::FinancialStatement {
                        header,
                        current: &current,
                        previous: &previous,
                    },
                )?
            };
            declarations.push(declaration);
        }

        if !missing.is_empty() {
            return Err(EcdfError::TemplateNotFound(missing));
        }
        debug!(count = declarations.len(), year, "annual declarations built");
        Ok(declarations)
    }

    /// Rows of `template`, or `None` after recording it as missing.
    fn compute(
        &self,
        engine: &impl ComputationEngine,
        template: &str,
        period: DateRange,
        missing: &mut Vec<String>,
    ) -> Result<Option<Vec<KpiRow>>, EcdfError> {
        let request = ComputeRequest {
            template,
            period,
            target_moves: self.config.target_moves,
        };
        match engine.compute(&request) {
            Ok(rows) => Ok(Some(rows)),
            Err(EcdfError::TemplateNotFound(templates)) => {
                for t in templates {
                    if !missing.contains(&t) {
                        missing.push(t);
                    }
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn year_before(date: NaiveDate) -> Result<NaiveDate, EcdfError> {
    let year = date.year() - 1;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .ok_or_else(|| EcdfError::validation("date_from", format!("no year before {date}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FormField, InMemoryEngine};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config() -> AnnualReportConfig {
        AnnualReportConfig {
            language: Language::EN,
            date_from: date(2024, 1, 1),
            date_to: date(2024, 12, 31),
            ..Default::default()
        }
    }

    fn engine() -> InMemoryEngine {
        InMemoryEngine::new()
            .with_template(
                "l10n_lu_mis_reports.mis_report_ca",
                vec![KpiRow::new("ecdf_0119_0120", "106 - Owner", dec!(-10))],
            )
            .with_template(
                "l10n_lu_mis_reports.mis_report_bs_2016",
                vec![KpiRow::new("ecdf_201_202", "Assets", dec!(100))],
            )
            .with_period(
                "l10n_lu_mis_reports.mis_report_bs_2016",
                date(2023, 1, 1),
                vec![KpiRow::new("ecdf_201_202", "Assets", dec!(80))],
            )
            .with_template(
                "l10n_lu_mis_reports.mis_report_pl_2016",
                vec![KpiRow::new("ecdf_601_602", "Turnover", dec!(50))],
            )
    }

    #[test]
    fn dates_must_be_ordered() {
        let mut c = config();
        c.date_to = c.date_from;
        assert!(matches!(AnnualReport::new(c), Err(EcdfError::Validation(_))));
    }

    #[test]
    fn selection_order_and_abridged_kinds() {
        let mut c = config();
        assert_eq!(
            c.selected_kinds(),
            [
                DeclarationKind::ChartOfAccounts,
                DeclarationKind::BalanceSheet,
                DeclarationKind::ProfitLoss
            ]
        );
        c.reports_type = ReportsType::Abbreviated;
        c.with_ac = false;
        assert_eq!(
            c.selected_kinds(),
            [
                DeclarationKind::BalanceSheetAbridged,
                DeclarationKind::ProfitLossAbridged
            ]
        );
    }

    #[test]
    fn previous_period_is_one_year_earlier() {
        let mut c = config();
        c.date_from = date(2023, 3, 1);
        c.date_to = date(2024, 2, 29);
        let report = AnnualReport::new(c).unwrap();
        assert_eq!(
            report.previous_period().unwrap(),
            DateRange::new(date(2022, 3, 1), date(2023, 2, 28))
        );
    }

    #[test]
    fn builds_all_three() {
        let report = AnnualReport::new(config()).unwrap();
        let decls = report.declarations(&engine(), "EUR").unwrap();
        let kinds: Vec<_> = decls.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                DeclarationKind::ChartOfAccounts,
                DeclarationKind::BalanceSheet,
                DeclarationKind::ProfitLoss
            ]
        );
        assert!(decls.iter().all(|d| d.year == 2024 && d.period == 1));
        assert_eq!(decls[2].model(), "2");

        let bs = &decls[1];
        assert_eq!(bs.numeric("202"), Some("100,00"));
        assert_eq!(bs.numeric("201"), Some("80,00"));
        assert_eq!(
            bs.fields[2],
            FormField::Text {
                id: "03".into(),
                value: "EUR".into()
            }
        );

        let ca = &decls[0];
        assert_eq!(ca.numeric("0118"), Some("10,00"));
        assert_eq!(ca.numeric("2260"), Some("10,00"));
        assert_eq!(ca.numeric("0120"), Some("10,00"));
    }

    #[test]
    fn nothing_selected() {
        let mut c = config();
        c.with_ac = false;
        c.with_bs = false;
        c.with_pl = false;
        let report = AnnualReport::new(c).unwrap();
        assert!(matches!(
            report.declarations(&engine(), "EUR"),
            Err(EcdfError::NoDeclarationLines(_))
        ));
    }

    #[test]
    fn missing_templates_are_collected() {
        let mut c = config();
        c.reports_type = ReportsType::Abbreviated;
        let report = AnnualReport::new(c).unwrap();
        let err = report.declarations(&engine(), "EUR").unwrap_err();
        match err {
            EcdfError::TemplateNotFound(templates) => assert_eq!(
                templates,
                [
                    "l10n_lu_mis_reports.mis_report_abr_bs",
                    "l10n_lu_mis_reports.mis_report_abr_pl"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }
}
