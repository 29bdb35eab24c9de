//! Declaration builders.
//!
//! Each builder maps computed values onto the regulator's field codes and
//! produces the ordered [`FormField`] sequence of one declaration:
//!
//! - VAT returns: the `204`/`205` accounting scheme choices, then one numeric
//!   field per report line, commented with the line description.
//! - Chart of accounts: each ledger row carries a debit and a credit code
//!   (`ecdf_<debit>_<credit>`); the sign of the balance selects one of them.
//! - Balance sheet / profit and loss: each row carries a previous and a
//!   current period code (`ecdf_<previous>_<current>`); both periods are
//!   emitted.
//!
//! Annual declarations start with the fiscal year bounds and the currency as
//! text fields `01`, `02` and `03`.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::vat::VatLine;
use crate::core::{
    DateRange, Declaration, DeclarationKind, EcdfError, FormField, KpiRow, Language, VatRegime,
    format_field, round_amount,
};

/// Label prefix of the ledger line reported under two extra codes.
const LINE_106_PREFIX: &str = "106 -";

/// Extra codes of the `106 -` line when its balance goes to the credit column.
pub const LINE_106_CREDIT_CODES: [&str; 2] = ["0118", "2260"];

/// Extra codes of the `106 -` line when its balance goes to the debit column.
pub const LINE_106_DEBIT_CODES: [&str; 2] = ["0117", "2259"];

/// Text field with the remarks of the chart of accounts.
pub const REMARKS_FIELD: &str = "2385";

/// Fiscal year header shared by the annual declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnualHeader<'a> {
    pub period: DateRange,
    /// ISO 4217 currency code.
    pub currency: &'a str,
    /// Free text, only reported with the chart of accounts.
    pub remarks: Option<&'a str>,
}

/// Values a declaration is built from.
#[derive(Debug, Clone, Copy)]
pub enum DeclarationInput<'a> {
    Vat {
        regime: VatRegime,
        lines: &'a [VatLine],
    },
    ChartOfAccounts {
        header: AnnualHeader<'a>,
        rows: &'a [KpiRow],
    },
    FinancialStatement {
        header: AnnualHeader<'a>,
        current: &'a [KpiRow],
        previous: &'a [KpiRow],
    },
}

/// Build one declaration of the given kind.
///
/// Fails with a validation error when `input` does not belong to `kind`.
pub fn build_declaration(
    kind: DeclarationKind,
    language: Language,
    year: i32,
    period: u32,
    input: DeclarationInput<'_>,
) -> Result<Declaration, EcdfError> {
    let fields = match (kind, input) {
        (k, DeclarationInput::Vat { regime, lines }) if k.is_vat() => vat_fields(regime, lines),
        (DeclarationKind::ChartOfAccounts, DeclarationInput::ChartOfAccounts { header, rows }) => {
            let mut fields = header_fields(&header);
            if let Some(remarks) = header.remarks.filter(|r| !r.trim().is_empty()) {
                fields.push(FormField::Text {
                    id: REMARKS_FIELD.into(),
                    value: remarks.to_string(),
                });
            }
            fields.extend(chart_of_accounts_fields(rows));
            fields
        }
        (
            DeclarationKind::BalanceSheet
            | DeclarationKind::BalanceSheetAbridged
            | DeclarationKind::ProfitLoss
            | DeclarationKind::ProfitLossAbridged,
            DeclarationInput::FinancialStatement {
                header,
                current,
                previous,
            },
        ) => {
            let mut fields = header_fields(&header);
            fields.extend(financial_statement_fields(current, previous));
            fields
        }
        (kind, _) => {
            return Err(EcdfError::validation(
                "kind",
                format!("input does not match declaration type {}", kind.code()),
            ));
        }
    };

    debug!(
        kind = kind.code(),
        year,
        period,
        fields = fields.len(),
        "declaration built"
    );

    let mut declaration = Declaration::new(kind, language, year, period);
    declaration.fields = fields;
    Ok(declaration)
}

/// Fields of a VAT return.
pub fn vat_fields(regime: VatRegime, lines: &[VatLine]) -> Vec<FormField> {
    let on_sales = regime == VatRegime::Sales;
    let mut fields = vec![
        FormField::Choice {
            id: "204".into(),
            selected: on_sales,
        },
        FormField::Choice {
            id: "205".into(),
            selected: !on_sales,
        },
    ];
    fields.extend(
        lines
            .iter()
            .filter_map(|line| format_field(&line.code, line.value, Some(line.description.as_str()))),
    );
    fields
}

/// Fields of a chart of accounts.
///
/// A rounded balance of zero or less is reported as its absolute value under
/// the credit code, a positive one under the debit code. Rows without a value
/// are skipped.
pub fn chart_of_accounts_fields(rows: &[KpiRow]) -> Vec<FormField> {
    let mut fields = Vec::new();
    for row in rows {
        let Some((debit, credit)) = code_pair(&row.name) else {
            warn!(row = %row.name, "row name carries no debit/credit codes, skipped");
            continue;
        };
        let Some(value) = row.value.number() else {
            continue;
        };

        let balance = round_amount(value);
        let (side, code, amount, extra) = if balance <= Decimal::ZERO {
            ("credit", credit, balance.abs(), LINE_106_CREDIT_CODES)
        } else {
            ("debit", debit, balance, LINE_106_DEBIT_CODES)
        };
        let comment = format!(" {side} - {} ", row.description);

        if row.description.starts_with(LINE_106_PREFIX) {
            for code in extra {
                fields.extend(format_field(code, amount.into(), Some(comment.as_str())));
            }
        }
        fields.extend(format_field(code, amount.into(), Some(comment.as_str())));
    }
    fields
}

/// Fields of a balance sheet or profit and loss: current period first, then
/// previous period.
pub fn financial_statement_fields(current: &[KpiRow], previous: &[KpiRow]) -> Vec<FormField> {
    let mut fields = Vec::new();
    for row in current {
        if let Some((_, code)) = code_pair(&row.name) {
            let comment = format!(" current - {} ", row.description);
            fields.extend(format_field(code, row.value, Some(comment.as_str())));
        }
    }
    for row in previous {
        if let Some((code, _)) = code_pair(&row.name) {
            let comment = format!(" previous - {} ", row.description);
            fields.extend(format_field(code, row.value, Some(comment.as_str())));
        }
    }
    fields
}

fn header_fields(header: &AnnualHeader<'_>) -> Vec<FormField> {
    let text = |id: &str, value: String| FormField::Text {
        id: id.into(),
        value,
    };
    vec![
        text("01", header.period.from.format("%d/%m/%Y").to_string()),
        text("02", header.period.to.format("%d/%m/%Y").to_string()),
        text("03", header.currency.to_string()),
    ]
}

/// Split `ecdf_<first>_<second>` into its two codes.
///
/// Anything after the second code is ignored.
pub(crate) fn code_pair(name: &str) -> Option<(&str, &str)> {
    let (first, rest) = name.strip_prefix("ecdf_")?.split_once('_')?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let second = &rest[..end];
    let is_code = |c: &str| !c.is_empty() && c.bytes().all(|b| b.is_ascii_digit());
    (is_code(first) && is_code(second)).then_some((first, second))
}
