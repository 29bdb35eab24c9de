use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A value produced by the computation engine for one KPI / account line.
///
/// `NotApplicable` means "no accounting movement occurred" and is never the
/// same thing as a zero movement. For formatting purposes it behaves like
/// `Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KpiValue {
    /// A computed amount.
    Number(Decimal),
    /// Explicit "no movement" marker.
    NotApplicable,
    /// No value at all.
    #[default]
    Unset,
}

impl KpiValue {
    /// The amount, if this is a number.
    pub fn number(&self) -> Option<Decimal> {
        match self {
            Self::Number(d) => Some(*d),
            Self::NotApplicable | Self::Unset => None,
        }
    }

    /// True for `NotApplicable` and `Unset`.
    pub fn is_absent(&self) -> bool {
        self.number().is_none()
    }
}

impl From<Decimal> for KpiValue {
    fn from(d: Decimal) -> Self {
        Self::Number(d)
    }
}

impl From<Option<Decimal>> for KpiValue {
    fn from(d: Option<Decimal>) -> Self {
        d.map_or(Self::Unset, Self::Number)
    }
}

/// One row returned by the computation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiRow {
    /// Technical name carrying the field code(s), e.g. `ecdf_101`,
    /// `ecdf_0107_0108` or `ext_103`.
    pub name: String,
    /// Human readable label, emitted as XML comment.
    pub description: String,
    /// Computed value.
    pub value: KpiValue,
}

impl KpiRow {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<KpiValue>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value: value.into(),
        }
    }
}

/// Language of the declaration content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    FR,
    DE,
    #[default]
    EN,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FR => "FR",
            Self::DE => "DE",
            Self::EN => "EN",
        }
    }
}

/// Kind of eCDF declaration (the `type` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    /// Monthly VAT return.
    VatMonthly,
    /// Annual (and quarterly) VAT return.
    VatAnnual,
    /// Chart of accounts.
    ChartOfAccounts,
    /// Balance sheet.
    BalanceSheet,
    /// Abridged balance sheet.
    BalanceSheetAbridged,
    /// Profit and loss.
    ProfitLoss,
    /// Abridged profit and loss.
    ProfitLossAbridged,
}

impl DeclarationKind {
    /// eCDF type code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::VatMonthly => "TVA_DECM",
            Self::VatAnnual => "TVA_DECA",
            Self::ChartOfAccounts => "CA_PLANCOMPTA",
            Self::BalanceSheet => "CA_BILAN",
            Self::BalanceSheetAbridged => "CA_BILANABR",
            Self::ProfitLoss => "CA_COMPP",
            Self::ProfitLossAbridged => "CA_COMPPABR",
        }
    }

    /// eCDF form model identifier.
    pub fn model(&self) -> &'static str {
        match self {
            Self::ProfitLoss => "2",
            _ => "1",
        }
    }

    pub fn is_vat(&self) -> bool {
        matches!(self, Self::VatMonthly | Self::VatAnnual)
    }
}

/// VAT accounting scheme (choice fields 204 / 205).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VatRegime {
    /// On sales [204].
    #[default]
    Sales,
    /// On payments received [205].
    Revenues,
}

/// Periodicity of a VAT return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PeriodType {
    #[default]
    Month,
    Quarter,
    Year,
}

impl PeriodType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

/// Which journal entries the engine should take into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetMoves {
    /// All posted entries.
    #[default]
    Posted,
    /// All entries, drafts included.
    All,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }
}

/// One slot of a declaration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormField {
    /// `<NumericField id="..">12,34</NumericField>`, optionally preceded by a comment.
    Numeric {
        id: String,
        value: String,
        comment: Option<String>,
    },
    /// `<Choice id="..">0|1</Choice>`.
    Choice { id: String, selected: bool },
    /// `<TextField id="..">..</TextField>`.
    Text { id: String, value: String },
}

impl FormField {
    pub fn id(&self) -> &str {
        match self {
            Self::Numeric { id, .. } | Self::Choice { id, .. } | Self::Text { id, .. } => id,
        }
    }
}

/// One regulatory form instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub language: Language,
    /// Fiscal year.
    pub year: i32,
    /// Period number (month, quarter or 1 for annual forms).
    pub period: u32,
    /// Ordered form fields.
    pub fields: Vec<FormField>,
}

impl Declaration {
    pub fn new(kind: DeclarationKind, language: Language, year: i32, period: u32) -> Self {
        Self {
            kind,
            language,
            year,
            period,
            fields: Vec::new(),
        }
    }

    pub fn model(&self) -> &'static str {
        self.kind.model()
    }

    /// Formatted text of the first numeric field with the given code.
    pub fn numeric(&self, id: &str) -> Option<&str> {
        self.fields.iter().find_map(|f| match f {
            FormField::Numeric { id: fid, value, .. } if fid == id => Some(value.as_str()),
            _ => None,
        })
    }

    /// Selection state of a choice field.
    pub fn choice(&self, id: &str) -> Option<bool> {
        self.fields.iter().find_map(|f| match f {
            FormField::Choice { id: fid, selected } if fid == id => Some(*selected),
            _ => None,
        })
    }

    /// Number of numeric fields.
    pub fn numeric_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| matches!(f, FormField::Numeric { .. }))
            .count()
    }
}

/// Company profile the declarer identity is read from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    /// Luxembourg matricule (national identification number).
    pub matricule: Option<String>,
    /// RCS number (Registre de Commerce et des Sociétés).
    pub company_registry: Option<String>,
    /// VAT number, usually with `LU` prefix.
    pub vat: Option<String>,
    /// eCDF prefix assigned to the filer, 6 characters.
    pub ecdf_prefix: Option<String>,
    /// Company currency (ISO 4217).
    pub currency: String,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            currency: "EUR".into(),
            ..Default::default()
        }
    }

    pub fn matricule(mut self, matricule: impl Into<String>) -> Self {
        self.matricule = Some(matricule.into());
        self
    }

    pub fn company_registry(mut self, rcs: impl Into<String>) -> Self {
        self.company_registry = Some(rcs.into());
        self
    }

    pub fn vat(mut self, vat: impl Into<String>) -> Self {
        self.vat = Some(vat.into());
        self
    }

    pub fn ecdf_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ecdf_prefix = Some(prefix.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

/// Agent filing on behalf of the company. Build with [`super::AgentBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub matricule: Option<String>,
    pub rcs: Option<String>,
    pub vat: Option<String>,
}

/// Resolved identity numbers, as emitted in the `Agent` and `Declarer` blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// `MatrNbr`
    pub matricule: String,
    /// `RCSNbr`
    pub rcs: String,
    /// `VATNbr`
    pub vat: String,
}
