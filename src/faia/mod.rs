//! FAIA (Fichier d'Audit Informatisé AED) bookkeeping export.
//!
//! Generates the reduced version B of the audit file the Luxembourg
//! indirect tax administration asks for during a tax audit: company header,
//! general ledger accounts and every journal entry of the fiscal year.
//!
//! The produced `faia.xml` is validated against the bundled reduced FAIA
//! schema before it is handed out.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ecdf_lu::core::Company;
//! use ecdf_lu::faia::*;
//! use rust_decimal_macros::dec;
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let company = FaiaCompany::from(
//!     &Company::new("ACME S.A.").company_registry("B123456").vat("LU12345613"),
//! )
//! .address("Luxembourg", "L-1234");
//!
//! let data = FaiaData {
//!     company,
//!     accounts: vec![FaiaAccount::new("601000", "Purchases", "Expense").closing(dec!(100))],
//!     journals: vec![FaiaJournal::new("PUR", "Purchases", "purchase").transaction(
//!         FaiaTransaction::new("1", 1, 2024, day, "BILL/2024/0001")
//!             .line(FaiaLine::debit("1", "601000", "Office chairs", dec!(100)))
//!             .line(FaiaLine::credit("2", "440000", "Supplier", dec!(100))),
//!     )],
//! };
//!
//! let export = to_faia(&data, &FaiaConfig::default(), day).unwrap();
//! assert_eq!(export.file_name, "faia.xml");
//! assert!(export.xml.contains("<TotalDebit>100.00</TotalDebit>"));
//! ```

mod audit_file;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::{Company, EcdfError};
use crate::schema::{self, SchemaFamily};

/// Value written for a mandatory element without data.
pub const MISSING_VALUE: &str = "N/A";

/// Maximum length of a journal type.
pub const JOURNAL_TYPE_MAX_LEN: usize = 9;

/// Configuration of the FAIA export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaiaConfig {
    /// Company whose software produced the file.
    pub software_company_name: String,
    pub software_id: String,
    pub software_version: String,
    pub audit_file_version: String,
    /// ISO 3166 country of the audit file.
    pub country: String,
    /// Accounting basis, at most 18 characters.
    pub tax_accounting_basis: String,
}

impl Default for FaiaConfig {
    fn default() -> Self {
        Self {
            software_company_name: "ecdf-lu".into(),
            software_id: "ecdf-lu".into(),
            software_version: env!("CARGO_PKG_VERSION").into(),
            audit_file_version: "2.01B".into(),
            country: "LU".into(),
            tax_accounting_basis: "Invoice".into(),
        }
    }
}

/// The audited company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaiaCompany {
    pub registration_number: Option<String>,
    pub name: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub tax_id: Option<String>,
    pub telephone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// ISO 4217 code of the bookkeeping currency.
    pub currency: String,
}

impl From<&Company> for FaiaCompany {
    fn from(company: &Company) -> Self {
        Self {
            registration_number: company.company_registry.clone(),
            name: company.name.clone(),
            tax_id: company.vat.clone(),
            currency: company.currency.clone(),
            ..Default::default()
        }
    }
}

impl FaiaCompany {
    pub fn address(mut self, city: impl Into<String>, postal_code: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn telephone(mut self, telephone: impl Into<String>) -> Self {
        self.telephone = Some(telephone.into());
        self
    }

    pub fn fax(mut self, fax: impl Into<String>) -> Self {
        self.fax = Some(fax.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }
}

/// A general ledger account with its balances over the fiscal year.
///
/// Positive balances are written as debit, negative ones as credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaiaAccount {
    pub id: String,
    pub description: String,
    pub account_type: String,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
}

impl FaiaAccount {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        account_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            account_type: account_type.into(),
            opening_balance: Decimal::ZERO,
            closing_balance: Decimal::ZERO,
        }
    }

    pub fn opening(mut self, balance: Decimal) -> Self {
        self.opening_balance = balance;
        self
    }

    pub fn closing(mut self, balance: Decimal) -> Self {
        self.closing_balance = balance;
        self
    }
}

/// A journal and the entries it holds for the fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaiaJournal {
    pub id: String,
    pub description: String,
    /// Journal type, truncated to 9 characters on export.
    pub journal_type: String,
    pub transactions: Vec<FaiaTransaction>,
}

impl FaiaJournal {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        journal_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            journal_type: journal_type.into(),
            transactions: Vec::new(),
        }
    }

    pub fn transaction(mut self, transaction: FaiaTransaction) -> Self {
        self.transactions.push(transaction);
        self
    }
}

/// A journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaiaTransaction {
    pub id: String,
    /// Accounting period number.
    pub period: u32,
    pub period_year: i32,
    pub date: NaiveDate,
    pub description: String,
    /// Date the entry was recorded. Defaults to `date`.
    pub system_entry_date: NaiveDate,
    /// Date the entry was posted to the ledger. Defaults to `date`.
    pub gl_posting_date: NaiveDate,
    pub lines: Vec<FaiaLine>,
}

impl FaiaTransaction {
    pub fn new(
        id: impl Into<String>,
        period: u32,
        period_year: i32,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            period,
            period_year,
            date,
            description: description.into(),
            system_entry_date: date,
            gl_posting_date: date,
            lines: Vec::new(),
        }
    }

    pub fn posted_on(mut self, date: NaiveDate) -> Self {
        self.gl_posting_date = date;
        self
    }

    pub fn line(mut self, line: FaiaLine) -> Self {
        self.lines.push(line);
        self
    }
}

/// A journal item. Written as `DebitAmount` when `debit` is non-zero,
/// `CreditAmount` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaiaLine {
    pub record_id: String,
    pub account_id: String,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl FaiaLine {
    pub fn debit(
        record_id: impl Into<String>,
        account_id: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            account_id: account_id.into(),
            description: description.into(),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    pub fn credit(
        record_id: impl Into<String>,
        account_id: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            account_id: account_id.into(),
            description: description.into(),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }
}

/// Everything exported for one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaiaData {
    pub company: FaiaCompany,
    pub accounts: Vec<FaiaAccount>,
    pub journals: Vec<FaiaJournal>,
}

impl FaiaData {
    /// Number of journal entries.
    pub fn entry_count(&self) -> usize {
        self.journals.iter().map(|j| j.transactions.len()).sum()
    }

    /// Sum of all debit and credit amounts.
    pub fn totals(&self) -> (Decimal, Decimal) {
        self.journals
            .iter()
            .flat_map(|j| &j.transactions)
            .flat_map(|t| &t.lines)
            .fold((Decimal::ZERO, Decimal::ZERO), |(debit, credit), line| {
                (debit + line.debit, credit + line.credit)
            })
    }
}

/// Result of a FAIA export.
#[derive(Debug, Clone)]
pub struct FaiaExport {
    /// Suggested download name.
    pub file_name: String,
    /// The schema-valid audit file.
    pub xml: String,
}

/// Generate and validate the audit file, created on `created`.
pub fn to_faia(
    data: &FaiaData,
    config: &FaiaConfig,
    created: NaiveDate,
) -> Result<FaiaExport, EcdfError> {
    if data.accounts.is_empty() && data.journals.is_empty() {
        return Err(EcdfError::NoDeclarationLines(
            "no account and no journal to export".into(),
        ));
    }

    let xml = audit_file::generate_audit_file(data, config, created)?;
    if let Err(e) = schema::validate(SchemaFamily::Faia, xml.as_bytes()) {
        error!("The generated XML file does not fit the required schema: {e}");
        return Err(e);
    }
    info!(
        accounts = data.accounts.len(),
        entries = data.entry_count(),
        "FAIA file generated"
    );
    Ok(FaiaExport {
        file_name: "faia.xml".into(),
        xml,
    })
}

/// Monetary amount with a decimal point and two decimals.
pub(crate) fn monetary(amount: Decimal) -> String {
    let mut value = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(2);
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn data() -> FaiaData {
        let company = FaiaCompany::from(
            &Company::new("ACME S.A.")
                .company_registry("B123456")
                .vat("LU12345613"),
        )
        .address("Luxembourg", "L-1234")
        .telephone("+352 123456");

        FaiaData {
            company,
            accounts: vec![
                FaiaAccount::new("512000", "Bank", "Asset").opening(dec!(1000)),
                FaiaAccount::new("701000", "Sales", "Income").closing(dec!(-250.5)),
            ],
            journals: vec![
                FaiaJournal::new("SAL", "Customer invoices", "sale").transaction(
                    FaiaTransaction::new("7", 3, 2024, date(2024, 3, 4), "INV/2024/0007")
                        .posted_on(date(2024, 3, 5))
                        .line(FaiaLine::debit("21", "400000", "Customer", dec!(250.5)))
                        .line(FaiaLine::credit("22", "701000", "Services", dec!(250.5))),
                ),
                FaiaJournal::new("MISC", "Miscellaneous operations", "general"),
            ],
        }
    }

    #[test]
    fn monetary_format() {
        assert_eq!(monetary(dec!(0)), "0.00");
        assert_eq!(monetary(dec!(250.5)), "250.50");
        assert_eq!(monetary(dec!(1.005)), "1.01");
        assert_eq!(monetary(dec!(-3)), "-3.00");
    }

    #[test]
    fn totals_and_count() {
        let d = data();
        assert_eq!(d.entry_count(), 1);
        assert_eq!(d.totals(), (dec!(250.5), dec!(250.5)));
    }

    #[test]
    fn export_is_valid() {
        let export = to_faia(&data(), &FaiaConfig::default(), date(2025, 2, 1)).unwrap();
        assert_eq!(export.file_name, "faia.xml");
        assert!(export.xml.contains("<AuditFileDateCreated>2025-02-01</AuditFileDateCreated>"));
        assert!(export.xml.contains("<NumberOfEntries>1</NumberOfEntries>"));
        assert!(export.xml.contains("<TotalCredit>250.50</TotalCredit>"));
        assert!(export.xml.contains("<OpeningDebitBalance>1000.00</OpeningDebitBalance>"));
        assert!(export.xml.contains("<ClosingCreditBalance>250.50</ClosingCreditBalance>"));
        assert!(export.xml.contains("<GLPostingDate>2024-03-05</GLPostingDate>"));
    }

    #[test]
    fn nothing_to_export() {
        let mut d = data();
        d.accounts.clear();
        d.journals.clear();
        assert!(matches!(
            to_faia(&d, &FaiaConfig::default(), date(2025, 2, 1)),
            Err(EcdfError::NoDeclarationLines(_))
        ));
    }

    #[test]
    fn oversized_value_is_rejected_by_schema() {
        let mut d = data();
        d.accounts[0].account_type = "A very long account type name".into();
        let err = to_faia(&d, &FaiaConfig::default(), date(2025, 2, 1)).unwrap_err();
        assert!(matches!(err, EcdfError::Schema(_)));
    }
}
