//! eCDF declaration files.
//!
//! Builds VAT returns and annual financial declarations from computed values,
//! wraps them in an `eCDFDeclarations` document and validates it against the
//! bundled eCDF schema before handing out the bytes.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ecdf_lu::core::{Company, InMemoryEngine, KpiRow, PeriodType};
//! use ecdf_lu::ecdf::{VatReport, VatReportConfig, generate};
//! use rust_decimal_macros::dec;
//!
//! let engine = InMemoryEngine::new().with_template(
//!     "l10n_lu_ecdf.mis_report_month_vat_2024",
//!     vec![KpiRow::new("ecdf_101", "Turnover", dec!(11.1))],
//! );
//! let mut report = VatReport::new(VatReportConfig {
//!     year: 2024,
//!     period_type: PeriodType::Month,
//!     period: 3,
//!     ..Default::default()
//! })
//! .unwrap();
//! report.generate_lines(&engine).unwrap();
//!
//! let company = Company::new("ACME S.A.")
//!     .matricule("0000000000000")
//!     .company_registry("L654321")
//!     .vat("LU12345613");
//! let created = NaiveDate::from_ymd_opt(2024, 4, 2)
//!     .unwrap()
//!     .and_hms_opt(9, 0, 0)
//!     .unwrap();
//! let file = generate(&company, None, vec![report.declaration().unwrap()], created).unwrap();
//! assert_eq!(file.download_name(), "000000X20240402T09000001.xml");
//! ```

mod annual;
mod declaration;
mod document;
mod vat;

pub use annual::*;
pub use declaration::{
    AnnualHeader, DeclarationInput, LINE_106_CREDIT_CODES, LINE_106_DEBIT_CODES, REMARKS_FIELD,
    build_declaration, chart_of_accounts_fields, financial_statement_fields, vat_fields,
};
pub use document::*;
pub use vat::*;
