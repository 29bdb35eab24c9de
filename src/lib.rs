//! # ecdf-lu
//!
//! Luxembourg electronic filing library: eCDF declaration files (VAT returns,
//! balance sheet, profit and loss, chart of accounts) and the FAIA
//! bookkeeping audit file.
//!
//! Figures come from a [`core::ComputationEngine`], are formatted the way the
//! eCDF portal expects, assembled into a document and validated against the
//! bundled XSD before any byte is handed out.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use ecdf_lu::core::*;
//! use rust_decimal_macros::dec;
//!
//! let company = Company::new("ACME S.A.")
//!     .matricule("20241234567")
//!     .vat("LU12345613");
//! let declarer = resolve_declarer(&company).unwrap();
//! assert_eq!(declarer.vat, "12345613");
//! assert_eq!(declarer.rcs, "NE");
//!
//! assert_eq!(format_amount(dec!(1234.565)), "1234,57");
//!
//! let created = NaiveDate::from_ymd_opt(2024, 4, 2)
//!     .unwrap()
//!     .and_hms_opt(9, 0, 0)
//!     .unwrap();
//! assert_eq!(file_reference(None, created, 1).unwrap(), "000000X20240402T09000001");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Types, identity resolution, field formatting, file naming, engine trait |
//! | `schema` | XSD validation of generated files |
//! | `ecdf` | VAT and annual eCDF declarations |
//! | `faia` | FAIA audit file export |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "schema")]
pub mod schema;

#[cfg(feature = "ecdf")]
pub mod ecdf;

#[cfg(feature = "faia")]
pub mod faia;

#[cfg(any(feature = "ecdf", feature = "faia"))]
#[cfg_attr(not(feature = "ecdf"), allow(dead_code))]
mod xml_utils;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
