//! XML Schema validation of generated files.
//!
//! The regulator publishes one XSD per document family. Both are bundled
//! with the crate and compiled once, on first use, into an immutable
//! [`Schema`]. Validation reports only the first violation, with the wording
//! and line number users of the filing portal are used to.
//!
//! Only the XSD constructs the bundled schemas use are supported; see
//! [`Schema::parse`] for the error returned on anything else.
//!
//! ```
//! use ecdf_lu::schema::{SchemaFamily, validate};
//!
//! let err = validate(SchemaFamily::Ecdf, b"<Unknown/>").unwrap_err();
//! assert!(err.to_string().contains("No matching global declaration"));
//! ```

mod check;
mod compile;

use std::sync::LazyLock;

pub use compile::Schema;

use crate::core::EcdfError;

/// XSD of eCDF declaration files.
pub const ECDF_XSD: &str = include_str!("ecdf_file_v1.1.xsd");

/// Reduced XSD of the FAIA (Fichier d'Audit Informatisé AED) audit file.
pub const FAIA_XSD: &str = include_str!("faia_v2.01_reduced_b.xsd");

static ECDF_SCHEMA: LazyLock<Result<Schema, String>> =
    LazyLock::new(|| Schema::parse(ECDF_XSD).map_err(|e| e.to_string()));

static FAIA_SCHEMA: LazyLock<Result<Schema, String>> =
    LazyLock::new(|| Schema::parse(FAIA_XSD).map_err(|e| e.to_string()));

/// Document families with a bundled schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFamily {
    /// eCDF declarations (VAT, annual accounts, chart of accounts).
    Ecdf,
    /// FAIA bookkeeping audit file.
    Faia,
}

impl SchemaFamily {
    /// File name of the bundled XSD.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Ecdf => "eCDF_file_v1.1.xsd",
            Self::Faia => "FAIA_v2.01_reduced_B.xsd",
        }
    }

    /// The compiled schema of this family.
    pub fn schema(&self) -> Result<&'static Schema, EcdfError> {
        let compiled = match self {
            Self::Ecdf => &*ECDF_SCHEMA,
            Self::Faia => &*FAIA_SCHEMA,
        };
        compiled
            .as_ref()
            .map_err(|e| EcdfError::SchemaDefinition(format!("{}: {e}", self.file_name())))
    }
}

/// Validate a serialized document against the schema of its family.
///
/// Returns [`EcdfError::Schema`] with the first violation.
pub fn validate(family: SchemaFamily, xml: &[u8]) -> Result<(), EcdfError> {
    let schema = family.schema()?;
    schema.validate(xml).map_err(|violation| {
        tracing::debug!(
            schema = family.file_name(),
            line = violation.line,
            "schema violation: {violation}"
        );
        EcdfError::Schema(violation)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_schemas_compile() {
        let ecdf = SchemaFamily::Ecdf.schema().unwrap();
        assert_eq!(ecdf.target_namespace(), Some("http://www.ctie.etat.lu/2011/ecdf"));
        let faia = SchemaFamily::Faia.schema().unwrap();
        assert_eq!(faia.target_namespace(), None);
    }

    #[test]
    fn unknown_root_rejected() {
        let err = validate(SchemaFamily::Faia, b"<eCDFDeclarations/>").unwrap_err();
        assert!(matches!(err, EcdfError::Schema(ref v) if v.line == 1));
    }
}
