//! Document assembly, serialization and the final schema gate.

use chrono::NaiveDateTime;
use tracing::{debug, error, info};

use crate::core::{
    Agent, Company, Declaration, EcdfError, FormField, Identity, file_reference, resolve_agent,
    resolve_declarer,
};
use crate::schema::{self, SchemaFamily};
use crate::xml_utils::XmlWriter;

/// Version of the eCDF file format.
pub const FILE_VERSION: &str = "1.1";

/// Interface identifier assigned by eCDF.
pub const INTERFACE: &str = "CODL7";

/// Namespace of eCDF documents.
pub const ECDF_NAMESPACE: &str = "http://www.ctie.etat.lu/2011/ecdf";

/// A complete eCDF document, ready to be serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_reference: String,
    pub agent: Identity,
    pub declarer: Identity,
    pub declarations: Vec<Declaration>,
}

/// A serialized document that passed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdfFile {
    pub file_reference: String,
    /// UTF-8 XML bytes.
    pub xml: Vec<u8>,
}

impl EcdfFile {
    /// File name offered for download.
    pub fn download_name(&self) -> String {
        format!("{}.xml", self.file_reference)
    }
}

impl Document {
    /// Wrap already resolved identities and declarations.
    ///
    /// Fails with [`EcdfError::NoDeclarationLines`] when there is no
    /// declaration or a declaration without any field.
    pub fn new(
        file_reference: String,
        agent: Identity,
        declarer: Identity,
        declarations: Vec<Declaration>,
    ) -> Result<Self, EcdfError> {
        if declarations.is_empty() {
            return Err(EcdfError::NoDeclarationLines(
                "nothing to declare: no declaration was produced".into(),
            ));
        }
        if let Some(empty) = declarations.iter().find(|d| d.fields.is_empty()) {
            return Err(EcdfError::NoDeclarationLines(format!(
                "the {} declaration of {} has no line",
                empty.kind.code(),
                empty.year
            )));
        }
        Ok(Self {
            file_reference,
            agent,
            declarer,
            declarations,
        })
    }

    /// Serialize to UTF-8 XML with a single default namespace.
    pub fn to_xml(&self) -> Result<Vec<u8>, EcdfError> {
        let mut w = XmlWriter::new()?;
        w.start_element_with_attrs("eCDFDeclarations", &[("xmlns", ECDF_NAMESPACE)])?;
        w.text_element("FileReference", &self.file_reference)?;
        w.text_element("eCDFFileVersion", FILE_VERSION)?;
        w.text_element("Interface", INTERFACE)?;

        w.start_element("Agent")?;
        write_identity(&mut w, &self.agent)?;
        w.end_element("Agent")?;

        w.start_element("Declarations")?;
        w.start_element("Declarer")?;
        write_identity(&mut w, &self.declarer)?;
        for declaration in &self.declarations {
            write_declaration(&mut w, declaration)?;
        }
        w.end_element("Declarer")?;
        w.end_element("Declarations")?;

        w.end_element("eCDFDeclarations")?;
        Ok(w.into_bytes())
    }

    /// Serialize and validate against the eCDF schema.
    ///
    /// The bytes are only returned when the document is valid.
    pub fn into_file(self) -> Result<EcdfFile, EcdfError> {
        let xml = self.to_xml()?;
        if let Err(e) = schema::validate(SchemaFamily::Ecdf, &xml) {
            error!(
                file = %self.file_reference,
                "The generated XML file does not fit the required schema: {e}"
            );
            return Err(e);
        }
        info!(
            file = %self.file_reference,
            declarations = self.declarations.len(),
            bytes = xml.len(),
            "eCDF file generated"
        );
        Ok(EcdfFile {
            file_reference: self.file_reference,
            xml,
        })
    }
}

/// Resolve identities and wrap `declarations` in a document created at
/// `created`, with file sequence `01`.
pub fn assemble_document(
    company: &Company,
    agent: Option<&Agent>,
    declarations: Vec<Declaration>,
    created: NaiveDateTime,
) -> Result<Document, EcdfError> {
    let declarer = resolve_declarer(company)?;
    let agent = resolve_agent(agent, &declarer);
    let reference = file_reference(company.ecdf_prefix.as_deref(), created, 1)?;
    debug!(file = %reference, company = %company.name, "assembling eCDF document");
    Document::new(reference, agent, declarer, declarations)
}

/// Assemble, serialize and validate in one step.
pub fn generate(
    company: &Company,
    agent: Option<&Agent>,
    declarations: Vec<Declaration>,
    created: NaiveDateTime,
) -> Result<EcdfFile, EcdfError> {
    assemble_document(company, agent, declarations, created)?.into_file()
}

/// Serialize a single declaration as a detached subtree.
pub fn declaration_xml(declaration: &Declaration) -> Result<String, EcdfError> {
    let mut w = XmlWriter::fragment();
    write_declaration(&mut w, declaration)?;
    w.into_string()
}

fn write_identity(w: &mut XmlWriter, identity: &Identity) -> Result<(), EcdfError> {
    w.text_element("MatrNbr", &identity.matricule)?;
    w.text_element("RCSNbr", &identity.rcs)?;
    w.text_element("VATNbr", &identity.vat)?;
    Ok(())
}

fn write_declaration(w: &mut XmlWriter, declaration: &Declaration) -> Result<(), EcdfError> {
    w.start_element_with_attrs(
        "Declaration",
        &[
            ("type", declaration.kind.code()),
            ("model", declaration.model()),
            ("language", declaration.language.code()),
        ],
    )?;
    w.text_element("Year", &declaration.year.to_string())?;
    w.text_element("Period", &declaration.period.to_string())?;
    w.start_element("FormData")?;
    for field in &declaration.fields {
        match field {
            FormField::Numeric { id, value, comment } => {
                if let Some(comment) = comment {
                    w.comment(comment)?;
                }
                w.text_element_with_attrs("NumericField", value, &[("id", id.as_str())])?;
            }
            FormField::Choice { id, selected } => {
                let value = if *selected { "1" } else { "0" };
                w.text_element_with_attrs("Choice", value, &[("id", id.as_str())])?;
            }
            FormField::Text { id, value } => {
                w.text_element_with_attrs("TextField", value, &[("id", id.as_str())])?;
            }
        }
    }
    w.end_element("FormData")?;
    w.end_element("Declaration")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeclarationKind, Language};
    use chrono::NaiveDate;

    fn created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 2)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap()
    }

    fn company() -> Company {
        Company::new("ACME S.A.")
            .matricule("20241234567")
            .company_registry("B123456")
            .vat("LU12345678")
    }

    fn vat_declaration() -> Declaration {
        let mut d = Declaration::new(DeclarationKind::VatMonthly, Language::EN, 2024, 3);
        d.fields = vec![
            FormField::Choice {
                id: "204".into(),
                selected: true,
            },
            FormField::Numeric {
                id: "012".into(),
                value: "1000,00".into(),
                comment: Some("Overall turnover".into()),
            },
        ];
        d
    }

    #[test]
    fn no_declaration_is_rejected() {
        let err = assemble_document(&company(), None, vec![], created()).unwrap_err();
        assert!(matches!(err, EcdfError::NoDeclarationLines(_)));
    }

    #[test]
    fn empty_declaration_is_rejected() {
        let empty = Declaration::new(DeclarationKind::VatMonthly, Language::EN, 2024, 3);
        let err = assemble_document(&company(), None, vec![empty], created()).unwrap_err();
        assert!(matches!(err, EcdfError::NoDeclarationLines(_)));
    }

    #[test]
    fn missing_matricule_is_fatal() {
        let company = Company::new("No id");
        let err = assemble_document(&company, None, vec![vat_declaration()], created()).unwrap_err();
        assert!(matches!(err, EcdfError::MissingIdentity(_)));
    }

    #[test]
    fn serialized_layout() {
        let doc = assemble_document(&company(), None, vec![vat_declaration()], created()).unwrap();
        assert_eq!(doc.file_reference, "000000X20240402T14300501");
        let xml = String::from_utf8(doc.to_xml().unwrap()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<eCDFDeclarations xmlns="http://www.ctie.etat.lu/2011/ecdf">"#));
        assert!(xml.contains(r#"<Declaration type="TVA_DECM" model="1" language="EN">"#));
        assert!(xml.contains("<!--Overall turnover-->"));
        assert!(xml.contains(r#"<NumericField id="012">1000,00</NumericField>"#));
        assert!(xml.contains(r#"<Choice id="204">1</Choice>"#));

        let order = ["<FileReference>", "<eCDFFileVersion>1.1<", "<Interface>CODL7<", "<Agent>", "<Declarations>", "<Declarer>"];
        let positions: Vec<_> = order.iter().map(|tag| xml.find(tag).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn valid_document_passes_the_schema() {
        let file = generate(&company(), None, vec![vat_declaration()], created()).unwrap();
        assert_eq!(file.download_name(), "000000X20240402T14300501.xml");
    }
}
