//! Declarer / agent identity resolution and identity number formats.

use super::error::EcdfError;
use super::types::{Agent, Company, Identity};

/// Placeholder emitted for an identity number that is not available.
pub const NOT_AVAILABLE: &str = "NE";

/// Resolve the declarer identity from the company profile.
///
/// The matricule is mandatory. A missing RCS or VAT number becomes `"NE"`;
/// a VAT number starting with `LU` loses its country prefix.
pub fn resolve_declarer(company: &Company) -> Result<Identity, EcdfError> {
    let matricule = non_empty(company.matricule.as_deref()).ok_or_else(|| {
        EcdfError::MissingIdentity(format!("the company '{}' has no matricule set", company.name))
    })?;
    let rcs = non_empty(company.company_registry.as_deref()).unwrap_or(NOT_AVAILABLE);
    let vat = non_empty(company.vat.as_deref()).map_or(NOT_AVAILABLE, normalize_vat);

    Ok(Identity {
        matricule: matricule.to_string(),
        rcs: rcs.to_string(),
        vat: vat.to_string(),
    })
}

/// Resolve the agent identity.
///
/// Each field is taken from the agent when set and non-empty, otherwise from
/// the already resolved declarer. The fallback is evaluated per field.
pub fn resolve_agent(agent: Option<&Agent>, declarer: &Identity) -> Identity {
    let field = |pick: fn(&Agent) -> Option<&str>| agent.and_then(|a| non_empty(pick(a)));

    Identity {
        matricule: field(|a| a.matricule.as_deref())
            .map_or_else(|| declarer.matricule.clone(), str::to_string),
        rcs: field(|a| a.rcs.as_deref()).map_or_else(|| declarer.rcs.clone(), str::to_string),
        vat: field(|a| a.vat.as_deref())
            .map_or_else(|| declarer.vat.clone(), |v| normalize_vat(v).to_string()),
    }
}

/// Strip the `LU` country prefix from a VAT number. Other values pass through.
pub fn normalize_vat(vat: &str) -> &str {
    vat.strip_prefix("LU").unwrap_or(vat)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Validate a Luxembourg matricule: 11 or 13 characters.
///
/// Only the length is checked.
pub fn validate_matricule(matricule: &str) -> Result<(), EcdfError> {
    if matches!(matricule.chars().count(), 11 | 13) {
        Ok(())
    } else {
        Err(EcdfError::validation(
            "matricule",
            "Matricule must be 11 or 13 characters long.",
        ))
    }
}

/// Validate an RCS number: an uppercase letter followed by 2 to 6 digits,
/// the first digit not being 0 (e.g. `B123456`).
pub fn validate_rcs(rcs: &str) -> Result<(), EcdfError> {
    let bytes = rcs.as_bytes();
    let valid = (3..=7).contains(&bytes.len())
        && bytes[0].is_ascii_uppercase()
        && matches!(bytes[1], b'1'..=b'9')
        && bytes[2..].iter().all(u8::is_ascii_digit);
    if valid {
        Ok(())
    } else {
        Err(EcdfError::validation(
            "rcs",
            "RCS number must begin with an uppercase letter followed by 2 to 6 digits. \
             The first digit must not be 0.",
        ))
    }
}

/// Validate a tax id: two uppercase letters followed by 8 digits.
pub fn validate_tax_id(vat: &str) -> Result<(), EcdfError> {
    let bytes = vat.as_bytes();
    let valid = bytes.len() == 10
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..].iter().all(u8::is_ascii_digit);
    if valid {
        Ok(())
    } else {
        Err(EcdfError::validation(
            "vat",
            "VAT number must begin with two uppercase letters followed by 8 digits.",
        ))
    }
}

/// Validate an eCDF filer prefix: exactly 6 digits.
pub fn validate_ecdf_prefix(prefix: &str) -> Result<(), EcdfError> {
    if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(EcdfError::validation(
            "ecdf_prefix",
            format!("eCDF prefix '{prefix}' must be exactly 6 digits"),
        ))
    }
}

/// Builder for a validated [`Agent`].
///
/// Every identity number is optional; the ones that are set must be well-formed.
#[derive(Debug, Clone)]
pub struct AgentBuilder {
    name: String,
    matricule: Option<String>,
    rcs: Option<String>,
    vat: Option<String>,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matricule: None,
            rcs: None,
            vat: None,
        }
    }

    pub fn matricule(mut self, matricule: impl Into<String>) -> Self {
        self.matricule = Some(matricule.into());
        self
    }

    pub fn rcs(mut self, rcs: impl Into<String>) -> Self {
        self.rcs = Some(rcs.into());
        self
    }

    pub fn vat(mut self, vat: impl Into<String>) -> Self {
        self.vat = Some(vat.into());
        self
    }

    pub fn build(self) -> Result<Agent, EcdfError> {
        if self.name.trim().is_empty() {
            return Err(EcdfError::validation("name", "agent name must not be empty"));
        }
        if let Some(m) = &self.matricule {
            validate_matricule(m)?;
        }
        if let Some(r) = &self.rcs {
            validate_rcs(r)?;
        }
        if let Some(v) = &self.vat {
            validate_tax_id(v)?;
        }
        Ok(Agent {
            name: self.name,
            matricule: self.matricule,
            rcs: self.rcs,
            vat: self.vat,
        })
    }
}
