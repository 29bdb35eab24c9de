use thiserror::Error;

/// Errors that can occur while generating an eCDF or FAIA file.
///
/// Every variant is terminal for the current generation request: nothing is
/// retried and no partial file is produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EcdfError {
    /// A required declarer identity field is absent.
    #[error("missing identity: {0}")]
    MissingIdentity(String),

    /// The computation engine could not resolve one or more report templates.
    #[error("report template(s) not found: {}", .0.join(", "))]
    TemplateNotFound(Vec<String>),

    /// Nothing to emit: no declaration or no declaration line.
    #[error("no declaration lines: {0}")]
    NoDeclarationLines(String),

    /// The assembled document does not fit the required schema.
    #[error("the generated file does not fit the required schema: {0}")]
    Schema(SchemaViolation),

    /// Malformed input rejected before generation.
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    /// The bundled schema itself could not be compiled.
    #[error("schema definition error: {0}")]
    SchemaDefinition(String),

    /// XML writing error.
    #[error("XML error: {0}")]
    Xml(String),
}

impl EcdfError {
    /// Shortcut for a [`EcdfError::Validation`] on a single field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(field, message))
    }

    /// Shortcut for a [`EcdfError::TemplateNotFound`] on a single template.
    pub fn template_not_found(template: impl Into<String>) -> Self {
        Self::TemplateNotFound(vec![template.into()])
    }
}

/// A single input validation error with field name and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the invalid field (e.g. "agent.rcs").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The first schema violation found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// 1-based line in the validated document (0 when unknown).
    pub line: u32,
    /// Violation message, shown verbatim to the user.
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl SchemaViolation {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_not_found_lists_all() {
        let err = EcdfError::TemplateNotFound(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "report template(s) not found: a, b");
    }

    #[test]
    fn schema_violation_displays_message_only() {
        let v = SchemaViolation::new(12, "Element 'X': This element is not expected.");
        assert_eq!(v.to_string(), "Element 'X': This element is not expected.");
    }
}
