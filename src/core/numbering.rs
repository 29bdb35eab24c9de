use chrono::{Datelike, NaiveDateTime};

use super::error::EcdfError;
use super::identity::validate_ecdf_prefix;

/// Prefix used when the company has no eCDF prefix configured.
pub const DEFAULT_ECDF_PREFIX: &str = "000000";

/// Length of an eCDF file reference.
pub const FILE_REFERENCE_LEN: usize = 24;

/// Build an eCDF file reference: `000000XyyyymmddThhmmssNN`.
///
/// - positions 1–6: eCDF prefix of the filer (`000000` when unset)
/// - position 7: file type, `X` for XML
/// - positions 8–15: creation date `yyyymmdd`
/// - position 16: `T`
/// - positions 17–22: creation time `hhmmss`
/// - positions 23–24: sequence number `01`–`99` for files created in the same second
pub fn file_reference(
    prefix: Option<&str>,
    created: NaiveDateTime,
    sequence: u8,
) -> Result<String, EcdfError> {
    let prefix = match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => {
            validate_ecdf_prefix(p)?;
            p
        }
        None => DEFAULT_ECDF_PREFIX,
    };
    if !(1..=99).contains(&sequence) {
        return Err(EcdfError::validation(
            "sequence",
            format!("file sequence {sequence} must be in range 01-99"),
        ));
    }
    // %Y signs or widens years outside four digits
    if !(0..=9999).contains(&created.year()) {
        return Err(EcdfError::validation(
            "created",
            format!("creation year {} does not fit in four digits", created.year()),
        ));
    }
    Ok(format!(
        "{prefix}{}{sequence:02}",
        created.format("X%Y%m%dT%H%M%S")
    ))
}

/// File reference generator that keeps names unique within one second.
///
/// The first file of a given second gets sequence `01`; further files created
/// in the same second get `02`, `03`, … up to `99`.
#[derive(Debug, Clone)]
pub struct FileReferenceSequence {
    prefix: Option<String>,
    last: Option<NaiveDateTime>,
    next_number: u8,
}

impl FileReferenceSequence {
    /// Create a sequence for the given company prefix.
    pub fn new(prefix: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            last: None,
            next_number: 1,
        }
    }

    /// Generate the file reference for a file created at `created`.
    pub fn next_reference(&mut self, created: NaiveDateTime) -> Result<String, EcdfError> {
        // sub-second precision is not part of the name
        let second = created.format("%Y%m%d%H%M%S").to_string();
        let same_second = self
            .last
            .is_some_and(|last| last.format("%Y%m%d%H%M%S").to_string() == second);
        if !same_second {
            self.last = Some(created);
            self.next_number = 1;
        }
        if self.next_number > 99 {
            return Err(EcdfError::validation(
                "sequence",
                format!("more than 99 files created in second {second}"),
            ));
        }
        let reference = file_reference(self.prefix.as_deref(), created, self.next_number)?;
        self.next_number += 1;
        Ok(reference)
    }

    /// Preview the next reference without consuming it.
    pub fn peek(&self, created: NaiveDateTime) -> Result<String, EcdfError> {
        self.clone().next_reference(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn default_prefix() {
        let r = file_reference(None, at(9, 5, 1), 1).unwrap();
        assert_eq!(r, "000000X20240307T09050101");
        assert_eq!(r.len(), FILE_REFERENCE_LEN);
    }

    #[test]
    fn company_prefix() {
        let r = file_reference(Some("123456"), at(23, 59, 59), 1).unwrap();
        assert_eq!(r, "123456X20240307T23595901");
    }

    #[test]
    fn blank_prefix_uses_default() {
        let r = file_reference(Some(" "), at(0, 0, 0), 1).unwrap();
        assert!(r.starts_with("000000X"));
    }

    #[test]
    fn invalid_prefix_rejected() {
        assert!(file_reference(Some("12AB"), at(0, 0, 0), 1).is_err());
    }

    #[test]
    fn sequence_out_of_range() {
        assert!(file_reference(None, at(0, 0, 0), 0).is_err());
        assert!(file_reference(None, at(0, 0, 0), 100).is_err());
    }

    #[test]
    fn year_outside_four_digits_rejected() {
        let far = NaiveDate::from_ymd_opt(10000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(file_reference(None, far, 1).is_err());

        let early = NaiveDate::from_ymd_opt(-1, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(file_reference(None, early, 1).is_err());

        let last = NaiveDate::from_ymd_opt(9999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(file_reference(None, last, 1).unwrap().len(), FILE_REFERENCE_LEN);
    }

    #[test]
    fn same_second_increments() {
        let mut seq = FileReferenceSequence::new(Some("123456"));
        assert_eq!(seq.next_reference(at(10, 0, 0)).unwrap(), "123456X20240307T10000001");
        assert_eq!(seq.next_reference(at(10, 0, 0)).unwrap(), "123456X20240307T10000002");
        assert_eq!(seq.next_reference(at(10, 0, 1)).unwrap(), "123456X20240307T10000101");
    }

    #[test]
    fn peek_does_not_consume() {
        let mut seq = FileReferenceSequence::new(None);
        assert_eq!(seq.peek(at(8, 0, 0)).unwrap(), "000000X20240307T08000001");
        assert_eq!(seq.next_reference(at(8, 0, 0)).unwrap(), "000000X20240307T08000001");
        assert_eq!(seq.peek(at(8, 0, 0)).unwrap(), "000000X20240307T08000002");
    }

    #[test]
    fn overflow_after_99() {
        let mut seq = FileReferenceSequence::new(None);
        for _ in 0..99 {
            seq.next_reference(at(12, 0, 0)).unwrap();
        }
        assert!(seq.next_reference(at(12, 0, 0)).is_err());
    }
}
