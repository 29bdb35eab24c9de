//! `AuditFile` XML generation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{
    FaiaAccount, FaiaCompany, FaiaConfig, FaiaData, FaiaJournal, FaiaLine, FaiaTransaction,
    JOURNAL_TYPE_MAX_LEN, MISSING_VALUE, monetary,
};
use crate::core::EcdfError;
use crate::xml_utils::XmlWriter;

/// Generate the `AuditFile` document.
pub fn generate_audit_file(
    data: &FaiaData,
    config: &FaiaConfig,
    created: NaiveDate,
) -> Result<String, EcdfError> {
    let mut writer = XmlWriter::new()?;

    writer.start_element("AuditFile")?;

    writer.start_element("Header")?;
    mandatory(&mut writer, "AuditFileVersion", &config.audit_file_version)?;
    mandatory(&mut writer, "AuditFileCountry", &config.country)?;
    mandatory(&mut writer, "AuditFileDateCreated", &created.to_string())?;
    mandatory(&mut writer, "SoftwareCompanyName", &config.software_company_name)?;
    mandatory(&mut writer, "SoftwareID", &config.software_id)?;
    mandatory(&mut writer, "SoftwareVersion", &config.software_version)?;
    write_company(&mut writer, &data.company)?;
    mandatory(&mut writer, "DefaultCurrencyCode", &data.company.currency)?;
    mandatory(&mut writer, "TaxAccountingBasis", &config.tax_accounting_basis)?;
    writer.end_element("Header")?;

    // GeneralLedgerAccounts needs at least one Account
    writer.start_element("MasterFiles")?;
    if !data.accounts.is_empty() {
        writer.start_element("GeneralLedgerAccounts")?;
        for account in &data.accounts {
            write_account(&mut writer, account)?;
        }
        writer.end_element("GeneralLedgerAccounts")?;
    }
    writer.end_element("MasterFiles")?;

    let (total_debit, total_credit) = data.totals();
    writer.start_element("GeneralLedgerEntries")?;
    mandatory(&mut writer, "NumberOfEntries", &data.entry_count().to_string())?;
    mandatory(&mut writer, "TotalDebit", &monetary(total_debit))?;
    mandatory(&mut writer, "TotalCredit", &monetary(total_credit))?;
    for journal in &data.journals {
        write_journal(&mut writer, journal)?;
    }
    writer.end_element("GeneralLedgerEntries")?;

    writer.end_element("AuditFile")?;

    writer.into_string()
}

fn write_company(writer: &mut XmlWriter, company: &FaiaCompany) -> Result<(), EcdfError> {
    writer.start_element("Company")?;
    mandatory(writer, "RegistrationNumber", text(&company.registration_number))?;
    mandatory(writer, "Name", &company.name)?;

    writer.start_element("Address")?;
    mandatory(writer, "City", text(&company.city))?;
    mandatory(writer, "PostalCode", text(&company.postal_code))?;
    writer.end_element("Address")?;

    optional(writer, "TaxID", &company.tax_id)?;

    writer.start_element("Contact")?;
    writer.start_element("ContactPerson")?;
    mandatory(writer, "FirstName", "")?;
    mandatory(writer, "LastName", &company.name)?;
    writer.end_element("ContactPerson")?;
    mandatory(writer, "Telephone", text(&company.telephone))?;
    optional(writer, "Fax", &company.fax)?;
    optional(writer, "Email", &company.email)?;
    optional(writer, "Website", &company.website)?;
    writer.end_element("Contact")?;

    writer.end_element("Company")?;
    Ok(())
}

fn write_account(writer: &mut XmlWriter, account: &FaiaAccount) -> Result<(), EcdfError> {
    writer.start_element("Account")?;
    mandatory(writer, "AccountID", &account.id)?;
    mandatory(writer, "AccountDescription", &account.description)?;
    mandatory(writer, "AccountType", &account.account_type)?;
    balance(writer, "Opening", account.opening_balance)?;
    balance(writer, "Closing", account.closing_balance)?;
    writer.end_element("Account")?;
    Ok(())
}

fn balance(writer: &mut XmlWriter, prefix: &str, amount: Decimal) -> Result<(), EcdfError> {
    let side = if amount.is_sign_negative() && !amount.is_zero() {
        "Credit"
    } else {
        "Debit"
    };
    mandatory(
        writer,
        &format!("{prefix}{side}Balance"),
        &monetary(amount.abs()),
    )
}

fn write_journal(writer: &mut XmlWriter, journal: &FaiaJournal) -> Result<(), EcdfError> {
    let journal_type: String = journal.journal_type.chars().take(JOURNAL_TYPE_MAX_LEN).collect();

    writer.start_element("Journal")?;
    mandatory(writer, "JournalID", &journal.id)?;
    mandatory(writer, "Description", &journal.description)?;
    mandatory(writer, "Type", &journal_type)?;
    for transaction in &journal.transactions {
        write_transaction(writer, transaction)?;
    }
    writer.end_element("Journal")?;
    Ok(())
}

fn write_transaction(
    writer: &mut XmlWriter,
    transaction: &FaiaTransaction,
) -> Result<(), EcdfError> {
    writer.start_element("Transaction")?;
    mandatory(writer, "TransactionID", &transaction.id)?;
    mandatory(writer, "Period", &transaction.period.to_string())?;
    mandatory(writer, "PeriodYear", &format!("{:04}", transaction.period_year))?;
    mandatory(writer, "TransactionDate", &transaction.date.to_string())?;
    mandatory(writer, "Description", &transaction.description)?;
    mandatory(writer, "SystemEntryDate", &transaction.system_entry_date.to_string())?;
    mandatory(writer, "GLPostingDate", &transaction.gl_posting_date.to_string())?;
    for line in &transaction.lines {
        write_line(writer, line)?;
    }
    writer.end_element("Transaction")?;
    Ok(())
}

fn write_line(writer: &mut XmlWriter, line: &FaiaLine) -> Result<(), EcdfError> {
    writer.start_element("Line")?;
    mandatory(writer, "RecordID", &line.record_id)?;
    mandatory(writer, "AccountID", &line.account_id)?;
    mandatory(writer, "Description", &line.description)?;
    let (tag, amount) = if line.debit.is_zero() {
        ("CreditAmount", line.credit)
    } else {
        ("DebitAmount", line.debit)
    };
    writer.start_element(tag)?;
    mandatory(writer, "Amount", &monetary(amount))?;
    writer.end_element(tag)?;
    writer.end_element("Line")?;
    Ok(())
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Write `<tag>text</tag>`, with `N/A` when `text` is blank.
fn mandatory(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<(), EcdfError> {
    let text = if text.trim().is_empty() {
        MISSING_VALUE
    } else {
        text
    };
    writer.text_element(tag, text)?;
    Ok(())
}

/// Write `<tag>text</tag>` only when there is a non-blank value.
fn optional(writer: &mut XmlWriter, tag: &str, text: &Option<String>) -> Result<(), EcdfError> {
    match text.as_deref() {
        Some(t) if !t.trim().is_empty() => mandatory(writer, tag, t),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Company;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn render(data: &FaiaData) -> String {
        generate_audit_file(data, &FaiaConfig::default(), date(2024, 6, 13)).unwrap()
    }

    fn minimal() -> FaiaData {
        FaiaData {
            company: FaiaCompany::from(&Company::new("ACME S.A.")),
            accounts: vec![FaiaAccount::new("512000", "Bank", "Asset")],
            journals: vec![],
        }
    }

    #[test]
    fn blank_mandatory_fields_fall_back() {
        let xml = render(&minimal());
        assert!(xml.contains("<RegistrationNumber>N/A</RegistrationNumber>"));
        assert!(xml.contains("<FirstName>N/A</FirstName>"));
        assert!(xml.contains("<LastName>ACME S.A.</LastName>"));
        assert!(xml.contains("<Telephone>N/A</Telephone>"));
        assert!(!xml.contains("<TaxID>"));
        assert!(!xml.contains("<Fax>"));
        assert!(xml.contains("<DefaultCurrencyCode>EUR</DefaultCurrencyCode>"));
    }

    #[test]
    fn header_comes_from_config() {
        let xml = render(&minimal());
        assert!(xml.contains("<AuditFileVersion>2.01B</AuditFileVersion>"));
        assert!(xml.contains("<AuditFileCountry>LU</AuditFileCountry>"));
        assert!(xml.contains("<TaxAccountingBasis>Invoice</TaxAccountingBasis>"));
    }

    #[test]
    fn zero_balance_is_debit() {
        let xml = render(&minimal());
        assert!(xml.contains("<OpeningDebitBalance>0.00</OpeningDebitBalance>"));
        assert!(xml.contains("<ClosingDebitBalance>0.00</ClosingDebitBalance>"));
    }

    #[test]
    fn journal_type_is_truncated() {
        let mut data = minimal();
        data.journals.push(FaiaJournal::new("BNK", "Bank", "bank_and_cash"));
        let xml = render(&data);
        assert!(xml.contains("<Type>bank_and_</Type>"));
    }

    #[test]
    fn empty_ledger_omits_accounts() {
        let mut data = minimal();
        data.accounts.clear();
        let xml = render(&data);
        assert!(xml.contains("<MasterFiles>"));
        assert!(!xml.contains("GeneralLedgerAccounts"));
    }

    #[test]
    fn line_side() {
        let mut data = minimal();
        data.journals.push(
            FaiaJournal::new("MISC", "Misc", "general").transaction(
                FaiaTransaction::new("1", 1, 2024, date(2024, 1, 2), "Opening")
                    .line(FaiaLine::debit("1", "512000", "Cash in", dec!(10)))
                    .line(FaiaLine::credit("2", "101000", "Capital", dec!(10))),
            ),
        );
        let xml = render(&data);
        let debit = xml.find("<DebitAmount>").unwrap();
        let credit = xml.find("<CreditAmount>").unwrap();
        assert!(debit < credit);
        assert!(xml.contains("<PeriodYear>2024</PeriodYear>"));
        assert!(xml.contains("<SystemEntryDate>2024-01-02</SystemEntryDate>"));
    }
}
