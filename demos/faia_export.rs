use chrono::NaiveDate;
use ecdf_lu::core::Company;
use ecdf_lu::faia::*;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let company = FaiaCompany::from(
        &Company::new("ACME S.A.")
            .company_registry("B123456")
            .vat("LU12345678"),
    )
    .address("Luxembourg", "L-1511")
    .telephone("+352 27 00 00")
    .website("https://acme.example");

    let data = FaiaData {
        company,
        accounts: vec![
            FaiaAccount::new("411000", "Customers", "Receivable").closing(dec!(1170)),
            FaiaAccount::new("706000", "Services", "Income").closing(dec!(-1000)),
            FaiaAccount::new("461100", "VAT payable", "Liability").closing(dec!(-170)),
        ],
        journals: vec![FaiaJournal::new("SAL", "Customer invoices", "sale").transaction(
            FaiaTransaction::new("1", 1, 2024, date(2024, 1, 31), "INV/2024/0001")
                .line(FaiaLine::debit("1", "411000", "Customer", dec!(1170)))
                .line(FaiaLine::credit("2", "706000", "Consulting", dec!(1000)))
                .line(FaiaLine::credit("3", "461100", "VAT 17%", dec!(170))),
        )],
    };

    let config = FaiaConfig {
        software_company_name: "ACME Software".into(),
        ..Default::default()
    };

    match to_faia(&data, &config, date(2025, 2, 14)) {
        Ok(export) => {
            println!("=== {} ===", export.file_name);
            println!("{}", export.xml);
        }
        Err(e) => eprintln!("export failed: {e}"),
    }
}
