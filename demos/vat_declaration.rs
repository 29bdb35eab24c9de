use chrono::NaiveDate;
use ecdf_lu::core::*;
use ecdf_lu::ecdf::*;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Figures as the computation engine would return them
    let engine = InMemoryEngine::new().with_template(
        "l10n_lu_ecdf.mis_report_month_vat_2024",
        vec![
            KpiRow::new("ecdf_012", "Overall turnover", dec!(25400)),
            KpiRow::new("ecdf_022", "Exempt turnover", KpiValue::NotApplicable),
            KpiRow::new("ecdf_037", "Breakdown of taxable turnover", dec!(25400)),
            KpiRow::new("ecdf_046", "Output tax 17%", dec!(4318)),
            KpiRow::new("ecdf_095", "Extra-community acquisitions", KpiValue::Unset),
            KpiRow::new("ext_103", "Adjustments", KpiValue::Unset),
        ],
    );

    let mut report = VatReport::new(VatReportConfig {
        name: "VAT March 2024".into(),
        language: Language::EN,
        year: 2024,
        period_type: PeriodType::Month,
        period: 3,
        ..Default::default()
    })
    .expect("valid period");
    report.set_manual_input("103", dec!(-12.5));
    report.generate_lines(&engine).expect("template exists");

    println!("=== Lines ===");
    for line in report.lines() {
        let kind = if line.automatic { "auto" } else { "manual" };
        println!("  [{}] {:<6} {:?} {}", line.code, kind, line.value, line.description);
    }

    let company = Company::new("ACME S.A.")
        .matricule("20241234567")
        .company_registry("B123456")
        .vat("LU12345678");
    let agent = AgentBuilder::new("Fiduciaire Exemple")
        .matricule("19991234567")
        .rcs("B99999")
        .build()
        .expect("valid agent");
    let created = NaiveDate::from_ymd_opt(2024, 4, 10)
        .unwrap()
        .and_hms_opt(11, 42, 7)
        .unwrap();

    let declaration = report.declaration().expect("report has lines");
    match generate(&company, Some(&agent), vec![declaration], created) {
        Ok(file) => {
            println!("\n=== {} ===", file.download_name());
            println!("{}", String::from_utf8_lossy(&file.xml));
        }
        Err(e) => eprintln!("generation failed: {e}"),
    }
}
