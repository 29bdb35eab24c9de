use chrono::NaiveDate;
use ecdf_lu::core::*;
use ecdf_lu::ecdf::*;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let engine = InMemoryEngine::new()
        .with_template(
            "l10n_lu_mis_reports.mis_report_ca",
            vec![
                KpiRow::new("ecdf_0107_0108", "101 - Subscribed capital", dec!(-31000)),
                KpiRow::new("ecdf_0119_0120", "106 - Owner's account", dec!(-1520.40)),
                KpiRow::new("ecdf_1437_1438", "512 - Bank", dec!(42310.77)),
                KpiRow::new("ecdf_1571_1572", "606 - Supplies", KpiValue::NotApplicable),
            ],
        )
        .with_template(
            "l10n_lu_mis_reports.mis_report_bs_2016",
            vec![
                KpiRow::new("ecdf_101_102", "Subscribed capital unpaid", KpiValue::Unset),
                KpiRow::new("ecdf_201_202", "Total assets", dec!(42310.77)),
            ],
        )
        .with_period(
            "l10n_lu_mis_reports.mis_report_bs_2016",
            date(2022, 1, 1),
            vec![KpiRow::new("ecdf_201_202", "Total assets", dec!(38112.05))],
        )
        .with_template(
            "l10n_lu_mis_reports.mis_report_pl_2016",
            vec![KpiRow::new("ecdf_701_702", "Net turnover", dec!(120500))],
        );

    let report = AnnualReport::new(AnnualReportConfig {
        language: Language::EN,
        date_from: date(2023, 1, 1),
        date_to: date(2023, 12, 31),
        remarks: Some("Accounts approved on 2024-05-15".into()),
        ..Default::default()
    })
    .expect("valid fiscal year");

    let company = Company::new("ACME S.A.")
        .matricule("20241234567")
        .company_registry("B123456")
        .vat("LU12345678")
        .ecdf_prefix("123456");

    let declarations = match report.declarations(&engine, &company.currency) {
        Ok(declarations) => declarations,
        Err(e) => {
            eprintln!("computation failed: {e}");
            return;
        }
    };
    for declaration in &declarations {
        println!(
            "{} ({} fields)",
            declaration.kind.code(),
            declaration.fields.len()
        );
    }

    let created = date(2024, 5, 20).and_hms_opt(16, 5, 0).unwrap();
    match generate(&company, None, declarations, created) {
        Ok(file) => println!("\nwrote {} ({} bytes)", file.download_name(), file.xml.len()),
        Err(e) => eprintln!("generation failed: {e}"),
    }
}
