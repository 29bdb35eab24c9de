#![cfg(all(feature = "ecdf", feature = "faia"))]

use chrono::NaiveDate;
use ecdf_lu::core::*;
use ecdf_lu::ecdf::*;
use ecdf_lu::faia::FaiaConfig;

#[test]
fn vat_config_from_partial_json() {
    let config: VatReportConfig =
        serde_json::from_str(r#"{"year": 2024, "period_type": "Quarter", "period": 4}"#).unwrap();
    assert_eq!(config.language, Language::EN);
    assert_eq!(config.regime, VatRegime::Sales);
    assert_eq!(config.target_moves, TargetMoves::Posted);
    assert_eq!(config.declaration_kind(), DeclarationKind::VatAnnual);
    assert_eq!(
        config.date_range().unwrap(),
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        )
    );
}

#[test]
fn vat_config_rejects_bad_period() {
    let config: VatReportConfig =
        serde_json::from_str(r#"{"year": 2024, "period_type": "Quarter", "period": 5}"#).unwrap();
    assert!(matches!(VatReport::new(config), Err(EcdfError::Validation(_))));
}

#[test]
fn annual_config_from_partial_json() {
    let config: AnnualReportConfig = serde_json::from_str(
        r#"{
            "date_from": "2023-07-01",
            "date_to": "2024-06-30",
            "with_ac": false,
            "reports_type": "Abbreviated"
        }"#,
    )
    .unwrap();
    assert_eq!(config.language, Language::EN);
    assert_eq!(
        config.selected_kinds(),
        [
            DeclarationKind::BalanceSheetAbridged,
            DeclarationKind::ProfitLossAbridged
        ]
    );
    let report = AnnualReport::new(config).unwrap();
    assert_eq!(
        report.previous_period().unwrap().from,
        NaiveDate::from_ymd_opt(2022, 7, 1).unwrap()
    );
}

#[test]
fn faia_config_defaults_and_roundtrip() {
    let config: FaiaConfig = serde_json::from_str(r#"{"software_id": "books"}"#).unwrap();
    assert_eq!(config.software_id, "books");
    assert_eq!(config.audit_file_version, "2.01B");
    assert_eq!(config.country, "LU");

    let json = serde_json::to_string(&config).unwrap();
    let back: FaiaConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
