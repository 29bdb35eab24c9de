use chrono::{NaiveDate, NaiveDateTime};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use ecdf_lu::core::*;
use ecdf_lu::ecdf::{self, DeclarationInput, VatLine, build_declaration};
use ecdf_lu::schema::{self, SchemaFamily};

fn created() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn company() -> Company {
    Company::new("Benchmark S.A.")
        .matricule("20241234567")
        .company_registry("B123456")
        .vat("LU12345678")
}

/// A monthly VAT return with `n` numeric lines.
fn vat_declaration(n: u32) -> Declaration {
    let lines: Vec<VatLine> = (0..n)
        .map(|i| {
            VatLine::automatic(
                format!("{:03}", i % 1000),
                format!("Line {i}"),
                Decimal::new(i64::from(i) * 12_345, 3),
            )
        })
        .collect();
    build_declaration(
        DeclarationKind::VatMonthly,
        Language::FR,
        2024,
        3,
        DeclarationInput::Vat {
            regime: VatRegime::Sales,
            lines: &lines,
        },
    )
    .unwrap()
}

// ── Benchmarks ─────────────────────────────────────────────────────

fn bench_build_declaration(c: &mut Criterion) {
    c.bench_function("build_vat_declaration_500_lines", |b| {
        b.iter(|| black_box(vat_declaration(500)));
    });
}

fn bench_serialize(c: &mut Criterion) {
    let document =
        ecdf::assemble_document(&company(), None, vec![vat_declaration(500)], created()).unwrap();
    c.bench_function("serialize_document_500_lines", |b| {
        b.iter(|| black_box(document.to_xml()));
    });
}

fn bench_validate(c: &mut Criterion) {
    let document = ecdf::assemble_document(
        &company(),
        None,
        (0..12).map(|_| vat_declaration(500)).collect(),
        created(),
    )
    .unwrap();
    let xml = document.to_xml().unwrap();
    // compile outside the measured loop
    SchemaFamily::Ecdf.schema().unwrap();
    c.bench_function("validate_document_6000_lines", |b| {
        b.iter(|| black_box(schema::validate(SchemaFamily::Ecdf, black_box(&xml))));
    });
}

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_file_500_lines", |b| {
        b.iter(|| {
            black_box(ecdf::generate(
                &company(),
                None,
                vec![vat_declaration(500)],
                created(),
            ))
        });
    });
}

fn bench_compile_schema(c: &mut Criterion) {
    c.bench_function("compile_ecdf_schema", |b| {
        b.iter(|| black_box(schema::Schema::parse(black_box(schema::ECDF_XSD))));
    });
}

criterion_group!(
    benches,
    bench_build_declaration,
    bench_serialize,
    bench_validate,
    bench_generate,
    bench_compile_schema,
);
criterion_main!(benches);
