use std::env;
use std::fs;
use std::process::ExitCode;

use ecdf_lu::schema::{SchemaFamily, validate};
use tracing_subscriber::EnvFilter;

/// Validate a file against one of the bundled schemas.
///
/// Usage: `cargo run --example schema_check --features schema -- <ecdf|faia> <file.xml>`
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let (family, path) = match args.as_slice() {
        [_, family, path] if family == "ecdf" => (SchemaFamily::Ecdf, path),
        [_, family, path] if family == "faia" => (SchemaFamily::Faia, path),
        _ => {
            eprintln!("usage: schema_check <ecdf|faia> <file.xml>");
            return ExitCode::from(2);
        }
    };

    let xml = match fs::read(path) {
        Ok(xml) => xml,
        Err(e) => {
            eprintln!("cannot read {path}: {e}");
            return ExitCode::from(2);
        }
    };

    match validate(family, &xml) {
        Ok(()) => {
            println!("{path}: valid against {}", family.file_name());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{path}: {e}");
            ExitCode::FAILURE
        }
    }
}
