#![no_main]

use ecdf_lu::schema::{SchemaFamily, validate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must not panic; violations are fine.
    let _ = validate(SchemaFamily::Ecdf, data);
    let _ = validate(SchemaFamily::Faia, data);
});
