#![no_main]

use ecdf_lu::schema::Schema;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(xsd) = std::str::from_utf8(data) {
        if let Ok(schema) = Schema::parse(xsd) {
            let _ = schema.validate(xsd.as_bytes());
        }
    }
});
