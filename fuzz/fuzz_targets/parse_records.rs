//! Arbitrary bytes through the record parser: must return `Ok` or `Err`, and
//! every parsed record must either validate or produce a score range error.

#![no_main]

use evalgate_adapters::parse_records;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(records) = parse_records(Path::new("fuzz.jsonl"), text) {
        for r in &records {
            if let Err(e) = r.validate() {
                assert_eq!(e.record_id, r.id);
            }
        }
    }
});
