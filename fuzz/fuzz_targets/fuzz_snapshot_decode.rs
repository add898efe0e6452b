#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Ok(map) = inio_core::snapshot::from_json(data) else {
        return;
    };
    // Anything that decodes must survive compaction and re-encoding.
    let compacted = map.compact();
    assert!(compacted.len() <= map.len());
    assert!(!compacted.has_duplicates());
    if let Ok(text) = inio_core::snapshot::to_json(&compacted) {
        let again = inio_core::snapshot::from_json(&text);
        assert!(again.is_ok_and(|m| m.len() == compacted.len()));
    }
});
