#![no_main]

use assessrec::catalog::{parse_assessment_length, StoredDocument};
use assessrec::CatalogRecord;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(record) = serde_json::from_slice::<CatalogRecord>(data) else {
        return;
    };

    let doc = StoredDocument::from_record(&record, Vec::new());
    assert_eq!(doc.name, record.name);
    assert_eq!(doc.assessment_length, parse_assessment_length(&record.assessment_length));
    assert!(doc.text.starts_with("Name: "));
    let _ = doc.test_types();
});
