#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use echoplate::labware::LabwareRegistry;
use echoplate::picklist::{parse_picklist, PickListParseOptions};
use echoplate::validator::cross_validate;

fuzz_target!(|data: &[u8]| {
    let registry = LabwareRegistry::with_builtin();

    if let Ok(parsed) = parse_picklist(Cursor::new(data), &registry, PickListParseOptions::default()) {
        // Every data row is either an entry or a skipped row
        assert_eq!(
            parsed.value.len() + parsed.warnings.len(),
            parsed.value.source_rows()
        );

        // Validation never fails, whatever the picklist holds
        let _ = cross_validate(&parsed.value, None, &registry);
    }
});
