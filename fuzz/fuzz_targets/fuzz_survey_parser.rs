#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use echoplate::labware::LabwareRegistry;
use echoplate::survey::{parse_survey, write_survey, SurveyParseOptions};

fuzz_target!(|data: &[u8]| {
    let registry = LabwareRegistry::with_builtin();

    // Any input must either parse or fail with an error, in both modes
    for options in [SurveyParseOptions::strict(), SurveyParseOptions::lenient()] {
        if let Ok(parsed) = parse_survey(Cursor::new(data), &registry, options) {
            let survey = parsed.value;
            let _ = survey.matrix();

            // Whatever parsed must write and parse again
            let written = write_survey(&survey).expect("parsed survey must be writable");
            let reparsed = parse_survey(Cursor::new(written.as_bytes()), &registry, options)
                .expect("written survey must parse");
            assert_eq!(reparsed.value.len(), survey.len());
        }
    }
});
