use std::io::BufRead;

use log::{debug, info};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use super::models::PlateSurvey;
use super::{SurveyError, SurveyWarning};
use crate::labware::LabwareRegistry;
use crate::outcome::{ParseMode, Parsed};

/// Options for [`parse_survey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyParseOptions {
    /// Reaction to out-of-layout and duplicate wells
    pub mode: ParseMode,
}

impl SurveyParseOptions {
    /// Abort on the first offending well (default)
    pub fn strict() -> Self {
        Self {
            mode: ParseMode::Strict,
        }
    }

    /// Drop offending wells and collect warnings
    pub fn lenient() -> Self {
        Self {
            mode: ParseMode::Lenient,
        }
    }
}

impl Default for SurveyParseOptions {
    fn default() -> Self {
        Self::strict()
    }
}

/// Parse a survey document of either dialect.
///
/// The labware type named in the document is resolved through `registry`
/// once; the resulting survey holds its own snapshot of the definition.
pub fn parse_survey<R: BufRead>(
    reader: R,
    registry: &LabwareRegistry,
    options: SurveyParseOptions,
) -> Result<Parsed<PlateSurvey, SurveyWarning>, SurveyError> {
    let parsed = SurveyParser::new(reader, registry, options).parse()?;
    info!(
        "Parsed survey of plate {} ({}): {} wells, {} warnings",
        parsed.value.plate_id(),
        parsed.value.labware().name(),
        parsed.value.len(),
        parsed.warnings.len()
    );
    Ok(parsed)
}

/// [`parse_survey`] over an in-memory document
pub fn parse_survey_str(
    xml: &str,
    registry: &LabwareRegistry,
    options: SurveyParseOptions,
) -> Result<Parsed<PlateSurvey, SurveyWarning>, SurveyError> {
    parse_survey(xml.as_bytes(), registry, options)
}

/// Pull parser shared by the survey dialects
pub(super) struct SurveyParser<'a, R> {
    pub(super) reader: Reader<R>,
    pub(super) registry: &'a LabwareRegistry,
    pub(super) options: SurveyParseOptions,
}

impl<'a, R: BufRead> SurveyParser<'a, R> {
    fn new(reader: R, registry: &'a LabwareRegistry, options: SurveyParseOptions) -> Self {
        let mut reader = Reader::from_reader(reader);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            registry,
            options,
        }
    }

    fn parse(&mut self) -> Result<Parsed<PlateSurvey, SurveyWarning>, SurveyError> {
        let mut buf = Vec::new();
        loop {
            let event = self.reader.read_event_into(&mut buf)?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let self_closing = matches!(event, Event::Empty(_));
                    let root = e.clone().into_owned();
                    return match root.name().as_ref() {
                        b"platesurvey" => {
                            debug!("Reading platesurvey document");
                            self.parse_plate_survey(&root, self_closing)
                        }
                        b"report" => {
                            debug!("Reading survey report document");
                            self.parse_report(self_closing)
                        }
                        _ => Err(SurveyError::MalformedSurvey(format!(
                            "unrecognised root element <{}>",
                            crate::xml::element_name(&root)
                        ))),
                    };
                }
                Event::Eof => {
                    return Err(SurveyError::MalformedSurvey(
                        "document has no root element".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
    }
}
