//! # Survey Module
//!
//! Parses plate-survey XML into a [`PlateSurvey`]: plate metadata plus one
//! [`WellSurvey`] per surveyed well, each carrying typed [`SignalFeature`]s.
//!
//! Two dialects are recognised from the root element:
//!
//! - `platesurvey`: the raw survey written by the instrument
//! - `report`: the cherry-pick survey report (header, records, footer)
//!
//! Wells are resolved against the labware named in the document. Out-of-layout
//! and duplicate wells abort the parse in [`ParseMode::Strict`] (the default)
//! and become [`SurveyWarning`]s in [`ParseMode::Lenient`]. Malformed signal
//! values always abort.
//!
//! ## Usage
//!
//! ```rust
//! use echoplate::labware::{LabwareRegistry, WellPosition};
//! use echoplate::survey::{parse_survey_str, CellValue, MatrixCell, SurveyParseOptions};
//!
//! let xml = r#"<platesurvey name="Corning_96_3590" barcode="P1" date="2024-01-15T10:30:00">
//!   <w n="A1"><f t="peak_height" v="12.5" u="RFU"/></w>
//!   <w n="B1"/>
//! </platesurvey>"#;
//!
//! let registry = LabwareRegistry::with_builtin();
//! let survey = parse_survey_str(xml, &registry, SurveyParseOptions::default())?.into_value();
//!
//! assert_eq!(survey.len(), 1);
//! assert_eq!(survey.matrix().get(WellPosition::new(1, 0)), Some(MatrixCell::NoData));
//! let grid = survey.value_grid("peak_height");
//! assert_eq!(grid.get(WellPosition::new(0, 0)), Some(CellValue::Value(12.5)));
//! # Ok::<(), echoplate::survey::SurveyError>(())
//! ```
//!
//! [`ParseMode::Strict`]: crate::outcome::ParseMode::Strict
//! [`ParseMode::Lenient`]: crate::outcome::ParseMode::Lenient

mod collector;
mod error;
mod matrix;
mod models;
mod parser;
mod platesurvey;
mod report;
mod signal;
mod writer;

#[cfg(test)]
mod tests;

pub use error::{SurveyError, SurveyWarning};
pub use matrix::{CellValue, MatrixCell, ValueGrid, WellMatrix};
pub use models::{
    InstrumentInfo, PlateSurvey, SurveyMetadata, SurveyTimestamp, WellSurvey, UNKNOWN_BARCODE,
};
pub use parser::{parse_survey, parse_survey_str, SurveyParseOptions};
pub use signal::{feature_kinds, Dimension, SignalFeature, Unit};
pub use writer::{write_survey, write_survey_to};
