use serde::Serialize;
use std::fmt;

/// Errors that abort parsing or writing of a survey document
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    /// Structurally broken document (missing root attributes, bad nesting)
    #[error("Malformed survey: {0}")]
    MalformedSurvey(String),

    /// The survey's labware type is not registered
    #[error("Unknown labware type: {0}")]
    UnknownLabware(String),

    /// A well name outside the plate layout
    #[error("Well '{well}' is outside the layout of {labware}")]
    InvalidWellReference {
        /// Well name as written
        well: String,
        /// Labware type of the surveyed plate
        labware: String,
    },

    /// A signal value or unit that cannot be coerced
    #[error("Malformed signal in well {well}: {message}")]
    MalformedSignal {
        /// Well containing the signal
        well: String,
        /// What is wrong with it
        message: String,
    },

    /// The same well appears twice in one plate
    #[error("Duplicate well: {0}")]
    DuplicateWell(String),

    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// I/O error while reading or writing
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Written document is not valid UTF-8
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

/// A record-level problem recovered from in lenient mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SurveyWarning {
    /// A well was dropped from the model
    DroppedWell {
        /// Well name as written
        well: String,
        /// Why it was dropped
        reason: String,
    },
    /// A repeated well replaced its earlier occurrence
    DuplicateOverridden {
        /// Canonical well name
        well: String,
    },
}

impl fmt::Display for SurveyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveyWarning::DroppedWell { well, reason } => {
                write!(f, "dropped well {}: {}", well, reason)
            }
            SurveyWarning::DuplicateOverridden { well } => {
                write!(f, "well {} appears more than once; the later occurrence wins", well)
            }
        }
    }
}
