//! Parse modes and tagged parse results shared by the survey and picklist parsers.
//!
//! A document moves through `Unparsed → Parsing → {Valid, Invalid}`. The
//! `Invalid` state is the `Err` arm of a parse function; no partial model
//! escapes it. Successful parses return [`Parsed`], which carries any
//! warnings collected in lenient mode and reports [`ParseStatus::Valid`] or
//! [`ParseStatus::ValidWithWarnings`].

use serde::{Deserialize, Serialize};

/// How a parser reacts to a recoverable, record-level problem.
///
/// Surveys default to [`ParseMode::Strict`] and picklists to
/// [`ParseMode::Lenient`]. The asymmetry mirrors how the instrument output is
/// used in practice (a partial picklist is still operationally meaningful,
/// a partial survey is not) and is a policy choice that can be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Abort the whole document on the first offending record
    Strict,
    /// Drop the offending record, record a warning and keep going
    Lenient,
}

impl ParseMode {
    /// Whether this mode aborts on record-level errors
    pub fn is_strict(self) -> bool {
        matches!(self, ParseMode::Strict)
    }
}

impl std::str::FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ParseMode::Strict),
            "lenient" => Ok(ParseMode::Lenient),
            other => Err(format!("unknown parse mode '{}' (expected strict or lenient)", other)),
        }
    }
}

/// Terminal success state of a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseStatus {
    /// Parsed without any finding
    Valid,
    /// Parsed in lenient mode with a non-empty warning list
    ValidWithWarnings,
}

/// A successfully parsed model together with the warnings raised on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T, W> {
    /// The validated model
    pub value: T,
    /// Record-level findings that were recovered from
    pub warnings: Vec<W>,
}

impl<T, W> Parsed<T, W> {
    /// Wrap a model and its warnings
    pub fn new(value: T, warnings: Vec<W>) -> Self {
        Self { value, warnings }
    }

    /// Terminal status of the parse
    pub fn status(&self) -> ParseStatus {
        if self.warnings.is_empty() {
            ParseStatus::Valid
        } else {
            ParseStatus::ValidWithWarnings
        }
    }

    /// Whether the document parsed without warnings
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Discard the warnings and keep the model
    pub fn into_value(self) -> T {
        self.value
    }
}
