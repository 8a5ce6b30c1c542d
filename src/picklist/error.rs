use std::fmt;

/// Errors raised while reading or writing a picklist.
///
/// Row numbers are zero-based data-row indices (the header is not counted).
#[derive(Debug, thiserror::Error)]
pub enum PickListError {
    /// Missing required column or empty required cell
    #[error("Malformed picklist{}: {message}", at_row(.row))]
    MalformedPickList {
        /// Offending data row, `None` for header problems
        row: Option<usize>,
        /// What is wrong
        message: String,
    },

    /// Non-numeric, negative or non-finite transfer volume
    #[error("Invalid transfer volume '{value}' at row {row}")]
    InvalidVolume {
        /// Offending data row
        row: usize,
        /// Volume cell as written
        value: String,
    },

    /// Well name that cannot be parsed or lies outside the plate layout
    #[error("Invalid well reference '{well}' at row {row}{}", on_labware(.labware))]
    InvalidWellReference {
        /// Offending data row
        row: usize,
        /// Well cell as written
        well: String,
        /// Plate type the well was checked against, when known
        labware: Option<String>,
    },

    /// Plate type column names an unregistered labware type
    #[error("Unknown labware type '{labware}' at row {row}")]
    UnknownLabware {
        /// Offending data row
        row: usize,
        /// Plate type as written
        labware: String,
    },

    /// Error from the CSV reader or writer
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PickListError {
    /// Data row the error refers to, if any
    pub fn row(&self) -> Option<usize> {
        match self {
            PickListError::MalformedPickList { row, .. } => *row,
            PickListError::InvalidVolume { row, .. }
            | PickListError::InvalidWellReference { row, .. }
            | PickListError::UnknownLabware { row, .. } => Some(*row),
            PickListError::Csv(_) | PickListError::Io(_) => None,
        }
    }
}

fn at_row(row: &Option<usize>) -> String {
    row.map(|r| format!(" at row {}", r)).unwrap_or_default()
}

fn on_labware(labware: &Option<String>) -> String {
    labware
        .as_ref()
        .map(|l| format!(" on {}", l))
        .unwrap_or_default()
}

/// A data row dropped in lenient mode
#[derive(Debug)]
pub struct SkippedRow {
    /// Zero-based data-row index
    pub row: usize,
    /// One-based line number in the file, when the reader knows it
    pub line: Option<u64>,
    /// Why the row was dropped
    pub error: PickListError,
}

impl fmt::Display for SkippedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "skipped row {} (line {}): {}", self.row, line, self.error),
            None => write!(f, "skipped row {}: {}", self.row, self.error),
        }
    }
}
