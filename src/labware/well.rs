//! Well positions and the letter/number well naming scheme.
//!
//! Rows are lettered `A`..`Z`, then `AA`, `AB`, … (a 1536-well plate runs
//! `A`..`AF`); columns are numbered from 1. Parsing is case-insensitive and
//! accepts zero-padded columns, so `C7`, `c7` and `C07` all name the same well.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::LabwareError;

/// Longest row label accepted by the parser
const MAX_ROW_LETTERS: usize = 3;

/// Zero-based position of a well on a plate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct WellPosition {
    /// Row index (0 = `A`)
    pub row: u16,
    /// Column index (0 = column `1`)
    pub column: u16,
}

impl WellPosition {
    /// Create a position from zero-based row and column indices
    pub fn new(row: u16, column: u16) -> Self {
        Self { row, column }
    }

    /// Parse a well name such as `B12` or `AF048`
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let split = name.find(|c: char| !c.is_ascii_alphabetic())?;
        let (letters, digits) = name.split_at(split);
        if letters.is_empty() || letters.len() > MAX_ROW_LETTERS {
            return None;
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let row = row_index(letters)?;
        let column: u16 = digits.parse().ok()?;
        if column == 0 {
            return None;
        }
        Some(Self::new(row, column - 1))
    }

    /// Row label, e.g. `A` or `AF`
    pub fn row_label(&self) -> String {
        row_label(self.row)
    }

    /// Format this position with the given naming convention.
    ///
    /// `columns` is the column count of the plate and sets the padding width
    /// for [`WellNaming::ZeroPadded`].
    pub fn format(&self, naming: WellNaming, columns: u16) -> String {
        match naming {
            WellNaming::Alphanumeric => format!("{}{}", self.row_label(), self.column + 1),
            WellNaming::ZeroPadded => {
                let width = columns.max(1).to_string().len();
                format!("{}{:0width$}", self.row_label(), self.column + 1, width = width)
            }
        }
    }

    /// Row-major linear index on a plate with `columns` columns
    pub fn linear_index(&self, columns: u16) -> usize {
        self.row as usize * columns as usize + self.column as usize
    }
}

impl fmt::Display for WellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_label(), self.column + 1)
    }
}

impl FromStr for WellPosition {
    type Err = LabwareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| LabwareError::InvalidWellName(s.to_string()))
    }
}

impl From<WellPosition> for String {
    fn from(pos: WellPosition) -> Self {
        pos.to_string()
    }
}

impl TryFrom<String> for WellPosition {
    type Error = LabwareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Column formatting convention of a labware type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellNaming {
    /// `A1`, `B12`
    #[default]
    Alphanumeric,
    /// `A01`, `B12` (padded to the width of the column count)
    ZeroPadded,
}

/// Bijective base-26 row label: 0 → `A`, 25 → `Z`, 26 → `AA`
fn row_label(row: u16) -> String {
    let mut label = Vec::new();
    let mut n = row as u32 + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        label.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

fn row_index(letters: &str) -> Option<u16> {
    let mut n: u32 = 0;
    for b in letters.bytes() {
        let digit = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        n = n * 26 + digit;
    }
    u16::try_from(n - 1).ok()
}
