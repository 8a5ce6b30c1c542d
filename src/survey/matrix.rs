//! Dense, labware-shaped views over a sparse list of surveyed wells.

use serde::Serialize;

use super::models::WellSurvey;
use crate::labware::{LabwareDefinition, WellPosition};

/// One cell of a [`WellMatrix`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatrixCell {
    /// Index into [`PlateSurvey::wells`](super::PlateSurvey::wells)
    Surveyed(usize),
    /// The well was not surveyed
    NoData,
}

impl MatrixCell {
    /// Well index, if surveyed
    pub fn index(self) -> Option<usize> {
        match self {
            MatrixCell::Surveyed(i) => Some(i),
            MatrixCell::NoData => None,
        }
    }
}

/// Row-major grid over every well of the labware
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WellMatrix {
    rows: u16,
    columns: u16,
    cells: Vec<MatrixCell>,
}

impl WellMatrix {
    pub(super) fn build(labware: &LabwareDefinition, wells: &[WellSurvey]) -> Self {
        let columns = labware.columns();
        let mut cells = vec![MatrixCell::NoData; labware.well_count()];
        for (i, well) in wells.iter().enumerate() {
            cells[well.position.linear_index(columns)] = MatrixCell::Surveyed(i);
        }
        Self {
            rows: labware.rows(),
            columns,
            cells,
        }
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (u16, u16) {
        (self.rows, self.columns)
    }

    /// Cell at a position; `None` outside the layout
    pub fn get(&self, pos: WellPosition) -> Option<MatrixCell> {
        if pos.row >= self.rows || pos.column >= self.columns {
            return None;
        }
        self.cells.get(pos.linear_index(self.columns)).copied()
    }

    /// All cells, row-major
    pub fn cells(&self) -> &[MatrixCell] {
        &self.cells
    }

    /// Rows of cells
    pub fn rows(&self) -> impl Iterator<Item = &[MatrixCell]> {
        self.cells.chunks(self.columns as usize)
    }

    /// Number of surveyed cells
    pub fn surveyed_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, MatrixCell::Surveyed(_)))
            .count()
    }
}

/// Value of one feature kind at one well
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CellValue {
    /// Canonical value (nL for volumes, mm for lengths)
    Value(f64),
    /// The well was surveyed but carries no feature of this kind
    NotMeasured,
    /// The well was not surveyed
    NoData,
}

impl CellValue {
    /// The value, if any
    pub fn value(self) -> Option<f64> {
        match self {
            CellValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Dense grid of one feature kind across the plate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueGrid {
    kind: String,
    rows: u16,
    columns: u16,
    cells: Vec<CellValue>,
}

impl ValueGrid {
    pub(super) fn new(kind: &str, rows: u16, columns: u16, cells: Vec<CellValue>) -> Self {
        Self {
            kind: kind.to_string(),
            rows,
            columns,
            cells,
        }
    }

    /// Feature kind of the grid
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (u16, u16) {
        (self.rows, self.columns)
    }

    /// Value at a position; `None` outside the layout
    pub fn get(&self, pos: WellPosition) -> Option<CellValue> {
        if pos.row >= self.rows || pos.column >= self.columns {
            return None;
        }
        self.cells.get(pos.linear_index(self.columns)).copied()
    }

    /// All cells, row-major
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Rows of cells
    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.cells.chunks(self.columns as usize)
    }
}
