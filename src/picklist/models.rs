use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::labware::WellPosition;

/// Unit of the transfer volume column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeUnit {
    /// nL, the instrument's base unit
    #[default]
    #[serde(rename = "nL", alias = "nl")]
    Nanoliter,
    /// µL
    #[serde(rename = "uL", alias = "ul", alias = "µL")]
    Microliter,
    /// mL
    #[serde(rename = "mL", alias = "ml")]
    Milliliter,
}

impl VolumeUnit {
    /// Nanoliters per unit
    pub fn nl_factor(self) -> f64 {
        match self {
            VolumeUnit::Nanoliter => 1.0,
            VolumeUnit::Microliter => 1_000.0,
            VolumeUnit::Milliliter => 1_000_000.0,
        }
    }

    /// Symbol as written in headers
    pub fn symbol(self) -> &'static str {
        match self {
            VolumeUnit::Nanoliter => "nL",
            VolumeUnit::Microliter => "uL",
            VolumeUnit::Milliliter => "mL",
        }
    }
}

impl fmt::Display for VolumeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for VolumeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nl" => Ok(VolumeUnit::Nanoliter),
            "ul" | "µl" | "μl" => Ok(VolumeUnit::Microliter),
            "ml" => Ok(VolumeUnit::Milliliter),
            other => Err(format!("unknown volume unit '{}'", other)),
        }
    }
}

/// One side of a transfer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateWell {
    /// Plate name column
    pub plate_name: Option<String>,
    /// Plate type (labware) column
    pub plate_type: Option<String>,
    /// Plate barcode column
    pub plate_barcode: Option<String>,
    /// Resolved well position
    pub well: WellPosition,
    /// Well cell as written
    pub well_name: String,
}

impl PlateWell {
    /// Label used to group transfers by plate: name, else barcode, else empty
    pub fn plate_label(&self) -> &str {
        self.plate_name
            .as_deref()
            .or(self.plate_barcode.as_deref())
            .unwrap_or("")
    }
}

/// A validated transfer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickListEntry {
    /// Position among validated entries
    pub index: usize,
    /// Zero-based data-row index in the source file
    pub row: usize,
    /// Where liquid is taken from
    pub source: PlateWell,
    /// Where liquid is dispensed
    pub destination: PlateWell,
    /// Transfer volume in nL
    pub volume_nl: f64,
    /// Sample name column
    pub sample_name: Option<String>,
    /// Destination sample name column
    pub destination_sample_name: Option<String>,
    /// Vendor-specific columns, keyed by header as written
    pub metadata: BTreeMap<String, String>,
}

/// Withdrawn or delivered volume per (plate label, well)
pub type WellVolumes = BTreeMap<(String, WellPosition), f64>;

/// Validated transfers in file order.
///
/// Entries are never reordered; order is execution order on the instrument.
/// `len()` plus the number of skipped rows equals `source_rows()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickList {
    entries: Vec<PickListEntry>,
    source_rows: usize,
    volume_unit: VolumeUnit,
    metadata_columns: Vec<String>,
}

impl PickList {
    pub(super) fn new(
        entries: Vec<PickListEntry>,
        source_rows: usize,
        volume_unit: VolumeUnit,
        metadata_columns: Vec<String>,
    ) -> Self {
        Self {
            entries,
            source_rows,
            volume_unit,
            metadata_columns,
        }
    }

    /// Validated entries in file order
    pub fn entries(&self) -> &[PickListEntry] {
        &self.entries
    }

    /// Iterate over entries
    pub fn iter(&self) -> std::slice::Iter<'_, PickListEntry> {
        self.entries.iter()
    }

    /// Entry by validated index
    pub fn get(&self, index: usize) -> Option<&PickListEntry> {
        self.entries.get(index)
    }

    /// Number of validated entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry survived validation
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of data rows in the source file
    pub fn source_rows(&self) -> usize {
        self.source_rows
    }

    /// Number of rows dropped during parsing
    pub fn skipped_rows(&self) -> usize {
        self.source_rows - self.entries.len()
    }

    /// Unit the volume column was written in
    pub fn volume_unit(&self) -> VolumeUnit {
        self.volume_unit
    }

    /// Vendor-specific column names, in header order
    pub fn metadata_columns(&self) -> &[String] {
        &self.metadata_columns
    }

    /// Total volume taken from each source well
    pub fn source_withdrawals(&self) -> WellVolumes {
        let mut totals = WellVolumes::new();
        for entry in &self.entries {
            *totals
                .entry((entry.source.plate_label().to_string(), entry.source.well))
                .or_insert(0.0) += entry.volume_nl;
        }
        totals
    }

    /// Total volume delivered to each destination well
    pub fn destination_totals(&self) -> WellVolumes {
        let mut totals = WellVolumes::new();
        for entry in &self.entries {
            *totals
                .entry((
                    entry.destination.plate_label().to_string(),
                    entry.destination.well,
                ))
                .or_insert(0.0) += entry.volume_nl;
        }
        totals
    }

    /// Sum of all transfer volumes in nL
    pub fn total_volume_nl(&self) -> f64 {
        self.entries.iter().map(|e| e.volume_nl).sum()
    }

    /// Join picklists end to end.
    ///
    /// Rows of each list are renumbered after the rows of the lists before
    /// it, so `row` stays increasing and `len() + skipped_rows()` still equals
    /// `source_rows()`. Metadata columns are merged in first-seen order. The
    /// volume unit is kept when all parts agree and is nL otherwise.
    pub fn concat<I>(picklists: I) -> PickList
    where
        I: IntoIterator<Item = PickList>,
    {
        let mut entries = Vec::new();
        let mut source_rows = 0;
        let mut volume_unit: Option<VolumeUnit> = None;
        let mut mixed_units = false;
        let mut metadata_columns: Vec<String> = Vec::new();

        for part in picklists {
            match volume_unit {
                None => volume_unit = Some(part.volume_unit),
                Some(unit) if unit != part.volume_unit => mixed_units = true,
                Some(_) => {}
            }
            for column in part.metadata_columns {
                if !metadata_columns.contains(&column) {
                    metadata_columns.push(column);
                }
            }
            for mut entry in part.entries {
                entry.index = entries.len();
                entry.row += source_rows;
                entries.push(entry);
            }
            source_rows += part.source_rows;
        }

        let volume_unit = if mixed_units {
            VolumeUnit::Nanoliter
        } else {
            volume_unit.unwrap_or_default()
        };
        PickList::new(entries, source_rows, volume_unit, metadata_columns)
    }
}

impl<'a> IntoIterator for &'a PickList {
    type Item = &'a PickListEntry;
    type IntoIter = std::slice::Iter<'a, PickListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
