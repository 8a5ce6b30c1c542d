use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{LabwareError, WellNaming, WellPosition};

/// Role of a plate type on the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateUsage {
    /// Aspirated from (`SRC`)
    Source,
    /// Dispensed into (`DEST`)
    Destination,
}

impl PlateUsage {
    /// Vendor spelling used in labware files
    pub fn as_vendor_str(self) -> &'static str {
        match self {
            PlateUsage::Source => "SRC",
            PlateUsage::Destination => "DEST",
        }
    }

    /// Parse the vendor spelling (`SRC`, `DEST`, case-insensitive)
    pub fn from_vendor_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SRC" | "SOURCE" => Some(PlateUsage::Source),
            "DEST" | "DESTINATION" => Some(PlateUsage::Destination),
            _ => None,
        }
    }
}

/// Geometry and volume limits of one labware type.
///
/// Definitions are immutable once built; use [`LabwareDefinition::builder`]
/// to create one. All volumes are in nanoliters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabwareDefinition {
    name: String,
    usage: PlateUsage,
    format: String,
    rows: u16,
    columns: u16,
    naming: WellNaming,
    capacity_nl: f64,
    dead_volume_nl: f64,
    drop_volume_nl: Option<f64>,
    well_capacity_overrides: BTreeMap<WellPosition, f64>,
}

impl LabwareDefinition {
    /// Start building a definition with the required geometry
    pub fn builder(
        name: impl Into<String>,
        usage: PlateUsage,
        rows: u16,
        columns: u16,
    ) -> LabwareBuilder {
        LabwareBuilder {
            name: name.into(),
            usage,
            format: None,
            rows,
            columns,
            naming: WellNaming::default(),
            capacity_nl: 0.0,
            dead_volume_nl: 0.0,
            drop_volume_nl: None,
            well_capacity_overrides: BTreeMap::new(),
        }
    }

    /// Labware type name (identity)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source or destination plate
    pub fn usage(&self) -> PlateUsage {
        self.usage
    }

    /// Vendor plate format string (e.g. `384PP`)
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Number of rows
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Number of columns
    pub fn columns(&self) -> u16 {
        self.columns
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (u16, u16) {
        (self.rows, self.columns)
    }

    /// Total number of wells
    pub fn well_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Naming convention used when formatting well names
    pub fn naming(&self) -> WellNaming {
        self.naming
    }

    /// Nominal well capacity
    pub fn capacity_nl(&self) -> f64 {
        self.capacity_nl
    }

    /// Volume that cannot be reliably aspirated
    pub fn dead_volume_nl(&self) -> f64 {
        self.dead_volume_nl
    }

    /// Smallest transferable increment, when the instrument enforces one
    pub fn drop_volume_nl(&self) -> Option<f64> {
        self.drop_volume_nl
    }

    /// Per-well capacity overrides
    pub fn well_capacity_overrides(&self) -> &BTreeMap<WellPosition, f64> {
        &self.well_capacity_overrides
    }

    /// Whether a position lies inside the layout
    pub fn contains(&self, pos: WellPosition) -> bool {
        pos.row < self.rows && pos.column < self.columns
    }

    /// Resolve a well name against this layout
    pub fn parse_well(&self, name: &str) -> Result<WellPosition, LabwareError> {
        match WellPosition::parse(name) {
            Some(pos) if self.contains(pos) => Ok(pos),
            _ => Err(LabwareError::InvalidWellReference {
                well: name.to_string(),
                labware: self.name.clone(),
            }),
        }
    }

    /// Canonical name of a position under this labware's naming convention
    pub fn well_name(&self, pos: WellPosition) -> String {
        pos.format(self.naming, self.columns)
    }

    /// Capacity of one well (override or nominal)
    pub fn well_capacity_nl(&self, pos: WellPosition) -> f64 {
        self.well_capacity_overrides
            .get(&pos)
            .copied()
            .unwrap_or(self.capacity_nl)
    }

    /// Aspirable volume of a full well: capacity minus dead volume
    pub fn usable_volume_nl(&self, pos: WellPosition) -> f64 {
        (self.well_capacity_nl(pos) - self.dead_volume_nl).max(0.0)
    }

    /// All positions in row-major order
    pub fn wells(&self) -> impl Iterator<Item = WellPosition> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.columns).map(move |c| WellPosition::new(r, c)))
    }
}

/// Builder for [`LabwareDefinition`]
#[derive(Debug, Clone)]
pub struct LabwareBuilder {
    name: String,
    usage: PlateUsage,
    format: Option<String>,
    rows: u16,
    columns: u16,
    naming: WellNaming,
    capacity_nl: f64,
    dead_volume_nl: f64,
    drop_volume_nl: Option<f64>,
    well_capacity_overrides: BTreeMap<WellPosition, f64>,
}

impl LabwareBuilder {
    /// Set the vendor plate format string
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set the naming convention
    pub fn naming(mut self, naming: WellNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Set the nominal well capacity (nL)
    pub fn capacity_nl(mut self, capacity: f64) -> Self {
        self.capacity_nl = capacity;
        self
    }

    /// Set the dead volume (nL)
    pub fn dead_volume_nl(mut self, dead_volume: f64) -> Self {
        self.dead_volume_nl = dead_volume;
        self
    }

    /// Set the drop volume (nL)
    pub fn drop_volume_nl(mut self, drop_volume: f64) -> Self {
        self.drop_volume_nl = Some(drop_volume);
        self
    }

    /// Override the capacity of a single well (nL)
    pub fn well_capacity(mut self, pos: WellPosition, capacity: f64) -> Self {
        self.well_capacity_overrides.insert(pos, capacity);
        self
    }

    /// Validate the invariants and build the definition
    pub fn build(self) -> Result<LabwareDefinition, LabwareError> {
        let invalid = |reason: String| LabwareError::InvalidDefinition {
            name: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if self.rows == 0 || self.columns == 0 {
            return Err(invalid(format!(
                "rows and columns must be positive, got {}x{}",
                self.rows, self.columns
            )));
        }
        if !self.capacity_nl.is_finite() || self.capacity_nl <= 0.0 {
            return Err(invalid(format!("capacity must be positive, got {}", self.capacity_nl)));
        }
        if !self.dead_volume_nl.is_finite()
            || self.dead_volume_nl < 0.0
            || self.dead_volume_nl > self.capacity_nl
        {
            return Err(invalid(format!(
                "dead volume {} must lie within [0, {}]",
                self.dead_volume_nl, self.capacity_nl
            )));
        }
        if let Some(drop) = self.drop_volume_nl {
            if !drop.is_finite() || drop <= 0.0 {
                return Err(invalid(format!("drop volume must be positive, got {}", drop)));
            }
        }
        for (pos, capacity) in &self.well_capacity_overrides {
            if pos.row >= self.rows || pos.column >= self.columns {
                return Err(invalid(format!("capacity override for {} is outside the layout", pos)));
            }
            if !capacity.is_finite() || *capacity < 0.0 {
                return Err(invalid(format!("capacity override for {} must be non-negative", pos)));
            }
        }

        let format = self
            .format
            .unwrap_or_else(|| format!("{}", self.rows as usize * self.columns as usize));

        Ok(LabwareDefinition {
            name: self.name,
            usage: self.usage,
            format,
            rows: self.rows,
            columns: self.columns,
            naming: self.naming,
            capacity_nl: self.capacity_nl,
            dead_volume_nl: self.dead_volume_nl,
            drop_volume_nl: self.drop_volume_nl,
            well_capacity_overrides: self.well_capacity_overrides,
        })
    }
}
