use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

use super::matrix::{CellValue, ValueGrid, WellMatrix};
use super::signal::{feature_kinds, SignalFeature};
use super::SurveyError;
use crate::labware::{LabwareDefinition, WellPosition};

/// Vendor placeholder written when the plate had no readable barcode
pub const UNKNOWN_BARCODE: &str = "UnknownBarCode";

/// Measurements for one surveyed well
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellSurvey {
    /// Position under the plate's labware
    pub position: WellPosition,
    /// Canonical well name under the labware naming convention
    pub name: String,
    /// Instrument status text for this well
    pub status: Option<String>,
    /// Signal features in document order
    pub features: Vec<SignalFeature>,
    /// Pass-through vendor attributes
    pub attributes: BTreeMap<String, String>,
}

impl WellSurvey {
    /// First feature of the given kind
    pub fn feature(&self, kind: &str) -> Option<&SignalFeature> {
        self.features.iter().find(|f| f.kind == kind)
    }

    /// All features of the given kind, in document order
    pub fn features_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a SignalFeature> {
        self.features.iter().filter(move |f| f.kind == kind)
    }

    /// Measured volume in nL, if the well carries a `volume` feature
    pub fn volume_nl(&self) -> Option<f64> {
        self.feature(feature_kinds::VOLUME)
            .map(SignalFeature::canonical_value)
    }
}

/// Survey time as written, plus its parsed value when the format is recognised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyTimestamp {
    /// The date string exactly as it appeared in the document
    pub raw: String,
    /// Parsed value, `None` for unrecognised formats
    pub parsed: Option<NaiveDateTime>,
}

impl SurveyTimestamp {
    const FORMATS: [&'static str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%m/%d/%Y %I:%M:%S %p",
        "%m/%d/%Y %H:%M:%S",
    ];

    /// Keep `raw` and try the date formats the instrument software emits
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        let parsed = DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.naive_local())
            .ok()
            .or_else(|| {
                Self::FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            });
        Self { raw, parsed }
    }
}

/// Instrument identification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstrumentInfo {
    /// Instrument serial number
    pub serial_number: Option<String>,
    /// Instrument name
    pub name: Option<String>,
    /// Instrument model
    pub model: Option<String>,
    /// Control software version
    pub software_version: Option<String>,
}

impl InstrumentInfo {
    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.serial_number.is_none()
            && self.name.is_none()
            && self.model.is_none()
            && self.software_version.is_none()
    }
}

/// Plate-level survey metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyMetadata {
    /// Plate identifier (barcode as written, possibly the vendor placeholder)
    pub plate_id: String,
    /// User-facing plate name
    pub plate_name: Option<String>,
    /// When the survey was taken
    pub timestamp: SurveyTimestamp,
    /// Instrument that took the survey
    pub instrument: InstrumentInfo,
    /// Vendor data format version (`frmt`)
    pub format_version: Option<String>,
    /// Pass-through plate-level attributes
    pub attributes: BTreeMap<String, String>,
}

impl SurveyMetadata {
    /// Minimal metadata with a plate id and a timestamp
    pub fn new(plate_id: impl Into<String>, timestamp: SurveyTimestamp) -> Self {
        Self {
            plate_id: plate_id.into(),
            plate_name: None,
            timestamp,
            instrument: InstrumentInfo::default(),
            format_version: None,
            attributes: BTreeMap::new(),
        }
    }
}

/// Surveyed wells of one physical plate.
///
/// Every well resolves under `labware`, each position appears at most once
/// and each well carries at least one feature. The dense [`WellMatrix`] is
/// built on first use and cached.
#[derive(Debug, Clone, Serialize)]
pub struct PlateSurvey {
    metadata: SurveyMetadata,
    labware: Arc<LabwareDefinition>,
    wells: Vec<WellSurvey>,
    #[serde(skip)]
    index: HashMap<WellPosition, usize>,
    #[serde(skip)]
    matrix: OnceLock<WellMatrix>,
}

impl PlateSurvey {
    /// Assemble a survey, checking the plate invariants
    pub fn new(
        metadata: SurveyMetadata,
        labware: Arc<LabwareDefinition>,
        wells: Vec<WellSurvey>,
    ) -> Result<Self, SurveyError> {
        let mut index = HashMap::with_capacity(wells.len());
        for (i, well) in wells.iter().enumerate() {
            if !labware.contains(well.position) {
                return Err(SurveyError::InvalidWellReference {
                    well: well.name.clone(),
                    labware: labware.name().to_string(),
                });
            }
            if well.features.is_empty() {
                return Err(SurveyError::MalformedSurvey(format!(
                    "well {} has no signal features",
                    well.name
                )));
            }
            if index.insert(well.position, i).is_some() {
                return Err(SurveyError::DuplicateWell(well.name.clone()));
            }
        }

        Ok(Self {
            metadata,
            labware,
            wells,
            index,
            matrix: OnceLock::new(),
        })
    }

    /// Plate-level metadata
    pub fn metadata(&self) -> &SurveyMetadata {
        &self.metadata
    }

    /// Plate identifier as written
    pub fn plate_id(&self) -> &str {
        &self.metadata.plate_id
    }

    /// Plate barcode, `None` when the instrument could not read one
    pub fn barcode(&self) -> Option<&str> {
        let id = self.metadata.plate_id.trim();
        if id.is_empty() || id == UNKNOWN_BARCODE {
            None
        } else {
            Some(id)
        }
    }

    /// Labware snapshot taken at parse time
    pub fn labware(&self) -> &Arc<LabwareDefinition> {
        &self.labware
    }

    /// Surveyed wells in document order
    pub fn wells(&self) -> &[WellSurvey] {
        &self.wells
    }

    /// Number of surveyed wells
    pub fn len(&self) -> usize {
        self.wells.len()
    }

    /// Whether no well was surveyed
    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    /// Survey of one position
    pub fn well(&self, pos: WellPosition) -> Option<&WellSurvey> {
        self.index.get(&pos).map(|&i| &self.wells[i])
    }

    /// Survey of a well by name, resolved under the plate's labware
    pub fn well_by_name(&self, name: &str) -> Option<&WellSurvey> {
        self.labware
            .parse_well(name)
            .ok()
            .and_then(|pos| self.well(pos))
    }

    /// Dense labware-shaped view; computed once and cached
    pub fn matrix(&self) -> &WellMatrix {
        self.matrix
            .get_or_init(|| WellMatrix::build(&self.labware, &self.wells))
    }

    /// Per-well values of one feature kind, in canonical units.
    ///
    /// Wells missing from the survey are [`CellValue::NoData`]; surveyed
    /// wells without that feature are [`CellValue::NotMeasured`].
    pub fn value_grid(&self, kind: &str) -> ValueGrid {
        let cells = self
            .matrix()
            .cells()
            .iter()
            .map(|cell| match cell.index() {
                None => CellValue::NoData,
                Some(i) => self.wells[i]
                    .feature(kind)
                    .map(|f| CellValue::Value(f.canonical_value()))
                    .unwrap_or(CellValue::NotMeasured),
            })
            .collect();
        ValueGrid::new(kind, self.labware.rows(), self.labware.columns(), cells)
    }

    /// Bounding box `(top_left, bottom_right)` of the surveyed wells
    pub fn extent(&self) -> Option<(WellPosition, WellPosition)> {
        let first = self.wells.first()?.position;
        let (mut min, mut max) = (first, first);
        for well in &self.wells {
            min.row = min.row.min(well.position.row);
            min.column = min.column.min(well.position.column);
            max.row = max.row.max(well.position.row);
            max.column = max.column.max(well.position.column);
        }
        Some((min, max))
    }
}

impl PartialEq for PlateSurvey {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
            && *self.labware == *other.labware
            && self.wells == other.wells
    }
}
