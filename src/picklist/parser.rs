use std::collections::BTreeMap;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::models::{PickList, PickListEntry, PlateWell, VolumeUnit};
use super::{PickListError, SkippedRow};
use crate::labware::{LabwareRegistry, WellPosition};
use crate::outcome::{ParseMode, Parsed};

/// Options for [`parse_picklist`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickListParseOptions {
    /// Reaction to a bad row; lenient (skip the row) by default
    pub mode: ParseMode,
    /// Volume unit for a volume column whose header names no unit
    pub volume_unit: Option<VolumeUnit>,
    /// Field delimiter
    pub delimiter: u8,
}

impl PickListParseOptions {
    /// Abort on the first bad row
    pub fn strict() -> Self {
        Self {
            mode: ParseMode::Strict,
            ..Self::default()
        }
    }

    /// Skip bad rows and record them (default)
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Tab-separated input
    pub fn tsv(mut self) -> Self {
        self.delimiter = b'\t';
        self
    }

    /// Use a different field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Interpret unit-less volume columns in this unit
    pub fn with_volume_unit(mut self, unit: VolumeUnit) -> Self {
        self.volume_unit = Some(unit);
        self
    }
}

impl Default for PickListParseOptions {
    fn default() -> Self {
        Self {
            mode: ParseMode::Lenient,
            volume_unit: None,
            delimiter: b',',
        }
    }
}

/// Columns the parser interprets
#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    SourcePlateName,
    SourcePlateType,
    SourcePlateBarcode,
    SourceWell,
    DestinationPlateName,
    DestinationPlateType,
    DestinationPlateBarcode,
    DestinationWell,
    TransferVolume,
    SampleName,
    DestinationSampleName,
    Metadata(String),
    /// Blank or repeated pass-through header; its cells are dropped
    Ignored,
}

impl Column {
    fn from_normalized(name: &str, raw: &str) -> Self {
        match name {
            "source plate name" => Column::SourcePlateName,
            "source plate type" => Column::SourcePlateType,
            "source plate barcode" => Column::SourcePlateBarcode,
            "source well" => Column::SourceWell,
            "destination plate name" => Column::DestinationPlateName,
            "destination plate type" => Column::DestinationPlateType,
            "destination plate barcode" => Column::DestinationPlateBarcode,
            "destination well" => Column::DestinationWell,
            "transfer volume" => Column::TransferVolume,
            "sample name" => Column::SampleName,
            "destination sample name" => Column::DestinationSampleName,
            "" => Column::Ignored,
            _ => Column::Metadata(raw.trim().to_string()),
        }
    }
}

/// Header names as the instrument software writes them
pub(super) mod headers {
    pub const SOURCE_PLATE_NAME: &str = "Source Plate Name";
    pub const SOURCE_PLATE_TYPE: &str = "Source Plate Type";
    pub const SOURCE_PLATE_BARCODE: &str = "Source Plate Barcode";
    pub const SOURCE_WELL: &str = "Source Well";
    pub const DESTINATION_PLATE_NAME: &str = "Destination Plate Name";
    pub const DESTINATION_PLATE_TYPE: &str = "Destination Plate Type";
    pub const DESTINATION_PLATE_BARCODE: &str = "Destination Plate Barcode";
    pub const DESTINATION_WELL: &str = "Destination Well";
    pub const TRANSFER_VOLUME: &str = "Transfer Volume";
    pub const SAMPLE_NAME: &str = "Sample Name";
    pub const DESTINATION_SAMPLE_NAME: &str = "Destination Sample Name";
}

/// Lower-case, collapse whitespace and split off a trailing `(unit)`
fn normalize_header(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim_start_matches('\u{feff}').trim();
    let (name, unit) = match (raw.rfind('('), raw.ends_with(')')) {
        (Some(open), true) => (
            &raw[..open],
            Some(raw[open + 1..raw.len() - 1].trim().to_string()),
        ),
        _ => (raw, None),
    };
    let name = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    (name, unit)
}

/// Column positions resolved from the header row
#[derive(Debug)]
struct HeaderMap {
    columns: Vec<Column>,
    volume_unit: VolumeUnit,
    metadata_columns: Vec<String>,
}

impl HeaderMap {
    fn from_record(
        record: &StringRecord,
        options: &PickListParseOptions,
    ) -> Result<Self, PickListError> {
        let mut columns = Vec::with_capacity(record.len());
        let mut header_unit: Option<VolumeUnit> = None;
        let mut metadata_columns = Vec::new();

        for (position, raw) in record.iter().enumerate() {
            let (name, unit) = normalize_header(raw);
            let mut column = Column::from_normalized(&name, raw.trim_start_matches('\u{feff}'));
            if column == Column::TransferVolume {
                if let Some(unit) = unit {
                    let parsed = unit.parse::<VolumeUnit>().map_err(|message| {
                        PickListError::MalformedPickList { row: None, message }
                    })?;
                    header_unit = Some(parsed);
                }
            }
            // Spreadsheet exports pad rows with unnamed columns
            if column != Column::Ignored && columns.contains(&column) {
                if let Column::Metadata(key) = &column {
                    warn!("Ignoring repeated picklist column '{}' at position {}", key, position);
                    column = Column::Ignored;
                } else {
                    return Err(PickListError::MalformedPickList {
                        row: None,
                        message: format!("column '{}' appears more than once", raw.trim()),
                    });
                }
            }
            if let Column::Metadata(key) = &column {
                metadata_columns.push(key.clone());
            }
            columns.push(column);
        }

        for (required, header) in [
            (Column::SourceWell, headers::SOURCE_WELL),
            (Column::DestinationWell, headers::DESTINATION_WELL),
            (Column::TransferVolume, headers::TRANSFER_VOLUME),
        ] {
            if !columns.contains(&required) {
                return Err(PickListError::MalformedPickList {
                    row: None,
                    message: format!("missing required column '{}'", header),
                });
            }
        }

        let volume_unit = header_unit
            .or(options.volume_unit)
            .unwrap_or_default();
        Ok(Self {
            columns,
            volume_unit,
            metadata_columns,
        })
    }
}

/// Cells of one row, keyed by interpreted column
#[derive(Debug, Default)]
struct RowCells {
    source_plate_name: Option<String>,
    source_plate_type: Option<String>,
    source_plate_barcode: Option<String>,
    source_well: Option<String>,
    destination_plate_name: Option<String>,
    destination_plate_type: Option<String>,
    destination_plate_barcode: Option<String>,
    destination_well: Option<String>,
    transfer_volume: Option<String>,
    sample_name: Option<String>,
    destination_sample_name: Option<String>,
    metadata: BTreeMap<String, String>,
}

impl RowCells {
    fn collect(header: &HeaderMap, record: &StringRecord) -> Self {
        let mut cells = RowCells::default();
        for (column, value) in header.columns.iter().zip(record.iter()) {
            let value = value.trim();
            if let Column::Metadata(key) = column {
                cells.metadata.insert(key.clone(), value.to_string());
                continue;
            }
            if value.is_empty() {
                continue;
            }
            let value = Some(value.to_string());
            match column {
                Column::SourcePlateName => cells.source_plate_name = value,
                Column::SourcePlateType => cells.source_plate_type = value,
                Column::SourcePlateBarcode => cells.source_plate_barcode = value,
                Column::SourceWell => cells.source_well = value,
                Column::DestinationPlateName => cells.destination_plate_name = value,
                Column::DestinationPlateType => cells.destination_plate_type = value,
                Column::DestinationPlateBarcode => cells.destination_plate_barcode = value,
                Column::DestinationWell => cells.destination_well = value,
                Column::TransferVolume => cells.transfer_volume = value,
                Column::SampleName => cells.sample_name = value,
                Column::DestinationSampleName => cells.destination_sample_name = value,
                Column::Metadata(_) | Column::Ignored => {}
            }
        }
        cells
    }
}

/// Parse a CSV/TSV picklist.
///
/// Rows are validated independently and in file order. In lenient mode a bad
/// row is recorded as a [`SkippedRow`] and parsing continues; in strict mode
/// the first bad row aborts. A missing required column always aborts.
pub fn parse_picklist<R: Read>(
    reader: R,
    registry: &LabwareRegistry,
    options: PickListParseOptions,
) -> Result<Parsed<PickList, SkippedRow>, PickListError> {
    let mut csv = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let header = HeaderMap::from_record(csv.headers()?, &options)?;
    debug!(
        "Picklist header: {} columns, volume unit {}",
        header.columns.len(),
        header.volume_unit
    );

    let mut entries = Vec::new();
    let mut skipped = Vec::new();
    let mut source_rows = 0;

    for (row, result) in csv.records().enumerate() {
        source_rows += 1;
        let (line, outcome) = match result {
            Ok(record) => {
                let line = record.position().map(|p| p.line());
                let outcome = parse_row(row, &record, &header, registry).map(|mut entry| {
                    entry.index = entries.len();
                    entry
                });
                (line, outcome)
            }
            Err(e) => (e.position().map(|p| p.line()), Err(PickListError::Csv(e))),
        };

        match outcome {
            Ok(entry) => entries.push(entry),
            Err(error) if options.mode.is_strict() => return Err(error),
            Err(error) => {
                warn!("Skipping picklist row {}: {}", row, error);
                skipped.push(SkippedRow { row, line, error });
            }
        }
    }

    info!(
        "Parsed picklist: {} of {} rows valid, {} skipped",
        entries.len(),
        source_rows,
        skipped.len()
    );
    let picklist = PickList::new(entries, source_rows, header.volume_unit, header.metadata_columns);
    Ok(Parsed::new(picklist, skipped))
}

/// [`parse_picklist`] over an in-memory document
pub fn parse_picklist_str(
    text: &str,
    registry: &LabwareRegistry,
    options: PickListParseOptions,
) -> Result<Parsed<PickList, SkippedRow>, PickListError> {
    parse_picklist(text.as_bytes(), registry, options)
}

fn parse_row(
    row: usize,
    record: &StringRecord,
    header: &HeaderMap,
    registry: &LabwareRegistry,
) -> Result<PickListEntry, PickListError> {
    let cells = RowCells::collect(header, record);

    let source_well = required(row, cells.source_well, headers::SOURCE_WELL)?;
    let destination_well = required(row, cells.destination_well, headers::DESTINATION_WELL)?;
    let raw_volume = required(row, cells.transfer_volume, headers::TRANSFER_VOLUME)?;

    let volume = raw_volume
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| PickListError::InvalidVolume {
            row,
            value: raw_volume.clone(),
        })?;

    let source = resolve_side(
        row,
        registry,
        cells.source_plate_name,
        cells.source_plate_type,
        cells.source_plate_barcode,
        source_well,
    )?;
    let destination = resolve_side(
        row,
        registry,
        cells.destination_plate_name,
        cells.destination_plate_type,
        cells.destination_plate_barcode,
        destination_well,
    )?;

    Ok(PickListEntry {
        index: 0,
        row,
        source,
        destination,
        volume_nl: volume * header.volume_unit.nl_factor(),
        sample_name: cells.sample_name,
        destination_sample_name: cells.destination_sample_name,
        metadata: cells.metadata,
    })
}

fn required(row: usize, cell: Option<String>, column: &str) -> Result<String, PickListError> {
    cell.ok_or_else(|| PickListError::MalformedPickList {
        row: Some(row),
        message: format!("empty '{}' cell", column),
    })
}

/// Resolve one side of a transfer; the well is checked against the plate
/// type when the row names one
fn resolve_side(
    row: usize,
    registry: &LabwareRegistry,
    plate_name: Option<String>,
    plate_type: Option<String>,
    plate_barcode: Option<String>,
    well_name: String,
) -> Result<PlateWell, PickListError> {
    let invalid_well = |labware: Option<String>| PickListError::InvalidWellReference {
        row,
        well: well_name.clone(),
        labware,
    };

    let well = match &plate_type {
        Some(type_name) => {
            let labware = registry
                .get(type_name)
                .ok_or_else(|| PickListError::UnknownLabware {
                    row,
                    labware: type_name.clone(),
                })?;
            labware
                .parse_well(&well_name)
                .map_err(|_| invalid_well(Some(type_name.clone())))?
        }
        None => WellPosition::parse(&well_name).ok_or_else(|| invalid_well(None))?,
    };

    Ok(PlateWell {
        plate_name,
        plate_type,
        plate_barcode,
        well,
        well_name,
    })
}
