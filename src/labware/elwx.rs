//! Reader for vendor `EchoLabware` XML files (`.elwx`, legacy `.elw`).
//!
//! ```text
//! EchoLabware
//! ├── sourceplates
//! │   └── plateinfo* (platetype, usage, rows, cols, wellcapacity, ...)
//! └── destinationplates
//!     └── plateinfo*
//! ```
//!
//! Legacy ELW files omit `usage`; it is inferred from the enclosing list.
//! Well volumes in these files are in microliters, drop volumes in nanoliters.

use std::collections::BTreeMap;
use std::io::BufRead;

use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::{LabwareDefinition, LabwareError, PlateUsage};
use crate::xml::collect_attributes;

const NL_PER_UL: f64 = 1000.0;

pub(super) fn read_labware_xml<R: BufRead>(
    reader: R,
) -> Result<Vec<LabwareDefinition>, LabwareError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut definitions = Vec::new();
    let mut seen_root = false;
    let mut list_usage: Option<PlateUsage> = None;
    let mut buf = Vec::new();

    loop {
        let event = xml.read_event_into(&mut buf)?;
        // Self-closing plate lists are empty and must not open a list scope
        let opens_scope = matches!(event, Event::Start(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                b"EchoLabware" => seen_root = true,
                _ if !seen_root => {
                    return Err(LabwareError::InvalidStructure(format!(
                        "expected EchoLabware root element, found {}",
                        crate::xml::element_name(e)
                    )));
                }
                b"sourceplates" if opens_scope => list_usage = Some(PlateUsage::Source),
                b"destinationplates" if opens_scope => {
                    list_usage = Some(PlateUsage::Destination)
                }
                b"plateinfo" => {
                    let attributes = collect_attributes(e, xml.decoder())?;
                    definitions.push(plate_from_attributes(&attributes, list_usage)?);
                }
                _ => {}
            },
            Event::End(ref e) => {
                if matches!(e.name().as_ref(), b"sourceplates" | b"destinationplates") {
                    list_usage = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(LabwareError::InvalidStructure(
            "document has no EchoLabware element".to_string(),
        ));
    }
    Ok(definitions)
}

fn plate_from_attributes(
    attributes: &BTreeMap<String, String>,
    list_usage: Option<PlateUsage>,
) -> Result<LabwareDefinition, LabwareError> {
    let name = required(attributes, "platetype")?;

    let usage = match attributes.get("usage") {
        Some(raw) => PlateUsage::from_vendor_str(raw).ok_or_else(|| {
            LabwareError::InvalidAttributeValue(format!("usage='{}' on {}", raw, name))
        })?,
        None => list_usage.ok_or_else(|| {
            LabwareError::MissingAttribute(format!("usage (plate {} outside a plate list)", name))
        })?,
    };

    let rows: u16 = parse_number(attributes, "rows", name)?
        .ok_or_else(|| LabwareError::MissingAttribute(format!("rows on {}", name)))?;
    let columns: u16 = parse_number(attributes, "cols", name)?
        .ok_or_else(|| LabwareError::MissingAttribute(format!("cols on {}", name)))?;

    let well_capacity_ul: Option<f64> = parse_number(attributes, "wellcapacity", name)?;
    let max_well_ul: Option<f64> = parse_number(attributes, "maxwellvol", name)?;
    let min_well_ul: Option<f64> = parse_number(attributes, "minwellvol", name)?;
    let drop_nl: Option<f64> = parse_number(attributes, "dropvolume", name)?;

    let capacity_ul = max_well_ul.or(well_capacity_ul).ok_or_else(|| {
        LabwareError::MissingAttribute(format!("wellcapacity or maxwellvol on {}", name))
    })?;

    let mut builder = LabwareDefinition::builder(name, usage, rows, columns)
        .capacity_nl(capacity_ul * NL_PER_UL)
        .dead_volume_nl(min_well_ul.unwrap_or(0.0) * NL_PER_UL);
    if let Some(format) = attributes.get("plateformat") {
        builder = builder.format(format.clone());
    }
    if let Some(drop) = drop_nl.filter(|d| *d > 0.0) {
        builder = builder.drop_volume_nl(drop);
    }

    let definition = builder.build()?;
    debug!(
        "Read labware {} ({}x{}, {:?})",
        definition.name(),
        definition.rows(),
        definition.columns(),
        definition.usage()
    );
    Ok(definition)
}

fn required<'a>(
    attributes: &'a BTreeMap<String, String>,
    key: &str,
) -> Result<&'a str, LabwareError> {
    attributes
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| LabwareError::MissingAttribute(key.to_string()))
}

fn parse_number<T: std::str::FromStr>(
    attributes: &BTreeMap<String, String>,
    key: &str,
    plate: &str,
) -> Result<Option<T>, LabwareError> {
    match attributes.get(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            LabwareError::InvalidAttributeValue(format!("{}='{}' on {}", key, raw, plate))
        }),
    }
}
