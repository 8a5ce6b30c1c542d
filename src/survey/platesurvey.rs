//! The raw `platesurvey` dialect written by the instrument's survey routine.
//!
//! ```text
//! platesurvey (name, barcode, date, serial_number, frmt, rows, cols, ...)
//! └── w* (n, r, c, status, vl, cvl, t, b, ...)
//!     ├── f* (t, v, u, o)
//!     └── e* (t, x, y, z, ...)
//!         └── f*
//! ```

use std::collections::BTreeMap;
use std::io::BufRead;

use log::debug;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};

use super::collector::{RawWell, WellCollector};
use super::models::{InstrumentInfo, SurveyMetadata, SurveyTimestamp};
use super::parser::SurveyParser;
use super::signal::{feature_kinds, SignalFeature};
use super::{PlateSurvey, SurveyError, SurveyWarning};
use crate::labware::WellPosition;
use crate::outcome::Parsed;
use crate::xml::collect_attributes;

pub(super) const ROOT: &str = "platesurvey";
pub(super) const WELL: &str = "w";
pub(super) const SIGNAL: &str = "e";
pub(super) const FEATURE: &str = "f";

/// Root attributes with a dedicated metadata field
pub(super) mod root_attr {
    pub const LABWARE: &str = "name";
    pub const BARCODE: &str = "barcode";
    pub const DATE: &str = "date";
    pub const PLATE_NAME: &str = "plate_name";
    pub const SERIAL_NUMBER: &str = "serial_number";
    pub const INSTRUMENT_NAME: &str = "instrument_name";
    pub const INSTRUMENT_MODEL: &str = "instrument_model";
    pub const SOFTWARE_VERSION: &str = "software_version";
    pub const FORMAT_VERSION: &str = "frmt";

    pub const RESERVED: [&str; 9] = [
        LABWARE,
        BARCODE,
        DATE,
        PLATE_NAME,
        SERIAL_NUMBER,
        INSTRUMENT_NAME,
        INSTRUMENT_MODEL,
        SOFTWARE_VERSION,
        FORMAT_VERSION,
    ];
}

/// Well attributes consumed by the parser
pub(super) mod well_attr {
    pub const NAME: &str = "n";
    pub const ROW: &str = "r";
    pub const COLUMN: &str = "c";
    pub const STATUS: &str = "status";
}

/// Vendor well attributes that carry a measurement: (attribute, kind, unit)
pub(super) const MEASUREMENT_ATTRIBUTES: [(&str, &str, &str); 4] = [
    ("vl", feature_kinds::VOLUME, "uL"),
    ("cvl", feature_kinds::CURRENT_VOLUME, "uL"),
    ("t", feature_kinds::FLUID_THICKNESS, "mm"),
    ("b", feature_kinds::BOTTOM_THICKNESS, "mm"),
];

/// Well attributes never written from the pass-through map
pub(super) fn is_reserved_well_attribute(key: &str) -> bool {
    matches!(
        key,
        well_attr::NAME | well_attr::ROW | well_attr::COLUMN | well_attr::STATUS
    ) || MEASUREMENT_ATTRIBUTES.iter().any(|(attr, _, _)| *attr == key)
}

/// Tag and remaining attributes of the `<e>` group being read
type OpenSignal = (String, BTreeMap<String, String>);

/// A `<w>` element being read. `position` is `None` for dropped wells,
/// whose children are skipped.
struct OpenWell {
    position: Option<WellPosition>,
    raw: RawWell,
}

impl<R: BufRead> SurveyParser<'_, R> {
    pub(super) fn parse_plate_survey(
        &mut self,
        root: &BytesStart<'_>,
        self_closing: bool,
    ) -> Result<Parsed<PlateSurvey, SurveyWarning>, SurveyError> {
        let mut attributes = collect_attributes(root, self.reader.decoder())?;
        let labware_type = take_required(&mut attributes, root_attr::LABWARE)?;
        let plate_id = take_required(&mut attributes, root_attr::BARCODE)?;
        let date = take_required(&mut attributes, root_attr::DATE)?;

        let labware = self
            .registry
            .get(&labware_type)
            .ok_or_else(|| SurveyError::UnknownLabware(labware_type.clone()))?;

        let metadata = SurveyMetadata {
            plate_id,
            plate_name: attributes.remove(root_attr::PLATE_NAME),
            timestamp: SurveyTimestamp::parse(date),
            instrument: InstrumentInfo {
                serial_number: attributes.remove(root_attr::SERIAL_NUMBER),
                name: attributes.remove(root_attr::INSTRUMENT_NAME),
                model: attributes.remove(root_attr::INSTRUMENT_MODEL),
                software_version: attributes.remove(root_attr::SOFTWARE_VERSION),
            },
            format_version: attributes.remove(root_attr::FORMAT_VERSION),
            attributes,
        };

        let mut collector = WellCollector::new(labware, self.options.mode);
        if !self_closing {
            self.read_wells(&mut collector)?;
        }
        collector.finish(metadata)
    }

    fn read_wells(&mut self, collector: &mut WellCollector) -> Result<(), SurveyError> {
        let decoder = self.reader.decoder();
        let mut buf = Vec::new();
        let mut current: Option<OpenWell> = None;
        let mut signal: Option<OpenSignal> = None;

        loop {
            let event = self.reader.read_event_into(&mut buf)?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let self_closing = matches!(event, Event::Empty(_));
                    match e.name().as_ref() {
                        b"w" => {
                            if let Some(open) = &current {
                                return Err(SurveyError::MalformedSurvey(format!(
                                    "well {} contains another <{}> element",
                                    open.raw.name, WELL
                                )));
                            }
                            let open = open_well(e, decoder, collector)?;
                            if self_closing {
                                close_well(open, collector)?;
                            } else {
                                current = Some(open);
                            }
                        }
                        b"e" => {
                            let open = current.as_ref().ok_or_else(|| outside_well(SIGNAL))?;
                            if !self_closing && open.position.is_some() {
                                let mut attrs = collect_attributes(e, decoder)?;
                                signal = attrs.remove("t").map(|tag| (tag, attrs));
                            }
                        }
                        b"f" => {
                            let open = current.as_mut().ok_or_else(|| outside_well(FEATURE))?;
                            if open.position.is_some() {
                                let feature =
                                    read_feature(e, decoder, &open.raw.name, signal.as_ref())?;
                                open.raw.features.push(feature);
                            }
                        }
                        _ => {
                            debug!(
                                "Ignoring <{}> in survey",
                                crate::xml::element_name(e)
                            );
                        }
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"w" => {
                        if let Some(open) = current.take() {
                            close_well(open, collector)?;
                        }
                        signal = None;
                    }
                    b"e" => signal = None,
                    b"platesurvey" => break,
                    _ => {}
                },
                Event::Eof => {
                    return Err(SurveyError::MalformedSurvey(format!(
                        "document ended inside <{}>",
                        ROOT
                    )))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }
}

fn open_well(
    e: &BytesStart<'_>,
    decoder: Decoder,
    collector: &mut WellCollector,
) -> Result<OpenWell, SurveyError> {
    let mut attributes = collect_attributes(e, decoder)?;
    let name = attributes.remove(well_attr::NAME).ok_or_else(|| {
        SurveyError::MalformedSurvey(format!(
            "<{}> element without '{}' attribute",
            WELL,
            well_attr::NAME
        ))
    })?;

    let position = collector.resolve(&name)?;
    let row = attributes.remove(well_attr::ROW);
    let column = attributes.remove(well_attr::COLUMN);
    let status = attributes.remove(well_attr::STATUS);

    let mut raw = RawWell {
        name,
        status,
        ..RawWell::default()
    };

    if let Some(pos) = position {
        check_index(&raw.name, well_attr::ROW, row.as_deref(), pos.row)?;
        check_index(&raw.name, well_attr::COLUMN, column.as_deref(), pos.column)?;

        for (attr, kind, unit) in MEASUREMENT_ATTRIBUTES {
            if let Some(value) = attributes.remove(attr) {
                let feature = SignalFeature::coerce(kind, &value, Some(unit), None)
                    .map_err(|message| malformed_signal(&raw.name, message))?;
                raw.features.push(feature);
            }
        }
    }

    raw.attributes = attributes;
    Ok(OpenWell { position, raw })
}

fn close_well(open: OpenWell, collector: &mut WellCollector) -> Result<(), SurveyError> {
    match open.position {
        Some(pos) => collector.push(pos, open.raw),
        None => Ok(()),
    }
}

fn read_feature(
    e: &BytesStart<'_>,
    decoder: Decoder,
    well: &str,
    signal: Option<&OpenSignal>,
) -> Result<SignalFeature, SurveyError> {
    let attributes = collect_attributes(e, decoder)?;
    let kind = attributes
        .get("t")
        .ok_or_else(|| malformed_signal(well, "feature without type attribute 't'".to_string()))?;
    let value = attributes
        .get("v")
        .ok_or_else(|| malformed_signal(well, format!("feature {} has no value", kind)))?;

    let tag = signal.map(|(tag, _)| tag.clone());
    let mut feature = SignalFeature::coerce(kind, value, attributes.get("u").map(String::as_str), tag)
        .map_err(|message| malformed_signal(well, message))?;
    if let Some((_, group)) = signal {
        feature = feature.with_signal_attributes(group.clone());
    }

    if let Some(raw_tof) = attributes.get("o") {
        let tof: f64 = raw_tof
            .trim()
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| {
                malformed_signal(well, format!("time of flight '{}' of {} is not numeric", raw_tof, kind))
            })?;
        feature = feature.with_time_of_flight(tof);
    }
    Ok(feature)
}

/// Vendor `r`/`c` indices are zero-based and must agree with the well name
fn check_index(
    well: &str,
    attr: &str,
    raw: Option<&str>,
    expected: u16,
) -> Result<(), SurveyError> {
    let Some(raw) = raw else {
        return Ok(());
    };
    match raw.trim().parse::<u16>() {
        Ok(value) if value == expected => Ok(()),
        _ => Err(SurveyError::MalformedSurvey(format!(
            "well {} has {}='{}', expected {}",
            well, attr, raw, expected
        ))),
    }
}

fn take_required(
    attributes: &mut BTreeMap<String, String>,
    key: &str,
) -> Result<String, SurveyError> {
    attributes.remove(key).ok_or_else(|| {
        SurveyError::MalformedSurvey(format!(
            "<{}> is missing required attribute '{}'",
            ROOT, key
        ))
    })
}

fn outside_well(element: &str) -> SurveyError {
    SurveyError::MalformedSurvey(format!("<{}> element outside a <{}> element", element, WELL))
}

fn malformed_signal(well: &str, message: String) -> SurveyError {
    SurveyError::MalformedSignal {
        well: well.to_string(),
        message,
    }
}
