//! The cherry-pick survey `report` dialect.
//!
//! ```text
//! report
//! ├── reportheader (RunID, RunDateTime, AppName, AppVersion, ...)
//! ├── reportbody
//! │   └── record* (SrcPlateName, SrcPlateBarcode, SrcPlateType, SrcWell,
//! │                SurveyFluidHeight, SurveyFluidVolume, FluidComposition,
//! │                FluidUnits, FluidType, SurveyStatus)
//! └── reportfooter (InstrName, InstrModel, InstrSN, InstrSWVersion)
//! ```
//!
//! Every field is a leaf element with text content. A report covers one
//! source plate; the plate fields must agree across records.

use std::collections::BTreeMap;
use std::io::BufRead;

use quick_xml::events::Event;

use super::collector::{RawWell, WellCollector};
use super::models::{InstrumentInfo, SurveyMetadata, SurveyTimestamp};
use super::parser::SurveyParser;
use super::signal::{feature_kinds, SignalFeature};
use super::{PlateSurvey, SurveyError, SurveyWarning};
use crate::outcome::Parsed;

type Fields = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Header,
    Body,
    Footer,
}

#[derive(Debug, Default)]
struct ReportDocument {
    header: Fields,
    records: Vec<Fields>,
    footer: Fields,
}

impl<R: BufRead> SurveyParser<'_, R> {
    pub(super) fn parse_report(
        &mut self,
        self_closing: bool,
    ) -> Result<Parsed<PlateSurvey, SurveyWarning>, SurveyError> {
        let document = if self_closing {
            ReportDocument::default()
        } else {
            self.read_report()?
        };
        self.assemble_report(document)
    }

    fn read_report(&mut self) -> Result<ReportDocument, SurveyError> {
        let mut buf = Vec::new();
        let mut document = ReportDocument::default();
        let mut section = Section::Outside;
        let mut record: Option<Fields> = None;
        let mut field: Option<(String, String)> = None;

        loop {
            let event = self.reader.read_event_into(&mut buf)?;
            match event {
                Event::Start(ref e) => match (section, e.name().as_ref()) {
                    (Section::Outside, b"reportheader") => section = Section::Header,
                    (Section::Outside, b"reportbody") => section = Section::Body,
                    (Section::Outside, b"reportfooter") => section = Section::Footer,
                    (Section::Body, b"record") if record.is_none() => record = Some(Fields::new()),
                    (Section::Outside, _) | (Section::Body, _) if record.is_none() => {}
                    _ => field = Some((crate::xml::element_name(e), String::new())),
                },
                Event::Empty(ref e) => {
                    let name = crate::xml::element_name(e);
                    match (section, record.as_mut()) {
                        (Section::Header, _) => {
                            document.header.insert(name, String::new());
                        }
                        (Section::Footer, _) => {
                            document.footer.insert(name, String::new());
                        }
                        (Section::Body, Some(fields)) => {
                            fields.insert(name, String::new());
                        }
                        // empty <record/> elements and stray elements carry no well
                        _ => {}
                    }
                }
                Event::Text(ref t) => {
                    if let Some((_, value)) = field.as_mut() {
                        value.push_str(&t.unescape()?);
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"reportheader" | b"reportbody" | b"reportfooter" => section = Section::Outside,
                    b"record" if field.is_none() => {
                        if let Some(fields) = record.take() {
                            document.records.push(fields);
                        }
                    }
                    b"report" => break,
                    _ => {
                        if let Some((name, value)) = field.take() {
                            let target = match section {
                                Section::Header => Some(&mut document.header),
                                Section::Footer => Some(&mut document.footer),
                                Section::Body => record.as_mut(),
                                Section::Outside => None,
                            };
                            if let Some(target) = target {
                                target.insert(name, value);
                            }
                        }
                    }
                },
                Event::Eof => {
                    return Err(SurveyError::MalformedSurvey(
                        "document ended inside <report>".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(document)
    }

    fn assemble_report(
        &self,
        document: ReportDocument,
    ) -> Result<Parsed<PlateSurvey, SurveyWarning>, SurveyError> {
        let ReportDocument {
            mut header,
            records,
            mut footer,
        } = document;

        let date = header.remove("RunDateTime").ok_or_else(|| {
            SurveyError::MalformedSurvey("report header has no RunDateTime".to_string())
        })?;
        let first = records.first().ok_or_else(|| {
            SurveyError::MalformedSurvey("report contains no records".to_string())
        })?;

        let labware_type = plate_field(&records, first, "SrcPlateType")?.ok_or_else(|| {
            SurveyError::MalformedSurvey("report records have no SrcPlateType".to_string())
        })?;
        let plate_id = plate_field(&records, first, "SrcPlateBarcode")?.unwrap_or_default();
        let plate_name = plate_field(&records, first, "SrcPlateName")?;

        let labware = self
            .registry
            .get(&labware_type)
            .ok_or_else(|| SurveyError::UnknownLabware(labware_type.clone()))?;

        let instrument = InstrumentInfo {
            serial_number: footer.remove("InstrSN"),
            name: footer.remove("InstrName"),
            model: footer.remove("InstrModel"),
            software_version: footer.remove("InstrSWVersion"),
        };
        let mut attributes = header;
        attributes.append(&mut footer);

        let metadata = SurveyMetadata {
            plate_id,
            plate_name,
            timestamp: SurveyTimestamp::parse(date),
            instrument,
            format_version: None,
            attributes,
        };

        let mut collector = WellCollector::new(labware, self.options.mode);
        for fields in records {
            add_record(fields, &mut collector)?;
        }
        collector.finish(metadata)
    }
}

/// A plate-level field that must carry the same value in every record
fn plate_field(
    records: &[Fields],
    first: &Fields,
    key: &str,
) -> Result<Option<String>, SurveyError> {
    let value = first.get(key).filter(|v| !v.is_empty());
    for record in records {
        let other = record.get(key).filter(|v| !v.is_empty());
        if other != value {
            return Err(SurveyError::MalformedSurvey(format!(
                "report covers more than one plate: {} '{}' and '{}'",
                key,
                value.map(String::as_str).unwrap_or(""),
                other.map(String::as_str).unwrap_or("")
            )));
        }
    }
    Ok(value.cloned())
}

fn add_record(mut fields: Fields, collector: &mut WellCollector) -> Result<(), SurveyError> {
    let name = fields
        .remove("SrcWell")
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| SurveyError::MalformedSurvey("report record without SrcWell".to_string()))?;
    for key in ["SrcPlateName", "SrcPlateBarcode", "SrcPlateType"] {
        fields.remove(key);
    }

    let Some(position) = collector.resolve(name.trim())? else {
        return Ok(());
    };
    let well_name = collector.labware().well_name(position);

    let fluid_units = fields.remove("FluidUnits");
    let measurements = [
        ("SurveyFluidVolume", feature_kinds::VOLUME, Some("uL")),
        ("SurveyFluidHeight", feature_kinds::FLUID_HEIGHT, Some("mm")),
        (
            "FluidComposition",
            feature_kinds::FLUID_COMPOSITION,
            fluid_units.as_deref(),
        ),
    ];

    let mut features = Vec::new();
    for (key, kind, unit) in measurements {
        let Some(value) = fields.remove(key) else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        let feature = SignalFeature::coerce(kind, &value, unit, None).map_err(|message| {
            SurveyError::MalformedSignal {
                well: well_name.clone(),
                message,
            }
        })?;
        features.push(feature);
    }

    let status = fields.remove("SurveyStatus");
    collector.push(
        position,
        RawWell {
            name,
            status,
            features,
            attributes: fields,
        },
    )
}
