use std::collections::BTreeMap;
use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use super::models::{PlateSurvey, WellSurvey};
use super::platesurvey::{
    is_reserved_well_attribute, root_attr, well_attr, FEATURE, MEASUREMENT_ATTRIBUTES, ROOT,
    SIGNAL, WELL,
};
use super::signal::{SignalFeature, Unit};
use super::SurveyError;

/// Serialize a survey to the canonical `platesurvey` document.
///
/// Surveys read from either dialect are written in this form; parsing the
/// output yields a survey equal to the input.
pub fn write_survey(survey: &PlateSurvey) -> Result<String, SurveyError> {
    let mut buf = Vec::new();
    write_survey_to(survey, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

/// Serialize a survey into any writer
pub fn write_survey_to<W: Write>(survey: &PlateSurvey, out: W) -> Result<(), SurveyError> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let metadata = survey.metadata();
    let mut root = BytesStart::new(ROOT);
    root.push_attribute((root_attr::LABWARE, survey.labware().name()));
    root.push_attribute((root_attr::BARCODE, metadata.plate_id.as_str()));
    root.push_attribute((root_attr::DATE, metadata.timestamp.raw.as_str()));

    let optional = [
        (root_attr::PLATE_NAME, &metadata.plate_name),
        (root_attr::SERIAL_NUMBER, &metadata.instrument.serial_number),
        (root_attr::INSTRUMENT_NAME, &metadata.instrument.name),
        (root_attr::INSTRUMENT_MODEL, &metadata.instrument.model),
        (root_attr::SOFTWARE_VERSION, &metadata.instrument.software_version),
        (root_attr::FORMAT_VERSION, &metadata.format_version),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            root.push_attribute((key, value.as_str()));
        }
    }
    for (key, value) in &metadata.attributes {
        if !root_attr::RESERVED.contains(&key.as_str()) {
            root.push_attribute((key.as_str(), value.as_str()));
        }
    }

    if survey.is_empty() {
        writer.write_event(Event::Empty(root))?;
        return Ok(());
    }

    writer.write_event(Event::Start(root))?;
    for well in survey.wells() {
        write_well(&mut writer, well)?;
    }
    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;
    Ok(())
}

fn write_well<W: Write>(writer: &mut Writer<W>, well: &WellSurvey) -> Result<(), SurveyError> {
    let mut element = BytesStart::new(WELL);
    element.push_attribute((well_attr::NAME, well.name.as_str()));
    element.push_attribute((well_attr::ROW, well.position.row.to_string().as_str()));
    element.push_attribute((well_attr::COLUMN, well.position.column.to_string().as_str()));
    if let Some(status) = &well.status {
        element.push_attribute((well_attr::STATUS, status.as_str()));
    }

    let as_attributes = attribute_prefix(&well.features);
    for (attr, feature) in &as_attributes {
        element.push_attribute((*attr, feature.value.to_string().as_str()));
    }
    for (key, value) in &well.attributes {
        if !is_reserved_well_attribute(key) {
            element.push_attribute((key.as_str(), value.as_str()));
        }
    }

    let children = &well.features[as_attributes.len()..];
    if children.is_empty() {
        writer.write_event(Event::Empty(element))?;
        return Ok(());
    }

    writer.write_event(Event::Start(element))?;
    // A new <e> opens whenever the tag or the group attributes change
    let mut open_signal: Option<(&str, &BTreeMap<String, String>)> = None;
    for feature in children {
        let signal = feature
            .signal
            .as_deref()
            .map(|tag| (tag, &feature.signal_attributes));
        if signal != open_signal {
            if open_signal.is_some() {
                writer.write_event(Event::End(BytesEnd::new(SIGNAL)))?;
            }
            if let Some((tag, attributes)) = signal {
                let mut group = BytesStart::new(SIGNAL);
                group.push_attribute(("t", tag));
                for (key, value) in attributes.iter().filter(|(key, _)| key.as_str() != "t") {
                    group.push_attribute((key.as_str(), value.as_str()));
                }
                writer.write_event(Event::Start(group))?;
            }
            open_signal = signal;
        }
        write_feature(writer, feature)?;
    }
    if open_signal.is_some() {
        writer.write_event(Event::End(BytesEnd::new(SIGNAL)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(WELL)))?;
    Ok(())
}

fn write_feature<W: Write>(
    writer: &mut Writer<W>,
    feature: &SignalFeature,
) -> Result<(), SurveyError> {
    let mut element = BytesStart::new(FEATURE);
    element.push_attribute(("t", feature.kind.as_str()));
    element.push_attribute(("v", feature.value.to_string().as_str()));
    if feature.unit != Unit::Dimensionless {
        element.push_attribute(("u", feature.unit.symbol()));
    }
    if let Some(tof) = feature.time_of_flight_us {
        element.push_attribute(("o", tof.to_string().as_str()));
    }
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

/// Leading features that can be written as vendor well attributes.
///
/// The parser places attribute measurements first, in the fixed attribute
/// order, so only a prefix in that order survives a write/read cycle.
fn attribute_prefix(features: &[SignalFeature]) -> Vec<(&'static str, &SignalFeature)> {
    let mut prefix = Vec::new();
    let mut next = 0;
    for feature in features {
        let matched = MEASUREMENT_ATTRIBUTES[next..]
            .iter()
            .position(|(_, kind, unit)| {
                feature.kind == *kind
                    && feature.signal.is_none()
                    && feature.time_of_flight_us.is_none()
                    && feature.unit == Unit::parse(unit)
            });
        match matched {
            Some(offset) => {
                prefix.push((MEASUREMENT_ATTRIBUTES[next + offset].0, feature));
                next += offset + 1;
            }
            None => break,
        }
    }
    prefix
}
