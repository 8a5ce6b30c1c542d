use super::*;

use std::sync::Arc;

use crate::labware::{LabwareRegistry, WellPosition};
use crate::outcome::ParseStatus;

const PLATE_SURVEY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<platesurvey name="384PP_DMSO2" barcode="UnknownBarCode" date="2023-06-12T14:22:05.123"
             serial_number="E5XX-1234" vtl="1" original="1" frmt="1" rows="2" cols="3" totalWells="6">
  <w r="0" c="0" n="A1" vl="25.955" cvl="25.955" status="" fld="DMSO" fldu="%" t="1.2" b="0.9" fsh="0.7"/>
  <w r="0" c="1" n="A2" vl="30.1" status="">
    <e t="DMSO" x="0" y="0" z="12">
      <f t="Peak" o="12.25" v="0.51"/>
      <f t="BB" o="8.5" v="0.88"/>
    </e>
  </w>
  <w r="1" c="2" n="B3" vl="0" status="Data missing for well (1th row, 3th column), defaulting to 0.0 value of AQ"/>
</platesurvey>"#;

const SURVEY_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<report>
  <reportheader>
    <RunID>2451</RunID>
    <RunDateTime>2023-09-01 10:15:42.000</RunDateTime>
    <AppName>Echo Cherry Pick</AppName>
    <AppVersion>2.7.1</AppVersion>
    <ProtocolName>survey-only</ProtocolName>
    <OrderID/>
    <UserName>lab</UserName>
  </reportheader>
  <reportbody>
    <record>
      <SrcPlateName>Source[1]</SrcPlateName>
      <SrcPlateBarcode>SRC-0001</SrcPlateBarcode>
      <SrcPlateType>384PP_DMSO2</SrcPlateType>
      <SrcWell>A1</SrcWell>
      <SurveyFluidHeight>2.112</SurveyFluidHeight>
      <SurveyFluidVolume>49.034</SurveyFluidVolume>
      <FluidComposition>100.0</FluidComposition>
      <FluidUnits>%DMSO</FluidUnits>
      <FluidType>DMSO</FluidType>
      <SurveyStatus>Ok</SurveyStatus>
    </record>
    <record>
      <SrcPlateName>Source[1]</SrcPlateName>
      <SrcPlateBarcode>SRC-0001</SrcPlateBarcode>
      <SrcPlateType>384PP_DMSO2</SrcPlateType>
      <SrcWell>A2</SrcWell>
      <SurveyFluidHeight>2.140</SurveyFluidHeight>
      <SurveyFluidVolume>49.983</SurveyFluidVolume>
      <FluidComposition>100.0</FluidComposition>
      <FluidUnits>%DMSO</FluidUnits>
      <FluidType>DMSO</FluidType>
      <SurveyStatus>Ok</SurveyStatus>
    </record>
  </reportbody>
  <reportfooter>
    <InstrName>Echo-1</InstrName>
    <InstrModel>Echo 525</InstrModel>
    <InstrSN>E5XX-1234</InstrSN>
    <InstrSWVersion>3.1.2</InstrSWVersion>
  </reportfooter>
</report>"#;

fn registry() -> LabwareRegistry {
    LabwareRegistry::with_builtin()
}

fn strict(xml: &str) -> Result<PlateSurvey, SurveyError> {
    parse_survey_str(xml, &registry(), SurveyParseOptions::strict()).map(|p| p.into_value())
}

fn survey_96(wells: &str) -> String {
    format!(
        r#"<platesurvey name="Corning_96_3590" barcode="P-0001" date="2024-01-15T10:30:00">{}</platesurvey>"#,
        wells
    )
}

#[test]
fn test_parse_vendor_platesurvey() {
    let survey = strict(PLATE_SURVEY).unwrap();

    assert_eq!(survey.len(), 3);
    assert_eq!(survey.labware().name(), "384PP_DMSO2");
    assert_eq!(survey.barcode(), None);
    assert_eq!(survey.plate_id(), UNKNOWN_BARCODE);

    let metadata = survey.metadata();
    assert_eq!(metadata.instrument.serial_number.as_deref(), Some("E5XX-1234"));
    assert_eq!(metadata.format_version.as_deref(), Some("1"));
    assert_eq!(metadata.attributes.get("totalWells").map(String::as_str), Some("6"));
    assert!(metadata.timestamp.parsed.is_some());

    let a1 = survey.well_by_name("A1").unwrap();
    let kinds: Vec<&str> = a1.features.iter().map(|f| f.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec!["volume", "current_volume", "fluid_thickness", "bottom_thickness"]
    );
    assert!((a1.volume_nl().unwrap() - 25_955.0).abs() < 1e-6);
    assert_eq!(a1.attributes.get("fld").map(String::as_str), Some("DMSO"));
    assert_eq!(a1.attributes.get("fsh").map(String::as_str), Some("0.7"));

    let a2 = survey.well(WellPosition::new(0, 1)).unwrap();
    let peak = a2.feature("Peak").unwrap();
    assert_eq!(peak.signal.as_deref(), Some("DMSO"));
    assert_eq!(peak.value, 0.51);
    assert_eq!(peak.time_of_flight_us, Some(12.25));
    assert_eq!(peak.unit, Unit::Dimensionless);
}

#[test]
fn test_two_well_scenario_marks_unsurveyed_as_no_data() {
    let xml = survey_96(
        r#"<w n="A1"><f t="peak_height" v="12.5" u="RFU"/></w>
           <w n="B1"></w>"#,
    );
    let survey = strict(&xml).unwrap();

    assert_eq!(survey.len(), 1);
    let a1 = &survey.wells()[0];
    assert_eq!(a1.name, "A1");
    assert_eq!(a1.features.len(), 1);
    assert_eq!(a1.features[0].value, 12.5);
    assert_eq!(a1.features[0].unit, Unit::Rfu);

    let matrix = survey.matrix();
    assert_eq!(matrix.shape(), (8, 12));
    assert_eq!(matrix.get(WellPosition::new(0, 0)), Some(MatrixCell::Surveyed(0)));
    assert_eq!(matrix.get(WellPosition::new(1, 0)), Some(MatrixCell::NoData));
    assert_eq!(matrix.surveyed_count(), 1);

    let grid = survey.value_grid("peak_height");
    assert_eq!(grid.get(WellPosition::new(1, 0)), Some(CellValue::NoData));
    assert_ne!(grid.get(WellPosition::new(1, 0)), Some(CellValue::Value(0.0)));
    assert_eq!(survey.value_grid("volume").get(WellPosition::new(0, 0)), Some(CellValue::NotMeasured));
}

#[test]
fn test_matrix_is_cached() {
    let survey = strict(&survey_96(r#"<w n="C3" vl="10"/>"#)).unwrap();
    let first = survey.matrix() as *const WellMatrix;
    let second = survey.matrix() as *const WellMatrix;
    assert_eq!(first, second);
}

#[test]
fn test_out_of_layout_well_strict_and_lenient() {
    let xml = survey_96(
        r#"<w n="A1" vl="20"/>
           <w n="Z99" vl="20"><f t="peak_height" v="1" u="RFU"/></w>
           <w n="H12" vl="15"/>"#,
    );

    let err = strict(&xml).unwrap_err();
    assert!(matches!(
        err,
        SurveyError::InvalidWellReference { ref well, ref labware }
            if well == "Z99" && labware == "Corning_96_3590"
    ));

    let parsed = parse_survey_str(&xml, &registry(), SurveyParseOptions::lenient()).unwrap();
    assert_eq!(parsed.status(), ParseStatus::ValidWithWarnings);
    assert_eq!(parsed.warnings.len(), 1);
    assert!(matches!(&parsed.warnings[0], SurveyWarning::DroppedWell { well, .. } if well == "Z99"));

    let names: Vec<&str> = parsed.value.wells().iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["A1", "H12"]);
}

#[test]
fn test_duplicate_wells() {
    let xml = survey_96(r#"<w n="A1" vl="20"/><w n="B2" vl="5"/><w n="a01" vl="25"/>"#);

    assert!(matches!(strict(&xml), Err(SurveyError::DuplicateWell(ref w)) if w == "A1"));

    let parsed = parse_survey_str(&xml, &registry(), SurveyParseOptions::lenient()).unwrap();
    assert_eq!(
        parsed.warnings,
        vec![SurveyWarning::DuplicateOverridden {
            well: "A1".to_string()
        }]
    );
    let survey = parsed.value;
    assert_eq!(survey.len(), 2);
    // The later occurrence replaces the earlier one in place
    assert_eq!(survey.wells()[0].name, "A1");
    assert_eq!(survey.wells()[0].volume_nl(), Some(25_000.0));
}

#[test]
fn test_malformed_signals_are_fatal_in_both_modes() {
    let cases = [
        r#"<w n="A1"><f t="peak_height" v="high" u="RFU"/></w>"#,
        r#"<w n="A1"><f t="volume" v="12" u="mm"/></w>"#,
        r#"<w n="A1" vl="lots"/>"#,
        r#"<w n="A1"><f v="1"/></w>"#,
        r#"<w n="A1"><f t="Peak" v="1" o="soon"/></w>"#,
    ];
    for wells in cases {
        let xml = survey_96(wells);
        for options in [SurveyParseOptions::strict(), SurveyParseOptions::lenient()] {
            let err = parse_survey_str(&xml, &registry(), options).unwrap_err();
            assert!(
                matches!(err, SurveyError::MalformedSignal { ref well, .. } if well == "A1"),
                "{} gave {:?}",
                wells,
                err
            );
        }
    }
}

#[test]
fn test_missing_root_attributes() {
    for xml in [
        r#"<platesurvey barcode="P" date="2024-01-01"/>"#,
        r#"<platesurvey name="Corning_96_3590" date="2024-01-01"/>"#,
        r#"<platesurvey name="Corning_96_3590" barcode="P"/>"#,
    ] {
        assert!(matches!(strict(xml), Err(SurveyError::MalformedSurvey(_))), "{}", xml);
    }
}

#[test]
fn test_unknown_labware() {
    let xml = r#"<platesurvey name="Mystery_384" barcode="P" date="2024-01-01"/>"#;
    assert!(matches!(strict(xml), Err(SurveyError::UnknownLabware(ref n)) if n == "Mystery_384"));
}

#[test]
fn test_structural_errors() {
    assert!(matches!(strict("<plate/>"), Err(SurveyError::MalformedSurvey(_))));
    assert!(matches!(strict(""), Err(SurveyError::MalformedSurvey(_))));
    assert!(matches!(
        strict(&survey_96(r#"<f t="x" v="1"/>"#)),
        Err(SurveyError::MalformedSurvey(_))
    ));
    assert!(matches!(
        strict(&survey_96(r#"<w vl="1"/>"#)),
        Err(SurveyError::MalformedSurvey(_))
    ));
    // Truncated document
    assert!(strict(r#"<platesurvey name="Corning_96_3590" barcode="P" date="d"><w n="A1" vl="1"/>"#).is_err());
}

#[test]
fn test_row_column_must_agree_with_name() {
    let err = strict(&survey_96(r#"<w n="B2" r="1" c="0" vl="1"/>"#)).unwrap_err();
    assert!(matches!(err, SurveyError::MalformedSurvey(ref m) if m.contains("B2")));
}

#[test]
fn test_self_closing_root_is_an_empty_survey() {
    let survey = strict(r#"<platesurvey name="Corning_96_3590" barcode="P" date="2024-01-01"/>"#).unwrap();
    assert!(survey.is_empty());
    assert_eq!(survey.extent(), None);
    assert_eq!(survey.matrix().surveyed_count(), 0);
}

#[test]
fn test_extent_covers_surveyed_wells() {
    let survey = strict(&survey_96(r#"<w n="B3" vl="1"/><w n="D2" vl="1"/><w n="C7" vl="1"/>"#)).unwrap();
    assert_eq!(
        survey.extent(),
        Some((WellPosition::new(1, 1), WellPosition::new(3, 6)))
    );
}

#[test]
fn test_parse_report_dialect() {
    let survey = strict(SURVEY_REPORT).unwrap();

    assert_eq!(survey.plate_id(), "SRC-0001");
    assert_eq!(survey.barcode(), Some("SRC-0001"));
    assert_eq!(survey.metadata().plate_name.as_deref(), Some("Source[1]"));
    assert_eq!(survey.labware().name(), "384PP_DMSO2");
    assert_eq!(survey.metadata().instrument.model.as_deref(), Some("Echo 525"));
    assert_eq!(survey.metadata().attributes.get("RunID").map(String::as_str), Some("2451"));
    assert_eq!(survey.metadata().attributes.get("OrderID").map(String::as_str), Some(""));
    assert!(survey.metadata().timestamp.parsed.is_some());

    let a1 = survey.well_by_name("A1").unwrap();
    assert_eq!(a1.status.as_deref(), Some("Ok"));
    assert_eq!(a1.feature(feature_kinds::VOLUME).unwrap().value, 49.034);
    assert_eq!(a1.feature(feature_kinds::FLUID_HEIGHT).unwrap().unit, Unit::Millimeter);
    assert_eq!(a1.feature(feature_kinds::FLUID_COMPOSITION).unwrap().unit, Unit::Percent("%DMSO".to_string()));
    assert_eq!(a1.attributes.get("FluidType").map(String::as_str), Some("DMSO"));

    let volumes: Vec<f64> = survey
        .value_grid(feature_kinds::VOLUME)
        .rows()
        .next()
        .unwrap()
        .iter()
        .take(3)
        .map(|c| c.value().unwrap_or(f64::NAN))
        .collect();
    assert!((volumes[0] - 49_034.0).abs() < 1e-6);
    assert!((volumes[1] - 49_983.0).abs() < 1e-6);
    assert!(volumes[2].is_nan());
}

#[test]
fn test_report_with_several_plates_is_rejected() {
    let xml = SURVEY_REPORT.replacen(
        "<SrcPlateType>384PP_DMSO2</SrcPlateType>",
        "<SrcPlateType>384LDV_DMSO</SrcPlateType>",
        1,
    );
    assert!(matches!(strict(&xml), Err(SurveyError::MalformedSurvey(_))));
}

#[test]
fn test_report_without_records() {
    let xml = r#"<report><reportheader><RunDateTime>2023-09-01</RunDateTime></reportheader><reportbody/></report>"#;
    assert!(matches!(strict(xml), Err(SurveyError::MalformedSurvey(ref m)) if m.contains("no records")));
}

#[test]
fn test_write_then_parse_is_stable() {
    let registry = registry();
    for doc in [PLATE_SURVEY, SURVEY_REPORT] {
        let first = strict(doc).unwrap();
        let written = write_survey(&first).unwrap();
        let second = parse_survey_str(&written, &registry, SurveyParseOptions::strict())
            .unwrap()
            .into_value();
        assert_eq!(first, second, "round trip changed the model:\n{}", written);
    }
}

#[test]
fn test_writer_uses_vendor_attribute_names() {
    let survey = strict(PLATE_SURVEY).unwrap();
    let written = write_survey(&survey).unwrap();

    assert!(written.starts_with("<?xml"));
    assert!(written.contains(r#"name="384PP_DMSO2""#));
    assert!(written.contains(r#"barcode="UnknownBarCode""#));
    assert!(written.contains(r#"vl="25.955""#));
    assert!(written.contains(r#"<e t="DMSO" x="0" y="0" z="12">"#));
    assert!(written.contains(r#"<f t="Peak" v="0.51" o="12.25"/>"#));
}

#[test]
fn test_signal_group_attributes_are_kept() {
    let survey = strict(PLATE_SURVEY).unwrap();
    let a2 = survey.well_by_name("A2").unwrap();

    for kind in ["Peak", "BB"] {
        let feature = a2.feature(kind).unwrap();
        let position: Vec<(&str, &str)> = feature
            .signal_attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(position, vec![("x", "0"), ("y", "0"), ("z", "12")]);
    }
    assert!(a2.feature(feature_kinds::VOLUME).unwrap().signal_attributes.is_empty());
}

#[test]
fn test_signal_groups_with_different_positions_stay_apart() {
    let xml = survey_96(
        r#"<w n="A1">
             <e t="DMSO" x="1" y="2" z="3"><f t="Peak" v="0.5"/></e>
             <e t="DMSO" x="4" y="5" z="6"><f t="Peak" v="0.7"/></e>
           </w>"#,
    );
    let survey = strict(&xml).unwrap();
    let written = write_survey(&survey).unwrap();

    assert!(written.contains(r#"<e t="DMSO" x="1" y="2" z="3">"#));
    assert!(written.contains(r#"<e t="DMSO" x="4" y="5" z="6">"#));
    let reread = strict(&written).unwrap();
    assert_eq!(reread, survey);
}

#[test]
fn test_escaped_attribute_values() {
    let xml = r#"<platesurvey name="Corning_96_3590" barcode="A&amp;B" plate_name="&lt;src&gt;" date="2024-01-15T10:30:00">
        <w n="A1" vl="10" note="x &quot;y&quot;"/>
    </platesurvey>"#;
    let survey = strict(xml).unwrap();

    assert_eq!(survey.plate_id(), "A&B");
    assert_eq!(survey.metadata().plate_name.as_deref(), Some("<src>"));
    assert_eq!(
        survey.wells()[0].attributes.get("note").map(String::as_str),
        Some(r#"x "y""#)
    );

    let written = write_survey(&survey).unwrap();
    assert!(written.contains(r#"barcode="A&amp;B""#));
    assert_eq!(strict(&written).unwrap(), survey);
}

#[test]
fn test_percent_unit_keeps_its_qualifier() {
    let xml = survey_96(r#"<w n="A1"><f t="fluid_composition" v="70" u="%DMSO"/></w>"#);
    let survey = strict(&xml).unwrap();
    let composition = survey.wells()[0].feature(feature_kinds::FLUID_COMPOSITION).unwrap();
    assert_eq!(composition.unit.symbol(), "%DMSO");

    let written = write_survey(&survey).unwrap();
    assert!(written.contains(r#"u="%DMSO""#));
    assert_eq!(strict(&written).unwrap(), survey);
}

#[test]
fn test_plate_survey_new_checks_invariants() {
    let registry = registry();
    let labware = registry.lookup("Corning_96_3590").unwrap();
    let metadata = SurveyMetadata::new("P", SurveyTimestamp::parse("2024-01-01T00:00:00"));
    let well = |row, column| WellSurvey {
        position: WellPosition::new(row, column),
        name: WellPosition::new(row, column).to_string(),
        status: None,
        features: vec![SignalFeature::new("volume", 1.0, None, None).unwrap()],
        attributes: Default::default(),
    };

    assert!(PlateSurvey::new(metadata.clone(), Arc::clone(&labware), vec![well(0, 0), well(7, 11)]).is_ok());
    assert!(matches!(
        PlateSurvey::new(metadata.clone(), Arc::clone(&labware), vec![well(8, 0)]),
        Err(SurveyError::InvalidWellReference { .. })
    ));
    assert!(matches!(
        PlateSurvey::new(metadata.clone(), Arc::clone(&labware), vec![well(0, 0), well(0, 0)]),
        Err(SurveyError::DuplicateWell(_))
    ));

    let mut empty = well(1, 1);
    empty.features.clear();
    assert!(PlateSurvey::new(metadata, labware, vec![empty]).is_err());
}

#[test]
fn test_survey_keeps_its_labware_snapshot() {
    let registry = registry();
    let xml = survey_96(r#"<w n="A1" vl="1"/>"#);
    let survey = parse_survey_str(&xml, &registry, SurveyParseOptions::default())
        .unwrap()
        .into_value();

    let bigger = crate::labware::LabwareDefinition::builder(
        "Corning_96_3590",
        crate::labware::PlateUsage::Destination,
        8,
        12,
    )
    .capacity_nl(400_000.0)
    .build()
    .unwrap();
    registry.register(bigger);

    assert_eq!(survey.labware().capacity_nl(), 360_000.0);
}

#[test]
fn test_timestamp_formats() {
    assert!(SurveyTimestamp::parse("2024-01-15T10:30:00Z").parsed.is_some());
    assert!(SurveyTimestamp::parse("2024-01-15 10:30:00").parsed.is_some());
    assert!(SurveyTimestamp::parse("1/15/2024 10:30:00 AM").parsed.is_some());

    let odd = SurveyTimestamp::parse("yesterday");
    assert_eq!(odd.raw, "yesterday");
    assert!(odd.parsed.is_none());
}
