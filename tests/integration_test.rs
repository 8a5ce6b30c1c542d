//! Integration tests for echoplate
//!
//! These tests drive the full pipeline: labware files on disk, survey and
//! picklist parsing, then cross validation.

use echoplate::prelude::*;
use echoplate::survey::{write_survey_to, MatrixCell};
use std::fs::{self, File};
use std::io::BufReader;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

const CUSTOM_LABWARE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<EchoLabware>
  <sourceplates>
    <plateinfo platetype="24RES_Custom" plateformat="24RES" usage="SRC" rows="4" cols="6"
               wellcapacity="200" minwellvol="50" dropvolume="25"/>
  </sourceplates>
  <destinationplates>
    <plateinfo platetype="Assay_96" plateformat="96" usage="DEST" rows="8" cols="12" wellcapacity="300"/>
  </destinationplates>
</EchoLabware>"#;

const SURVEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<platesurvey name="24RES_Custom" barcode="RES-17" date="2024-03-02 08:15:00" serial_number="E5XX-0042">
  <w n="A1" vl="180"/>
  <w n="A2" vl="80"/>
  <w n="B1" vl="120">
    <e t="DMSO">
      <f t="vpp" v="0.8"/>
    </e>
  </w>
</platesurvey>"#;

const PICKLIST: &str = "\
Source Plate Name,Source Plate Type,Source Well,Destination Plate Name,Destination Plate Type,Destination Well,Transfer Volume (uL)
RES-17,24RES_Custom,A1,assay-1,Assay_96,A1,50
RES-17,24RES_Custom,A1,assay-1,Assay_96,A2,50
RES-17,24RES_Custom,A1,assay-1,Assay_96,A3,50
RES-17,24RES_Custom,A2,assay-1,Assay_96,A4,25
RES-17,24RES_Custom,C3,assay-1,Assay_96,A5,25
RES-17,24RES_Custom,E1,assay-1,Assay_96,A6,25
";

fn registry_from_file(dir: &std::path::Path) -> LabwareRegistry {
    let path = dir.join("custom.elwx");
    fs::write(&path, CUSTOM_LABWARE).unwrap();

    let registry = LabwareRegistry::with_builtin();
    let loaded = registry
        .load_elwx(BufReader::new(File::open(&path).unwrap()))
        .unwrap();
    assert_eq!(loaded.len(), 2);
    registry
}

/// Test the complete labware → survey → picklist → validation pipeline
#[test]
fn test_full_pipeline_from_files() {
    let dir = tempdir().unwrap();
    let registry = registry_from_file(dir.path());

    let survey_path = dir.path().join("survey.xml");
    fs::write(&survey_path, SURVEY).unwrap();
    let survey = parse_survey(
        BufReader::new(File::open(&survey_path).unwrap()),
        &registry,
        SurveyParseOptions::default(),
    )
    .unwrap();
    assert_eq!(survey.status(), ParseStatus::Valid);
    let survey = survey.value;
    assert_eq!(survey.barcode(), Some("RES-17"));
    assert_eq!(survey.labware().name(), "24RES_Custom");
    assert_eq!(survey.well_by_name("A1").and_then(|w| w.volume_nl()), Some(180_000.0));

    let picklist_path = dir.path().join("transfers.csv");
    fs::write(&picklist_path, PICKLIST).unwrap();
    let parsed = parse_picklist(
        File::open(&picklist_path).unwrap(),
        &registry,
        PickListParseOptions::default(),
    )
    .unwrap();

    // E1 does not exist on a 4-row plate
    assert_eq!(parsed.status(), ParseStatus::ValidWithWarnings);
    assert_eq!(parsed.warnings.len(), 1);
    assert_eq!(parsed.warnings[0].row, 5);
    let picklist = parsed.value;
    assert_eq!(picklist.len(), 5);
    assert_eq!(picklist.volume_unit(), VolumeUnit::Microliter);
    assert_eq!(picklist.entries()[0].volume_nl, 50_000.0);

    // A1 holds 180 uL over a 50 uL dead volume, so the third 50 uL draw falls short.
    // Its capacity limit of 150 uL is reached but not exceeded.
    let report = cross_validate(&picklist, Some(&survey), &registry);
    let kinds: Vec<FindingKind> = report.findings.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![FindingKind::SurveyedVolumeShortfall, FindingKind::UnsurveyedWell]
    );
    assert_eq!(report.findings[0].entry.map(|e| e.index), Some(2));
    assert_eq!(report.findings[1].entry.map(|e| e.index), Some(4));
    assert!(!report.has_errors());
}

/// Survey written to disk and read back keeps its wells
#[test]
fn test_survey_write_read_cycle() {
    let dir = tempdir().unwrap();
    let registry = registry_from_file(dir.path());
    let survey = parse_survey_str(SURVEY, &registry, SurveyParseOptions::default())
        .unwrap()
        .value;

    let path = dir.path().join("rewritten.xml");
    write_survey_to(&survey, File::create(&path).unwrap()).unwrap();
    let reread = parse_survey(
        BufReader::new(File::open(&path).unwrap()),
        &registry,
        SurveyParseOptions::default(),
    )
    .unwrap()
    .value;

    assert_eq!(reread.wells(), survey.wells());
    assert_eq!(reread.plate_id(), "RES-17");
    assert_eq!(reread.metadata().instrument.serial_number.as_deref(), Some("E5XX-0042"));
}

/// 10 x 5000 nL fits a 384PP well, the eleventh transfer overdraws it
#[test]
fn test_overdraft_scenario() {
    let registry = LabwareRegistry::with_builtin();
    let mut csv = String::from("Source Plate Name,Source Plate Type,Source Well,Destination Plate Name,Destination Well,Transfer Volume\n");
    for i in 1..=10 {
        csv.push_str(&format!("src,384PP_DMSO2,A1,dst,A{},5000\n", i));
    }

    let ten = parse_picklist_str(&csv, &registry, PickListParseOptions::strict())
        .unwrap()
        .value;
    let report = cross_validate(&ten, None, &registry);
    assert_eq!(report.of_kind(FindingKind::VolumeOverdraft).count(), 0);

    csv.push_str("src,384PP_DMSO2,A1,dst,A11,5000\n");
    let eleven = parse_picklist_str(&csv, &registry, PickListParseOptions::strict())
        .unwrap()
        .value;
    let report = cross_validate(&eleven, None, &registry);
    let overdrafts: Vec<&Finding> = report.of_kind(FindingKind::VolumeOverdraft).collect();
    assert_eq!(overdrafts.len(), 1);
    assert_eq!(overdrafts[0].entry.map(|e| e.index), Some(10));
    assert_eq!(overdrafts[0].severity, Severity::Warning);
}

/// A 96-well survey of A1 only leaves every other cell without data
#[test]
fn test_two_well_survey_scenario() {
    let registry = LabwareRegistry::with_builtin();
    let xml = r#"<platesurvey name="Corning_96_3590" barcode="P-0001" date="2024-01-15T10:30:00">
        <w n="A1"><f t="peak_height" v="12.5" u="RFU"/></w>
        <w n="B1"></w>
    </platesurvey>"#;
    let survey = parse_survey_str(xml, &registry, SurveyParseOptions::default())
        .unwrap()
        .value;

    let matrix = survey.matrix();
    assert_eq!(matrix.shape(), (8, 12));
    assert_eq!(matrix.surveyed_count(), 1);
    assert_eq!(matrix.get(WellPosition::new(0, 0)), Some(MatrixCell::Surveyed(0)));
    assert_eq!(matrix.get(WellPosition::new(1, 0)), Some(MatrixCell::NoData));
}

/// Picklist row accounting with bad rows in lenient and strict mode
#[test]
fn test_picklist_row_accounting() {
    let registry = LabwareRegistry::with_builtin();
    let mut csv = String::from("Source Plate Type,Source Well,Destination Well,Transfer Volume\n");
    for i in 0..8 {
        let well = if i == 3 || i == 6 { "Q1" } else { "A1" };
        csv.push_str(&format!("384PP_DMSO2,{},B{},10\n", well, i + 1));
    }

    let parsed = parse_picklist_str(&csv, &registry, PickListParseOptions::default()).unwrap();
    assert_eq!(parsed.value.len(), 6);
    assert_eq!(parsed.warnings.len(), 2);
    assert_eq!(parsed.value.len() + parsed.warnings.len(), parsed.value.source_rows());
    assert_eq!(
        parsed.warnings.iter().map(|s| s.row).collect::<Vec<_>>(),
        vec![3, 6]
    );

    let err = parse_picklist_str(&csv, &registry, PickListParseOptions::strict()).unwrap_err();
    assert_eq!(err.row(), Some(3));
}

/// The registry can be shared by parsers on several threads
#[test]
fn test_shared_registry_across_threads() {
    let registry = Arc::new(LabwareRegistry::with_builtin());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let xml = format!(
                    r#"<platesurvey name="384PP_DMSO2" barcode="P-{}" date="2024-01-15T10:30:00"><w n="A{}" vl="30"/></platesurvey>"#,
                    i,
                    i + 1
                );
                let survey = parse_survey_str(&xml, &registry, SurveyParseOptions::default())
                    .unwrap()
                    .value;

                let custom = LabwareDefinition::builder(format!("Thread_{}", i), PlateUsage::Destination, 8, 12)
                    .capacity_nl(300_000.0)
                    .build()
                    .unwrap();
                registry.register(custom);
                survey.len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
    assert!(registry.contains("Thread_3"));
    assert_eq!(registry.len(), LabwareRegistry::with_builtin().len() + 4);
}

/// Registering the same definition twice leaves the registry unchanged
#[test]
fn test_registration_is_idempotent() {
    let registry = LabwareRegistry::with_builtin();
    let before = registry.snapshot();

    let existing = registry.lookup("384PP_DMSO2").unwrap();
    let outcome = registry.register(existing.as_ref().clone());
    assert!(outcome.is_replacement());

    let after = registry.snapshot();
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.as_ref(), b.as_ref());
    }
}
