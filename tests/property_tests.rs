//! Property-based tests for parsing and validation invariants

use std::collections::BTreeMap;

use echoplate::prelude::*;
use proptest::prelude::*;

/// A generated `<f>` element: kind, value, unit, time of flight
type GeneratedFeature = (&'static str, f64, Option<&'static str>, Option<f64>);

/// A generated `<e>` group (or bare features when the tag is `None`)
type GeneratedGroup = (Option<&'static str>, Option<(u8, u8, u8)>, Vec<GeneratedFeature>);

#[derive(Debug, Clone)]
struct GeneratedWell {
    volume: f64,
    note: Option<String>,
    groups: Vec<GeneratedGroup>,
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn survey_xml(wells: &BTreeMap<(u16, u16), GeneratedWell>) -> String {
    let mut xml = String::from(
        r#"<platesurvey name="384PP_DMSO2" barcode="PROP&amp;1" date="2024-01-15T10:30:00" vtl="1">"#,
    );
    for (&(row, column), well) in wells {
        let name = WellPosition::new(row, column).format(WellNaming::Alphanumeric, 24);
        xml.push_str(&format!(r#"<w n="{}" vl="{}""#, name, well.volume));
        if let Some(note) = &well.note {
            xml.push_str(&format!(r#" note="{}""#, escape(note)));
        }
        xml.push('>');
        for (tag, position, features) in &well.groups {
            if let Some(tag) = tag {
                xml.push_str(&format!(r#"<e t="{}""#, tag));
                if let Some((x, y, z)) = position {
                    xml.push_str(&format!(r#" x="{}" y="{}" z="{}""#, x, y, z));
                }
                xml.push('>');
            }
            for (kind, value, unit, tof) in features {
                xml.push_str(&format!(r#"<f t="{}" v="{}""#, kind, value));
                if let Some(unit) = unit {
                    xml.push_str(&format!(r#" u="{}""#, unit));
                }
                if let Some(tof) = tof {
                    xml.push_str(&format!(r#" o="{}""#, tof));
                }
                xml.push_str("/>");
            }
            if tag.is_some() {
                xml.push_str("</e>");
            }
        }
        xml.push_str("</w>");
    }
    xml.push_str("</platesurvey>");
    xml
}

fn feature_strategy() -> impl Strategy<Value = GeneratedFeature> {
    (
        prop_oneof![
            (Just("Peak"), prop_oneof![Just(None), Just(Some("RFU")), Just(Some("%DMSO"))]),
            (Just("vpp"), prop_oneof![Just(None), Just(Some("mV"))]),
            (Just("fluid_composition"), Just(Some("%DMSO"))),
        ],
        -50.0f64..50.0,
        prop::option::of(0.0f64..40.0),
    )
        .prop_map(|((kind, unit), value, tof)| (kind, value, unit, tof))
}

fn well_strategy() -> impl Strategy<Value = GeneratedWell> {
    let group = (
        prop::option::of(prop_oneof![Just("DMSO"), Just("AQ")]),
        prop::option::of((0u8..10, 0u8..10, 0u8..30)),
        prop::collection::vec(feature_strategy(), 1..3),
    );
    (
        0.0f64..65.0,
        prop::option::of("[a-z&<>\" ]{0,8}"),
        prop::collection::vec(group, 0..3),
    )
        .prop_map(|(volume, note, groups)| GeneratedWell { volume, note, groups })
}

fn well_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // Inside a 384-well layout
        (0u16..16, 0u16..24).prop_map(|(r, c)| WellPosition::new(r, c).format(WellNaming::Alphanumeric, 24)),
        // Outside it, or not a well name at all
        Just("Q1".to_string()),
        Just("A25".to_string()),
        Just("7A".to_string()),
        Just(String::new()),
    ]
}

fn volume_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => (0u32..20_000).prop_map(|v| (v as f64 * 2.5).to_string()),
        1 => Just("-5".to_string()),
        1 => Just("lots".to_string()),
    ]
}

proptest! {
    /// Any well formats to a name that parses back to the same position
    #[test]
    fn test_well_naming_bijection(row in 0u16..32, column in 0u16..48) {
        let registry = LabwareRegistry::with_builtin();
        let plate = registry.lookup("1536LDV_DMSO").unwrap();
        let pos = WellPosition::new(row, column);

        let name = plate.well_name(pos);
        prop_assert_eq!(plate.parse_well(&name).unwrap(), pos);
        prop_assert_eq!(WellPosition::parse(&name), Some(pos));

        let padded = pos.format(WellNaming::ZeroPadded, 48);
        prop_assert_eq!(plate.parse_well(&padded).unwrap(), pos);
    }

    /// Parsing a written survey gives back the same survey
    #[test]
    fn test_survey_write_parse_round_trip(
        wells in prop::collection::btree_map((0u16..16, 0u16..24), well_strategy(), 1..40)
    ) {
        let registry = LabwareRegistry::with_builtin();
        let first = parse_survey_str(&survey_xml(&wells), &registry, SurveyParseOptions::default())
            .unwrap()
            .value;
        prop_assert_eq!(first.len(), wells.len());

        let written = write_survey(&first).unwrap();
        let second = parse_survey_str(&written, &registry, SurveyParseOptions::default())
            .unwrap()
            .value;

        prop_assert_eq!(first.plate_id(), "PROP&1");
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.matrix(), second.matrix());
    }

    /// Lenient picklist parsing accounts for every data row, in order
    #[test]
    fn test_picklist_rows_are_accounted_for(
        rows in prop::collection::vec((well_name_strategy(), well_name_strategy(), volume_strategy()), 0..60)
    ) {
        let registry = LabwareRegistry::with_builtin();
        let mut csv = String::from(
            "Source Plate Type,Source Well,Destination Plate Type,Destination Well,Transfer Volume\n",
        );
        for (source, destination, volume) in &rows {
            csv.push_str(&format!(
                "384PP_DMSO2,{},Corning_384PS_3657,{},{}\n",
                source, destination, volume
            ));
        }

        let parsed = parse_picklist_str(&csv, &registry, PickListParseOptions::default()).unwrap();
        let picklist = &parsed.value;

        prop_assert_eq!(picklist.source_rows(), rows.len());
        prop_assert_eq!(picklist.len() + parsed.warnings.len(), rows.len());

        let mut seen: Vec<usize> = picklist
            .iter()
            .map(|e| e.row)
            .chain(parsed.warnings.iter().map(|s| s.row))
            .collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..rows.len()).collect::<Vec<_>>());

        for (i, entry) in picklist.iter().enumerate() {
            prop_assert_eq!(entry.index, i);
            prop_assert!(entry.volume_nl >= 0.0);
        }
        prop_assert!(picklist.iter().zip(picklist.iter().skip(1)).all(|(a, b)| a.row < b.row));
    }

    /// Registering a definition again does not change the registry
    #[test]
    fn test_registration_idempotence(
        rows in 1u16..64,
        columns in 1u16..64,
        capacity in 1.0f64..1e6,
        dead_fraction in 0.0f64..1.0,
    ) {
        let registry = LabwareRegistry::with_builtin();
        let definition = LabwareDefinition::builder("Prop_Plate", PlateUsage::Source, rows, columns)
            .capacity_nl(capacity)
            .dead_volume_nl(capacity * dead_fraction)
            .build()
            .unwrap();

        prop_assert!(!registry.register(definition.clone()).is_replacement());
        let once = registry.snapshot();
        prop_assert!(registry.register(definition).is_replacement());
        let twice = registry.snapshot();

        prop_assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            prop_assert_eq!(a.as_ref(), b.as_ref());
        }
    }

    /// Repeated withdrawals from one well raise at most one overdraft
    #[test]
    fn test_single_overdraft_per_well(volumes in prop::collection::vec(0u32..8_000, 1..40)) {
        let registry = LabwareRegistry::with_builtin();
        let mut csv = String::from(
            "Source Plate Name,Source Plate Type,Source Well,Destination Well,Transfer Volume\n",
        );
        for v in &volumes {
            csv.push_str(&format!("src,384PP_DMSO2,A1,B1,{}\n", *v as f64 * 2.5));
        }
        let picklist = parse_picklist_str(&csv, &registry, PickListParseOptions::strict())
            .unwrap()
            .value;

        let report = cross_validate(&picklist, None, &registry);
        let total: f64 = volumes.iter().map(|v| *v as f64 * 2.5).sum();
        let overdrafts = report.of_kind(FindingKind::VolumeOverdraft).count();

        prop_assert_eq!(overdrafts, usize::from(total > 50_000.0));
        prop_assert!(!report.has_errors());
    }
}
