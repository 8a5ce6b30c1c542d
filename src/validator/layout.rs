use crate::labware::{LabwareRegistry, PlateUsage};
use crate::picklist::{PickList, PickListEntry, PlateWell};

use super::{EntryRef, Finding, FindingKind, ValidationReport};

/// Relative tolerance when comparing a volume with a whole number of drops
const DROP_TOLERANCE: f64 = 1e-6;

fn sides(entry: &PickListEntry) -> [(&PlateWell, PlateUsage, &'static str); 2] {
    [
        (&entry.source, PlateUsage::Source, "source"),
        (&entry.destination, PlateUsage::Destination, "destination"),
    ]
}

/// Plate types are registered, wells fit their plate and roles match
pub(crate) fn check_layout(
    picklist: &PickList,
    registry: &LabwareRegistry,
    report: &mut ValidationReport,
) {
    for entry in picklist {
        for (side, expected, label) in sides(entry) {
            let Some(plate_type) = side.plate_type.as_deref() else {
                continue;
            };
            let Some(labware) = registry.get(plate_type) else {
                report.add(Finding::new(
                    Some(EntryRef::from(entry)),
                    FindingKind::UnknownLabware,
                    format!("{} plate type '{}' is not registered", label, plate_type),
                ));
                continue;
            };

            if !labware.contains(side.well) {
                report.add(Finding::new(
                    Some(EntryRef::from(entry)),
                    FindingKind::WellOutsideLayout,
                    format!(
                        "{} well {} is outside {} ({}x{})",
                        label,
                        side.well_name,
                        labware.name(),
                        labware.rows(),
                        labware.columns()
                    ),
                ));
            }

            if labware.usage() != expected {
                report.add(Finding::new(
                    Some(EntryRef::from(entry)),
                    FindingKind::UsageMismatch,
                    format!(
                        "{} plate type '{}' is a {} plate",
                        label,
                        plate_type,
                        labware.usage().as_vendor_str()
                    ),
                ));
            }
        }
    }
}

/// Transfer volumes are whole multiples of the source drop volume
pub(crate) fn check_drop_volumes(
    picklist: &PickList,
    registry: &LabwareRegistry,
    report: &mut ValidationReport,
) {
    for entry in picklist {
        let drop = entry
            .source
            .plate_type
            .as_deref()
            .and_then(|t| registry.get(t))
            .and_then(|labware| labware.drop_volume_nl());
        let Some(drop) = drop.filter(|d| *d > 0.0) else {
            continue;
        };

        let drops = entry.volume_nl / drop;
        if (drops - drops.round()).abs() > DROP_TOLERANCE * drops.max(1.0) {
            report.add(Finding::new(
                Some(EntryRef::from(entry)),
                FindingKind::DropVolumeMismatch,
                format!(
                    "{} nL is not a multiple of the {} nL drop volume; {} nL will be dispensed",
                    entry.volume_nl,
                    drop,
                    drops.round() * drop
                ),
            ));
        }
    }
}
