use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::labware::{LabwareDefinition, LabwareRegistry, WellPosition};
use crate::picklist::{PickList, PlateWell};
use crate::survey::PlateSurvey;

use super::{EntryRef, Finding, FindingKind, ValidationReport};

/// Slack for accumulated floating point error, in nL
const VOLUME_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PlateKey<'a> {
    Survey,
    Label(&'a str),
}

/// Whether a source plate reference names the surveyed plate.
///
/// Unnamed sources match when their plate type, if any, is the survey's.
fn draws_from_survey(source: &PlateWell, survey: &PlateSurvey) -> bool {
    let names = [source.plate_name.as_deref(), source.plate_barcode.as_deref()];
    if names.iter().all(Option::is_none) {
        return source
            .plate_type
            .as_deref()
            .map_or(true, |t| t == survey.labware().name());
    }

    let ids = [Some(survey.plate_id()), survey.metadata().plate_name.as_deref()];
    names
        .iter()
        .flatten()
        .any(|name| ids.iter().flatten().any(|id| id == name))
}

/// Whether adding a transfer moved the running total across `limit`
fn crosses(before: f64, after: f64, limit: f64) -> bool {
    before <= limit + VOLUME_EPSILON && after > limit + VOLUME_EPSILON
}

/// Cumulative withdrawals per source well against capacity and survey
pub(crate) fn check_volumes(
    picklist: &PickList,
    survey: Option<&PlateSurvey>,
    registry: &LabwareRegistry,
    report: &mut ValidationReport,
) {
    let mut totals: HashMap<(PlateKey<'_>, WellPosition), f64> = HashMap::new();
    let mut unsurveyed: HashSet<WellPosition> = HashSet::new();
    let mut survey_used = false;

    for entry in picklist {
        let well = entry.source.well;
        let from_survey = survey.filter(|s| draws_from_survey(&entry.source, s));
        survey_used |= from_survey.is_some();

        let (key, labware): (_, Option<Arc<LabwareDefinition>>) = match from_survey {
            Some(s) => (PlateKey::Survey, Some(Arc::clone(s.labware()))),
            None => (
                PlateKey::Label(entry.source.plate_label()),
                entry
                    .source
                    .plate_type
                    .as_deref()
                    .and_then(|t| registry.get(t)),
            ),
        };

        let total = totals.entry((key, well)).or_insert(0.0);
        let before = *total;
        *total += entry.volume_nl;
        let after = *total;

        let Some(labware) = labware else {
            continue;
        };
        if !labware.contains(well) {
            // Entries checked against their own plate type were reported by the layout check
            if let Some(survey) = from_survey {
                report.add(Finding::new(
                    Some(EntryRef::from(entry)),
                    FindingKind::WellOutsideLayout,
                    format!(
                        "source well {} is outside surveyed plate {} ({})",
                        entry.source.well_name,
                        survey.plate_id(),
                        labware.name()
                    ),
                ));
            }
            continue;
        }

        if let Some(survey) = from_survey {
            match survey.well(well) {
                None => {
                    if unsurveyed.insert(well) {
                        report.add(Finding::new(
                            Some(EntryRef::from(entry)),
                            FindingKind::UnsurveyedWell,
                            format!(
                                "source well {} was not surveyed on plate {}",
                                labware.well_name(well),
                                survey.plate_id()
                            ),
                        ));
                    }
                }
                Some(surveyed) => {
                    if let Some(measured) = surveyed.volume_nl() {
                        let available = (measured - labware.dead_volume_nl()).max(0.0);
                        if crosses(before, after, available) {
                            report.add(Finding::new(
                                Some(EntryRef::from(entry)),
                                FindingKind::SurveyedVolumeShortfall,
                                format!(
                                    "withdrawals from {} reach {} nL but only {} nL is available above the dead volume (surveyed {} nL)",
                                    surveyed.name, after, available, measured
                                ),
                            ));
                        }
                    }
                }
            }
        }

        let limit = labware.usable_volume_nl(well);
        if crosses(before, after, limit) {
            report.add(Finding::new(
                Some(EntryRef::from(entry)),
                FindingKind::VolumeOverdraft,
                format!(
                    "withdrawals from {} {} reach {} nL, over the {} nL usable volume of {}",
                    source_label(&entry.source),
                    labware.well_name(well),
                    after,
                    limit,
                    labware.name()
                ),
            ));
        }
    }

    if let Some(survey) = survey {
        if !survey_used {
            report.add(Finding::new(
                None,
                FindingKind::SurveyUnmatched,
                format!("no transfer draws from surveyed plate {}", survey.plate_id()),
            ));
        }
    }
}

fn source_label(source: &PlateWell) -> &str {
    match source.plate_label() {
        "" => "source plate",
        label => label,
    }
}
