//! # Cross Validation Module
//!
//! Checks a parsed [`PickList`] against the labware registry and, when one is
//! supplied, against a [`PlateSurvey`] of the source plate. Problems are
//! collected as [`Finding`]s in a [`ValidationReport`]; nothing here fails
//! or corrects the inputs.
//!
//! ## Checks
//!
//! 1. **Layout**: plate types are registered, wells lie inside their plate
//!    and plate types are used in the right role
//! 2. **Drops**: volumes are whole multiples of the source drop volume
//! 3. **Volumes**: cumulative withdrawals stay within capacity minus dead
//!    volume, and within the surveyed volume when a survey is given
//! 4. **Plates**: each plate name has one type and plates do not feed each
//!    other in a cycle
//!
//! ## Usage
//!
//! ```rust
//! use echoplate::labware::LabwareRegistry;
//! use echoplate::picklist::{parse_picklist_str, PickListParseOptions};
//! use echoplate::validator::{cross_validate, FindingKind};
//!
//! let mut csv = String::from("Source Plate Name,Source Plate Type,Source Well,Destination Plate Name,Destination Well,Transfer Volume\n");
//! for i in 1..=11 {
//!     csv.push_str(&format!("src,384PP_DMSO2,A1,dst,B{},5000\n", i));
//! }
//!
//! let registry = LabwareRegistry::with_builtin();
//! let picklist = parse_picklist_str(&csv, &registry, PickListParseOptions::default())?.value;
//! let report = cross_validate(&picklist, None, &registry);
//!
//! let overdrafts: Vec<_> = report.of_kind(FindingKind::VolumeOverdraft).collect();
//! assert_eq!(overdrafts.len(), 1);
//! assert_eq!(overdrafts[0].entry.map(|e| e.index), Some(10));
//! # Ok::<(), echoplate::picklist::PickListError>(())
//! ```

use log::{debug, info};

use crate::labware::LabwareRegistry;
use crate::picklist::PickList;
use crate::survey::PlateSurvey;

pub use report::{EntryRef, Finding, FindingKind, Severity, ValidationReport};

mod layout;
mod plates;
mod report;
mod volume;


/// Cross-validate a picklist against the registry and an optional survey.
///
/// Never fails; every problem becomes a finding. Findings appear grouped by
/// check, in picklist order within each check.
pub fn cross_validate(
    picklist: &PickList,
    survey: Option<&PlateSurvey>,
    registry: &LabwareRegistry,
) -> ValidationReport {
    let mut report = ValidationReport::new(
        picklist.len(),
        survey.map(|s| s.plate_id().to_string()),
    );

    debug!("Step 1: layout and plate roles");
    layout::check_layout(picklist, registry, &mut report);

    debug!("Step 2: drop volumes");
    layout::check_drop_volumes(picklist, registry, &mut report);

    debug!("Step 3: well volumes");
    volume::check_volumes(picklist, survey, registry, &mut report);

    debug!("Step 4: plate consistency");
    plates::check_plate_types(picklist, &mut report);
    plates::check_transfer_graph(picklist, &mut report);

    info!(
        "Cross validation of {} entries: {} errors, {} warnings",
        report.entries_checked,
        report.error_count(),
        report.warning_count()
    );

    report
}
