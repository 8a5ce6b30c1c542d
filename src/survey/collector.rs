use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, warn};

use super::models::{PlateSurvey, SurveyMetadata, WellSurvey};
use super::signal::SignalFeature;
use super::{SurveyError, SurveyWarning};
use crate::labware::{LabwareDefinition, WellPosition};
use crate::outcome::{ParseMode, Parsed};

/// A well as read from the document, before it is checked against the plate
#[derive(Debug, Default)]
pub(super) struct RawWell {
    pub name: String,
    pub status: Option<String>,
    pub features: Vec<SignalFeature>,
    pub attributes: BTreeMap<String, String>,
}

/// Resolves wells against the labware and applies the strict/lenient policy.
///
/// Both survey dialects feed their wells through one collector so that
/// reference checks, duplicate handling and warnings behave identically.
pub(super) struct WellCollector {
    labware: Arc<LabwareDefinition>,
    mode: ParseMode,
    wells: Vec<WellSurvey>,
    index: HashMap<WellPosition, usize>,
    warnings: Vec<SurveyWarning>,
}

impl WellCollector {
    pub fn new(labware: Arc<LabwareDefinition>, mode: ParseMode) -> Self {
        Self {
            labware,
            mode,
            wells: Vec::new(),
            index: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn labware(&self) -> &LabwareDefinition {
        &self.labware
    }

    /// Resolve a well name. `Ok(None)` means the well was dropped in lenient mode.
    pub fn resolve(&mut self, name: &str) -> Result<Option<WellPosition>, SurveyError> {
        match self.labware.parse_well(name) {
            Ok(pos) => Ok(Some(pos)),
            Err(_) if self.mode.is_strict() => Err(SurveyError::InvalidWellReference {
                well: name.to_string(),
                labware: self.labware.name().to_string(),
            }),
            Err(_) => {
                let reason = format!("outside the layout of {}", self.labware.name());
                warn!("Dropping survey well {}: {}", name, reason);
                self.warnings.push(SurveyWarning::DroppedWell {
                    well: name.to_string(),
                    reason,
                });
                Ok(None)
            }
        }
    }

    /// Add a resolved well. Wells without features are unsurveyed and skipped.
    pub fn push(&mut self, position: WellPosition, raw: RawWell) -> Result<(), SurveyError> {
        let name = self.labware.well_name(position);
        if raw.features.is_empty() {
            debug!("Well {} has no signal features; treating it as unsurveyed", name);
            return Ok(());
        }

        let well = WellSurvey {
            position,
            name,
            status: raw.status,
            features: raw.features,
            attributes: raw.attributes,
        };

        match self.index.get(&position) {
            None => {
                self.index.insert(position, self.wells.len());
                self.wells.push(well);
            }
            Some(_) if self.mode.is_strict() => {
                return Err(SurveyError::DuplicateWell(well.name));
            }
            Some(&existing) => {
                warn!("Well {} appears more than once; keeping the later occurrence", well.name);
                self.warnings.push(SurveyWarning::DuplicateOverridden {
                    well: well.name.clone(),
                });
                self.wells[existing] = well;
            }
        }
        Ok(())
    }

    pub fn finish(
        self,
        metadata: SurveyMetadata,
    ) -> Result<Parsed<PlateSurvey, SurveyWarning>, SurveyError> {
        let survey = PlateSurvey::new(metadata, self.labware, self.wells)?;
        Ok(Parsed::new(survey, self.warnings))
    }
}
