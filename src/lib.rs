//! # echoplate - Typed Tooling for Acoustic Liquid Handlers
//!
//! `echoplate` reads the files an acoustic liquid handler consumes and
//! produces, validates them against known plate geometry, and checks that a
//! transfer plan is executable before it reaches the instrument.
//!
//! ## Key Features
//!
//! - **Labware Registry**: Thread-safe catalogue of plate types (geometry,
//!   capacity, dead volume, drop volume) seeded with common plates and
//!   extensible from the instrument's labware XML.
//!
//! - **Plate Surveys**: Streaming parser for both survey XML dialects (the
//!   `platesurvey` export and the `report` form), producing a typed plate
//!   model with a cached, labware-shaped well matrix.
//!
//! - **Picklists**: CSV/TSV transfer lists with case-insensitive headers,
//!   unit-aware volumes and a row-level ledger of skipped rows.
//!
//! - **Cross Validation**: Capacity, dead-volume, survey, drop-size and
//!   plate-graph checks reported as findings, never as failures.
//!
//! ## Quick Start
//!
//! ```rust
//! use echoplate::prelude::*;
//!
//! let registry = LabwareRegistry::with_builtin();
//!
//! let xml = r#"<platesurvey name="384PP_DMSO2" barcode="P-0001" date="2024-01-15T10:30:00">
//!   <w n="A1" vl="40"/>
//!   <w n="A2" vl="25"/>
//! </platesurvey>"#;
//! let survey = parse_survey_str(xml, &registry, SurveyParseOptions::default())?.value;
//!
//! let csv = "\
//! Source Plate Name,Source Plate Type,Source Well,Destination Plate Name,Destination Well,Transfer Volume
//! P-0001,384PP_DMSO2,A1,assay,A1,2.5
//! P-0001,384PP_DMSO2,A2,assay,A2,12500
//! ";
//! let picklist = parse_picklist_str(csv, &registry, PickListParseOptions::default())?.value;
//!
//! let report = cross_validate(&picklist, Some(&survey), &registry);
//! // A2 holds 25 uL; only 10 uL is above the 15 uL dead volume
//! assert!(report.has_warnings());
//! assert!(!report.has_errors());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`labware`]: Plate geometry, well naming and the shared registry
//! - [`survey`]: Survey XML parsing, the plate model and the XML writer
//! - [`picklist`]: Picklist parsing, aggregation and the CSV writer
//! - [`validator`]: Cross validation of picklists against labware and surveys
//! - [`outcome`]: Parse modes and tagged parse results
//!
//! ## Units
//!
//! Volumes in the models are nanoliters. Survey features keep the value and
//! unit they were written with; [`survey::SignalFeature::canonical_value`]
//! converts volumes to nL and lengths to mm.
//!
//! ## Error Handling
//!
//! Each parser has its own error type. Structural problems always abort;
//! record-level problems abort in strict mode and become warnings in
//! lenient mode. Surveys default to strict, picklists to lenient.

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod labware;
pub mod outcome;
pub mod picklist;
pub mod survey;
pub mod validator;

mod xml;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::labware::{
        LabwareDefinition, LabwareError, LabwareRegistry, PlateUsage, Registration, WellNaming,
        WellPosition,
    };
    pub use crate::outcome::{ParseMode, ParseStatus, Parsed};
    pub use crate::picklist::{
        parse_picklist, parse_picklist_str, write_picklist, PickList, PickListEntry,
        PickListError, PickListParseOptions, SkippedRow, VolumeUnit, WellContent,
    };
    pub use crate::survey::{
        feature_kinds, parse_survey, parse_survey_str, write_survey, CellValue, PlateSurvey,
        SignalFeature, SurveyError, SurveyParseOptions, SurveyWarning, Unit, WellMatrix,
        WellSurvey,
    };
    pub use crate::validator::{
        cross_validate, EntryRef, Finding, FindingKind, Severity, ValidationReport,
    };
}
