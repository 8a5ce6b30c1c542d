//! # PickList Module
//!
//! Parses transfer picklists (CSV or TSV, one row per transfer) into a
//! [`PickList`] of validated [`PickListEntry`] records in file order.
//!
//! Required columns are `Source Well`, `Destination Well` and
//! `Transfer Volume`; header matching ignores case and extra whitespace.
//! Plate name, type and barcode columns are optional. When a plate type is
//! given it must be registered, and the well must lie inside its layout.
//! Every other column is kept as per-entry metadata; blank header cells,
//! as left by spreadsheet exports, are ignored.
//!
//! Parsing is lenient by default: a bad row is recorded as a [`SkippedRow`]
//! and the rest of the list is kept, because a partial picklist is still
//! usable. Strict mode aborts on the first bad row.
//!
//! ## Usage
//!
//! ```rust
//! use echoplate::labware::LabwareRegistry;
//! use echoplate::picklist::{parse_picklist_str, PickListParseOptions};
//!
//! let csv = "\
//! Source Plate Name,Source Plate Type,Source Well,Destination Plate Name,Destination Well,Transfer Volume
//! src1,384PP_DMSO2,A1,dst1,B2,2.5
//! src1,384PP_DMSO2,Q1,dst1,B3,2.5
//! ";
//! let registry = LabwareRegistry::with_builtin();
//! let parsed = parse_picklist_str(csv, &registry, PickListParseOptions::default())?;
//!
//! assert_eq!(parsed.value.len(), 1);
//! assert_eq!(parsed.warnings.len(), 1);
//! assert_eq!(parsed.value.len() + parsed.warnings.len(), parsed.value.source_rows());
//! # Ok::<(), echoplate::picklist::PickListError>(())
//! ```

mod contents;
mod error;
mod models;
mod parser;
mod writer;


pub use contents::WellContent;
pub use error::{PickListError, SkippedRow};
pub use models::{PickList, PickListEntry, PlateWell, VolumeUnit, WellVolumes};
pub use parser::{parse_picklist, parse_picklist_str, PickListParseOptions};
pub use writer::write_picklist;
