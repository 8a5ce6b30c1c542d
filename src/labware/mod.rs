//! # Labware Module
//!
//! Plate geometry definitions and the registry that resolves labware type
//! names (as written in surveys and picklists) to those definitions.
//!
//! ## Contents
//!
//! - [`WellPosition`] / [`WellNaming`]: bijective well naming (`A1` ⇄ (0, 0))
//! - [`LabwareDefinition`]: rows, columns, capacity, dead volume, drop volume
//! - [`LabwareRegistry`]: thread-safe lookup table, seeded with built-in
//!   types and extendable at runtime or from vendor `EchoLabware` XML files
//!
//! ## Usage
//!
//! ```rust
//! use echoplate::labware::{LabwareRegistry, WellPosition};
//!
//! let registry = LabwareRegistry::with_builtin();
//! let plate = registry.lookup("384PP_DMSO2")?;
//! assert_eq!(plate.shape(), (16, 24));
//! assert_eq!(plate.parse_well("P24")?, WellPosition::new(15, 23));
//! assert_eq!(plate.usable_volume_nl(WellPosition::new(0, 0)), 50_000.0);
//! # Ok::<(), echoplate::labware::LabwareError>(())
//! ```

mod builtin;
mod definition;
mod elwx;
mod error;
mod registry;
mod well;


pub use definition::{LabwareBuilder, LabwareDefinition, PlateUsage};
pub use error::LabwareError;
pub use registry::{LabwareRegistry, Registration};
pub use well::{WellNaming, WellPosition};
