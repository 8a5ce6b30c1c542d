//! Signal features, their units and unit coercion.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Feature-type tags the parsers produce for vendor measurements
pub mod feature_kinds {
    /// Estimated well volume
    pub const VOLUME: &str = "volume";
    /// Volume at the time of the survey after prior transfers
    pub const CURRENT_VOLUME: &str = "current_volume";
    /// Height of the fluid column
    pub const FLUID_HEIGHT: &str = "fluid_height";
    /// Fluid thickness from the acoustic echo
    pub const FLUID_THICKNESS: &str = "fluid_thickness";
    /// Plate bottom thickness
    pub const BOTTOM_THICKNESS: &str = "bottom_thickness";
    /// Fluid composition; its unit varies with the calibration (`%DMSO`, `GPSA`, ...)
    pub const FLUID_COMPOSITION: &str = "fluid_composition";
    /// Echo time of flight
    pub const TIME_OF_FLIGHT: &str = "tof";
    /// Peak-to-peak echo amplitude
    pub const PEAK_AMPLITUDE: &str = "vpp";
}

/// Physical dimension of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dimension {
    /// nL, µL, mL
    Volume,
    /// mm, µm
    Length,
    /// µs
    Time,
    /// mV
    Voltage,
    /// %
    Fraction,
    /// Relative fluorescence and similar instrument counts
    Signal,
    /// No unit
    Dimensionless,
    /// A unit string this crate does not interpret
    Unknown,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dimension::Volume => "volume",
            Dimension::Length => "length",
            Dimension::Time => "time",
            Dimension::Voltage => "voltage",
            Dimension::Fraction => "fraction",
            Dimension::Signal => "signal",
            Dimension::Dimensionless => "dimensionless",
            Dimension::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Unit of a signal value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Unit {
    /// nL
    Nanoliter,
    /// µL
    Microliter,
    /// mL
    Milliliter,
    /// mm
    Millimeter,
    /// µm
    Micrometer,
    /// µs
    Microsecond,
    /// mV
    Millivolt,
    /// A percentage, with the symbol as written (`%`, `%DMSO`)
    Percent(String),
    /// Relative fluorescence units
    Rfu,
    /// No unit
    Dimensionless,
    /// Any other unit string, kept verbatim
    Other(String),
}

impl Unit {
    /// Interpret a unit string. Never fails; unrecognised strings become [`Unit::Other`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('%') {
            return Unit::Percent(trimmed.to_string());
        }
        match trimmed.to_lowercase().as_str() {
            "" | "none" | "1" => Unit::Dimensionless,
            "nl" => Unit::Nanoliter,
            "ul" | "µl" | "μl" => Unit::Microliter,
            "ml" => Unit::Milliliter,
            "mm" => Unit::Millimeter,
            "um" | "µm" | "μm" => Unit::Micrometer,
            "us" | "µs" | "μs" => Unit::Microsecond,
            "mv" => Unit::Millivolt,
            "percent" => Unit::Percent("%".to_string()),
            "rfu" => Unit::Rfu,
            _ => Unit::Other(trimmed.to_string()),
        }
    }

    /// Canonical symbol, as written by the survey writer
    pub fn symbol(&self) -> &str {
        match self {
            Unit::Nanoliter => "nL",
            Unit::Microliter => "uL",
            Unit::Milliliter => "mL",
            Unit::Millimeter => "mm",
            Unit::Micrometer => "um",
            Unit::Microsecond => "us",
            Unit::Millivolt => "mV",
            Unit::Percent(s) => s,
            Unit::Rfu => "RFU",
            Unit::Dimensionless => "",
            Unit::Other(s) => s,
        }
    }

    /// Physical dimension
    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Nanoliter | Unit::Microliter | Unit::Milliliter => Dimension::Volume,
            Unit::Millimeter | Unit::Micrometer => Dimension::Length,
            Unit::Microsecond => Dimension::Time,
            Unit::Millivolt => Dimension::Voltage,
            Unit::Percent(_) => Dimension::Fraction,
            Unit::Rfu => Dimension::Signal,
            Unit::Dimensionless => Dimension::Dimensionless,
            Unit::Other(_) => Dimension::Unknown,
        }
    }

    /// Factor converting a value in this unit to the base unit of its
    /// dimension (nL for volume, mm for length)
    fn base_factor(&self) -> f64 {
        match self {
            Unit::Microliter => 1_000.0,
            Unit::Milliliter => 1_000_000.0,
            Unit::Micrometer => 0.001,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Expected dimension and default unit of a known feature kind
fn known_kind(kind: &str) -> Option<(Dimension, Unit)> {
    use feature_kinds::*;
    match kind {
        VOLUME | CURRENT_VOLUME => Some((Dimension::Volume, Unit::Microliter)),
        FLUID_HEIGHT | FLUID_THICKNESS | BOTTOM_THICKNESS => {
            Some((Dimension::Length, Unit::Millimeter))
        }
        TIME_OF_FLIGHT => Some((Dimension::Time, Unit::Microsecond)),
        PEAK_AMPLITUDE => Some((Dimension::Voltage, Unit::Millivolt)),
        _ => None,
    }
}

/// One named measurement attached to a surveyed well
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalFeature {
    /// Feature-type tag (e.g. `volume`, `peak_height`)
    pub kind: String,
    /// Value as written, in `unit`
    pub value: f64,
    /// Unit of `value`
    pub unit: Unit,
    /// Tag of the enclosing echo signal group, if any
    pub signal: Option<String>,
    /// Other attributes of the enclosing signal group, such as the
    /// transducer position `x`/`y`/`z`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub signal_attributes: BTreeMap<String, String>,
    /// Echo time of flight (vendor `o` attribute), in µs
    pub time_of_flight_us: Option<f64>,
}

impl SignalFeature {
    /// Create a feature, checking the value and the unit against the kind.
    ///
    /// Values must be finite. Known kinds (see [`feature_kinds`]) take their
    /// default unit when none is given and reject units of another dimension;
    /// unknown kinds accept any unit and default to dimensionless.
    pub fn new(
        kind: impl Into<String>,
        value: f64,
        unit: Option<Unit>,
        signal: Option<String>,
    ) -> Result<Self, String> {
        let kind = kind.into();
        if kind.trim().is_empty() {
            return Err("feature type must not be empty".to_string());
        }
        if !value.is_finite() {
            return Err(format!("{} value {} is not finite", kind, value));
        }

        let unit = match (known_kind(&kind), unit) {
            (Some((_, default)), None) => default,
            (Some((expected, _)), Some(unit)) => {
                if unit.dimension() != expected {
                    return Err(format!(
                        "unit '{}' is not a {} unit as required by {}",
                        unit, expected, kind
                    ));
                }
                unit
            }
            (None, unit) => unit.unwrap_or(Unit::Dimensionless),
        };

        Ok(Self {
            kind,
            value,
            unit,
            signal,
            signal_attributes: BTreeMap::new(),
            time_of_flight_us: None,
        })
    }

    /// Attach an echo time of flight
    pub fn with_time_of_flight(mut self, tof_us: f64) -> Self {
        self.time_of_flight_us = Some(tof_us);
        self
    }

    /// Attach the pass-through attributes of the enclosing signal group
    pub fn with_signal_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.signal_attributes = attributes;
        self
    }

    /// Coerce raw attribute strings into a feature
    pub fn coerce(
        kind: &str,
        raw_value: &str,
        raw_unit: Option<&str>,
        signal: Option<String>,
    ) -> Result<Self, String> {
        let value: f64 = raw_value
            .trim()
            .parse()
            .map_err(|_| format!("{} value '{}' is not numeric", kind, raw_value))?;
        let unit = raw_unit
            .filter(|u| !u.trim().is_empty())
            .map(Unit::parse);
        Self::new(kind, value, unit, signal)
    }

    /// Value converted to the base unit of its dimension (nL, mm)
    pub fn canonical_value(&self) -> f64 {
        self.value * self.unit.base_factor()
    }
}
