//! TOML configuration file support.
//!
//! Settings that would otherwise be repeated on every invocation can live in
//! a config file. Command-line flags still win over the file.
//!
//! ```toml
//! # echoplate.toml
//! [survey]
//! mode = "lenient"
//!
//! [picklist]
//! mode = "strict"
//! volume_unit = "uL"
//! delimiter = "\t"
//!
//! [labware]
//! files = ["plates/custom.elwx"]
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use echoplate::outcome::ParseMode;
use echoplate::picklist::{PickListParseOptions, VolumeUnit};
use echoplate::survey::SurveyParseOptions;

/// Root configuration structure for echoplate.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Survey parsing settings.
    #[serde(default)]
    pub survey: SurveyConfig,

    /// Picklist parsing settings.
    #[serde(default)]
    pub picklist: PickListConfig,

    /// Extra labware definitions.
    #[serde(default)]
    pub labware: LabwareConfig,
}

/// Configuration for survey parsing.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveyConfig {
    /// Strict (default) or lenient.
    pub mode: Option<ParseMode>,
}

/// Configuration for picklist parsing.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PickListConfig {
    /// Strict or lenient (default).
    pub mode: Option<ParseMode>,

    /// Unit of volume columns whose header names none.
    pub volume_unit: Option<VolumeUnit>,

    /// Single-character field delimiter.
    pub delimiter: Option<String>,
}

/// Configuration for the labware registry.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabwareConfig {
    /// Labware XML files loaded on top of the built-in table.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_str(&content)?;
        // Labware paths are relative to the config file
        if let Some(dir) = path.parent() {
            for file in &mut config.labware.files {
                if file.is_relative() {
                    *file = dir.join(&*file);
                }
            }
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Survey options with an optional command-line mode override.
    pub fn survey_options(&self, mode: Option<ParseMode>) -> SurveyParseOptions {
        let mut options = SurveyParseOptions::default();
        if let Some(mode) = mode.or(self.survey.mode) {
            options.mode = mode;
        }
        options
    }

    /// Picklist options with command-line overrides applied on top.
    pub fn picklist_options(
        &self,
        mode: Option<ParseMode>,
        volume_unit: Option<VolumeUnit>,
        tsv: bool,
    ) -> Result<PickListParseOptions> {
        let mut options = PickListParseOptions::default();
        if let Some(mode) = mode.or(self.picklist.mode) {
            options.mode = mode;
        }
        if let Some(unit) = volume_unit.or(self.picklist.volume_unit) {
            options = options.with_volume_unit(unit);
        }
        if tsv {
            options = options.tsv();
        } else if let Some(delimiter) = &self.picklist.delimiter {
            options = options.with_delimiter(parse_delimiter(delimiter)?);
        }
        Ok(options)
    }
}

fn parse_delimiter(value: &str) -> Result<u8> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => bail!("Delimiter must be a single ASCII character, got {:?}", value),
    }
}
